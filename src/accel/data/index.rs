// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Arrow-backed ID index.

use arrow::array::{Array, StringArray, StringBuilder};
use rustc_hash::FxHashMap;

/// Index mapping external string identifiers to dense positions.
///
/// Positions are assigned in first-seen order.
#[derive(Clone, Debug)]
pub struct IdIndex {
    /// The array of IDs.
    ids: StringArray,

    /// Lookup table.
    index: FxHashMap<String, u32>,
}

impl IdIndex {
    /// Create an empty ID index.
    pub fn empty() -> Self {
        IdIndex {
            ids: StringBuilder::new().finish(),
            index: FxHashMap::default(),
        }
    }

    /// Build an index from identifiers, ignoring repeats.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bld = StringBuilder::new();
        let mut index = FxHashMap::default();
        for id in ids {
            let id = id.as_ref();
            if !index.contains_key(id) {
                index.insert(id.to_string(), index.len() as u32);
                bld.append_value(id);
            }
        }
        IdIndex {
            ids: bld.finish(),
            index,
        }
    }

    /// Look up a single index by ID.
    pub fn get_index(&self, id: &str) -> Option<u32> {
        self.index.get(id).copied()
    }

    /// Look up multiple indexes by ID.
    pub fn get_indexes<'a, I>(&self, ids: I) -> Vec<Option<u32>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter().map(|id| self.get_index(id)).collect()
    }

    /// Get the ID at a position.
    pub fn id(&self, pos: u32) -> &str {
        self.ids.value(pos as usize)
    }

    /// Get the ID array.
    pub fn id_array(&self) -> &StringArray {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::IdIndex;

    #[test]
    fn first_seen_order() {
        let idx = IdIndex::from_ids(["bob", "alice", "bob", "carol"]);
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.get_index("bob"), Some(0));
        assert_eq!(idx.get_index("alice"), Some(1));
        assert_eq!(idx.get_index("carol"), Some(2));
        assert_eq!(idx.get_index("dave"), None);
        assert_eq!(idx.id(1), "alice");
    }

    #[test]
    fn bulk_lookup() {
        let idx = IdIndex::from_ids(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(idx.get_indexes(["b", "z"]), vec![Some(1), None]);
        assert!(IdIndex::empty().is_empty());
    }
}
