// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Row-column sets for quick masking.

use rustc_hash::{FxHashMap, FxHashSet};

/// A set of (row, column) pairs, such as (user, item) candidates.
#[derive(Clone, Debug, Default)]
pub struct RowColumnSet {
    set: FxHashSet<(i32, i32)>,
}

impl RowColumnSet {
    pub fn from_pairs<I: IntoIterator<Item = (i32, i32)>>(pairs: I) -> Self {
        RowColumnSet {
            set: pairs.into_iter().collect(),
        }
    }

    pub fn contains_pair(&self, row: i32, col: i32) -> bool {
        self.set.contains(&(row, col))
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Get the distinct rows present in the set, in ascending order.
    pub fn rows(&self) -> Vec<i32> {
        let mut rows: Vec<i32> = self.set.iter().map(|(r, _)| *r).collect();
        rows.sort_unstable();
        rows.dedup();
        rows
    }

    /// Group the columns of the set by row, with columns ascending.
    pub fn by_row(&self) -> FxHashMap<i32, Vec<i32>> {
        let mut rows: FxHashMap<i32, Vec<i32>> = FxHashMap::default();
        for (r, c) in &self.set {
            rows.entry(*r).or_default().push(*c);
        }
        for cols in rows.values_mut() {
            cols.sort_unstable();
        }
        rows
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.set.iter().copied()
    }
}

impl FromIterator<(i32, i32)> for RowColumnSet {
    fn from_iter<T: IntoIterator<Item = (i32, i32)>>(iter: T) -> Self {
        RowColumnSet::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::RowColumnSet;

    #[test]
    fn dedups_pairs() {
        let set: RowColumnSet = vec![(1, 2), (1, 2), (0, 5), (1, 0)].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.rows(), vec![0, 1]);
        assert_eq!(set.by_row().get(&1), Some(&vec![0, 2]));
        assert_eq!(set.iter().count(), 3);
        assert!(set.contains_pair(0, 5));
        assert!(!set.contains_pair(5, 0));
    }
}
