// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Interaction logs and identifier management.

use std::sync::Arc;

use arrow::{
    array::{Array, Float32Array, Int32Array, RecordBatch},
    datatypes::{Float32Type, Int32Type},
};
use arrow_schema::{DataType, Field, Schema};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::arrow::{checked_array, checked_column};
use crate::errors::{Result, SlimError};
use crate::sparse::{COOMatrix, COOMatrixBuilder};

mod index;
mod rc_set;
mod recs;

pub use index::IdIndex;
pub use rc_set::RowColumnSet;
pub use recs::{Recommendations, ScoredItem};

pub const USER_COL: &str = "user_idx";
pub const ITEM_COL: &str = "item_idx";
pub const RELEVANCE_COL: &str = "relevance";

/// A single (user, item, relevance) observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub user: i32,
    pub item: i32,
    pub relevance: f32,
}

impl From<(i32, i32, f32)> for Interaction {
    fn from((user, item, relevance): (i32, i32, f32)) -> Self {
        Interaction {
            user,
            item,
            relevance,
        }
    }
}

/// Columnar log of user-item interactions with dense integer indices.
///
/// Record order is significant: when a (user, item) pair repeats, matrix
/// construction keeps the later record.
#[derive(Clone, Debug)]
pub struct InteractionLog {
    coo: COOMatrix<Float32Type, Int32Type>,
}

impl InteractionLog {
    /// Create a log from user, item, and relevance columns.
    pub fn new(users: Int32Array, items: Int32Array, relevance: Float32Array) -> Result<Self> {
        let n = users.len();
        if items.len() != n || relevance.len() != n {
            return Err(SlimError::InvalidInput(format!(
                "column length mismatch: {} users, {} items, {} relevance values",
                n,
                items.len(),
                relevance.len()
            )));
        }
        let users = checked_array::<Int32Type>(USER_COL, &users)?;
        let items = checked_array::<Int32Type>(ITEM_COL, &items)?;
        let relevance = checked_array::<Float32Type>(RELEVANCE_COL, &relevance)?;
        Ok(InteractionLog {
            coo: COOMatrix {
                row: users,
                col: items,
                val: relevance,
            },
        })
    }

    /// Create a log from interaction records, preserving their order.
    pub fn from_records<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Interaction>,
    {
        let records = records.into_iter();
        let mut bld: COOMatrixBuilder<Float32Type, Int32Type> =
            COOMatrixBuilder::with_capacity(records.size_hint().0);
        for r in records {
            let r: Interaction = r.into();
            bld.add_entry(r.user, r.item, r.relevance);
        }
        InteractionLog { coo: bld.finish() }
    }

    /// Create a log from a record batch with `user_idx`, `item_idx`, and
    /// `relevance` columns.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        Ok(InteractionLog {
            coo: COOMatrix {
                row: checked_column::<Int32Type>(batch, USER_COL)?,
                col: checked_column::<Int32Type>(batch, ITEM_COL)?,
                val: checked_column::<Float32Type>(batch, RELEVANCE_COL)?,
            },
        })
    }

    pub fn empty() -> Self {
        Self::from_records(Vec::<Interaction>::new())
    }

    pub fn len(&self) -> usize {
        self.coo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coo.is_empty()
    }

    pub fn users(&self) -> &[i32] {
        self.coo.row.values()
    }

    pub fn items(&self) -> &[i32] {
        self.coo.col.values()
    }

    pub fn relevance(&self) -> &[f32] {
        self.coo.val.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = Interaction> + '_ {
        self.users()
            .iter()
            .zip(self.items())
            .zip(self.relevance())
            .map(|((u, i), r)| Interaction {
                user: *u,
                item: *i,
                relevance: *r,
            })
    }

    /// Get the distinct item indices in the log, in ascending order.
    pub fn distinct_items(&self) -> Vec<i32> {
        let mut items: Vec<i32> = self.items().to_vec();
        items.sort_unstable();
        items.dedup();
        items
    }

    /// Keep only the records of the given users.
    pub fn restrict_users(&self, users: &FxHashSet<i32>) -> InteractionLog {
        InteractionLog::from_records(self.iter().filter(|r| users.contains(&r.user)))
    }

    /// Group the item indices of each user's records, in log order.
    pub fn user_histories(&self) -> FxHashMap<i32, Vec<i32>> {
        let mut hist: FxHashMap<i32, Vec<i32>> = FxHashMap::default();
        for (u, i) in self.users().iter().zip(self.items()) {
            hist.entry(*u).or_default().push(*i);
        }
        hist
    }

    /// Get the set of (user, item) pairs observed in the log.
    pub fn seen_pairs(&self) -> RowColumnSet {
        RowColumnSet::from_pairs(self.users().iter().copied().zip(self.items().iter().copied()))
    }

    /// Convert the log to an Arrow record batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Schema::new(vec![
            Field::new(USER_COL, DataType::Int32, false),
            Field::new(ITEM_COL, DataType::Int32, false),
            Field::new(RELEVANCE_COL, DataType::Float32, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(self.coo.row.clone()),
                Arc::new(self.coo.col.clone()),
                Arc::new(self.coo.val.clone()),
            ],
        )?;
        Ok(batch)
    }
}

impl<R: Into<Interaction>> FromIterator<R> for InteractionLog {
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        InteractionLog::from_records(iter)
    }
}
