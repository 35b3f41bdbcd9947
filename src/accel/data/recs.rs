// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Scored (user, item) output.

use std::sync::Arc;

use arrow::{
    array::RecordBatch,
    datatypes::{Float32Type, Int32Type},
};
use arrow_schema::{DataType, Field, Schema};

use crate::errors::Result;
use crate::sorting::top_k;
use crate::sparse::{COOMatrix, COOMatrixBuilder};

use super::{RowColumnSet, ITEM_COL, RELEVANCE_COL, USER_COL};

/// A single scored (user, item) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    pub user: i32,
    pub item: i32,
    pub relevance: f32,
}

/// Scores for a set of (user, item) pairs.
///
/// Each user's rows are stored contiguously.  The set carries no meaningful
/// order beyond that; pairs that could not be scored are absent.
#[derive(Debug, Clone)]
pub struct Recommendations {
    coo: COOMatrix<Float32Type, Int32Type>,
}

impl Recommendations {
    pub(crate) fn from_user_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (i32, Vec<(i32, f32)>)>,
    {
        let mut bld: COOMatrixBuilder<Float32Type, Int32Type> = COOMatrixBuilder::with_capacity(0);
        for (user, items) in rows {
            for (item, score) in items {
                bld.add_entry(user, item, score);
            }
        }
        Recommendations { coo: bld.finish() }
    }

    pub fn empty() -> Self {
        Self::from_user_rows(Vec::new())
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

    pub fn scores(&self) -> &[f32] {
        self.coo.val.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = ScoredItem> + '_ {
        self.users()
            .iter()
            .zip(self.items())
            .zip(self.scores())
            .map(|((u, i), s)| ScoredItem {
                user: *u,
                item: *i,
                relevance: *s,
            })
    }

    /// Look up the score of a pair, if it was scored.
    pub fn get(&self, user: i32, item: i32) -> Option<f32> {
        self.iter()
            .find(|r| r.user == user && r.item == item)
            .map(|r| r.relevance)
    }

    /// Drop the pairs present in `seen`.
    pub fn without_pairs(&self, seen: &RowColumnSet) -> Recommendations {
        self.regroup(|user, items| {
            items
                .into_iter()
                .filter(|(i, _)| !seen.contains_pair(user, *i))
                .collect()
        })
    }

    /// Keep the `k` best items of each user, ordered by decreasing score.
    pub fn top_k(&self, k: usize) -> Recommendations {
        self.regroup(|_, items| top_k(items, k))
    }

    /// Rebuild the rows one user group at a time.
    fn regroup<F>(&self, mut f: F) -> Recommendations
    where
        F: FnMut(i32, Vec<(i32, f32)>) -> Vec<(i32, f32)>,
    {
        let mut groups: Vec<(i32, Vec<(i32, f32)>)> = Vec::new();
        for r in self.iter() {
            match groups.last_mut() {
                Some((u, items)) if *u == r.user => {
                    items.push((r.item, r.relevance));
                    continue;
                }
                _ => (),
            }
            groups.push((r.user, vec![(r.item, r.relevance)]));
        }
        Recommendations::from_user_rows(groups.into_iter().map(|(u, items)| (u, f(u, items))))
    }

    /// Convert the scores to an Arrow record batch.
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
