// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Aggregated item-item similarity tables.

use std::io::{BufRead, Write};
use std::sync::Arc;

use arrow::{
    array::RecordBatch,
    datatypes::{Float32Type, Int32Type},
};
use arrow_schema::{DataType, Field, Schema};
use log::*;
use serde::{Deserialize, Serialize};

use crate::arrow::checked_column;
use crate::errors::{Result, SlimError};
use crate::sparse::{COOMatrix, COOMatrixBuilder};

pub const ITEM_ONE_COL: &str = "item_id_one";
pub const ITEM_TWO_COL: &str = "item_id_two";
pub const SIMILARITY_COL: &str = "similarity";

/// One learned weight: how much `item_id_one` contributes to `item_id_two`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    pub item_id_one: i32,
    pub item_id_two: i32,
    pub similarity: f32,
}

/// The learned item × item weights.
///
/// Rows are grouped by `item_id_one` in ascending order, and ascend by
/// `item_id_two` within a group.  Every stored similarity is strictly
/// positive and no item is linked to itself.
#[derive(Debug, Clone)]
pub struct SimilarityTable {
    n_items: usize,
    item_ptrs: Vec<usize>,
    coo: COOMatrix<Float32Type, Int32Type>,
}

impl SimilarityTable {
    /// Assemble a table from per-item rows produced by the fitter.
    ///
    /// Each row's neighbors must ascend; the rows themselves may come in any
    /// order but each source item may appear only once.
    pub(crate) fn from_item_rows(n_items: usize, mut rows: Vec<(i32, Vec<(i32, f32)>)>) -> Self {
        rows.sort_unstable_by_key(|(item, _)| *item);
        let nnz = rows.iter().map(|(_, r)| r.len()).sum();
        let mut bld: COOMatrixBuilder<Float32Type, Int32Type> =
            COOMatrixBuilder::with_capacity(nnz);
        let mut counts = vec![0usize; n_items];
        for (item, nbrs) in rows {
            counts[item as usize] += nbrs.len();
            for (other, sim) in nbrs {
                debug_assert!(other != item && sim > 0.0);
                bld.add_entry(item, other, sim);
            }
        }

        SimilarityTable {
            n_items,
            item_ptrs: offsets(&counts),
            coo: bld.finish(),
        }
    }

    /// Rebuild a table from previously exported rows, checking its invariants.
    pub fn from_rows<I>(n_items: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = SimilarityRow>,
    {
        let mut rows: Vec<SimilarityRow> = rows.into_iter().collect();
        for row in &rows {
            for (name, id) in [(ITEM_ONE_COL, row.item_id_one), (ITEM_TWO_COL, row.item_id_two)] {
                if id < 0 || id as usize >= n_items {
                    return Err(SlimError::IndexOutOfRange {
                        kind: name,
                        index: id as i64,
                        bound: n_items,
                    });
                }
            }
            if row.item_id_one == row.item_id_two {
                return Err(SlimError::InvalidInput(format!(
                    "item {} is linked to itself",
                    row.item_id_one
                )));
            }
            if !(row.similarity.is_finite() && row.similarity > 0.0) {
                return Err(SlimError::InvalidInput(format!(
                    "similarity {} for ({}, {}) is not positive",
                    row.similarity, row.item_id_one, row.item_id_two
                )));
            }
        }

        rows.sort_unstable_by_key(|r| (r.item_id_one, r.item_id_two));
        if let Some(w) = rows
            .windows(2)
            .find(|w| (w[0].item_id_one, w[0].item_id_two) == (w[1].item_id_one, w[1].item_id_two))
        {
            return Err(SlimError::InvalidInput(format!(
                "duplicate similarity for ({}, {})",
                w[0].item_id_one, w[0].item_id_two
            )));
        }

        let mut counts = vec![0usize; n_items];
        let mut bld: COOMatrixBuilder<Float32Type, Int32Type> =
            COOMatrixBuilder::with_capacity(rows.len());
        for row in rows {
            counts[row.item_id_one as usize] += 1;
            bld.add_entry(row.item_id_one, row.item_id_two, row.similarity);
        }

        Ok(SimilarityTable {
            n_items,
            item_ptrs: offsets(&counts),
            coo: bld.finish(),
        })
    }

    /// Load a table from an Arrow record batch in the export layout.
    pub fn from_record_batch(n_items: usize, batch: &RecordBatch) -> Result<Self> {
        let ones = checked_column::<Int32Type>(batch, ITEM_ONE_COL)?;
        let twos = checked_column::<Int32Type>(batch, ITEM_TWO_COL)?;
        let sims = checked_column::<Float32Type>(batch, SIMILARITY_COL)?;
        let rows = ones
            .values()
            .iter()
            .zip(twos.values().iter())
            .zip(sims.values().iter())
            .map(|((a, b), s)| SimilarityRow {
                item_id_one: *a,
                item_id_two: *b,
                similarity: *s,
            });
        Self::from_rows(n_items, rows)
    }

    /// Get the number of stored rows.
    pub fn len(&self) -> usize {
        self.coo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coo.is_empty()
    }

    /// Get the size of the item space the table was trained over.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Get the neighbors of an item and their similarities.
    ///
    /// Unknown items have no neighbors.
    pub fn neighbors(&self, item: i32) -> (&[i32], &[f32]) {
        if item < 0 || item as usize >= self.n_items {
            return (&[], &[]);
        }
        let start = self.item_ptrs[item as usize];
        let end = self.item_ptrs[item as usize + 1];
        (
            &self.coo.col.values()[start..end],
            &self.coo.val.values()[start..end],
        )
    }

    pub fn rows(&self) -> impl Iterator<Item = SimilarityRow> + '_ {
        self.coo
            .row
            .values()
            .iter()
            .zip(self.coo.col.values().iter())
            .zip(self.coo.val.values().iter())
            .map(|((a, b), s)| SimilarityRow {
                item_id_one: *a,
                item_id_two: *b,
                similarity: *s,
            })
    }

    /// Get the smallest stored similarity, if the table has any rows.
    pub fn min_similarity(&self) -> Option<f32> {
        self.coo.val.values().iter().copied().reduce(f32::min)
    }

    /// Export the table as an Arrow record batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Schema::new(vec![
            Field::new(ITEM_ONE_COL, DataType::Int32, false),
            Field::new(ITEM_TWO_COL, DataType::Int32, false),
            Field::new(SIMILARITY_COL, DataType::Float32, false),
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

    /// Write the rows as JSON lines.
    pub fn write_json<W: Write>(&self, mut out: W) -> Result<()> {
        for row in self.rows() {
            serde_json::to_writer(&mut out, &row)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        debug!("wrote {} similarity rows", self.len());
        Ok(())
    }

    /// Read a table written by [SimilarityTable::write_json].
    pub fn read_json<R: BufRead>(n_items: usize, input: R) -> Result<Self> {
        let mut rows = Vec::new();
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(serde_json::from_str::<SimilarityRow>(&line)?);
        }
        debug!("read {} similarity rows", rows.len());
        Self::from_rows(n_items, rows)
    }
}

fn offsets(counts: &[usize]) -> Vec<usize> {
    let mut ptrs = Vec::with_capacity(counts.len() + 1);
    ptrs.push(0);
    for c in counts {
        let last = ptrs[ptrs.len() - 1];
        ptrs.push(last + c);
    }
    ptrs
}
