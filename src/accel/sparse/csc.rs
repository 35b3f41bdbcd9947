// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Compressed sparse column interaction matrices.

use log::*;
use ndarray::Array1;

use crate::data::InteractionLog;
use crate::errors::{Result, SlimError};

use super::SparseColumns;

/// A users × items matrix of relevance values in compressed sparse column form.
///
/// The matrix is immutable once built; per-item fits exclude a column through
/// [MaskedColumns] instead of writing to it.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionMatrix {
    n_rows: usize,
    n_cols: usize,
    col_ptrs: Vec<usize>,
    row_inds: Vec<u32>,
    values: Vec<f32>,
}

impl InteractionMatrix {
    /// Build the matrix from an interaction log with known dimensions.
    ///
    /// When a (user, item) pair appears more than once, the record that comes
    /// later in the log determines the cell value.
    pub fn from_log(log: &InteractionLog, n_users: usize, n_items: usize) -> Result<Self> {
        let users = log.users();
        let items = log.items();
        let vals = log.relevance();

        for (u, i) in users.iter().zip(items) {
            check_index("user", *u, n_users)?;
            check_index("item", *i, n_items)?;
        }

        debug!(
            "building {}x{} interaction matrix from {} records",
            n_users,
            n_items,
            log.len()
        );

        // sort by (column, row); the position breaks ties so later records sort last
        let mut order: Vec<usize> = (0..log.len()).collect();
        order.sort_unstable_by_key(|k| (items[*k], users[*k], *k));

        let mut counts = vec![0usize; n_items];
        let mut cells: Vec<(usize, u32)> = Vec::with_capacity(order.len());
        let mut values: Vec<f32> = Vec::with_capacity(order.len());
        for k in order {
            let cell = (items[k] as usize, users[k] as u32);
            if cells.last() == Some(&cell) {
                // duplicate cell: the later record wins
                if let Some(v) = values.last_mut() {
                    *v = vals[k];
                }
            } else {
                counts[cell.0] += 1;
                cells.push(cell);
                values.push(vals[k]);
            }
        }

        let mut col_ptrs = Vec::with_capacity(n_items + 1);
        col_ptrs.push(0);
        for i in 0..n_items {
            col_ptrs.push(col_ptrs[i] + counts[i]);
        }

        let dups = log.len() - cells.len();
        if dups > 0 {
            debug!("resolved {} duplicate cells (last record wins)", dups);
        }

        Ok(InteractionMatrix {
            n_rows: n_users,
            n_cols: n_items,
            col_ptrs,
            row_inds: cells.into_iter().map(|(_, r)| r).collect(),
            values,
        })
    }

    /// Get the (rows, columns) shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Get the number of stored cells.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Get the extent in the underlying arrays for a column.
    pub fn extent(&self, col: usize) -> (usize, usize) {
        (self.col_ptrs[col], self.col_ptrs[col + 1])
    }

    /// Look up a single cell, returning 0 for unstored cells.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        let (rows, vals) = self.column(col);
        match rows.binary_search(&(row as u32)) {
            Ok(pos) => vals[pos],
            Err(_) => 0.0,
        }
    }

    /// Materialize a column as a dense vector over all rows.
    pub fn dense_column(&self, col: usize) -> Array1<f32> {
        let mut out = Array1::zeros(self.n_rows);
        let (rows, vals) = self.column(col);
        for (r, v) in rows.iter().zip(vals) {
            out[*r as usize] = *v;
        }
        out
    }

    /// View the matrix with one column treated as all-zero.
    pub fn mask_column(&self, col: usize) -> MaskedColumns<'_> {
        MaskedColumns {
            matrix: self,
            masked: col,
        }
    }

    /// Compute the transposed (items × users) matrix.
    pub fn transpose(&self) -> InteractionMatrix {
        let mut counts = vec![0usize; self.n_rows];
        for r in &self.row_inds {
            counts[*r as usize] += 1;
        }
        let mut col_ptrs = Vec::with_capacity(self.n_rows + 1);
        col_ptrs.push(0);
        for r in 0..self.n_rows {
            col_ptrs.push(col_ptrs[r] + counts[r]);
        }

        let mut fill = col_ptrs.clone();
        let mut row_inds = vec![0u32; self.nnz()];
        let mut values = vec![0.0f32; self.nnz()];
        // scanning columns in order keeps the output rows sorted
        for c in 0..self.n_cols {
            let (rows, vals) = self.column(c);
            for (r, v) in rows.iter().zip(vals) {
                let pos = fill[*r as usize];
                row_inds[pos] = c as u32;
                values[pos] = *v;
                fill[*r as usize] += 1;
            }
        }

        InteractionMatrix {
            n_rows: self.n_cols,
            n_cols: self.n_rows,
            col_ptrs,
            row_inds,
            values,
        }
    }
}

impl SparseColumns for InteractionMatrix {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_cols(&self) -> usize {
        self.n_cols
    }

    fn column(&self, col: usize) -> (&[u32], &[f32]) {
        let (start, end) = self.extent(col);
        (&self.row_inds[start..end], &self.values[start..end])
    }
}

/// Read-only view of an [InteractionMatrix] with one column excluded.
///
/// This is how a target item is removed from its own predictors without
/// touching the shared matrix.
#[derive(Clone, Copy)]
pub struct MaskedColumns<'a> {
    matrix: &'a InteractionMatrix,
    masked: usize,
}

impl SparseColumns for MaskedColumns<'_> {
    fn n_rows(&self) -> usize {
        self.matrix.n_rows
    }

    fn n_cols(&self) -> usize {
        self.matrix.n_cols
    }

    fn column(&self, col: usize) -> (&[u32], &[f32]) {
        if col == self.masked {
            (&[], &[])
        } else {
            self.matrix.column(col)
        }
    }
}

fn check_index(kind: &'static str, index: i32, bound: usize) -> Result<()> {
    if index < 0 || index as usize >= bound {
        Err(SlimError::IndexOutOfRange {
            kind,
            index: index as i64,
            bound,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(records: &[(i32, i32, f32)]) -> InteractionLog {
        InteractionLog::from_records(records.iter().copied())
    }

    #[test]
    fn builds_columns() {
        let m = InteractionMatrix::from_log(&log(&[(1, 0, 2.0), (0, 0, 1.0), (1, 2, 3.0)]), 2, 3)
            .expect("matrix");
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.column(0), (&[0u32, 1][..], &[1.0f32, 2.0][..]));
        assert_eq!(m.column(1).0.len(), 0);
        assert_eq!(m.get(1, 2), 3.0);
        assert_eq!(m.get(0, 2), 0.0);
    }

    #[test]
    fn duplicate_cell_keeps_later_record() {
        let m = InteractionMatrix::from_log(&log(&[(0, 1, 5.0), (1, 1, 1.0), (0, 1, 2.0)]), 2, 2)
            .expect("matrix");
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.get(0, 1), 2.0);

        let m = InteractionMatrix::from_log(&log(&[(0, 1, 2.0), (0, 1, 5.0)]), 1, 2)
            .expect("matrix");
        assert_eq!(m.get(0, 1), 5.0);
    }

    #[test]
    fn out_of_range_item() {
        let err = InteractionMatrix::from_log(&log(&[(0, 0, 1.0), (0, 2, 1.0)]), 1, 2).unwrap_err();
        match err {
            SlimError::IndexOutOfRange { kind, index, bound } => {
                assert_eq!(kind, "item");
                assert_eq!(index, 2);
                assert_eq!(bound, 2);
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn negative_user() {
        let err = InteractionMatrix::from_log(&log(&[(-1, 0, 1.0)]), 1, 1).unwrap_err();
        assert!(matches!(err, SlimError::IndexOutOfRange { kind: "user", .. }));
    }

    #[test]
    fn dense_column_and_mask() {
        let m = InteractionMatrix::from_log(&log(&[(0, 0, 1.0), (2, 0, 4.0), (1, 1, 1.0)]), 3, 2)
            .expect("matrix");
        assert_eq!(m.dense_column(0).to_vec(), vec![1.0, 0.0, 4.0]);

        let masked = m.mask_column(0);
        assert!(masked.column(0).0.is_empty());
        assert_eq!(masked.column(1), m.column(1));
        assert_eq!(masked.column_norm_sq(0), 0.0);
        assert_eq!(m.column_norm_sq(0), 17.0);
        // the underlying matrix is untouched
        assert_eq!(m.dense_column(0).to_vec(), vec![1.0, 0.0, 4.0]);
    }

    #[test]
    fn transpose_swaps_axes() {
        let m = InteractionMatrix::from_log(&log(&[(0, 1, 1.0), (1, 0, 2.0), (1, 1, 3.0)]), 2, 2)
            .expect("matrix");
        let t = m.transpose();
        assert_eq!(t.shape(), (2, 2));
        assert_eq!(t.column(1), (&[0u32, 1][..], &[2.0f32, 3.0][..]));
        assert_eq!(t.get(1, 0), 1.0);
        assert_eq!(t.transpose(), m);
    }
}
