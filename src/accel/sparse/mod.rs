// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Sparse matrix support.

mod coo;
mod csc;

pub use coo::{COOMatrix, COOMatrixBuilder};
pub use csc::{InteractionMatrix, MaskedColumns};

/// Column-wise read access to a sparse matrix.
pub trait SparseColumns {
    /// Get the number of rows.
    fn n_rows(&self) -> usize;

    /// Get the number of columns.
    fn n_cols(&self) -> usize;

    /// Get the row indices and values of a column, with rows ascending.
    fn column(&self, col: usize) -> (&[u32], &[f32]);

    /// Get the squared Euclidean norm of a column.
    fn column_norm_sq(&self, col: usize) -> f64 {
        let (_, vals) = self.column(col);
        vals.iter().map(|v| (*v as f64) * (*v as f64)).sum()
    }
}
