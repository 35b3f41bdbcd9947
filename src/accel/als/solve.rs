// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("dimension mismatch: {rows}x{cols} system with {rhs} right-hand values")]
    DimensionMismatch { rows: usize, cols: usize, rhs: usize },
    #[error("array is not positive definite")]
    NotPositive,
}

/// Solve `A x = b` for a symmetric positive-definite `A` by Cholesky
/// factorization.
pub fn cholesky_solve(matrix: &Array2<f32>, vector: &Array1<f32>) -> Result<Array1<f32>, SolveError> {
    let (rows, cols) = matrix.dim();
    if rows != cols || vector.len() != rows {
        return Err(SolveError::DimensionMismatch {
            rows,
            cols,
            rhs: vector.len(),
        });
    }

    let a = DMatrix::from_row_iterator(rows, cols, matrix.iter().copied());
    let b = DVector::from_iterator(rows, vector.iter().copied());
    let chol = a.cholesky().ok_or(SolveError::NotPositive)?;
    let soln = chol.solve(&b);
    Ok(soln.iter().copied().collect())
}
