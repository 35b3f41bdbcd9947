// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Regularized linear regression solvers.

use ndarray::{Array1, ArrayView1};

use crate::sparse::SparseColumns;

mod elastic_net;

pub use elastic_net::{ElasticNet, Selection};

/// Result of a regression fit.
#[derive(Debug, Clone)]
pub struct RegressionFit {
    /// Learned coefficients, one per column of the design matrix.
    pub coefficients: Array1<f64>,
    /// Number of passes over the coordinates.
    pub iterations: usize,
    /// Whether the convergence criterion was met within the iteration budget.
    pub converged: bool,
}

/// A regression solver over sparse column designs.
pub trait Regressor: Sync {
    /// Fit coefficients so that `x · coefficients` approximates `y`.
    ///
    /// Solvers that run out of iterations return their last iterate with
    /// `converged` unset instead of failing.
    fn fit<X: SparseColumns + ?Sized>(&self, x: &X, y: ArrayView1<'_, f32>) -> RegressionFit;
}
