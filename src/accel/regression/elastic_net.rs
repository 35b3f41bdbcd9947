// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Elastic-net regression by coordinate descent.

use log::*;
use ndarray::{Array1, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::sparse::SparseColumns;

use super::{RegressionFit, Regressor};

/// Order in which coordinates are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Cyclic,
    /// Draw a random coordinate for each update.
    Random,
}

/// Elastic-net linear regression without an intercept.
///
/// Minimizes
///
/// ```text
/// 1/(2n) ‖y − Xw‖² + α·ρ·‖w‖₁ + ½·α·(1 − ρ)·‖w‖²
/// ```
///
/// with `α = alpha` and `ρ = l1_ratio`, optionally constrained to `w ≥ 0`.
/// Convergence is declared when the relative coefficient change drops below
/// `tol` and the duality gap is below `tol·‖y‖²`.
#[derive(Debug, Clone)]
pub struct ElasticNet {
    alpha: f64,
    l1_ratio: f64,
    positive: bool,
    max_iter: usize,
    tol: f64,
    selection: Selection,
    seed: Option<u64>,
}

impl ElasticNet {
    pub fn new(alpha: f64, l1_ratio: f64) -> Self {
        ElasticNet {
            alpha,
            l1_ratio: l1_ratio.clamp(0.0, 1.0),
            positive: false,
            max_iter: 1000,
            tol: 1e-4,
            selection: Selection::Cyclic,
            seed: None,
        }
    }

    pub fn with_positive(mut self, positive: bool) -> Self {
        self.positive = positive;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Seed the random coordinate order.  Every fit restarts from this seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn l1_ratio(&self) -> f64 {
        self.l1_ratio
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    fn rng(&self) -> Pcg64 {
        match self.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::seed_from_u64(rand::random()),
        }
    }
}

impl Regressor for ElasticNet {
    fn fit<X: SparseColumns + ?Sized>(&self, x: &X, y: ArrayView1<'_, f32>) -> RegressionFit {
        let n_samples = x.n_rows();
        let n_features = x.n_cols();
        assert_eq!(y.len(), n_samples, "target length must match row count");

        let mut w = vec![0.0f64; n_features];
        let y: Vec<f64> = y.iter().map(|v| *v as f64).collect();
        let y_norm2: f64 = y.iter().map(|v| v * v).sum();

        if y_norm2 == 0.0 || n_features == 0 {
            return RegressionFit {
                coefficients: Array1::from(w),
                iterations: 0,
                converged: true,
            };
        }

        let norms: Vec<f64> = (0..n_features).map(|j| x.column_norm_sq(j)).collect();
        let l1_pen = self.alpha * self.l1_ratio * n_samples as f64;
        let l2_pen = self.alpha * (1.0 - self.l1_ratio) * n_samples as f64;
        let gap_tol = self.tol * y_norm2;

        // residual y - Xw, starting from w = 0
        let mut resid = y.clone();
        let mut rng = self.rng();
        let mut converged = false;
        let mut iterations = 0;
        let mut gap = f64::INFINITY;

        for iter in 0..self.max_iter {
            iterations = iter + 1;
            let mut w_max = 0.0f64;
            let mut d_w_max = 0.0f64;

            for f in 0..n_features {
                let j = match self.selection {
                    Selection::Cyclic => f,
                    Selection::Random => rng.random_range(0..n_features),
                };
                if norms[j] == 0.0 {
                    continue;
                }

                let (rows, vals) = x.column(j);
                let w_old = w[j];
                if w_old != 0.0 {
                    axpy(&mut resid, rows, vals, w_old);
                }

                let tmp = sparse_dot(rows, vals, &resid);
                let w_new = if self.positive && tmp < 0.0 {
                    0.0
                } else {
                    tmp.signum() * (tmp.abs() - l1_pen).max(0.0) / (norms[j] + l2_pen)
                };
                w[j] = w_new;

                if w_new != 0.0 {
                    axpy(&mut resid, rows, vals, -w_new);
                }

                d_w_max = d_w_max.max((w_new - w_old).abs());
                w_max = w_max.max(w_new.abs());
            }

            if w_max == 0.0 || d_w_max / w_max < self.tol || iter + 1 == self.max_iter {
                gap = duality_gap(x, &w, &resid, &y, l1_pen, l2_pen, self.positive);
                if gap < gap_tol {
                    converged = true;
                    break;
                }
            }
        }

        if !converged {
            warn!(
                "elastic net did not converge in {} iterations (duality gap {:.3e}, tolerance {:.3e})",
                iterations, gap, gap_tol
            );
        }

        RegressionFit {
            coefficients: Array1::from(w),
            iterations,
            converged,
        }
    }
}

fn sparse_dot(rows: &[u32], vals: &[f32], dense: &[f64]) -> f64 {
    rows.iter()
        .zip(vals)
        .map(|(r, v)| *v as f64 * dense[*r as usize])
        .sum()
}

/// Add `scale` times a sparse column to a dense vector.
fn axpy(dense: &mut [f64], rows: &[u32], vals: &[f32], scale: f64) {
    for (r, v) in rows.iter().zip(vals) {
        dense[*r as usize] += scale * *v as f64;
    }
}

fn duality_gap<X: SparseColumns + ?Sized>(
    x: &X,
    w: &[f64],
    resid: &[f64],
    y: &[f64],
    l1_pen: f64,
    l2_pen: f64,
    positive: bool,
) -> f64 {
    let mut dual_norm = if positive { f64::NEG_INFINITY } else { 0.0 };
    for (j, wj) in w.iter().enumerate() {
        let (rows, vals) = x.column(j);
        let xta = sparse_dot(rows, vals, resid) - l2_pen * wj;
        dual_norm = if positive {
            dual_norm.max(xta)
        } else {
            dual_norm.max(xta.abs())
        };
    }

    let r_norm2: f64 = resid.iter().map(|r| r * r).sum();
    let w_norm2: f64 = w.iter().map(|v| v * v).sum();
    let l1_norm: f64 = w.iter().map(|v| v.abs()).sum();

    let (scale, mut gap) = if dual_norm > l1_pen {
        let scale = l1_pen / dual_norm;
        let a_norm2 = r_norm2 * scale * scale;
        (scale, 0.5 * (r_norm2 + a_norm2))
    } else {
        (1.0, r_norm2)
    };

    let r_dot_y: f64 = resid.iter().zip(y).map(|(r, y)| r * y).sum();
    gap += l1_pen * l1_norm - scale * r_dot_y + 0.5 * l2_pen * (1.0 + scale * scale) * w_norm2;
    gap
}

#[cfg(test)]
mod tests {
    use ndarray::Array1;

    use crate::data::InteractionLog;
    use crate::sparse::InteractionMatrix;

    use super::*;

    fn matrix(records: &[(i32, i32, f32)], n: usize, m: usize) -> InteractionMatrix {
        let log = InteractionLog::from_records(records.iter().copied());
        InteractionMatrix::from_log(&log, n, m).expect("matrix")
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn orthogonal_design_closed_form() {
        // two disjoint columns: each coefficient has a closed-form solution
        let x = matrix(&[(0, 0, 1.0), (1, 0, 1.0), (2, 1, 1.0), (3, 1, 1.0)], 4, 2);
        let y = Array1::from(vec![2.0f32, 2.0, 1.0, 1.0]);
        let enet = ElasticNet::new(0.1, 0.5);
        let fit = enet.fit(&x, y.view());

        // l1 and l2 penalties are both 0.1 * 0.5 * 4 = 0.2
        assert!(fit.converged);
        assert!(close(fit.coefficients[0], 3.8 / 2.2));
        assert!(close(fit.coefficients[1], 1.8 / 2.2));
    }

    #[test]
    fn positive_clamps_negative_correlation() {
        let x = matrix(&[(0, 0, 1.0), (1, 1, 1.0)], 2, 2);
        let y = Array1::from(vec![-1.0f32, 1.0]);

        let free = ElasticNet::new(0.1, 1.0).fit(&x, y.view());
        assert!(free.coefficients[0] < 0.0);

        let pos = ElasticNet::new(0.1, 1.0).with_positive(true).fit(&x, y.view());
        assert_eq!(pos.coefficients[0], 0.0);
        assert!(close(pos.coefficients[1], 1.0 - 0.2));
    }

    #[test]
    fn zero_target_short_circuits() {
        let x = matrix(&[(0, 0, 1.0), (1, 1, 1.0)], 2, 2);
        let y = Array1::zeros(2);
        let fit = ElasticNet::new(1.0, 0.5).fit(&x, y.view());
        assert!(fit.converged);
        assert_eq!(fit.iterations, 0);
        assert!(fit.coefficients.iter().all(|w| *w == 0.0));
    }

    #[test]
    fn masked_column_gets_no_weight() {
        let x = matrix(&[(0, 0, 1.0), (0, 1, 1.0), (1, 1, 1.0)], 2, 2);
        let y = x.dense_column(0);
        let fit = ElasticNet::new(0.01, 0.5)
            .with_positive(true)
            .fit(&x.mask_column(0), y.view());
        assert_eq!(fit.coefficients[0], 0.0);
        assert!(fit.coefficients[1] > 0.0);
    }

    #[test]
    fn budget_exhaustion_returns_iterate() {
        let x = matrix(
            &[
                (0, 0, 1.0),
                (1, 0, 1.0),
                (2, 0, 1.0),
                (1, 1, 1.0),
                (2, 1, 1.0),
                (3, 1, 1.0),
            ],
            4,
            2,
        );
        let y = Array1::from(vec![1.0f32, 2.0, 2.0, 1.0]);
        let fit = ElasticNet::new(0.01, 0.5)
            .with_positive(true)
            .with_max_iter(1)
            .fit(&x, y.view());
        assert!(!fit.converged);
        assert_eq!(fit.iterations, 1);
        assert!(fit.coefficients.iter().all(|w| *w > 0.0));

        let full = ElasticNet::new(0.01, 0.5)
            .with_positive(true)
            .with_max_iter(5000)
            .fit(&x, y.view());
        assert!(full.converged);
        assert!((full.coefficients[0] - full.coefficients[1]).abs() < 1e-3);
    }

    #[test]
    fn seeded_random_order_is_repeatable() {
        let x = matrix(
            &[
                (0, 0, 1.0),
                (1, 0, 1.0),
                (1, 1, 1.0),
                (2, 1, 1.0),
                (2, 2, 1.0),
                (0, 2, 0.5),
            ],
            3,
            3,
        );
        let y = Array1::from(vec![1.0f32, 1.0, 0.5]);
        let enet = ElasticNet::new(0.02, 0.5)
            .with_positive(true)
            .with_selection(Selection::Random)
            .with_seed(Some(7));
        let a = enet.fit(&x, y.view());
        let b = enet.fit(&x, y.view());
        assert_eq!(a.coefficients, b.coefficients);
        assert_eq!(a.iterations, b.iterations);
    }
}
