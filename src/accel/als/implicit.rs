// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use ndarray::{Array1, Array2, ArrayViewMut1, Axis};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;

use log::*;

use crate::{
    config::AlsConfig,
    errors::Result,
    progress::ProgressHandle,
    sparse::{InteractionMatrix, SparseColumns},
};

use super::{solve::cholesky_solve, MatrixFactorization};

/// Implicit-feedback ALS (Hu, Koren, and Volinsky 2008).
///
/// Observed relevance `r` becomes a confidence of `1 + weight·r` on a
/// preference of 1; unobserved cells have confidence 1 and preference 0.
#[derive(Debug, Clone)]
pub struct ImplicitAls {
    config: AlsConfig,
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
}

impl ImplicitAls {
    pub fn new(config: AlsConfig) -> Result<Self> {
        config.validate()?;
        Ok(ImplicitAls {
            user_factors: Array2::zeros((0, config.rank)),
            item_factors: Array2::zeros((0, config.rank)),
            config,
        })
    }

    pub fn config(&self) -> &AlsConfig {
        &self.config
    }

    pub fn user_factors(&self) -> &Array2<f32> {
        &self.user_factors
    }

    pub fn item_factors(&self) -> &Array2<f32> {
        &self.item_factors
    }

    fn init_factors(&self, rng: &mut Pcg64, n: usize) -> Array2<f32> {
        let scale = 1.0 / self.config.rank as f32;
        Array2::from_shape_simple_fn((n, self.config.rank), || rng.random::<f32>() * scale)
    }
}

impl MatrixFactorization for ImplicitAls {
    fn fit(&mut self, matrix: &InteractionMatrix) -> Result<()> {
        let (nu, ni) = matrix.shape();
        let mut rng = match self.config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::seed_from_u64(rand::random()),
        };
        // columns of the transpose are users
        let by_user = matrix.transpose();

        self.user_factors = self.init_factors(&mut rng, nu);
        self.item_factors = self.init_factors(&mut rng, ni);

        for epoch in 0..self.config.epochs {
            let du = train_half(
                &by_user,
                &mut self.user_factors,
                &self.item_factors,
                &self.config,
            )?;
            let di = train_half(
                matrix,
                &mut self.item_factors,
                &self.user_factors,
                &self.config,
            )?;
            info!(
                "ALS epoch {}/{}: user delta {:.4e}, item delta {:.4e}",
                epoch + 1,
                self.config.epochs,
                du,
                di
            );
        }
        Ok(())
    }

    fn n_users(&self) -> usize {
        self.user_factors.nrows()
    }

    fn n_items(&self) -> usize {
        self.item_factors.nrows()
    }

    fn score(&self, user: usize, item: usize) -> f32 {
        self.user_factors.row(user).dot(&self.item_factors.row(item))
    }
}

/// Re-solve every row of `this` against the fixed `other` factors.
///
/// Column `i` of `matrix` holds the observations for row `i` of `this`.
/// Returns the Frobenius norm of the change.
fn train_half(
    matrix: &InteractionMatrix,
    this: &mut Array2<f32>,
    other: &Array2<f32>,
    config: &AlsConfig,
) -> Result<f32> {
    let rank = other.ncols();
    let otor = other.t().dot(other) + Array2::<f32>::eye(rank) * config.regularization;

    debug!(
        "beginning implicit ALS training half with {} rows",
        this.nrows()
    );
    let pb = ProgressHandle::new("ALS rows", this.nrows());
    let deltas: Vec<f32> = this
        .outer_iter_mut()
        .into_par_iter()
        .enumerate()
        .map(|(i, row)| {
            let f = train_row_solve(matrix, i, row, other, &otor, config.weight);
            pb.tick();
            f
        })
        .collect::<Result<Vec<f32>>>()?;
    pb.finish();

    Ok(deltas.iter().sum::<f32>().sqrt())
}

fn train_row_solve(
    matrix: &InteractionMatrix,
    row_num: usize,
    mut row_data: ArrayViewMut1<'_, f32>,
    other: &Array2<f32>,
    otor: &Array2<f32>,
    weight: f32,
) -> Result<f32> {
    let (rows, vals) = matrix.column(row_num);

    if rows.is_empty() {
        let old = row_data.dot(&row_data);
        row_data.fill(0.0);
        return Ok(old);
    }

    let picked: Vec<usize> = rows.iter().map(|r| *r as usize).collect();
    let conf: Array1<f32> = vals.iter().map(|v| *v * weight).collect();

    let o_picked = other.select(Axis(0), &picked);
    let mt = o_picked.t();
    let mtl = &mt * &conf;
    let mtm = mtl.dot(&o_picked);

    let a = otor + &mtm;
    let y = mt.dot(&(conf + 1.0));

    let soln = cholesky_solve(&a, &y)?;

    let deltas = &soln - &row_data;
    row_data.assign(&soln);

    Ok(deltas.dot(&deltas))
}
