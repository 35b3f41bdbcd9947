// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Per-item SLIM regressions.

use log::*;
use rayon::prelude::*;

use crate::config::SlimConfig;
use crate::errors::{Result, SlimError};
use crate::parallel::{maybe_fuse, with_pool};
use crate::progress::ProgressHandle;
use crate::regression::{ElasticNet, Regressor, Selection};
use crate::sparse::{InteractionMatrix, SparseColumns};

use super::SimilarityTable;

/// Learns one row of the similarity table at a time.
#[derive(Debug, Clone)]
pub struct ItemFitter<R: Regressor = ElasticNet> {
    solver: R,
}

impl ItemFitter<ElasticNet> {
    /// Set up the non-negative elastic net for a validated configuration.
    pub fn from_config(config: &SlimConfig) -> Result<Self> {
        config.validate()?;
        let solver = ElasticNet::new(config.alpha(), config.l1_ratio())
            .with_positive(true)
            .with_max_iter(config.max_iter)
            .with_tol(config.tol)
            .with_selection(Selection::Random)
            .with_seed(config.seed);
        Ok(ItemFitter { solver })
    }
}

impl<R: Regressor> ItemFitter<R> {
    pub fn new(solver: R) -> Self {
        ItemFitter { solver }
    }

    pub fn solver(&self) -> &R {
        &self.solver
    }

    /// Regress item `idx` on every other item column.
    ///
    /// Returns the positive coefficients as `(item_id_two, similarity)`
    /// in ascending item order.
    pub fn fit_item(&self, matrix: &InteractionMatrix, idx: usize) -> Vec<(i32, f32)> {
        let y = matrix.dense_column(idx);
        let predictors = matrix.mask_column(idx);
        let fit = self.solver.fit(&predictors, y.view());

        fit.coefficients
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != idx)
            .map(|(j, w)| (j as i32, *w as f32))
            // narrowing can flush tiny weights to zero
            .filter(|(_, w)| *w > 0.0)
            .collect()
    }
}

/// Fit the similarity rows of `items` in parallel and assemble the table.
///
/// Items may be given in any order; repeats are fitted once.  Rows are
/// merged only after every fit has finished.
pub fn train_similarities<R: Regressor>(
    fitter: &ItemFitter<R>,
    matrix: &InteractionMatrix,
    items: &[i32],
    threads: Option<usize>,
) -> Result<SimilarityTable> {
    let (nu, ni) = matrix.shape();
    if let Some(bad) = items.iter().find(|i| **i < 0 || **i as usize >= ni) {
        return Err(SlimError::IndexOutOfRange {
            kind: "item",
            index: *bad as i64,
            bound: ni,
        });
    }
    // the table groups rows by ascending source item
    let mut items = items.to_vec();
    items.sort_unstable();
    items.dedup();
    debug!(
        "fitting {} SLIM rows over a {}x{} matrix ({} cells)",
        items.len(),
        nu,
        ni,
        matrix.nnz()
    );

    let pb = ProgressHandle::new("SLIM items", items.len());
    let rows: Vec<(i32, Vec<(i32, f32)>)> = with_pool(threads, || {
        maybe_fuse(items.par_iter().map(|item| {
            let row = fitter.fit_item(matrix, *item as usize);
            pb.tick();
            (*item, row)
        }))
        .collect()
    })?;
    pb.finish();

    let table = SimilarityTable::from_item_rows(matrix.n_cols(), rows);
    info!(
        "learned {} similarities for {} items",
        table.len(),
        items.len()
    );
    Ok(table)
}
