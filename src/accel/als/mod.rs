// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Alternating least squares matrix factorization, with a recommender that
//! works on raw string identifiers.

use log::*;
use rayon::prelude::*;

use crate::config::AlsConfig;
use crate::data::{IdIndex, InteractionLog, RowColumnSet};
use crate::errors::Result;
use crate::sorting::top_k;
use crate::sparse::InteractionMatrix;

mod implicit;
mod solve;

pub use implicit::ImplicitAls;
pub use solve::{cholesky_solve, SolveError};

/// Context tag attached to recommendations that carry no context.
pub const DEFAULT_CONTEXT: &str = "no_context";

/// A model that learns latent factors from an interaction matrix.
pub trait MatrixFactorization: Send + Sync {
    /// Learn factors from a users × items matrix.
    fn fit(&mut self, matrix: &InteractionMatrix) -> Result<()>;

    fn n_users(&self) -> usize;

    fn n_items(&self) -> usize;

    /// Score one (user, item) pair by dense index.
    fn score(&self, user: usize, item: usize) -> f32;
}

/// One recommended item for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub user_id: String,
    pub item_id: String,
    pub relevance: f32,
    pub context: String,
}

/// Recommender over raw identifiers backed by a factorization model.
pub struct AlsRecommender<M: MatrixFactorization = ImplicitAls> {
    model: M,
    users: IdIndex,
    items: IdIndex,
    seen: RowColumnSet,
}

impl AlsRecommender<ImplicitAls> {
    pub fn new(config: AlsConfig) -> Result<Self> {
        Ok(Self::with_model(ImplicitAls::new(config)?))
    }
}

impl<M: MatrixFactorization> AlsRecommender<M> {
    pub fn with_model(model: M) -> Self {
        AlsRecommender {
            model,
            users: IdIndex::empty(),
            items: IdIndex::empty(),
            seen: RowColumnSet::default(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn users(&self) -> &IdIndex {
        &self.users
    }

    pub fn items(&self) -> &IdIndex {
        &self.items
    }

    /// Train on (user id, item id, relevance) records.
    pub fn fit<S: AsRef<str>>(&mut self, records: &[(S, S, f32)]) -> Result<()> {
        let users = IdIndex::from_ids(records.iter().map(|r| r.0.as_ref()));
        let items = IdIndex::from_ids(records.iter().map(|r| r.1.as_ref()));
        debug!(
            "indexed {} users and {} items from {} records",
            users.len(),
            items.len(),
            records.len()
        );

        let log: InteractionLog = records
            .iter()
            .filter_map(|(u, i, r)| {
                let u = users.get_index(u.as_ref())?;
                let i = items.get_index(i.as_ref())?;
                Some((u as i32, i as i32, *r))
            })
            .collect();
        let matrix = InteractionMatrix::from_log(&log, users.len(), items.len())?;
        self.model.fit(&matrix)?;

        self.seen = log.seen_pairs();
        self.users = users;
        self.items = items;
        Ok(())
    }

    /// Recommend up to `k` of `items` to each of `users`, best first.
    ///
    /// Identifiers not seen in training are skipped.
    pub fn predict<S: AsRef<str> + Sync>(
        &self,
        users: &[S],
        items: &[S],
        k: usize,
        filter_seen: bool,
    ) -> Vec<Recommendation> {
        let item_ix: Vec<u32> = items
            .iter()
            .filter_map(|i| self.items.get_index(i.as_ref()))
            .collect();
        let user_ix: Vec<u32> = users
            .iter()
            .filter_map(|u| self.users.get_index(u.as_ref()))
            .collect();
        let skipped = users.len() - user_ix.len();
        if skipped > 0 {
            debug!("skipping {} unknown users", skipped);
        }

        let per_user: Vec<Vec<Recommendation>> = user_ix
            .par_iter()
            .map(|u| {
                let scored: Vec<(u32, f32)> = item_ix
                    .iter()
                    .filter(|i| !(filter_seen && self.seen.contains_pair(*u as i32, **i as i32)))
                    .map(|i| (*i, self.model.score(*u as usize, *i as usize)))
                    .collect();
                top_k(scored, k)
                    .into_iter()
                    .map(|(i, s)| Recommendation {
                        user_id: self.users.id(*u).to_string(),
                        item_id: self.items.id(i).to_string(),
                        relevance: s,
                        context: DEFAULT_CONTEXT.to_string(),
                    })
                    .collect()
            })
            .collect();

        per_user.into_iter().flatten().collect()
    }
}
