// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Sparse Linear Methods for recommendation.
//!
//! SLIM learns a sparse, non-negative item × item weight table by regressing
//! each item's interaction column on every other item's column, and scores a
//! user's candidate items by summing the weights that link them to the
//! user's history.

use std::fmt;
use std::sync::Arc;

use log::*;
use rustc_hash::FxHashSet;

use crate::config::SlimConfig;
use crate::data::{InteractionLog, Recommendations, RowColumnSet};
use crate::errors::{Result, SlimError};
use crate::regression::ElasticNet;
use crate::sparse::InteractionMatrix;

mod accum;
pub mod fit;
pub mod score;
mod table;

pub use fit::{train_similarities, ItemFitter};
pub use score::{score_users, CandidateFilter};
pub use table::{SimilarityRow, SimilarityTable, ITEM_ONE_COL, ITEM_TWO_COL, SIMILARITY_COL};

/// The SLIM recommender.
///
/// The learned table is shared: scoring calls hold their own reference, so
/// [Slim::clear_cache] and refitting never disturb a scorer that is running.
#[derive(Debug, Clone)]
pub struct Slim {
    config: SlimConfig,
    fitter: ItemFitter<ElasticNet>,
    similarity: Option<Arc<SimilarityTable>>,
}

impl Slim {
    /// Create an unfitted model, rejecting invalid hyperparameters.
    pub fn new(config: SlimConfig) -> Result<Self> {
        let fitter = ItemFitter::from_config(&config)?;
        Ok(Slim {
            config,
            fitter,
            similarity: None,
        })
    }

    /// Create an unfitted model from the L2 (`beta`) and L1 (`lambda`) weights.
    pub fn with_params(beta: f64, lambda: f64) -> Result<Self> {
        Self::new(SlimConfig::new(beta, lambda))
    }

    /// Get the hyperparameters this model was built with.
    pub fn config(&self) -> &SlimConfig {
        &self.config
    }

    /// Check whether a similarity table has been learned or installed.
    pub fn is_fitted(&self) -> bool {
        self.similarity.is_some()
    }

    /// Learn the similarity table from an interaction log.
    ///
    /// Every distinct item in the log gets one regression.  The new table
    /// replaces the old one only if every fit succeeds.
    pub fn fit(&mut self, log: &InteractionLog, n_users: usize, n_items: usize) -> Result<()> {
        info!(
            "training {} on {} interactions ({} users, {} items)",
            self,
            log.len(),
            n_users,
            n_items
        );
        let matrix = InteractionMatrix::from_log(log, n_users, n_items)?;
        let items = log.distinct_items();
        let table = train_similarities(&self.fitter, &matrix, &items, self.config.threads)?;
        self.similarity = Some(Arc::new(table));
        Ok(())
    }

    /// Install a previously learned table.
    pub fn set_similarity(&mut self, table: SimilarityTable) {
        self.similarity = Some(Arc::new(table));
    }

    /// Get the learned similarity table, if the model is fitted.
    pub fn similarity(&self) -> Option<Arc<SimilarityTable>> {
        self.similarity.clone()
    }

    /// Release the model's reference to the learned table.
    pub fn clear_cache(&mut self) {
        if self.similarity.take().is_some() {
            debug!("released {} similarity table", self);
        }
    }

    /// Score every requested user against the admissible items.
    ///
    /// `log` supplies the user histories and is required.
    pub fn predict(
        &self,
        log: Option<&InteractionLog>,
        users: &[i32],
        items: &[i32],
    ) -> Result<Recommendations> {
        let log = self.require_log(log, "predict")?;
        let table = self.require_table("predict")?;
        let wanted: FxHashSet<i32> = users.iter().copied().collect();
        let history = log.restrict_users(&wanted);
        score_users(&table, &history, users, CandidateFilter::Items(items))
    }

    /// Score exactly the listed (user, item) pairs.
    pub fn predict_pairs(
        &self,
        pairs: &RowColumnSet,
        log: Option<&InteractionLog>,
    ) -> Result<Recommendations> {
        let log = self.require_log(log, "predict_pairs")?;
        let table = self.require_table("predict_pairs")?;
        let users = pairs.rows();
        let wanted: FxHashSet<i32> = users.iter().copied().collect();
        let history = log.restrict_users(&wanted);
        score_users(&table, &history, &users, CandidateFilter::Pairs(pairs))
    }

    /// Produce the top `k` items for each user, best first.
    ///
    /// With `filter_seen`, items the user already interacted with in `log`
    /// are not recommended.
    pub fn recommend(
        &self,
        log: Option<&InteractionLog>,
        users: &[i32],
        items: &[i32],
        k: usize,
        filter_seen: bool,
    ) -> Result<Recommendations> {
        let mut recs = self.predict(log, users, items)?;
        if filter_seen {
            if let Some(log) = log {
                recs = recs.without_pairs(&log.seen_pairs());
            }
        }
        Ok(recs.top_k(k))
    }

    fn require_log<'a>(
        &self,
        log: Option<&'a InteractionLog>,
        op: &str,
    ) -> Result<&'a InteractionLog> {
        log.ok_or_else(|| {
            SlimError::Usage(format!(
                "{} requires an interaction log to {}",
                self, op
            ))
        })
    }

    fn require_table(&self, op: &str) -> Result<Arc<SimilarityTable>> {
        self.similarity().ok_or_else(|| {
            SlimError::Usage(format!("{} must be fitted before calling {}", self, op))
        })
    }
}

impl fmt::Display for Slim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SLIM(beta={}, lambda_={})",
            self.config.beta, self.config.lambda
        )
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn log(records: &[(i32, i32, f32)]) -> InteractionLog {
        InteractionLog::from_records(records.iter().copied())
    }

    fn seeded(seed: u64) -> Slim {
        Slim::new(SlimConfig::new(0.01, 0.01).with_seed(seed)).expect("model")
    }

    fn sample_log() -> InteractionLog {
        log(&[
            (0, 0, 1.0),
            (0, 1, 1.0),
            (0, 2, 1.0),
            (1, 0, 1.0),
            (1, 1, 1.0),
            (2, 1, 1.0),
            (2, 2, 1.0),
            (3, 3, 1.0),
            (3, 0, 1.0),
        ])
    }

    fn assert_invariants(table: &SimilarityTable) {
        assert!(table.rows().all(|r| r.item_id_one != r.item_id_two));
        if let Some(min) = table.min_similarity() {
            assert!(min > 0.0);
        }
    }

    #[test]
    fn default_params_are_valid() {
        let model = Slim::new(SlimConfig::default()).expect("model");
        assert_eq!(model.config().beta, 4.0);
        assert!(!model.is_fitted());
        assert_eq!(model.to_string(), "SLIM(beta=4, lambda_=0.02)");
    }

    #[test]
    fn invalid_params_rejected() {
        assert!(matches!(
            Slim::with_params(-1.0, 0.02),
            Err(SlimError::Configuration(_))
        ));
        assert!(matches!(
            Slim::with_params(4.0, 0.0),
            Err(SlimError::Configuration(_))
        ));
        assert!(matches!(
            Slim::with_params(f64::NAN, 0.02),
            Err(SlimError::Configuration(_))
        ));
    }

    #[test]
    fn small_log_scenario() {
        let history = log(&[(0, 0, 1.0), (0, 1, 1.0), (1, 1, 1.0)]);
        let mut model = Slim::with_params(4.0, 0.02).expect("model");
        model.fit(&history, 2, 2).expect("fit");

        let table = model.similarity().expect("fitted");
        assert_invariants(&table);

        let user_hist = log(&[(0, 0, 1.0)]);
        let recs = model.predict(Some(&user_hist), &[0], &[1]).expect("predict");
        let edge = table
            .rows()
            .find(|r| r.item_id_one == 0 && r.item_id_two == 1)
            .map(|r| r.similarity);
        assert_eq!(recs.get(0, 1), edge);
        assert_eq!(recs.len(), edge.iter().count());
    }

    #[test]
    fn predict_without_log_is_usage_error() {
        let mut model = seeded(1);
        model.fit(&sample_log(), 4, 4).expect("fit");
        let err = model.predict(None, &[0], &[1]).unwrap_err();
        assert!(matches!(err, SlimError::Usage(_)));
        assert!(err.to_string().contains("SLIM"));

        let pairs: RowColumnSet = vec![(0, 1)].into_iter().collect();
        let err = model.predict_pairs(&pairs, None).unwrap_err();
        assert!(matches!(err, SlimError::Usage(_)));
    }

    #[test]
    fn predict_before_fit_is_usage_error() {
        let model = seeded(1);
        let err = model.predict(Some(&sample_log()), &[0], &[1]).unwrap_err();
        assert!(matches!(err, SlimError::Usage(_)));
    }

    #[test]
    fn duplicate_records_keep_later_value() {
        let first = log(&[(0, 0, 1.0), (0, 1, 5.0), (1, 1, 1.0), (0, 1, 1.0)]);
        let last_only = log(&[(0, 0, 1.0), (1, 1, 1.0), (0, 1, 1.0)]);

        let mut a = seeded(9);
        a.fit(&first, 2, 2).expect("fit");
        let mut b = seeded(9);
        b.fit(&last_only, 2, 2).expect("fit");

        let rows_a: Vec<_> = a.similarity().expect("a").rows().collect();
        let rows_b: Vec<_> = b.similarity().expect("b").rows().collect();
        assert_eq!(rows_a, rows_b);
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let mut a = Slim::new(
            SlimConfig::new(0.01, 0.01)
                .with_seed(17)
                .with_threads(3),
        )
        .expect("model");
        let mut b = seeded(17);
        a.fit(&sample_log(), 4, 4).expect("fit");
        b.fit(&sample_log(), 4, 4).expect("fit");

        let rows_a: Vec<_> = a.similarity().expect("a").rows().collect();
        let rows_b: Vec<_> = b.similarity().expect("b").rows().collect();
        assert!(!rows_a.is_empty());
        assert_eq!(rows_a, rows_b);
    }

    #[test]
    fn out_of_range_fails_and_keeps_table() {
        let mut model = seeded(2);
        model.fit(&sample_log(), 4, 4).expect("fit");
        let before = model.similarity().expect("fitted");

        let err = model.fit(&log(&[(0, 5, 1.0)]), 4, 4).unwrap_err();
        assert!(matches!(err, SlimError::IndexOutOfRange { kind: "item", .. }));
        let after = model.similarity().expect("still fitted");
        assert!(Arc::ptr_eq(&before, &after));

        let mut fresh = seeded(2);
        assert!(fresh.fit(&log(&[(7, 0, 1.0)]), 4, 4).is_err());
        assert!(!fresh.is_fitted());
    }

    #[test]
    fn clear_cache_keeps_reader_alive() {
        let mut model = seeded(4);
        model.fit(&sample_log(), 4, 4).expect("fit");
        let reader = model.similarity().expect("fitted");
        model.clear_cache();
        assert!(!model.is_fitted());
        assert!(model.similarity().is_none());
        assert_invariants(&reader);
    }

    #[test]
    fn predict_pairs_only_scores_listed_pairs() {
        let mut model = seeded(5);
        let train = sample_log();
        model.fit(&train, 4, 4).expect("fit");

        let pairs: RowColumnSet = vec![(0, 3), (1, 2), (3, 1)].into_iter().collect();
        let recs = model.predict_pairs(&pairs, Some(&train)).expect("score");
        assert!(recs.iter().all(|r| pairs.contains_pair(r.user, r.item)));
        assert!(recs.iter().all(|r| r.relevance > 0.0));

        let empty = model
            .predict_pairs(&RowColumnSet::default(), Some(&train))
            .expect("score");
        assert!(empty.is_empty());
    }

    #[test]
    fn predict_restricts_to_requested_users() {
        let mut model = seeded(6);
        let train = sample_log();
        model.fit(&train, 4, 4).expect("fit");
        let recs = model
            .predict(Some(&train), &[1], &[0, 1, 2, 3])
            .expect("predict");
        assert!(recs.iter().all(|r| r.user == 1));
        let none = model.predict(Some(&train), &[1], &[]).expect("predict");
        assert!(none.is_empty());
    }

    #[test]
    fn recommend_filters_and_truncates() {
        let mut model = seeded(8);
        let train = sample_log();
        model.fit(&train, 4, 4).expect("fit");

        let seen = train.seen_pairs();
        let recs = model
            .recommend(Some(&train), &[0, 1, 2, 3], &[0, 1, 2, 3], 1, true)
            .expect("recommend");
        assert!(recs.iter().all(|r| !seen.contains_pair(r.user, r.item)));
        for u in 0..4 {
            assert!(recs.iter().filter(|r| r.user == u).count() <= 1);
        }

        let all = model
            .recommend(Some(&train), &[0], &[0, 1, 2, 3], 4, false)
            .expect("recommend");
        let scores: Vec<f32> = all.iter().map(|r| r.relevance).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn unfitted_items_have_no_rows() {
        let mut model = seeded(3);
        model.fit(&log(&[(0, 0, 1.0), (0, 1, 1.0), (1, 1, 1.0)]), 2, 5).expect("fit");
        let table = model.similarity().expect("fitted");
        assert!(table.rows().all(|r| r.item_id_one < 2 && r.item_id_two < 2));
    }

    #[test]
    fn persisted_table_scores_the_same() {
        let mut model = seeded(11);
        let train = sample_log();
        model.fit(&train, 4, 4).expect("fit");
        let table = model.similarity().expect("fitted");

        let mut buf = Vec::new();
        table.write_json(&mut buf).expect("write");
        let reloaded = SimilarityTable::read_json(4, buf.as_slice()).expect("read");

        let mut other = seeded(11);
        other.set_similarity(reloaded);
        let a = model.predict(Some(&train), &[0, 1], &[0, 1, 2, 3]).expect("a");
        let b = other.predict(Some(&train), &[0, 1], &[0, 1, 2, 3]).expect("b");
        assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn valid_params_construct(beta in 0.0f64..10.0, lambda in 1e-6f64..10.0) {
            prop_assert!(Slim::with_params(beta, lambda).is_ok());
        }

        #[test]
        fn invalid_params_fail(beta in -10.0f64..-1e-9, lambda in -10.0f64..=0.0) {
            prop_assert!(matches!(Slim::with_params(beta, 0.02), Err(SlimError::Configuration(_))));
            prop_assert!(matches!(Slim::with_params(4.0, lambda), Err(SlimError::Configuration(_))));
        }

        #[test]
        fn tables_keep_invariants(
            records in proptest::collection::vec((0i32..6, 0i32..5, 0.5f32..5.0), 1..30),
            seed in any::<u64>(),
        ) {
            let mut model = seeded(seed);
            model.fit(&log(&records), 6, 5).expect("fit");
            let table = model.similarity().expect("fitted");
            prop_assert!(table.rows().all(|r| r.item_id_one != r.item_id_two));
            prop_assert!(table.rows().all(|r| r.similarity > 0.0));
        }
    }
}
