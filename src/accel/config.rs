// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Model configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SlimError};

/// Distribution of a tunable hyperparameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "lowercase")]
pub enum ParamRange {
    LogUniform(f64, f64),
    Uniform(f64, f64),
}

/// Configuration for SLIM training.
///
/// Field names follow the hyperparameter names used by callers, so `lambda`
/// is read from and written to `lambda_`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlimConfig {
    /// L2-leaning regularization strength (must be non-negative).
    pub beta: f64,
    /// L1-leaning regularization strength (must be positive).
    #[serde(rename = "lambda_")]
    pub lambda: f64,
    /// Seed for the coordinate-selection order.
    pub seed: Option<u64>,
    /// Iteration budget for each per-item regression.
    pub max_iter: usize,
    /// Convergence tolerance for each per-item regression.
    pub tol: f64,
    /// Worker threads for training; `None` uses the global pool.
    pub threads: Option<usize>,
}

impl Default for SlimConfig {
    fn default() -> Self {
        SlimConfig {
            beta: 4.0,
            lambda: 0.02,
            seed: None,
            max_iter: 5000,
            tol: 1e-4,
            threads: None,
        }
    }
}

impl SlimConfig {
    pub fn new(beta: f64, lambda: f64) -> Self {
        SlimConfig {
            beta,
            lambda,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Parse a configuration from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SlimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the regularization parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(SlimError::Configuration(format!(
                "beta must be a non-negative number, got {}",
                self.beta
            )));
        }
        if !self.lambda.is_finite() || self.lambda <= 0.0 {
            return Err(SlimError::Configuration(format!(
                "lambda_ must be a positive number, got {}",
                self.lambda
            )));
        }
        if self.max_iter == 0 {
            return Err(SlimError::Configuration(
                "max_iter must be at least 1".into(),
            ));
        }
        if self.tol.is_nan() || self.tol < 0.0 {
            return Err(SlimError::Configuration(format!(
                "tol must be non-negative, got {}",
                self.tol
            )));
        }
        if self.threads == Some(0) {
            return Err(SlimError::Configuration(
                "threads must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Overall elastic-net penalty strength.
    pub fn alpha(&self) -> f64 {
        self.beta + self.lambda
    }

    /// Share of the penalty assigned to the L1 term.
    pub fn l1_ratio(&self) -> f64 {
        self.lambda / self.alpha()
    }

    /// Hyperparameter search space for tuning.
    pub fn search_space() -> Vec<(&'static str, ParamRange)> {
        vec![
            ("beta", ParamRange::LogUniform(1e-9, 5.0)),
            ("lambda_", ParamRange::LogUniform(1e-9, 2.0)),
        ]
    }
}

/// Configuration for the implicit-feedback ALS baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlsConfig {
    /// Number of latent features.
    pub rank: usize,
    /// Number of alternating epochs.
    pub epochs: usize,
    /// Ridge regularization applied to each row solve.
    pub regularization: f32,
    /// Confidence scaling for observed interactions.
    pub weight: f32,
    pub seed: Option<u64>,
}

impl Default for AlsConfig {
    fn default() -> Self {
        AlsConfig {
            rank: 10,
            epochs: 10,
            regularization: 0.1,
            weight: 1.0,
            seed: None,
        }
    }
}

impl AlsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rank == 0 {
            return Err(SlimError::Configuration("rank must be at least 1".into()));
        }
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(SlimError::Configuration(format!(
                "regularization must be non-negative, got {}",
                self.regularization
            )));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(SlimError::Configuration(format!(
                "weight must be positive, got {}",
                self.weight
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference() {
        let config = SlimConfig::default();
        assert_eq!(config.beta, 4.0);
        assert_eq!(config.lambda, 0.02);
        assert_eq!(config.max_iter, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn penalty_mix() {
        let config = SlimConfig::new(3.0, 1.0);
        assert_eq!(config.alpha(), 4.0);
        assert_eq!(config.l1_ratio(), 0.25);
    }

    #[test]
    fn json_uses_lambda_underscore() {
        let config = SlimConfig::from_json(r#"{"beta": 1.5, "lambda_": 0.5, "seed": 42}"#)
            .expect("valid config");
        assert_eq!(config.beta, 1.5);
        assert_eq!(config.lambda, 0.5);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_iter, 5000);
    }

    #[test]
    fn json_rejects_bad_lambda() {
        let err = SlimConfig::from_json(r#"{"lambda_": 0.0}"#).unwrap_err();
        assert!(matches!(err, SlimError::Configuration(_)));
    }

    #[test]
    fn rejects_nan() {
        assert!(SlimConfig::new(f64::NAN, 0.1).validate().is_err());
        assert!(SlimConfig::new(1.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn search_space_names() {
        let space = SlimConfig::search_space();
        let names: Vec<_> = space.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["beta", "lambda_"]);
    }

    #[test]
    fn als_rank_validated() {
        let config = AlsConfig {
            rank: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
