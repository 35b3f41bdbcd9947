// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! SLIM item-similarity training and scoring.
//!
//! The core trains a sparse item × item weight table with one non-negative
//! elastic-net regression per item ([slim::Slim::fit]), and scores users by
//! summing the weights that connect candidate items to their histories
//! ([slim::Slim::predict], [slim::Slim::predict_pairs]).  An implicit ALS
//! recommender over raw identifiers lives in [als].

pub mod als;
mod arrow;
pub mod config;
pub mod data;
pub mod errors;
pub mod parallel;
mod progress;
pub mod regression;
pub mod slim;
pub mod sorting;
pub mod sparse;

#[cfg(feature = "python")]
mod python;

pub use config::{AlsConfig, SlimConfig};
pub use data::{InteractionLog, Recommendations, RowColumnSet};
pub use errors::{Result, SlimError};
pub use slim::{SimilarityRow, SimilarityTable, Slim};
