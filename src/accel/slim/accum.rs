// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Accumulator for summed similarity scores.
use ordered_float::NotNan;

use crate::errors::{Result, SlimError};

/// Accumulate similarity contributions for one candidate item.
///
/// Only enabled accumulators collect weight, and an enabled accumulator that
/// never receives a contribution produces no score.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) enum ScoreAccumulator {
    #[default]
    Disabled,
    Empty,
    Sum(NotNan<f32>),
}

impl ScoreAccumulator {
    /// Create accumulators for `n` items, enabling the active ones.
    ///
    /// Active items outside `0..n` cannot receive contributions and are skipped.
    pub fn new_array(n: usize, active: &[i32]) -> Vec<ScoreAccumulator> {
        let mut accs = vec![ScoreAccumulator::Disabled; n];
        for i in active {
            if *i >= 0 && (*i as usize) < n {
                accs[*i as usize].enable();
            }
        }
        accs
    }

    pub fn enable(&mut self) {
        if let Self::Disabled = self {
            *self = Self::Empty;
        }
    }

    pub fn add_weight(&mut self, weight: f32) -> Result<()> {
        let weight = NotNan::new(weight)
            .map_err(|_e| SlimError::InvalidInput("similarity is NaN".into()))?;
        match self {
            Self::Disabled => (),
            Self::Empty => *self = Self::Sum(weight),
            Self::Sum(total) => *total += weight,
        }
        Ok(())
    }

    /// Get the summed weight, if any contribution was received.
    pub fn score(&self) -> Option<f32> {
        match self {
            Self::Sum(total) => Some(total.into_inner()),
            _ => None,
        }
    }
}

/// Collect the scored items from an accumulator array, in item order.
pub(super) fn collect_scored(accs: &[ScoreAccumulator]) -> Vec<(i32, f32)> {
    accs.iter()
        .enumerate()
        .filter_map(|(i, acc)| acc.score().map(|s| (i as i32, s)))
        .collect()
}
