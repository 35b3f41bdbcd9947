// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Error types for training and scoring.

use arrow::error::ArrowError;
use thiserror::Error;

use crate::als::SolveError;

/// Errors surfaced by the SLIM core and its collaborators.
#[derive(Error, Debug)]
pub enum SlimError {
    /// Invalid hyperparameters; raised before any data is touched.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// An operation was invoked without the inputs it requires.
    #[error("{0}")]
    Usage(String),
    /// An interaction referenced a user or item outside the declared counts.
    #[error("{kind} index {index} out of range (count {bound})")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        bound: usize,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("linear solve failed: {0}")]
    Solve(#[from] SolveError),
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SlimError>;

/// Convert an [Option] into a [Result] with a formatted [SlimError::InvalidInput].
#[macro_export]
macro_rules! ok_or_invalid {
    ($opt:expr, $($arg:expr),*) => {
        $opt.ok_or_else(|| $crate::errors::SlimError::InvalidInput(format!($($arg),*)))
    };
}

#[cfg(feature = "python")]
impl From<SlimError> for pyo3::PyErr {
    fn from(err: SlimError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyIndexError, PyRuntimeError, PyTypeError, PyValueError};
        match err {
            SlimError::Configuration(_) | SlimError::Usage(_) => {
                PyValueError::new_err(err.to_string())
            }
            SlimError::IndexOutOfRange { .. } => PyIndexError::new_err(err.to_string()),
            SlimError::InvalidInput(_) => PyTypeError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}
