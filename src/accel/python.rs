// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Python bindings over pyarrow record batches.

use arrow::{array::RecordBatch, pyarrow::PyArrowType};
use log::*;
use pyo3::prelude::*;

use crate::config::SlimConfig;
use crate::data::InteractionLog;
use crate::parallel;
use crate::slim::{score_users, CandidateFilter, SimilarityTable, Slim};

/// Entry point for the slimkit accelerator module.
#[pymodule]
#[pyo3(name = "_accel")]
fn accel_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    register_slim(m)?;

    m.add_function(wrap_pyfunction!(init_accel_pool, m)?)?;
    m.add_function(wrap_pyfunction!(thread_count, m)?)?;

    Ok(())
}

/// Register the `_accel.slim` module.
fn register_slim(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let slim = PyModule::new(parent.py(), "slim")?;
    parent.add_submodule(&slim)?;

    slim.add_function(wrap_pyfunction!(train_slim, &slim)?)?;
    slim.add_function(wrap_pyfunction!(score_slim, &slim)?)?;

    Ok(())
}

#[pyfunction]
fn init_accel_pool(n_threads: usize) -> PyResult<()> {
    Ok(parallel::init_accel_pool(n_threads)?)
}

#[pyfunction]
fn thread_count() -> PyResult<usize> {
    Ok(parallel::thread_count())
}

/// Train a similarity table from a `user_idx`/`item_idx`/`relevance` batch.
///
/// `config` is an optional JSON object of hyperparameters.
#[pyfunction]
#[pyo3(signature = (log, shape, config=None))]
fn train_slim(
    py: Python<'_>,
    log: PyArrowType<RecordBatch>,
    shape: (usize, usize),
    config: Option<&str>,
) -> PyResult<PyArrowType<RecordBatch>> {
    let (nu, ni) = shape;
    let config = match config {
        Some(json) => SlimConfig::from_json(json)?,
        None => SlimConfig::default(),
    };

    let batch = py.allow_threads(|| {
        let log = InteractionLog::from_record_batch(&log.0)?;
        let mut model = Slim::new(config)?;
        model.fit(&log, nu, ni)?;
        let table = model
            .similarity()
            .map(|t| t.to_record_batch())
            .transpose()?;
        crate::ok_or_invalid!(table, "training produced no table")
    })?;

    Ok(batch.into())
}

/// Score users against candidate items with a trained similarity table.
#[pyfunction]
fn score_slim(
    py: Python<'_>,
    similarity: PyArrowType<RecordBatch>,
    n_items: usize,
    history: PyArrowType<RecordBatch>,
    users: Vec<i32>,
    items: Vec<i32>,
) -> PyResult<PyArrowType<RecordBatch>> {
    let batch = py.allow_threads(|| {
        let table = SimilarityTable::from_record_batch(n_items, &similarity.0)?;
        let history = InteractionLog::from_record_batch(&history.0)?;
        debug!(
            "scoring {} users with {} similarities",
            users.len(),
            table.len()
        );
        let recs = score_users(&table, &history, &users, CandidateFilter::Items(&items))?;
        recs.to_record_batch()
    })?;

    Ok(batch.into())
}
