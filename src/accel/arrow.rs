// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Utilities for working with Arrow data.

use arrow::array::{downcast_array, Array, ArrowPrimitiveType, PrimitiveArray, RecordBatch};

use crate::errors::{Result, SlimError};

/// Extract a primitive array, checking its type and rejecting nulls.
pub fn checked_array<E: ArrowPrimitiveType + 'static>(
    name: &str,
    array: &dyn Array,
) -> Result<PrimitiveArray<E>> {
    if !array.data_type().equals_datatype(&E::DATA_TYPE) {
        return Err(SlimError::InvalidInput(format!(
            "invalid {} type {}, expected {}",
            name,
            array.data_type(),
            E::DATA_TYPE
        )));
    }
    if array.null_count() > 0 {
        return Err(SlimError::InvalidInput(format!(
            "{} contains {} nulls",
            name,
            array.null_count()
        )));
    }
    Ok(downcast_array(array))
}

/// Extract a named column from a record batch.
pub fn checked_column<E: ArrowPrimitiveType + 'static>(
    batch: &RecordBatch,
    name: &str,
) -> Result<PrimitiveArray<E>> {
    let col = crate::ok_or_invalid!(batch.column_by_name(name), "missing column '{}'", name)?;
    checked_array(name, col.as_ref())
}
