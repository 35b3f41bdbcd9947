// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Sparse coordinate arrays.

use arrow::{
    array::{Array, ArrowPrimitiveType, OffsetSizeTrait, PrimitiveArray, PrimitiveBuilder},
    datatypes::Int32Type,
};

/// Coordinate-format triples stored as parallel Arrow arrays.
#[derive(Debug)]
pub struct COOMatrix<V, Ix = Int32Type>
where
    V: ArrowPrimitiveType,
    Ix: ArrowPrimitiveType,
    Ix::Native: OffsetSizeTrait,
{
    pub row: PrimitiveArray<Ix>,
    pub col: PrimitiveArray<Ix>,
    pub val: PrimitiveArray<V>,
}

impl<V, Ix> Clone for COOMatrix<V, Ix>
where
    V: ArrowPrimitiveType,
    Ix: ArrowPrimitiveType,
    Ix::Native: OffsetSizeTrait,
{
    fn clone(&self) -> Self {
        COOMatrix {
            row: self.row.clone(),
            col: self.col.clone(),
            val: self.val.clone(),
        }
    }
}

pub struct COOMatrixBuilder<V, Ix = Int32Type>
where
    V: ArrowPrimitiveType,
    Ix: ArrowPrimitiveType,
    Ix::Native: OffsetSizeTrait,
{
    pub row: PrimitiveBuilder<Ix>,
    pub col: PrimitiveBuilder<Ix>,
    pub val: PrimitiveBuilder<V>,
}

impl<V, Ix> COOMatrix<V, Ix>
where
    V: ArrowPrimitiveType,
    Ix: ArrowPrimitiveType,
    Ix::Native: OffsetSizeTrait,
{
    /// Get the number of stored triples.
    pub fn len(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }
}

impl<V, Ix> COOMatrixBuilder<V, Ix>
where
    V: ArrowPrimitiveType,
    Ix: ArrowPrimitiveType,
    Ix::Native: OffsetSizeTrait,
{
    /// Initialize a builder with a specified capacity.
    pub fn with_capacity(cap: usize) -> Self {
        COOMatrixBuilder {
            row: PrimitiveBuilder::with_capacity(cap),
            col: PrimitiveBuilder::with_capacity(cap),
            val: PrimitiveBuilder::with_capacity(cap),
        }
    }

    pub fn add_entry(&mut self, row: Ix::Native, col: Ix::Native, val: V::Native) {
        self.row.append_value(row);
        self.col.append_value(col);
        self.val.append_value(val);
    }

    /// Build the final COO matrix from this builder.
    pub fn finish(mut self) -> COOMatrix<V, Ix> {
        COOMatrix {
            row: self.row.finish(),
            col: self.col.finish(),
            val: self.val.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::Float32Type;

    use super::*;

    #[test]
    fn builds_parallel_arrays() {
        let mut bld: COOMatrixBuilder<Float32Type> = COOMatrixBuilder::with_capacity(2);
        bld.add_entry(0, 3, 1.5);
        bld.add_entry(2, 1, 0.5);
        let coo = bld.finish();
        assert_eq!(coo.len(), 2);
        assert_eq!(&coo.row.values()[..], &[0, 2]);
        assert_eq!(&coo.col.values()[..], &[3, 1]);
        assert_eq!(coo.val.value(0), 1.5);
    }
}
