//! Matrix-based OPRF.
//!
//! The [MatrixBuilder] (the OT extension sender) samples a random matrix `A` and a correction matrix `Δ`
//! whose zero bits mark the rows hit by its own items, and sends `A ^ Δ` masked column by column with
//! the second OT output. The [MatrixReconstructor] (the OT extension receiver) ends up with
//! `C[col] = A[col]` when its choice bit is 0 and `C[col] = A[col] ^ Δ[col]` when it is 1.
//! Wherever `Δ` is zero the two matrices agree, hence both parties read the same `width` bits for a
//! common item.
//!
//! Both sides collect one bit per column for every item into [OprfOutputs], which is later
//! compressed with a random oracle.

mod builder;
mod reconstructor;

pub use builder::{BuiltGroup, MatrixBuilder};
pub use reconstructor::{MatrixReconstructor, ReconstructedGroup};

use crate::hash_utils::RandomOracle;
use crate::location::LocationTable;
use crate::matrix::BitMatrix;
use crate::params::ColumnGroup;
use anyhow::Result;
use std::ops::Range;

/// Per-item OPRF outputs, stored transposed: column `c` holds bit `c` of every item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OprfOutputs {
    bits: BitMatrix,
}

impl OprfOutputs {
    /// Empty outputs for `items` items of `width` bits.
    pub fn new(width: usize, items: usize) -> Self {
        Self {
            bits: BitMatrix::new(width, items),
        }
    }

    /// Number of bits per output.
    pub fn width(&self) -> usize {
        self.bits.columns()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.bits.rows()
    }

    /// Whether there are no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// For every item and every column of `group`, append the bit of `matrix` at the item's location.
    pub fn accumulate(&mut self, group: &ColumnGroup, matrix: &BitMatrix, locations: &LocationTable) {
        for (i, c) in group.columns().enumerate() {
            for (j, &row) in locations.column(i).iter().enumerate() {
                if matrix.get(i, row as usize) {
                    self.bits.set(c, j);
                }
            }
        }
    }

    fn pack_into(&self, range: Range<usize>, out: &mut [u8]) {
        let width_in_bytes = (self.width() + 7) / 8;
        out.iter_mut().for_each(|b| *b = 0);
        for c in 0..self.width() {
            for j in range.clone() {
                if self.bits.get(c, j) {
                    out[(j - range.start) * width_in_bytes + (c >> 3)] |= 1 << (c & 7);
                }
            }
        }
    }

    /// Output of item `j`, packed LSB-first into `ceil(width / 8)` bytes.
    pub fn output(&self, j: usize) -> Vec<u8> {
        let mut out = vec![0u8; (self.width() + 7) / 8];
        self.pack_into(j..j + 1, &mut out);
        out
    }

    /// Digests of the items in `range`, concatenated, `hash_length` bytes each.
    pub fn digest_tile(&self, range: Range<usize>, hash_length: usize) -> Result<Vec<u8>> {
        let width_in_bytes = (self.width() + 7) / 8;
        let mut packed = vec![0u8; range.len() * width_in_bytes];
        self.pack_into(range.clone(), &mut packed);

        let mut oracle = RandomOracle::new(hash_length)?;
        let mut digests = vec![0u8; range.len() * hash_length];
        for (input, output) in packed
            .chunks(width_in_bytes)
            .zip(digests.chunks_mut(hash_length))
        {
            oracle.reset();
            oracle.update(input);
            oracle.finalize_into(output);
        }

        Ok(digests)
    }
}
