use crate::errors::PsiError;
use anyhow::Result;
use sha2::{Digest, Sha256};

/// Longest output the oracle can produce.
pub const MAX_ORACLE_OUTPUT: usize = 32;

/// Random oracle with a fixed output length, instantiated with SHA-256 truncated to `output_len` bytes.
#[derive(Clone)]
pub struct RandomOracle {
    hasher: Sha256,
    output_len: usize,
}

impl RandomOracle {
    /// Create an oracle producing `output_len` bytes. `output_len` must be in `1..=32`.
    pub fn new(output_len: usize) -> Result<Self> {
        if output_len == 0 || output_len > MAX_ORACLE_OUTPUT {
            return Err(PsiError::InvalidParameter {
                field: "oracle output length",
                value: output_len,
                reason: "must be in 1..=32",
            }
            .into());
        }

        Ok(Self {
            hasher: Sha256::new(),
            output_len,
        })
    }

    /// Drop all absorbed input.
    #[inline]
    pub fn reset(&mut self) {
        Digest::reset(&mut self.hasher);
    }

    /// Absorb `data`.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    /// Write the digest into the first `output_len` bytes of `out` and reset the oracle.
    #[inline]
    pub fn finalize_into(&mut self, out: &mut [u8]) {
        let res = self.hasher.finalize_reset();
        out[..self.output_len].copy_from_slice(&res[..self.output_len]);
    }

    /// One-shot helper: `H(data)`.
    pub fn digest(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; self.output_len];
        self.reset();
        self.update(data);
        self.finalize_into(&mut out);
        out
    }
}
