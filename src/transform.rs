//! Canonical transform of the input items and the public key schedule.
//!
//! Every item `x` is hashed to `H1(x) = (mask seed, canonical value)` and mapped to
//! `canonical value ^ AES_k0(mask seed)`. Row locations are derived from these transformed values,
//! one AES key per column group, all keys drawn in order from a PRG seeded by the public common seed.

use crate::hash_utils::RandomOracle;
use anyhow::Result;
use rand::{Rng, SeedableRng};
use scuttlebutt::{Aes128, AesRng, Block};

const H1_LENGTH: usize = 32;

/// PRG over the common seed. Both parties pull keys from it in the same order.
pub struct CommonKeySchedule {
    rng: AesRng,
}

impl CommonKeySchedule {
    /// Start the schedule at `common_seed`.
    pub fn new(common_seed: Block) -> Self {
        Self {
            rng: AesRng::from_seed(common_seed),
        }
    }

    /// Draw the next key and return the cipher keyed with it.
    pub fn next_cipher(&mut self) -> Aes128 {
        let key = self.rng.gen::<Block>();
        Aes128::new(key)
    }
}

/// Output of [canonical_transform]. Both vectors are parallel to the input.
#[derive(Clone, Debug)]
pub struct TransformedSet {
    /// Inputs of the row location derivation.
    pub transformed_values: Vec<Block>,
    /// The unmasked halves of `H1(x)`.
    pub canonical_values: Vec<Block>,
}

/// Apply the canonical transform to `items` with the cipher holding the first key of the schedule.
pub fn canonical_transform(items: &[Block], cipher: &Aes128) -> Result<TransformedSet> {
    let mut h1 = RandomOracle::new(H1_LENGTH)?;
    let mut out = [0u8; H1_LENGTH];

    let mut transformed_values = Vec::with_capacity(items.len());
    let mut canonical_values = Vec::with_capacity(items.len());

    for item in items {
        h1.reset();
        h1.update(item.as_ref());
        h1.finalize_into(&mut out);

        let mask_seed = block_from_slice(&out[..16]);
        let canonical = block_from_slice(&out[16..]);

        transformed_values.push(canonical ^ cipher.encrypt(mask_seed));
        canonical_values.push(canonical);
    }

    Ok(TransformedSet {
        transformed_values,
        canonical_values,
    })
}

fn block_from_slice(bytes: &[u8]) -> Block {
    let mut b = [0u8; 16];
    b.copy_from_slice(bytes);
    Block::from(b)
}
