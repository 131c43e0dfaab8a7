//! Utility functions for creating sets for the set intersection protocol.

use anyhow::{bail, Result};
use itertools::Itertools;
use rand::seq::index::sample;
use rand::{CryptoRng, Rng, SeedableRng};
use scuttlebutt::{AesRng, Block};

const SENDER_DEMO_SEED: u128 = 123;
const RECEIVER_DEMO_SEED: u128 = 456;

/// Input sets of both parties with the positions of their common items.
#[derive(Clone, Debug)]
pub struct PsiSets {
    /// Items of the [Receiver](crate::psi::Receiver).
    pub receiver_set: Vec<Block>,
    /// Items of the [Sender](crate::psi::Sender).
    pub sender_set: Vec<Block>,
    /// `(receiver index, sender index)` of every planted common item.
    pub common: Vec<(usize, usize)>,
}

impl PsiSets {
    /// Receiver indices of the planted common items, sorted.
    pub fn receiver_common_indices(&self) -> Vec<usize> {
        let mut indices = self.common.iter().map(|&(r, _)| r).collect::<Vec<_>>();
        indices.sort_unstable();
        indices
    }
}

/// Create random sets sharing exactly `common_size` items, planted at random positions.
///
/// The other items are random blocks, so accidental overlaps are negligible.
pub fn create_sets_with_common<RNG>(
    receiver_size: usize,
    sender_size: usize,
    common_size: usize,
    rng: &mut RNG,
) -> Result<PsiSets>
where
    RNG: CryptoRng + Rng,
{
    if receiver_size < common_size || sender_size < common_size {
        bail!(
            "set sizes (={}, {}) < common_size (={}) @{}:{}",
            receiver_size,
            sender_size,
            common_size,
            file!(),
            line!()
        );
    }

    let receiver_set = (0..receiver_size).map(|_| rng.gen::<Block>()).collect_vec();
    let mut sender_set = (0..sender_size).map(|_| rng.gen::<Block>()).collect_vec();

    let r_indices = sample(rng, receiver_size, common_size);
    let s_indices = sample(rng, sender_size, common_size);
    let common = r_indices.into_iter().zip(s_indices.into_iter()).collect_vec();

    for &(r, s) in common.iter() {
        sender_set[s] = receiver_set[r];
    }

    Ok(PsiSets {
        receiver_set,
        sender_set,
        common,
    })
}

/// Deterministic sender set: `size` blocks from a PRG seeded with a fixed value.
pub fn demo_sender_set(size: usize) -> Vec<Block> {
    let mut rng = AesRng::from_seed(Block::from(SENDER_DEMO_SEED));
    (0..size).map(|_| rng.gen::<Block>()).collect()
}

/// Deterministic receiver set whose first `common_size` items are the first items of
/// [demo_sender_set] and whose remaining items come from an independent PRG.
///
/// Two separate processes started with the same sizes therefore share exactly
/// `min(common_size, receiver_size, sender_size)` items.
pub fn demo_receiver_set(size: usize, common_size: usize) -> Vec<Block> {
    let common_size = common_size.min(size);
    let mut set = demo_sender_set(common_size);

    let mut rng = AesRng::from_seed(Block::from(RECEIVER_DEMO_SEED));
    set.extend((common_size..size).map(|_| rng.gen::<Block>()));
    set
}
