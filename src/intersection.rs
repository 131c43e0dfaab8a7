//! Digest exchange and intersection test.
//!
//! The sender streams the digest of every OPRF output of its items in batches. The receiver indexes its
//! own digests by their first [DIGEST_PREFIX_LEN] bytes and checks every incoming digest against the
//! index, comparing the full digest on a prefix hit.

use crate::oprf::OprfOutputs;
use crate::params::DIGEST_PREFIX_LEN;
use anyhow::{Context, Result};
use itertools::Itertools;
use log::debug;
use scuttlebutt::AbstractChannel;
use std::collections::HashMap;

/// Outcome of a run on the receiver's side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intersection {
    /// Number of sender digests that hit a receiver digest.
    pub size: usize,
    /// Indices into the receiver's input of every item hit by at least one sender digest, ascending.
    ///
    /// Duplicated receiver items are all reported, so `matched_indices.len()` can differ from `size`.
    pub matched_indices: Vec<usize>,
}

fn prefix_of(digest: &[u8]) -> u64 {
    let mut b = [0u8; DIGEST_PREFIX_LEN];
    b.copy_from_slice(&digest[..DIGEST_PREFIX_LEN]);
    u64::from_le_bytes(b)
}

/// Receiver digests keyed by their prefix.
pub struct DigestIndex {
    hash_length: usize,
    table: HashMap<u64, Vec<(Vec<u8>, usize)>>,
}

impl DigestIndex {
    /// Hash every output `tile` at a time and index the digests.
    pub fn build(outputs: &OprfOutputs, hash_length: usize, tile: usize) -> Result<Self> {
        let tile = tile.max(1);
        let mut table: HashMap<u64, Vec<(Vec<u8>, usize)>> = HashMap::with_capacity(outputs.len());

        for low in (0..outputs.len()).step_by(tile) {
            let up = (low + tile).min(outputs.len());
            let digests = outputs.digest_tile(low..up, hash_length)?;
            for (k, digest) in digests.chunks(hash_length).enumerate() {
                table
                    .entry(prefix_of(digest))
                    .or_default()
                    .push((digest.to_vec(), low + k));
            }
        }

        Ok(Self { hash_length, table })
    }

    /// Indices of all receiver items whose digest equals `digest`, in input order.
    pub fn lookup<'a>(&'a self, digest: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
        debug_assert_eq!(digest.len(), self.hash_length);
        self.table
            .get(&prefix_of(digest))
            .into_iter()
            .flatten()
            .filter(move |(d, _)| d.as_slice() == digest)
            .map(|&(_, idx)| idx)
    }

    /// Number of indexed digests.
    pub fn len(&self) -> usize {
        self.table.values().map(|v| v.len()).sum()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Read `sender_size` digests from `channel`, `tile` at a time, and collect the hits.
    pub fn match_stream<C: AbstractChannel>(
        &self,
        channel: &mut C,
        sender_size: usize,
        tile: usize,
    ) -> Result<Intersection> {
        let tile = tile.max(1);
        let mut buf = vec![0u8; tile * self.hash_length];
        let mut matched = vec![false; self.len()];
        let mut size = 0;

        for low in (0..sender_size).step_by(tile) {
            let up = (low + tile).min(sender_size);
            let buf = &mut buf[..(up - low) * self.hash_length];
            channel
                .read_bytes(buf)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;

            for digest in buf.chunks(self.hash_length) {
                let mut hit = false;
                for idx in self.lookup(digest) {
                    matched[idx] = true;
                    hit = true;
                }
                if hit {
                    size += 1;
                }
            }
        }
        debug!("digest stream: {} of {} matched", size, sender_size);

        Ok(Intersection {
            size,
            matched_indices: matched.iter().positions(|&m| m).collect(),
        })
    }
}

/// Hash the sender's outputs `tile` at a time and send every batch as it is ready.
pub fn stream_digests<C: AbstractChannel>(
    outputs: &OprfOutputs,
    channel: &mut C,
    hash_length: usize,
    tile: usize,
) -> Result<()> {
    let tile = tile.max(1);
    for low in (0..outputs.len()).step_by(tile) {
        let up = (low + tile).min(outputs.len());
        let digests = outputs.digest_tile(low..up, hash_length)?;
        channel
            .write_bytes(&digests)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
    }
    channel
        .flush()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    Ok(())
}
