//! Protocol parameters.
//!
//! [PsiParams] must be identical on both sides. Instead of trusting both parties to be started with the
//! same values, [PsiParams::exchange] sends ours, reads the peer's and aborts on the first difference.
//! [LocalConfig] only changes how a party schedules its own work and never travels on the wire.

use crate::errors::PsiError;
use crate::hash_utils::RandomOracle;
use anyhow::{Context, Result};
use itertools::Itertools;
use scuttlebutt::{AbstractChannel, Block};

/// Bytes of a digest used as the key of the intersection index.
pub const DIGEST_PREFIX_LEN: usize = 8;

const MIN_LOG_HEIGHT: usize = 3;
const MAX_LOG_HEIGHT: usize = 32;
const BLOCK_BYTES: usize = 16;

/// Parameters both parties agree on before a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PsiParams {
    sender_size: usize,
    receiver_size: usize,
    log_height: usize,
    width: usize,
    hash_length: usize,
    common_seed: Block,
}

/// A run of consecutive matrix columns whose row locations come from one PRP evaluation per item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnGroup {
    /// Global index of the first column of the group.
    pub start: usize,
    /// Number of columns in the group. Only the last group may be shorter than `columns_per_block`.
    pub len: usize,
}

impl ColumnGroup {
    /// Global column indices of the group.
    pub fn columns(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

impl PsiParams {
    /// Validate and bundle the parameters.
    ///
    /// - `sender_size`: number of items of the party streaming digests ([Sender](crate::psi::Sender)).
    /// - `receiver_size`: number of items of the party building the matrix ([Receiver](crate::psi::Receiver)).
    /// - `log_height`: the matrix has `2^log_height` rows.
    /// - `width`: number of matrix columns, i.e. bits of every OPRF output.
    /// - `hash_length`: bytes of the digests compared in the intersection test.
    /// - `common_seed`: public seed of the key schedule.
    pub fn new(
        sender_size: usize,
        receiver_size: usize,
        log_height: usize,
        width: usize,
        hash_length: usize,
        common_seed: Block,
    ) -> Result<Self, PsiError> {
        if !(MIN_LOG_HEIGHT..=MAX_LOG_HEIGHT).contains(&log_height) {
            return Err(PsiError::InvalidParameter {
                field: "log_height",
                value: log_height,
                reason: "must be in 3..=32",
            });
        }

        if width == 0 {
            return Err(PsiError::InvalidParameter {
                field: "width",
                value: width,
                reason: "must be positive",
            });
        }

        if !(DIGEST_PREFIX_LEN..=crate::hash_utils::MAX_ORACLE_OUTPUT).contains(&hash_length) {
            return Err(PsiError::InvalidParameter {
                field: "hash_length",
                value: hash_length,
                reason: "must be in 8..=32",
            });
        }

        Ok(Self {
            sender_size,
            receiver_size,
            log_height,
            width,
            hash_length,
            common_seed,
        })
    }

    /// Number of items of the digest-streaming party.
    pub fn sender_size(&self) -> usize {
        self.sender_size
    }

    /// Number of items of the matrix-building party.
    pub fn receiver_size(&self) -> usize {
        self.receiver_size
    }

    /// `log2(height)`.
    pub fn log_height(&self) -> usize {
        self.log_height
    }

    /// Number of matrix rows.
    pub fn height(&self) -> usize {
        1 << self.log_height
    }

    /// Bytes of one matrix column.
    pub fn height_in_bytes(&self) -> usize {
        self.height() / 8
    }

    /// Mask applied to raw locations.
    pub fn location_mask(&self) -> u32 {
        (((1u64 << self.log_height) - 1) & u32::MAX as u64) as u32
    }

    /// Number of matrix columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Bytes of one packed OPRF output.
    pub fn width_in_bytes(&self) -> usize {
        (self.width + 7) / 8
    }

    /// Digest length in bytes.
    pub fn hash_length(&self) -> usize {
        self.hash_length
    }

    /// Public seed of the key schedule.
    pub fn common_seed(&self) -> Block {
        self.common_seed
    }

    /// Bytes of a PRP output consumed by one row location.
    pub fn location_in_bytes(&self) -> usize {
        (self.log_height + 7) / 8
    }

    /// Columns served by one PRP evaluation.
    pub fn columns_per_block(&self) -> usize {
        BLOCK_BYTES / self.location_in_bytes()
    }

    /// Column groups in protocol order.
    pub fn column_groups(&self) -> Vec<ColumnGroup> {
        let cpb = self.columns_per_block();
        (0..self.width)
            .step_by(cpb)
            .map(|start| ColumnGroup {
                start,
                len: cpb.min(self.width - start),
            })
            .collect_vec()
    }

    /// Bytes the matrix builder sends during matrix construction.
    pub fn matrix_bytes(&self) -> usize {
        self.width * self.height_in_bytes()
    }

    fn seed_fingerprint(&self) -> Result<Block> {
        let mut oracle = RandomOracle::new(16)?;
        let h = oracle.digest(self.common_seed.as_ref());
        let mut b = [0u8; 16];
        b.copy_from_slice(&h);
        Ok(Block::from(b))
    }

    fn announced(&self) -> [(&'static str, usize); 5] {
        [
            ("sender_size", self.sender_size),
            ("receiver_size", self.receiver_size),
            ("log_height", self.log_height),
            ("width", self.width),
            ("hash_length", self.hash_length),
        ]
    }

    /// Send our parameters, read the peer's and check that they agree.
    ///
    /// Both parties write before reading; the messages are small enough to sit in the transport's buffers.
    pub fn exchange<C: AbstractChannel>(&self, channel: &mut C) -> Result<()> {
        let ours = self.announced();
        for (_, v) in ours.iter() {
            channel
                .write_usize(*v)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
        }
        let fingerprint = self.seed_fingerprint()?;
        channel
            .write_block(&fingerprint)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        channel
            .flush()
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        let mut theirs = Vec::with_capacity(ours.len());
        for _ in 0..ours.len() {
            theirs.push(
                channel
                    .read_usize()
                    .with_context(|| format!("@{}:{}", file!(), line!()))?,
            );
        }
        let their_fingerprint = channel
            .read_block()
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        for ((field, ours), theirs) in ours.into_iter().zip(theirs) {
            if ours != theirs {
                return Err(PsiError::ParameterMismatch {
                    field,
                    ours,
                    theirs,
                }
                .into());
            }
        }

        if fingerprint != their_fingerprint {
            return Err(PsiError::CommonSeedMismatch.into());
        }

        Ok(())
    }
}

/// Party-local scheduling knobs. Results never depend on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalConfig {
    /// Items encrypted per batch while deriving row locations.
    pub location_tile: usize,
    /// Items hashed (and, for the sender, sent) per digest batch.
    pub digest_tile: usize,
    /// Worker threads deriving row locations.
    pub threads: usize,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            location_tile: 1 << 8,
            digest_tile: 1 << 8,
            threads: 1,
        }
    }
}

impl LocalConfig {
    /// Validate and bundle the knobs.
    pub fn new(location_tile: usize, digest_tile: usize, threads: usize) -> Result<Self, PsiError> {
        for (field, value) in [
            ("location_tile", location_tile),
            ("digest_tile", digest_tile),
            ("threads", threads),
        ] {
            if value == 0 {
                return Err(PsiError::InvalidParameter {
                    field,
                    value,
                    reason: "must be positive",
                });
            }
        }

        Ok(Self {
            location_tile,
            digest_tile,
            threads,
        })
    }
}
