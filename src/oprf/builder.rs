use super::OprfOutputs;
use crate::errors::PsiError;
use crate::location::LocationTable;
use crate::matrix::BitMatrix;
use crate::params::{ColumnGroup, LocalConfig, PsiParams};
use crate::transform::CommonKeySchedule;
use anyhow::{Context, Result};
use log::debug;
use rand::{RngCore, SeedableRng};
use scuttlebutt::utils::xor_inplace;
use scuttlebutt::{AbstractChannel, Aes128, AesRng, Block};

/// Matrices of one column group on the building side.
pub struct BuiltGroup {
    /// Row locations of the builder's items.
    pub locations: LocationTable,
    /// `A`, expanded from the first OT output of every column.
    pub matrix_a: BitMatrix,
    /// `Δ`: all ones except at the builder's locations.
    pub delta: BitMatrix,
}

/// Builds `A` and `Δ` and sends the masked difference, one column group at a time.
pub struct MatrixBuilder {
    params: PsiParams,
    config: LocalConfig,
    seeds: Vec<(Block, Block)>,
}

impl MatrixBuilder {
    /// `seeds` are the random OT sender outputs, one pair per column.
    pub fn new(params: &PsiParams, config: &LocalConfig, seeds: &[(Block, Block)]) -> Result<Self> {
        if seeds.len() != params.width() {
            return Err(PsiError::OtOutputLength {
                expected: params.width(),
                actual: seeds.len(),
            }
            .into());
        }

        Ok(Self {
            params: *params,
            config: *config,
            seeds: seeds.to_vec(),
        })
    }

    /// Handle one column group: derive locations, build `A` and `Δ`, send `T = PRG(seed1) ^ A ^ Δ`.
    pub fn process_group<C: AbstractChannel>(
        &self,
        group: &ColumnGroup,
        cipher: &Aes128,
        values: &[Block],
        channel: &mut C,
    ) -> Result<BuiltGroup> {
        let height = self.params.height();
        let locations = LocationTable::compute(
            &self.params,
            group,
            cipher,
            values,
            self.config.location_tile,
            self.config.threads,
        )?;

        let mut delta = BitMatrix::filled(group.len, height, 0xff);
        for i in 0..group.len {
            for &row in locations.column(i) {
                delta.clear(i, row as usize);
            }
        }

        let mut matrix_a = BitMatrix::new(group.len, height);
        let mut t = vec![0u8; self.params.height_in_bytes()];
        for (i, c) in group.columns().enumerate() {
            let (seed0, seed1) = self.seeds[c];
            AesRng::from_seed(seed0).fill_bytes(matrix_a.column_mut(i));
            AesRng::from_seed(seed1).fill_bytes(&mut t);

            xor_inplace(&mut t, matrix_a.column(i));
            xor_inplace(&mut t, delta.column(i));

            channel
                .write_bytes(&t)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
        }
        channel
            .flush()
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        Ok(BuiltGroup {
            locations,
            matrix_a,
            delta,
        })
    }

    /// Run every column group in order and collect the builder's OPRF outputs.
    ///
    /// `schedule` must already have handed out the transform key.
    pub fn build<C: AbstractChannel>(
        &self,
        values: &[Block],
        schedule: &mut CommonKeySchedule,
        channel: &mut C,
    ) -> Result<OprfOutputs> {
        let mut outputs = OprfOutputs::new(self.params.width(), values.len());

        for group in self.params.column_groups() {
            let cipher = schedule.next_cipher();
            let built = self.process_group(&group, &cipher, values, channel)?;
            outputs.accumulate(&group, &built.matrix_a, &built.locations);
            debug!("matrix builder: columns {:?} sent", group.columns());
        }

        Ok(outputs)
    }
}
