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

/// `C` of one column group on the reconstructing side.
pub struct ReconstructedGroup {
    /// Row locations of the reconstructor's items.
    pub locations: LocationTable,
    /// `C[col] = A[col]` or `A[col] ^ Δ[col]` depending on the column's choice bit.
    pub matrix_c: BitMatrix,
}

/// Receives the masked columns and recovers `C`, one column group at a time.
pub struct MatrixReconstructor {
    params: PsiParams,
    config: LocalConfig,
    seeds: Vec<Block>,
    choices: Vec<bool>,
}

impl MatrixReconstructor {
    /// `seeds` are the random OT receiver outputs for the choice bits `choices`, one per column.
    pub fn new(
        params: &PsiParams,
        config: &LocalConfig,
        seeds: &[Block],
        choices: &[bool],
    ) -> Result<Self> {
        for actual in [seeds.len(), choices.len()] {
            if actual != params.width() {
                return Err(PsiError::OtOutputLength {
                    expected: params.width(),
                    actual,
                }
                .into());
            }
        }

        Ok(Self {
            params: *params,
            config: *config,
            seeds: seeds.to_vec(),
            choices: choices.to_vec(),
        })
    }

    /// Handle one column group: derive locations, read `T` and rebuild `C`.
    ///
    /// `T` is read for every column, whatever the choice bit, to stay in step with the builder.
    pub fn process_group<C: AbstractChannel>(
        &self,
        group: &ColumnGroup,
        cipher: &Aes128,
        values: &[Block],
        channel: &mut C,
    ) -> Result<ReconstructedGroup> {
        let locations = LocationTable::compute(
            &self.params,
            group,
            cipher,
            values,
            self.config.location_tile,
            self.config.threads,
        )?;

        let mut matrix_c = BitMatrix::new(group.len, self.params.height());
        let mut t = vec![0u8; self.params.height_in_bytes()];
        for (i, c) in group.columns().enumerate() {
            channel
                .read_bytes(&mut t)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;

            let column = matrix_c.column_mut(i);
            AesRng::from_seed(self.seeds[c]).fill_bytes(column);
            if self.choices[c] {
                xor_inplace(column, &t);
            }
        }

        Ok(ReconstructedGroup {
            locations,
            matrix_c,
        })
    }

    /// Run every column group in order and collect the reconstructor's OPRF outputs.
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
            let rebuilt = self.process_group(&group, &cipher, values, channel)?;
            outputs.accumulate(&group, &rebuilt.matrix_c, &rebuilt.locations);
            debug!("matrix reconstructor: columns {:?} received", group.columns());
        }

        Ok(outputs)
    }
}
