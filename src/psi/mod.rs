//! Two-party PSI built on the matrix OPRF.
//!
//! [Receiver] builds the matrix as the OT extension sender and learns the intersection.
//! [Sender] reconstructs its share of the matrix as the OT extension receiver and streams digests.
//! Both run [PsiParams::exchange] first, so a party started with different parameters fails fast.

use crate::errors::PsiError;
use crate::intersection::{stream_digests, DigestIndex, Intersection};
use crate::oprf::{MatrixBuilder, MatrixReconstructor};
use crate::params::{LocalConfig, PsiParams};
use crate::transform::{canonical_transform, CommonKeySchedule};
use anyhow::{Context, Error};
use log::info;
use ocelot::ot::{
    AlszReceiver, AlszSender, RandomReceiver as OtRandomReceiver, RandomSender as OtRandomSender,
    Receiver as OtReceiver, Sender as OtSender,
};
use rand::{CryptoRng, Rng};
use scuttlebutt::{AbstractChannel, Block};
use std::marker::PhantomData;
use std::time::Instant;

mod bin;
pub use bin::run;

/// The party learning the intersection. Plays the OT extension sender.
pub struct Receiver<OT = AlszSender>
where
    OT: OtSender<Msg = Block> + OtRandomSender,
{
    params: PsiParams,
    config: LocalConfig,
    seeds: Vec<(Block, Block)>,
    _ot: PhantomData<OT>,
}

impl<OT> Receiver<OT>
where
    OT: OtSender<Msg = Block> + OtRandomSender,
{
    /// Parameter handshake, base OTs and one random OT per matrix column.
    pub fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        params: &PsiParams,
        config: &LocalConfig,
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let start = Instant::now();

        params
            .exchange(channel)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        let mut ot = OT::init(channel, rng).with_context(|| format!("@{}:{}", file!(), line!()))?;
        let seeds = ot
            .send_random(channel, params.width(), rng)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        info!("receiver: base OT done in {:?}", start.elapsed());

        Ok(Self {
            params: *params,
            config: *config,
            seeds,
            _ot: PhantomData,
        })
    }

    /// Build and send the matrix, then match the sender's digests against ours.
    pub fn receive<C: AbstractChannel>(
        self,
        inputs: &[Block],
        channel: &mut C,
    ) -> Result<Intersection, Error> {
        if inputs.len() != self.params.receiver_size() {
            return Err(PsiError::SetSizeMismatch {
                expected: self.params.receiver_size(),
                actual: inputs.len(),
            }
            .into());
        }

        let start = Instant::now();
        let mut schedule = CommonKeySchedule::new(self.params.common_seed());
        let transformed = canonical_transform(inputs, &schedule.next_cipher())?;
        info!("receiver: canonical transform done in {:?}", start.elapsed());

        let start = Instant::now();
        let builder = MatrixBuilder::new(&self.params, &self.config, &self.seeds)?;
        let outputs = builder
            .build(&transformed.transformed_values, &mut schedule, channel)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        info!("receiver: matrix sent in {:?}", start.elapsed());

        let start = Instant::now();
        let index = DigestIndex::build(&outputs, self.params.hash_length(), self.config.digest_tile)?;
        let res = index
            .match_stream(channel, self.params.sender_size(), self.config.digest_tile)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        info!(
            "receiver: {} matches found in {:?}",
            res.size,
            start.elapsed()
        );

        Ok(res)
    }
}

/// The party streaming digests. Plays the OT extension receiver and learns nothing.
pub struct Sender<OT = AlszReceiver>
where
    OT: OtReceiver<Msg = Block> + OtRandomReceiver,
{
    params: PsiParams,
    config: LocalConfig,
    choices: Vec<bool>,
    seeds: Vec<Block>,
    _ot: PhantomData<OT>,
}

impl<OT> Sender<OT>
where
    OT: OtReceiver<Msg = Block> + OtRandomReceiver,
{
    /// Parameter handshake, base OTs and one random OT per matrix column with random choice bits.
    pub fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        params: &PsiParams,
        config: &LocalConfig,
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let start = Instant::now();

        params
            .exchange(channel)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        let choices = (0..params.width())
            .map(|_| rng.gen::<bool>())
            .collect::<Vec<_>>();

        let mut ot = OT::init(channel, rng).with_context(|| format!("@{}:{}", file!(), line!()))?;
        let seeds = ot
            .receive_random(channel, &choices, rng)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        info!("sender: base OT done in {:?}", start.elapsed());

        Ok(Self {
            params: *params,
            config: *config,
            choices,
            seeds,
            _ot: PhantomData,
        })
    }

    /// Rebuild our side of the matrix and send the digests of our OPRF outputs.
    pub fn send<C: AbstractChannel>(self, inputs: &[Block], channel: &mut C) -> Result<(), Error> {
        if inputs.len() != self.params.sender_size() {
            return Err(PsiError::SetSizeMismatch {
                expected: self.params.sender_size(),
                actual: inputs.len(),
            }
            .into());
        }

        let start = Instant::now();
        let mut schedule = CommonKeySchedule::new(self.params.common_seed());
        let transformed = canonical_transform(inputs, &schedule.next_cipher())?;
        info!("sender: canonical transform done in {:?}", start.elapsed());

        let start = Instant::now();
        let reconstructor =
            MatrixReconstructor::new(&self.params, &self.config, &self.seeds, &self.choices)?;
        let outputs = reconstructor
            .build(&transformed.transformed_values, &mut schedule, channel)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        info!("sender: matrix received in {:?}", start.elapsed());

        let start = Instant::now();
        stream_digests(
            &outputs,
            channel,
            self.params.hash_length(),
            self.config.digest_tile,
        )
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
        info!("sender: digests sent in {:?}", start.elapsed());

        Ok(())
    }
}
