//! Module about native channel of Rust. See [crossbeam].
//! This module provides in-process channels, for running both parties in one process.

use scuttlebutt::SyncChannel;
pub mod crossbeam_wrapper;
use crossbeam_wrapper::cbch_pair;
pub use crossbeam_wrapper::{CrossbeamReceiver, CrossbeamSender};

/// In-process channel.
pub type CrossbeamChannel = SyncChannel<CrossbeamReceiver, CrossbeamSender>;

/// Create two connected crossbeam channels.
pub fn create_crossbeam_channel_pair() -> (CrossbeamChannel, CrossbeamChannel) {
    let (sr, rl) = cbch_pair();
    let (sl, rr) = cbch_pair();
    let left = SyncChannel::new(rl, sl);
    let right = SyncChannel::new(rr, sr);

    (left, right)
}

/// Create a channel that reads back what it writes.
///
/// Handy for driving both sides of a one-directional exchange from one thread.
pub fn create_crossbeam_loopback() -> CrossbeamChannel {
    let (s, r) = cbch_pair();
    SyncChannel::new(r, s)
}
