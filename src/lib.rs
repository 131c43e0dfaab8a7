//! # Matrix OPRF based two-party PSI
//!
//! Two parties, each holding a set of 128-bit items, learn how many items they share. The party called
//! [psi::Receiver] learns the size of the intersection (and which of its items are in it), the
//! [psi::Sender] learns nothing.
//!
//! The protocol is built on an oblivious pseudorandom function evaluated through a random binary matrix:
//! the receiver builds the matrix as the sender of a random OT extension, the sender reconstructs its view
//! of it as the OT receiver, and both derive a `width`-bit output for each of their items. See [oprf].
//!
//! [psi] is the main module of this library.
#![warn(missing_docs)]

pub mod channel_utils;
pub mod cli_utils;
pub mod errors;
mod hash_utils;
pub mod intersection;
pub mod location;
pub mod matrix;
pub mod oprf;
pub mod params;
pub mod psi;
pub mod set_utils;
pub mod transform;
