//! CLI (CommandLine Interface) utilities for the `psi` binary.
//!
//! Here, you can know the options for the protocol through enum types and structs.
//! See other modules for the actual implementation of the protocol or details of what options mean.

use crate::channel_utils::sync_channel::{create_unix_channel_pair, UnixSyncChannel};
use crate::channel_utils::sync_channel_by_cb::{create_crossbeam_channel_pair, CrossbeamChannel};
use crate::channel_utils::tcp_channel::{create_tcp_channel_pair, TcpSyncChannel};
use crate::params::{LocalConfig, PsiParams};
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use scuttlebutt::{AbstractChannel, Block};
use std::fmt::Display;

/// Largest accepted `--ss`/`--rs`.
pub const MAX_LOG_SET_SIZE: usize = 40;

/// Which party to run.
#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum Role {
    /// Build the matrix and learn the intersection. Listens on the address.
    Receiver,
    /// Stream digests. Connects to the address.
    Sender,
    /// Run both parties in this process, over the channel selected with `--channel`.
    Both,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Receiver => write!(f, "receiver"),
            Role::Sender => write!(f, "sender"),
            Role::Both => write!(f, "both"),
        }
    }
}

/// Channel types. Channels are used to communicate between parties. More details: [channel_utils](crate::channel_utils).
#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum ChannelType {
    /// Unix domain socket. See [std::os::unix::net::UnixStream].
    Unix,
    /// TCP socket. See [std::net::TcpStream].
    Tcp,
    /// Native channel of Rust. See [crossbeam].
    #[value(name = "crossbeam")]
    CrossBeam,
}

impl Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Unix => write!(f, "unix"),
            ChannelType::Tcp => write!(f, "tcp"),
            ChannelType::CrossBeam => write!(f, "crossbeam"),
        }
    }
}

/// Arguments for the PSI protocol.
/// This struct implements [clap::Parser] to make that this binary has CommandLine Arguments.
///
/// Without `--role` the usage is printed.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, next_line_help = true)]
pub struct Args {
    /// Party to run.
    #[arg(short = 'r', long)]
    pub role: Option<Role>,

    /// log2 of the number of elements on the sender side.
    #[arg(long = "ss", default_value_t = 20)]
    pub sender_log_size: usize,

    /// log2 of the number of elements on the receiver side.
    #[arg(long = "rs", default_value_t = 20)]
    pub receiver_log_size: usize,

    /// Width of the matrix, i.e. bits of every OPRF output.
    #[arg(short = 'w', long, default_value_t = 632)]
    pub width: usize,

    /// log2 of the height of the matrix.
    #[arg(long = "log-height", default_value_t = 20)]
    pub log_height: usize,

    /// Hash output length in bytes.
    #[arg(long = "hash", default_value_t = 10)]
    pub hash_length: usize,

    /// Address the receiver listens on and the sender connects to.
    #[arg(short = 'a', long, default_value = "127.0.0.1:12345")]
    pub address: String,

    /// Channel type used with `--role both`. A lone receiver or sender always uses TCP.
    #[arg(short = 'c', long = "channel", default_value_t = ChannelType::Unix)]
    pub channel_type: ChannelType,

    /// Number of elements planted in both demo sets.
    #[arg(short = 'm', long, default_value_t = 100)]
    pub common_size: usize,

    /// Public seed of the key schedule. Both parties must use the same one.
    #[arg(long, default_value_t = 123456)]
    pub seed: u128,

    /// Items per batch when deriving locations and hashing outputs.
    #[arg(long, default_value_t = 256)]
    pub tile: usize,

    /// Worker threads deriving row locations.
    #[arg(long, default_value_t = 1)]
    pub threads: usize,
}

impl Args {
    /// Protocol parameters described by the arguments.
    pub fn params(&self) -> Result<PsiParams> {
        for (name, v) in [("ss", self.sender_log_size), ("rs", self.receiver_log_size)] {
            if v > MAX_LOG_SET_SIZE {
                bail!(
                    "--{} (={}) > {} @{}:{}",
                    name,
                    v,
                    MAX_LOG_SET_SIZE,
                    file!(),
                    line!()
                );
            }
        }

        Ok(PsiParams::new(
            1 << self.sender_log_size,
            1 << self.receiver_log_size,
            self.log_height,
            self.width,
            self.hash_length,
            Block::from(self.seed),
        )?)
    }

    /// Local scheduling knobs described by the arguments.
    pub fn local_config(&self) -> Result<LocalConfig> {
        Ok(LocalConfig::new(self.tile, self.tile, self.threads)?)
    }
}

/// Enum type to handle multiple channel types on runtime. Please ignore it :)
pub enum ChannelUnion {
    /// Unix domain socket.
    Unix(UnixSyncChannel),
    /// TCP socket.
    Tcp(TcpSyncChannel),
    /// Native channel of Rust.
    CrossBeam(CrossbeamChannel),
}

use ChannelUnion::*;

impl AbstractChannel for ChannelUnion {
    #[inline(always)]
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            Unix(c) => c.write_bytes(bytes),
            Tcp(c) => c.write_bytes(bytes),
            CrossBeam(c) => c.write_bytes(bytes),
        }
    }

    #[inline(always)]
    fn read_bytes(&mut self, bytes: &mut [u8]) -> std::io::Result<()> {
        match self {
            Unix(c) => c.read_bytes(bytes),
            Tcp(c) => c.read_bytes(bytes),
            CrossBeam(c) => c.read_bytes(bytes),
        }
    }

    #[inline(always)]
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Unix(c) => c.flush(),
            Tcp(c) => c.flush(),
            CrossBeam(c) => c.flush(),
        }
    }

    #[inline(always)]
    fn clone(&self) -> Self {
        match self {
            Unix(c) => Unix(c.clone()),
            Tcp(c) => Tcp(c.clone()),
            CrossBeam(c) => CrossBeam(c.clone()),
        }
    }
}

/// Create two connected channels of the given type. Runtime utility.
///
/// `address` is only used by [ChannelType::Tcp].
pub fn create_channel_pair(type_: ChannelType, address: &str) -> Result<(ChannelUnion, ChannelUnion)> {
    match type_ {
        ChannelType::Unix => {
            let (l, r) = create_unix_channel_pair()?;
            Ok((Unix(l), Unix(r)))
        }
        ChannelType::Tcp => {
            let (l, r) = create_tcp_channel_pair(address)?;
            Ok((Tcp(l), Tcp(r)))
        }
        ChannelType::CrossBeam => {
            let (l, r) = create_crossbeam_channel_pair();
            Ok((CrossBeam(l), CrossBeam(r)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["psi"]);
        assert_eq!(args.role, None);
        assert_eq!(args.sender_log_size, 20);
        assert_eq!(args.receiver_log_size, 20);
        assert_eq!(args.width, 632);
        assert_eq!(args.log_height, 20);
        assert_eq!(args.hash_length, 10);
        assert_eq!(args.address, "127.0.0.1:12345");
        assert_eq!(args.common_size, 100);

        let params = args.params().unwrap();
        assert_eq!(params.sender_size(), 1 << 20);
        assert_eq!(params.common_seed(), Block::from(123456u128));
        assert_eq!(args.local_config().unwrap(), LocalConfig::default());
    }

    #[test]
    fn test_parse() {
        let args = Args::parse_from([
            "psi", "--role", "both", "--ss", "10", "--rs", "12", "-w", "128", "--log-height", "14",
            "--hash", "12", "-c", "crossbeam", "--tile", "64", "--threads", "4",
        ]);
        assert_eq!(args.role, Some(Role::Both));
        assert_eq!(args.channel_type, ChannelType::CrossBeam);

        let params = args.params().unwrap();
        assert_eq!(params.sender_size(), 1 << 10);
        assert_eq!(params.receiver_size(), 1 << 12);
        assert_eq!(params.height(), 1 << 14);
        assert_eq!(params.hash_length(), 12);
        assert_eq!(args.local_config().unwrap(), LocalConfig::new(64, 64, 4).unwrap());
    }

    #[test]
    fn test_invalid_args() {
        let args = Args::parse_from(["psi", "--hash", "40"]);
        assert!(args.params().is_err());

        let args = Args::parse_from(["psi", "--threads", "0"]);
        assert!(args.local_config().is_err());

        for flag in ["--ss", "--rs"] {
            let args = Args::parse_from(["psi", flag, "63"]);
            assert!(args.params().is_err());
            let args = Args::parse_from(["psi", flag, "41"]);
            assert!(args.params().is_err());
        }
        let args = Args::parse_from(["psi", "--ss", "40", "--rs", "40"]);
        assert_eq!(args.params().unwrap().sender_size(), 1 << 40);

        assert!(Args::try_parse_from(["psi", "--role", "nobody"]).is_err());
    }

    #[test]
    fn test_channel_pairs() {
        for type_ in [ChannelType::Unix, ChannelType::CrossBeam] {
            let (mut l, mut r) = create_channel_pair(type_, "").unwrap();
            let handle = std::thread::spawn(move || {
                let n = r.read_usize().unwrap();
                r.write_usize(n + 1).unwrap();
                r.flush().unwrap();
            });
            l.write_usize(41).unwrap();
            l.flush().unwrap();
            assert_eq!(l.read_usize().unwrap(), 42);
            handle.join().unwrap();
        }
    }
}
