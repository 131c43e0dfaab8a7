use crate::channel_utils::tcp_channel::{connect, listen};
use crate::channel_utils::CountingChannel;
use crate::cli_utils::{create_channel_pair, Args, ChannelUnion, Role};
use crate::params::{LocalConfig, PsiParams};
use crate::psi::{Receiver, Sender};
use crate::set_utils::{demo_receiver_set, demo_sender_set};
use anyhow::{bail, Context, Result};
use log::info;
use ocelot::ot::{AlszReceiver, AlszSender};
use scuttlebutt::AesRng;
use std::fmt::Display;
use std::time::{Duration, Instant};

/// What a party observed during one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Party the report is about.
    pub role: Role,
    /// Intersection size, known to the receiver only.
    pub intersection_size: Option<usize>,
    /// Size of the intersection planted in the demo sets.
    pub expected_size: usize,
    /// Handshake and OT time.
    pub setup_time: Duration,
    /// Time from the first matrix column to the last digest.
    pub online_time: Duration,
    /// Bytes written by the party.
    pub bytes_sent: usize,
    /// Bytes read by the party.
    pub bytes_received: usize,
}

fn megabytes(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

impl Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "role: {}", self.role)?;
        if let Some(size) = self.intersection_size {
            writeln!(
                f,
                "intersection size: {} (expected {}, {})",
                size,
                self.expected_size,
                if size == self.expected_size {
                    "ok"
                } else {
                    "MISMATCH"
                }
            )?;
        }
        writeln!(f, "setup time: {:?}", self.setup_time)?;
        writeln!(f, "online time: {:?}", self.online_time)?;
        write!(
            f,
            "communication: {:.3} MB sent, {:.3} MB received",
            megabytes(self.bytes_sent),
            megabytes(self.bytes_received)
        )
    }
}

fn run_receiver(
    params: PsiParams,
    config: LocalConfig,
    channel: ChannelUnion,
    common_size: usize,
) -> Result<RunReport> {
    let set = demo_receiver_set(params.receiver_size(), common_size);
    info!("receiver: {} items prepared", set.len());

    let mut channel = CountingChannel::new(channel);
    let mut rng = AesRng::new();

    let start = Instant::now();
    let receiver = Receiver::<AlszSender>::init(&params, &config, &mut channel, &mut rng)
        .with_context(|| "Failed to set up the receiver.")?;
    let setup_time = start.elapsed();

    let start = Instant::now();
    let res = receiver
        .receive(&set, &mut channel)
        .with_context(|| "Failed to run the receiver.")?;
    let online_time = start.elapsed();

    Ok(RunReport {
        role: Role::Receiver,
        intersection_size: Some(res.size),
        expected_size: common_size
            .min(params.receiver_size())
            .min(params.sender_size()),
        setup_time,
        online_time,
        bytes_sent: channel.bytes_written(),
        bytes_received: channel.bytes_read(),
    })
}

fn run_sender(
    params: PsiParams,
    config: LocalConfig,
    channel: ChannelUnion,
    common_size: usize,
) -> Result<RunReport> {
    let set = demo_sender_set(params.sender_size());
    info!("sender: {} items prepared", set.len());

    let mut channel = CountingChannel::new(channel);
    let mut rng = AesRng::new();

    let start = Instant::now();
    let sender = Sender::<AlszReceiver>::init(&params, &config, &mut channel, &mut rng)
        .with_context(|| "Failed to set up the sender.")?;
    let setup_time = start.elapsed();

    let start = Instant::now();
    sender
        .send(&set, &mut channel)
        .with_context(|| "Failed to run the sender.")?;
    let online_time = start.elapsed();

    Ok(RunReport {
        role: Role::Sender,
        intersection_size: None,
        expected_size: common_size
            .min(params.receiver_size())
            .min(params.sender_size()),
        setup_time,
        online_time,
        bytes_sent: channel.bytes_written(),
        bytes_received: channel.bytes_read(),
    })
}

/// Run the party selected by `args.role` on the demo sets.
///
/// With [Role::Both] the sender runs on its own thread and the receiver's report is returned.
pub fn run(args: Args) -> Result<RunReport> {
    let Some(role) = args.role else {
        bail!("no role given @{}:{}", file!(), line!());
    };

    let params = args.params()?;
    let config = args.local_config()?;
    let common_size = args.common_size;

    match role {
        Role::Receiver => {
            info!("receiver: listening on {}", args.address);
            let channel = listen(args.address.as_str())?;
            run_receiver(params, config, ChannelUnion::Tcp(channel), common_size)
        }
        Role::Sender => {
            info!("sender: connecting to {}", args.address);
            let channel = connect(args.address.as_str())?;
            run_sender(params, config, ChannelUnion::Tcp(channel), common_size)
        }
        Role::Both => {
            let (r_channel, s_channel) = create_channel_pair(args.channel_type, &args.address)
                .with_context(|| "Failed to create channels.")?;
            info!("{} channels prepared", args.channel_type);

            let handle =
                std::thread::spawn(move || run_sender(params, config, s_channel, common_size));
            let report = run_receiver(params, config, r_channel, common_size)?;

            match handle.join() {
                Ok(res) => {
                    res?;
                }
                Err(_) => bail!("sender thread panicked @{}:{}", file!(), line!()),
            }

            Ok(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_run_both() {
        for channel in ["unix", "crossbeam"] {
            let args = Args::parse_from([
                "psi", "--role", "both", "--ss", "10", "--rs", "9", "-w", "128", "--log-height", "12",
                "-m", "100", "-c", channel,
            ]);
            let report = run(args).unwrap();
            assert_eq!(report.role, Role::Receiver);
            assert_eq!(report.intersection_size, Some(100));
            assert_eq!(report.expected_size, 100);
            assert!(report.to_string().contains("ok"));
        }
    }

    #[test]
    fn test_run_receiver_and_sender_over_tcp() {
        let args = Args::parse_from([
            "psi", "--ss", "9", "--rs", "10", "-w", "96", "--log-height", "11", "-m", "1000",
            "-a", "127.0.0.1:12399",
        ]);

        let mut s_args = args.clone();
        s_args.role = Some(Role::Sender);
        let handle = std::thread::spawn(move || run(s_args).unwrap());

        let mut r_args = args;
        r_args.role = Some(Role::Receiver);
        let report = run(r_args).unwrap();

        // the planted intersection is capped by the smaller set
        assert_eq!(report.intersection_size, Some(512));
        assert_eq!(report.expected_size, 512);

        let s_report = handle.join().unwrap();
        assert_eq!(s_report.intersection_size, None);
        assert_eq!(s_report.bytes_sent, report.bytes_received);
        assert_eq!(s_report.bytes_received, report.bytes_sent);
    }

    #[test]
    fn test_run_without_role() {
        assert!(run(Args::parse_from(["psi"])).is_err());
    }
}
