//! Module about tcp channel. See [TcpStream].
//! The receiving party of the protocol listens, the sending party connects and retries until the listener is up.

use anyhow::{bail, Context, Result};
use log::debug;
use scuttlebutt::SyncChannel;
use std::io::{BufReader, BufWriter};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::thread::sleep;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Tcp stream channel.
pub type TcpSyncChannel = SyncChannel<BufReader<TcpStream>, BufWriter<TcpStream>>;

fn wrap(stream: TcpStream) -> Result<TcpSyncChannel> {
    stream
        .set_nodelay(true)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    let reader = stream
        .try_clone()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    Ok(SyncChannel::new(
        BufReader::new(reader),
        BufWriter::new(stream),
    ))
}

/// Bind `addr` and wait for one peer.
pub fn listen<A: ToSocketAddrs + std::fmt::Debug>(addr: A) -> Result<TcpSyncChannel> {
    let listener =
        TcpListener::bind(&addr).with_context(|| format!("addr={:?} @{}:{}", addr, file!(), line!()))?;
    let (stream, peer) = listener
        .accept()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    debug!("accepted connection from {}", peer);

    wrap(stream)
}

/// Connect to `addr`, retrying until the peer listens or the timeout expires.
pub fn connect<A: ToSocketAddrs + std::fmt::Debug>(addr: A) -> Result<TcpSyncChannel> {
    let start = Instant::now();
    loop {
        match TcpStream::connect(&addr) {
            Ok(stream) => {
                debug!("connected to {:?}", addr);
                return wrap(stream);
            }
            Err(e) if start.elapsed() < TIMEOUT => {
                debug!("connect to {:?} failed ({}), retrying", addr, e);
                sleep(RETRY_INTERVAL);
            }
            Err(e) => bail!("could not connect to {:?}: {} @{}:{}", addr, e, file!(), line!()),
        }
    }
}

/// Create two connected tcp channels on `addr`, the first one being the listening side.
pub fn create_tcp_channel_pair(addr: &str) -> Result<(TcpSyncChannel, TcpSyncChannel)> {
    let listen_addr = addr.to_string();
    let handle = std::thread::spawn(move || listen(listen_addr));

    let right = connect(addr)?;
    let left = match handle.join() {
        Ok(res) => res?,
        Err(_) => bail!("listener thread panicked @{}:{}", file!(), line!()),
    };

    Ok((left, right))
}
