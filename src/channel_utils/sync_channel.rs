//! Module about unix domain socket channel. See [UnixStream].
//! This module provides a function to create a connected pair of unix domain socket channels for the two parties.

use anyhow::{Context, Result};
use scuttlebutt::SyncChannel;
use std::{
    io::{BufReader, BufWriter},
    os::unix::net::UnixStream,
};

/// Unix domain socket channel.
pub type UnixSyncChannel = SyncChannel<BufReader<UnixStream>, BufWriter<UnixStream>>;

fn wrap(stream: UnixStream) -> Result<UnixSyncChannel> {
    let reader = stream
        .try_clone()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    Ok(SyncChannel::new(
        BufReader::new(reader),
        BufWriter::new(stream),
    ))
}

/// Create two connected unix domain socket channels. See [UnixStream].
pub fn create_unix_channel_pair() -> Result<(UnixSyncChannel, UnixSyncChannel)> {
    let (left, right) = UnixStream::pair().with_context(|| format!("@{}:{}", file!(), line!()))?;

    Ok((wrap(left)?, wrap(right)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttlebutt::AbstractChannel;

    #[test]
    fn test_pair() {
        let (mut left, mut right) = create_unix_channel_pair().unwrap();

        let handle = std::thread::spawn(move || {
            let n = right.read_u32().unwrap();
            right.write_u32(n * 2).unwrap();
            right.flush().unwrap();
        });

        left.write_u32(123).unwrap();
        left.flush().unwrap();
        assert_eq!(left.read_u32().unwrap(), 246);

        handle.join().unwrap();
    }
}
