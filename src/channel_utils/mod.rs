//! Channels between the two parties.
//!
//! Every transport here ends up as a [scuttlebutt::SyncChannel]; [CountingChannel] wraps any of them
//! to report how many bytes a party sent and received.

use scuttlebutt::AbstractChannel;
use std::io::Result;

pub mod sync_channel;
pub mod sync_channel_by_cb;
pub mod tcp_channel;

/// [AbstractChannel] that counts the bytes going through it.
pub struct CountingChannel<C: AbstractChannel> {
    inner: C,
    written: usize,
    read: usize,
}

impl<C: AbstractChannel> CountingChannel<C> {
    /// Start counting from zero.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            written: 0,
            read: 0,
        }
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    /// Bytes read so far.
    pub fn bytes_read(&self) -> usize {
        self.read
    }

    /// Reset both counters.
    pub fn reset(&mut self) {
        self.written = 0;
        self.read = 0;
    }
}

impl<C: AbstractChannel> AbstractChannel for CountingChannel<C> {
    #[inline]
    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        self.inner.read_bytes(bytes)?;
        self.read += bytes.len();
        Ok(())
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_bytes(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            written: self.written,
            read: self.read,
        }
    }
}
