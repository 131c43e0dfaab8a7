use crossbeam::channel::{unbounded, Receiver, SendError, Sender};
use std::io::{Error, ErrorKind, Read, Result, Write};

/// Writing end of an in-process byte pipe. Every write is sent as one chunk.
pub struct CrossbeamSender(Sender<Vec<u8>>);

/// Reading end of an in-process byte pipe.
pub struct CrossbeamReceiver {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl Write for CrossbeamSender {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if let Err(SendError(_)) = self.0.send(buf.to_vec()) {
            return Err(Error::new(ErrorKind::BrokenPipe, "receiver dropped"));
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Read for CrossbeamReceiver {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        // blocks until the peer writes, EOF once it hangs up
        while self.pos == self.pending.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;

        Ok(n)
    }
}

/// Create a connected pipe.
pub fn cbch_pair() -> (CrossbeamSender, CrossbeamReceiver) {
    let (s, r) = unbounded();
    (
        CrossbeamSender(s),
        CrossbeamReceiver {
            rx: r,
            pending: Vec::new(),
            pos: 0,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttlebutt::{AbstractChannel, SyncChannel};

    #[test]
    fn test() {
        let (mut s1, mut r1) = cbch_pair();

        let handle = std::thread::spawn(move || {
            let mut v = vec![0u8; 3];
            r1.read_exact(&mut v).unwrap();
            assert_eq!(v, [1, 2, 3]);
        });

        let v = [1, 2, 3];
        s1.write_all(&v).unwrap();

        handle.join().unwrap();
    }

    #[test]
    fn test_reads_across_chunks() {
        let (mut s1, mut r1) = cbch_pair();

        s1.write_all(&[1, 2]).unwrap();
        s1.write_all(&[3, 4, 5]).unwrap();
        s1.write_all(&[6]).unwrap();

        let mut v = vec![0u8; 4];
        r1.read_exact(&mut v).unwrap();
        assert_eq!(v, [1, 2, 3, 4]);

        let mut v = vec![0u8; 2];
        r1.read_exact(&mut v).unwrap();
        assert_eq!(v, [5, 6]);
    }

    #[test]
    fn test_slow_writer() {
        let (mut s1, mut r1) = cbch_pair();

        let handle = std::thread::spawn(move || {
            let mut v = vec![0u8; 4];
            r1.read_exact(&mut v).unwrap();
            assert_eq!(v, [1, 2, 3, 4]);
        });

        s1.write_all(&[1, 2]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(300));
        s1.write_all(&[3, 4]).unwrap();

        handle.join().unwrap();
    }

    #[test]
    fn test_eof_after_hang_up() {
        let (mut s1, mut r1) = cbch_pair();

        let handle = std::thread::spawn(move || {
            let mut v = vec![0u8; 3];
            r1.read_exact(&mut v).unwrap();
            assert_eq!(v, [1, 2, 3]);

            let mut v = vec![0u8; 3];
            let e = r1.read_exact(&mut v).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::UnexpectedEof);
            assert_eq!(r1.read(&mut v).unwrap(), 0);
        });

        let v = [1, 2, 3];
        s1.write_all(&v).unwrap();
        drop(s1);

        handle.join().unwrap();
    }

    #[test]
    fn test_broken_pipe() {
        let (mut s1, r1) = cbch_pair();
        drop(r1);

        let e = s1.write_all(&[1, 2, 3]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_channel() {
        let (s1, r1) = cbch_pair();
        let (s2, r2) = cbch_pair();
        let mut ch1 = SyncChannel::new(r1, s2);
        let mut ch2 = SyncChannel::new(r2, s1);

        let handle = std::thread::spawn(move || {
            let n = ch1.read_u32().unwrap();
            assert_eq!(n, 123);
            ch1.write_u32(n * 2).unwrap();
        });

        let n = 123;
        ch2.write_u32(n).unwrap();
        let n = ch2.read_u32().unwrap();
        assert_eq!(n, 246);

        handle.join().unwrap();
    }
}
