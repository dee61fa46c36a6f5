use std::io::{ErrorKind, Write};

use tracing::trace;

use crate::codec::{wrap, MAX_PAYLOAD};
use crate::error::{FrameError, Result};

/// Writes envelopes to any `Write` stream.
pub struct EnvelopeWriter<T> {
    inner: T,
}

impl<T: Write> EnvelopeWriter<T> {
    /// Create a new envelope writer.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Wrap a raw command payload and send it (blocking).
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        self.write_wrapped(&wrap(payload))
    }

    /// Send bytes that are already envelope-wrapped (blocking).
    ///
    /// Command builders return wrapped bytes, and an animation is several
    /// envelopes back to back; both go out unchanged.
    pub fn write_wrapped(&mut self, wire: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < wire.len() {
            match self.inner.write(&wire[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        trace!(bytes = wire.len(), "wrote envelope bytes");

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
