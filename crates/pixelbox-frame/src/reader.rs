use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::error::{FrameError, Result};

/// Bytes requested from the socket per read.
pub const READ_CHUNK_SIZE: usize = 128;

/// Reads raw chunks from any `Read` stream.
///
/// The device flushes whole envelopes per RFCOMM packet, so each chunk is
/// handed on as-is; no reassembly happens at this layer.
pub struct ChunkReader<T> {
    inner: T,
    chunk_size: usize,
}

impl<T: Read> ChunkReader<T> {
    /// Create a new chunk reader using [`READ_CHUNK_SIZE`].
    pub fn new(inner: T) -> Self {
        Self::with_chunk_size(inner, READ_CHUNK_SIZE)
    }

    /// Create a new chunk reader with an explicit chunk size.
    pub fn with_chunk_size(inner: T, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Read the next chunk of up to `chunk_size` bytes (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_chunk(&mut self) -> Result<Bytes> {
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => {
                    chunk.truncate(n);
                    return Ok(Bytes::from(chunk));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Configured chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
