use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::{FrameError, Result};

/// First byte of every envelope.
pub const PREFIX: u8 = 0x01;

/// Last byte of every envelope.
pub const POSTFIX: u8 = 0x02;

/// Bytes added around a payload: prefix (1) + length (2) + checksum (2) + postfix (1).
pub const ENVELOPE_OVERHEAD: usize = 6;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize - 2;

/// 16-bit wrapping sum of all bytes.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, b| sum.wrapping_add(u16::from(*b)))
}

/// Wrap a command payload in an envelope.
///
/// Wire format:
/// ```text
/// ┌────────┬────────────┬──────────────────┬────────────┬─────────┐
/// │ Prefix │ Length     │ Payload          │ Checksum   │ Postfix │
/// │ 0x01   │ (2B LE)    │ (Length-2 bytes) │ (2B LE)    │ 0x02    │
/// └────────┴────────────┴──────────────────┴────────────┴─────────┘
/// ```
///
/// `Length` counts itself plus the payload; the checksum covers the same
/// region. Payloads above [`MAX_PAYLOAD`] cannot be represented and wrap
/// the length field; every command this crate family builds is far below it.
pub fn wrap(payload: &[u8]) -> Vec<u8> {
    let length = (payload.len() + 2) as u16;

    let mut dst = BytesMut::with_capacity(payload.len() + ENVELOPE_OVERHEAD);
    dst.put_u8(PREFIX);
    dst.put_u16_le(length);
    dst.put_slice(payload);
    let sum = checksum(&dst[1..]);
    dst.put_u16_le(sum);
    dst.put_u8(POSTFIX);
    dst.to_vec()
}

/// Unwrap one or more back-to-back envelopes.
///
/// The buffer must hold complete envelopes only; there is no partial-frame
/// buffering. Returned payloads exclude the two length bytes. Any bad
/// prefix, postfix, checksum or truncated envelope fails the whole batch.
pub fn unwrap(src: &[u8]) -> Result<Vec<Bytes>> {
    let buf = Bytes::copy_from_slice(src);
    let mut payloads = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        let (payload, next) = unwrap_one(&buf, offset)?;
        payloads.push(payload);
        offset = next;
    }
    debug!(count = payloads.len(), bytes = buf.len(), "unwrapped envelopes");
    Ok(payloads)
}

/// Result of [`unwrap_partial`].
#[derive(Debug)]
pub struct PartialUnwrap {
    /// Payloads decoded before the first failure, in order.
    pub payloads: Vec<Bytes>,
    /// The failure that stopped decoding, if any.
    pub error: Option<FrameError>,
}

/// Like [`unwrap`], but keeps the payloads decoded before the first failure.
///
/// Decoding still stops at the first bad envelope: once framing is lost
/// there is no reliable way to find the next prefix.
pub fn unwrap_partial(src: &[u8]) -> PartialUnwrap {
    let buf = Bytes::copy_from_slice(src);
    let mut payloads = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        match unwrap_one(&buf, offset) {
            Ok((payload, next)) => {
                payloads.push(payload);
                offset = next;
            }
            Err(err) => {
                return PartialUnwrap {
                    payloads,
                    error: Some(err),
                }
            }
        }
    }
    PartialUnwrap {
        payloads,
        error: None,
    }
}

/// Decode the envelope starting at `offset`; returns the payload and the
/// offset just past the envelope.
fn unwrap_one(buf: &Bytes, offset: usize) -> Result<(Bytes, usize)> {
    if buf[offset] != PREFIX {
        return Err(FrameError::InvalidPrefix {
            offset,
            found: buf[offset],
        });
    }

    let truncated = |needed: usize| FrameError::Truncated {
        offset,
        needed,
        available: buf.len() - offset,
    };

    if buf.len() < offset + 3 {
        return Err(truncated(3));
    }
    let length = u16::from_le_bytes([buf[offset + 1], buf[offset + 2]]);
    if length < 2 {
        return Err(FrameError::InvalidLength { offset, length });
    }

    let checksum_index = offset + 1 + usize::from(length);
    let end_index = checksum_index + 2;
    if end_index >= buf.len() {
        return Err(truncated(end_index + 1 - offset));
    }

    if buf[end_index] != POSTFIX {
        return Err(FrameError::InvalidPostfix {
            offset,
            found: buf[end_index],
        });
    }

    let found = u16::from_le_bytes([buf[checksum_index], buf[checksum_index + 1]]);
    let expected = checksum(&buf[offset + 1..checksum_index]);
    if found != expected {
        return Err(FrameError::ChecksumMismatch {
            offset,
            expected,
            found,
        });
    }

    Ok((buf.slice(offset + 3..checksum_index), end_index + 1))
}
