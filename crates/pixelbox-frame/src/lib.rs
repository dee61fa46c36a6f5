//! Checksummed envelope framing for the Pixelbox serial protocol.
//!
//! Every message on the wire, in either direction, is wrapped as:
//! - A `0x01` prefix byte
//! - A 2-byte little-endian length (payload length + 2)
//! - The payload
//! - A 2-byte little-endian checksum over the length bytes and the payload
//! - A `0x02` postfix byte
//!
//! The device delivers whole envelopes back to back; [`unwrap`] splits a
//! received buffer into payloads and rejects the whole batch on any fault.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    checksum, unwrap, unwrap_partial, wrap, PartialUnwrap, ENVELOPE_OVERHEAD, MAX_PAYLOAD,
    POSTFIX, PREFIX,
};
pub use error::{FrameError, Result};
pub use reader::{ChunkReader, READ_CHUNK_SIZE};
pub use writer::EnvelopeWriter;
