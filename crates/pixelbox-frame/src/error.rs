/// Errors that can occur during envelope encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The envelope does not start with the prefix byte.
    #[error("envelope at offset {offset}: expected prefix 0x01, found {found:#04x}")]
    InvalidPrefix { offset: usize, found: u8 },

    /// The envelope does not end with the postfix byte.
    #[error("envelope at offset {offset}: expected postfix 0x02, found {found:#04x}")]
    InvalidPostfix { offset: usize, found: u8 },

    /// The transmitted checksum does not match the envelope contents.
    #[error("envelope at offset {offset}: invalid checksum, expected {expected}, got {found}")]
    ChecksumMismatch {
        offset: usize,
        expected: u16,
        found: u16,
    },

    /// The length field points past the end of the buffer.
    #[error("envelope at offset {offset}: truncated ({needed} bytes needed, {available} available)")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The length field is too small to cover its own two bytes.
    #[error("envelope at offset {offset}: invalid length field {length}")]
    InvalidLength { offset: usize, length: u16 },

    /// The payload does not fit the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing envelopes.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed by the device.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
