use pixelbox_frame::FrameError;

/// Errors raised while building commands or decoding device messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The raster is not the fixed 16×16 size.
    #[error("image needs to be 16x16, got: {width}x{height}")]
    Dimension { width: usize, height: usize },

    /// Raw pixel data does not match the declared raster size.
    #[error("raster data has {len} bytes, expected {expected}")]
    RasterSize { len: usize, expected: usize },

    /// A numeric command argument is outside its accepted range.
    #[error("{field} should be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A named argument is not in its lookup table.
    #[error("invalid {kind} type {value:?}")]
    UnknownType { kind: &'static str, value: String },

    /// Animation frames and durations are not paired one to one.
    #[error("animation has {frames} frames but {durations} durations")]
    DurationMismatch { frames: usize, durations: usize },

    /// Palette and index data do not describe a valid image.
    #[error("corrupt image data: {reason}")]
    CorruptImage { reason: String },

    /// An incoming payload lacks the `0x04 .. 0x55` sub-header.
    #[error("received a message format I don't understand ({len} bytes)")]
    Malformed { len: usize },

    /// Envelope unwrapping failed.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
