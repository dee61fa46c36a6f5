/// Errors that can occur while talking to a device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] pixelbox_transport::TransportError),

    /// Frame-level error, including write failures.
    #[error("frame error: {0}")]
    Frame(#[from] pixelbox_frame::FrameError),

    /// The connection is not active; nothing was written.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called on a connection that is already up.
    #[error("already connected")]
    AlreadyConnected,

    /// Thread or OS-level I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
