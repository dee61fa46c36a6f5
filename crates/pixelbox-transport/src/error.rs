/// Errors that can occur in device transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The Bluetooth address could not be parsed.
    #[error("invalid bluetooth address {input:?} (expected six colon-separated hex bytes)")]
    InvalidAddress { input: String },

    /// Creating the socket descriptor failed.
    #[error("failed to create socket: {0}")]
    Socket(std::io::Error),

    /// Failed to connect to the specified target.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport is not available on this platform.
    #[error("{0} transport is not supported on this platform")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, TransportError>;
