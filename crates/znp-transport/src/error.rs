use std::path::PathBuf;

use znp_frame::FrameError;

/// Errors that can occur in ZNP transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open or configure the device at the specified path.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded for sending.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The transport has been shut down or the stream reached EOF.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
