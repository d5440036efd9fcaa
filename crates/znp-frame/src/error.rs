/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the MT length limit.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The frame check sequence did not match the frame contents.
    #[error("frame checksum mismatch (computed {computed:#04x}, received {received:#04x})")]
    ChecksumMismatch { computed: u8, received: u8 },

    /// CMD0 carried a command type outside the MT range.
    #[error("unknown command type {0}")]
    UnknownCommandType(u8),

    /// CMD0 carried an unknown subsystem id.
    #[error("unknown subsystem {0:#04x}")]
    UnknownSubsystem(u8),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether the stream is still usable after this error.
    ///
    /// Malformed frames are consumed by the decoder, so reading can resume
    /// at the next start-of-frame byte.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PayloadTooLarge { .. }
                | Self::ChecksumMismatch { .. }
                | Self::UnknownCommandType(_)
                | Self::UnknownSubsystem(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
