use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_frame, Frame, FrameConfig, FCS_SIZE, HEADER_SIZE, MAX_PAYLOAD};
use crate::error::{FrameError, Result};

/// Blocking MT frame writer over any byte sink.
///
/// Each frame is encoded into a reused buffer and written out in full,
/// then flushed, before `write_frame` returns.
pub struct FrameWriter<W> {
    sink: W,
    scratch: BytesMut,
    config: FrameConfig,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_config(sink, FrameConfig::default())
    }

    pub fn with_config(sink: W, config: FrameConfig) -> Self {
        Self {
            sink,
            scratch: BytesMut::with_capacity(HEADER_SIZE + MAX_PAYLOAD + FCS_SIZE),
            config,
        }
    }

    /// Encode and write one frame.
    ///
    /// A sink that stops accepting bytes is reported as
    /// [`FrameError::ConnectionClosed`].
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let max = self.config.max_payload_size.min(MAX_PAYLOAD);
        if frame.payload.len() > max {
            return Err(FrameError::PayloadTooLarge {
                size: frame.payload.len(),
                max,
            });
        }

        self.scratch.clear();
        encode_frame(frame, &mut self.scratch)?;
        trace!(
            command_type = %frame.command_type,
            command = %frame.command,
            bytes = ?&self.scratch[..],
            "writing frame"
        );

        self.sink
            .write_all(&self.scratch)
            .and_then(|()| self.sink.flush())
            .map_err(|err| match err.kind() {
                ErrorKind::WriteZero | ErrorKind::BrokenPipe => FrameError::ConnectionClosed,
                _ => FrameError::Io(err),
            })
    }
}
