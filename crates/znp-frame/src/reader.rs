use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_frame, Frame, FrameConfig, HEADER_SIZE, MAX_PAYLOAD};
use crate::error::{FrameError, Result};

/// Blocking MT frame reader over any byte stream.
///
/// Bytes are buffered across calls, so a frame split over several reads
/// (or several frames delivered by one read) come out one at a time. A
/// malformed frame is reported once and skipped; the next call resumes at
/// the following start-of-frame byte.
pub struct FrameReader<R> {
    source: R,
    pending: BytesMut,
    config: FrameConfig,
}

impl<R: Read> FrameReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_config(source, FrameConfig::default())
    }

    pub fn with_config(source: R, config: FrameConfig) -> Self {
        Self {
            source,
            pending: BytesMut::with_capacity(2 * (HEADER_SIZE + MAX_PAYLOAD)),
            config,
        }
    }

    /// Block until the next complete frame.
    ///
    /// End of stream, even in the middle of a frame, is
    /// [`FrameError::ConnectionClosed`]. Read timeouts surface as
    /// [`FrameError::Io`] with the buffered partial frame kept, so the
    /// caller may simply call again.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let mut scratch = [0u8; HEADER_SIZE + MAX_PAYLOAD];
        loop {
            if let Some(frame) = decode_frame(&mut self.pending, self.config.max_payload_size)? {
                return Ok(frame);
            }
            match self.source.read(&mut scratch) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => self.pending.extend_from_slice(&scratch[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }
}
