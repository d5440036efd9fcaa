use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig};
use crate::error::FrameError;

/// `tokio-util` codec over the MT frame format, for use with `Framed`.
#[derive(Debug, Clone, Default)]
pub struct ZnpCodec {
    config: FrameConfig,
}

impl ZnpCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for ZnpCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        decode_frame(src, self.config.max_payload_size)
    }
}

impl Encoder<Frame> for ZnpCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        Encoder::<&Frame>::encode(self, &frame, dst)
    }
}

impl Encoder<&Frame> for ZnpCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: &Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        if frame.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: frame.payload.len(),
                max: self.config.max_payload_size,
            });
        }
        encode_frame(frame, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{sys, CommandType};

    #[test]
    fn codec_roundtrip() {
        let mut codec = ZnpCodec::default();
        let frame = Frame::new(CommandType::Srsp, sys::OSAL_NV_LENGTH, vec![0x02, 0x00]);

        let mut buf = BytesMut::new();
        Encoder::<Frame>::encode(&mut codec, frame.clone(), &mut buf).unwrap();
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(frame));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn codec_respects_configured_limit() {
        let mut codec = ZnpCodec::new(FrameConfig {
            max_payload_size: 1,
        });
        let frame = Frame::new(CommandType::Sreq, sys::OSAL_NV_WRITE, vec![0, 0]);
        let err = Encoder::<&Frame>::encode(&mut codec, &frame, &mut BytesMut::new()).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }
}
