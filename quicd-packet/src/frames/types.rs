//! # Frame Encoding Boundary
//!
//! What a packet needs from its frames on the send path: an exact size and
//! a way to write them.

#![forbid(unsafe_code)]

use super::parse::FrameDecoder;
use crate::error::Result;
use bytes::{BufMut, Bytes};

/// Frame carried in a packet payload
pub trait Frame {
    /// Exact number of bytes [`Frame::encode`] writes.
    fn encoded_len(&self) -> usize;

    fn encode<B: BufMut>(&self, buf: &mut B);
}

/// Opaque payload treated as a single frame.
///
/// Used when the payload is still AEAD-protected, or by callers that parse
/// frames later on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(pub Bytes);

impl Frame for RawPayload {
    fn encoded_len(&self) -> usize {
        self.0.len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.0);
    }
}

/// Decoder producing one [`RawPayload`] covering the whole payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPayloadDecoder;

impl FrameDecoder for RawPayloadDecoder {
    type Frame = RawPayload;

    fn decode_frame(&self, payload: &Bytes) -> Result<(RawPayload, usize)> {
        Ok((RawPayload(payload.clone()), payload.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::decode_payload;
    use bytes::BytesMut;

    #[test]
    fn test_raw_payload_takes_everything() {
        let payload = Bytes::from_static(&[0x06, 0x00, 0x01, 0xff]);
        let frames = decode_payload(&RawPayloadDecoder, payload.clone()).unwrap();
        assert_eq!(frames, vec![RawPayload(payload)]);
    }

    #[test]
    fn test_raw_payload_encode() {
        let frame = RawPayload(Bytes::from_static(b"ciphertext"));
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        assert_eq!(buf.len(), frame.encoded_len());
        assert_eq!(&buf[..], b"ciphertext");
    }
}
