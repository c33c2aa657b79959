//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use bytes::{BufMut, Bytes};
use quicd_packet::frames::{Frame, FrameDecoder};
use quicd_packet::{ConnectionId, Error, Result};
use tracing_subscriber::EnvFilter;

/// Test frame: one length byte followed by that many bytes.
///
/// Unlike an opaque payload it knows its own extent, so a payload cut short
/// fails to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFrame(pub Bytes);

impl TestFrame {
    pub fn new(data: &'static [u8]) -> Self {
        assert!(data.len() <= u8::MAX as usize);
        Self(Bytes::from_static(data))
    }
}

impl Frame for TestFrame {
    fn encoded_len(&self) -> usize {
        1 + self.0.len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.0.len() as u8);
        buf.put_slice(&self.0);
    }
}

pub struct TestFrameDecoder;

impl FrameDecoder for TestFrameDecoder {
    type Frame = TestFrame;

    fn decode_frame(&self, payload: &Bytes) -> Result<(TestFrame, usize)> {
        let Some(&len) = payload.first() else {
            return Err(Error::protocol_violation());
        };
        let end = 1 + len as usize;
        if payload.len() < end {
            return Err(Error::protocol_violation());
        }
        Ok((TestFrame(payload.slice(1..end)), end))
    }
}

pub fn cid(bytes: &[u8]) -> ConnectionId {
    ConnectionId::from_slice(bytes).unwrap()
}

/// Route `tracing` output through the test harness. `RUST_LOG` selects levels.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
