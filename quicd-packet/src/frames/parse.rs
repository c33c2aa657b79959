//! # Frame Decoding Boundary
//!
//! Zero-copy iteration over the frames of one packet payload. The payload is
//! a `Bytes` slice of the datagram, so decoders can keep sub-slices of it
//! without copying.

#![forbid(unsafe_code)]

extern crate alloc;

use crate::error::{Error, Result};
use alloc::vec::Vec;
use bytes::{Buf, Bytes};

/// Frame Decoder Trait
///
/// Implemented by the frame layer. The packet layer only calls it with the
/// exact payload range a packet declares.
pub trait FrameDecoder {
    /// Frame representation produced by this decoder
    type Frame;

    /// Decode one frame from the front of `payload`.
    ///
    /// Returns the frame and the number of bytes it occupied. Returning 0
    /// consumed bytes, or more bytes than `payload` holds, is treated as a
    /// protocol violation by the caller.
    fn decode_frame(&self, payload: &Bytes) -> Result<(Self::Frame, usize)>;
}

/// Frame Iterator (Zero-Copy)
///
/// Iterates over frames in a packet payload. Stops after the first error.
pub struct FrameIterator<'a, D: FrameDecoder + ?Sized> {
    decoder: &'a D,
    payload: Bytes,
}

impl<'a, D: FrameDecoder + ?Sized> FrameIterator<'a, D> {
    pub fn new(decoder: &'a D, payload: Bytes) -> Self {
        Self { decoder, payload }
    }
}

impl<'a, D: FrameDecoder + ?Sized> Iterator for FrameIterator<'a, D> {
    type Item = Result<D::Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.payload.is_empty() {
            return None;
        }

        match self.decoder.decode_frame(&self.payload) {
            Ok((frame, consumed)) if consumed > 0 && consumed <= self.payload.len() => {
                self.payload.advance(consumed);
                Some(Ok(frame))
            }
            Ok(_) => {
                // No progress or overrun: the payload cannot be accounted for
                self.payload.clear();
                Some(Err(Error::protocol_violation()))
            }
            Err(e) => {
                self.payload.clear();
                Some(Err(e))
            }
        }
    }
}

/// Decode a whole packet payload into frames.
///
/// # Errors
/// `PROTOCOL_VIOLATION` for an empty payload (every packet with a packet
/// number carries at least one frame) or a decoder that does not account for
/// every byte. Decoder errors are passed through unchanged.
pub fn decode_payload<D: FrameDecoder + ?Sized>(
    decoder: &D,
    payload: Bytes,
) -> Result<Vec<D::Frame>> {
    if payload.is_empty() {
        return Err(Error::protocol_violation());
    }
    FrameIterator::new(decoder, payload).collect()
}
