//! Field-level helpers shared by the packet variants.
//!
//! Every reader works on a `Bytes` cursor: `remaining()` is the budget and a
//! short read fails with `PROTOCOL_VIOLATION` before anything is consumed.

#![forbid(unsafe_code)]

use super::header::{FIXED_BIT, HEADER_FORM_BIT};
use super::PacketType;
use crate::error::{Error, Result};
use crate::frames::Frame;
use crate::types::ConnectionId;
use crate::version::{long_packet_type, Version};
use bytes::{Buf, BufMut, Bytes};

/// Split `len` bytes off the front of `buf`.
pub(crate) fn take_bytes(buf: &mut Bytes, len: usize) -> Result<Bytes> {
    if buf.remaining() < len {
        return Err(Error::protocol_violation());
    }
    Ok(buf.split_to(len))
}

/// Read a single-byte length prefix followed by the connection ID.
pub(crate) fn read_connection_id(buf: &mut Bytes) -> Result<ConnectionId> {
    if !buf.has_remaining() {
        return Err(Error::protocol_violation());
    }
    let len = buf.get_u8() as usize;
    let bytes = take_bytes(buf, len)?;
    ConnectionId::new(bytes).ok_or_else(Error::protocol_violation)
}

pub(crate) fn write_connection_id<B: BufMut>(cid: &ConnectionId, buf: &mut B) {
    buf.put_u8(cid.len() as u8);
    buf.put_slice(cid.as_bytes());
}

/// Fields shared by every long header: first byte, version and both IDs.
pub(crate) struct LongPrefix {
    pub first_byte: u8,
    pub version: u32,
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
}

pub(crate) fn read_long_prefix(buf: &mut Bytes) -> Result<LongPrefix> {
    if buf.remaining() < 5 {
        return Err(Error::protocol_violation());
    }
    let first_byte = buf.get_u8();
    if first_byte & HEADER_FORM_BIT == 0 {
        return Err(Error::protocol_violation());
    }
    let version = buf.get_u32();
    let dcid = read_connection_id(buf)?;
    let scid = read_connection_id(buf)?;

    Ok(LongPrefix {
        first_byte,
        version,
        dcid,
        scid,
    })
}

/// Encoded size of [`LongPrefix`].
pub(crate) fn long_prefix_len(dcid: &ConnectionId, scid: &ConnectionId) -> usize {
    1 + 4 + 1 + dcid.len() + 1 + scid.len()
}

/// Check that a parsed prefix really belongs to `expected`.
///
/// A zero version never belongs to a typed long header. An unknown version
/// is reported as such so the caller can answer with Version Negotiation.
pub(crate) fn check_long_type(prefix: &LongPrefix, expected: PacketType) -> Result<Version> {
    let version = match Version::from_wire(prefix.version) {
        Some(Version::V0) => return Err(Error::protocol_violation()),
        Some(version) => version,
        None => return Err(Error::UnsupportedVersion(prefix.version)),
    };
    if prefix.first_byte & FIXED_BIT == 0 {
        return Err(Error::protocol_violation());
    }
    if long_packet_type(version, prefix.first_byte) != Some(expected) {
        return Err(Error::protocol_violation());
    }
    Ok(version)
}

pub(crate) fn frames_len<F: Frame>(frames: &[F]) -> usize {
    frames.iter().map(Frame::encoded_len).sum()
}

pub(crate) fn write_frames<F: Frame, B: BufMut>(frames: &[F], buf: &mut B) -> usize {
    for frame in frames {
        frame.encode(buf);
    }
    frames_len(frames)
}
