//! # Long Header Packets with Packet Numbers (RFC 9000 Section 17.2)
//!
//! Initial, 0-RTT and Handshake packets share one layout:
//!
//! ```text
//! Long Header Packet {
//!   Header Form (1) = 1,
//!   Fixed Bit (1) = 1,
//!   Long Packet Type (2),
//!   Reserved Bits (2),
//!   Packet Number Length (2),
//!   Version (32),
//!   Destination Connection ID Length (8),
//!   Destination Connection ID (0..2040),
//!   Source Connection ID Length (8),
//!   Source Connection ID (0..2040),
//!   [Token Length (i), Token (..)]      // Initial only
//!   Length (i),
//!   Packet Number (8..32),
//!   Packet Payload (8..),
//! }
//! ```
//!
//! `Length` covers the packet number, the payload and the AEAD tag that the
//! protection layer appends after serialization.

#![forbid(unsafe_code)]

extern crate alloc;

use super::api::ParseContext;
use super::codec::{
    check_long_type, frames_len, long_prefix_len, read_long_prefix, write_connection_id,
    write_frames,
};
use super::header::{
    check_reserved_bits, packet_number_len, FIXED_BIT, HEADER_FORM_BIT, LONG_RESERVED_BITS,
};
use super::number::{PacketNumberCodec, MAX_PN_LEN};
use super::PacketType;
use crate::error::{Error, Result};
use crate::frames::{decode_payload, Frame, FrameDecoder};
use crate::types::{ConnectionId, PacketNumber, Token};
use crate::varint::VarIntCodec;
use crate::version::{long_type_bits, Version};
use alloc::vec::Vec;
use bytes::{Buf, BufMut, Bytes};

// ============================================================================
// Shared layout
// ============================================================================

/// Borrowed view of everything that determines a long header's encoding.
struct LongLayout<'a> {
    packet_type: PacketType,
    version: Version,
    dcid: &'a ConnectionId,
    scid: &'a ConnectionId,
    token: Option<&'a Token>,
    packet_number: PacketNumber,
}

impl LongLayout<'_> {
    /// Bytes preceding the Length field.
    fn fixed_len(&self) -> Result<usize> {
        let mut len = long_prefix_len(self.dcid, self.scid);
        if let Some(token) = self.token {
            len += VarIntCodec::size(token.len() as u64)? + token.len();
        }
        Ok(len)
    }

    fn encoded_len(&self, pn_len: usize, payload_len: usize, tag_len: usize) -> Result<usize> {
        let length = pn_len + payload_len + tag_len;
        Ok(self.fixed_len()? + VarIntCodec::size(length as u64)? + length)
    }

    /// Write everything up to and including the packet number.
    ///
    /// All fallible checks run before the first byte is written.
    fn write_header<B: BufMut>(
        &self,
        largest: Option<PacketNumber>,
        payload_len: usize,
        tag_len: usize,
        buf: &mut B,
    ) -> Result<usize> {
        let pn_len = PacketNumberCodec::encoded_len(self.packet_number, largest)?;
        let type_bits = long_type_bits(self.version, self.packet_type)
            .ok_or(Error::UnsupportedVersion(self.version.to_wire()))?;
        let length = (pn_len + payload_len + tag_len) as u64;
        let header_len = self.fixed_len()? + VarIntCodec::size(length)? + pn_len;

        buf.put_u8(HEADER_FORM_BIT | FIXED_BIT | type_bits | (pn_len as u8 - 1));
        buf.put_u32(self.version.to_wire());
        write_connection_id(self.dcid, buf);
        write_connection_id(self.scid, buf);
        if let Some(token) = self.token {
            VarIntCodec::encode(token.len() as u64, buf)?;
            buf.put_slice(token.as_bytes());
        }
        VarIntCodec::encode(length, buf)?;
        PacketNumberCodec::encode(self.packet_number, largest, buf)?;

        Ok(header_len)
    }
}

/// Decoded fields of a numbered long header packet.
struct LongParts<F> {
    version: Version,
    dcid: ConnectionId,
    scid: ConnectionId,
    token: Option<Token>,
    packet_number: PacketNumber,
    frames: Vec<F>,
}

fn parse_long<D: FrameDecoder + ?Sized>(
    packet_type: PacketType,
    buf: &mut Bytes,
    ctx: &ParseContext,
    decoder: &D,
) -> Result<LongParts<D::Frame>> {
    let mut work = buf.clone();

    let prefix = read_long_prefix(&mut work)?;
    let version = check_long_type(&prefix, packet_type)?;
    check_reserved_bits(prefix.first_byte, LONG_RESERVED_BITS)?;

    let token = if packet_type == PacketType::Initial {
        let token_len = VarIntCodec::decode(&mut work)?;
        if token_len > work.remaining() as u64 {
            return Err(Error::protocol_violation());
        }
        Some(Token::new(work.split_to(token_len as usize)))
    } else {
        None
    };

    let length = VarIntCodec::decode(&mut work)?;
    if length > work.remaining() as u64 {
        return Err(Error::protocol_violation());
    }
    let mut body = work.split_to(length as usize);

    let pn_len = packet_number_len(prefix.first_byte);
    if body.remaining() < pn_len + ctx.tag_len {
        return Err(Error::protocol_violation());
    }
    let packet_number = PacketNumberCodec::decode(&mut body, pn_len, ctx.largest_pn)?;
    let payload = body.split_to(body.len() - ctx.tag_len);
    let frames = decode_payload(decoder, payload)?;

    *buf = work;
    Ok(LongParts {
        version,
        dcid: prefix.dcid,
        scid: prefix.scid,
        token,
        packet_number,
        frames,
    })
}

// ============================================================================
// Initial
// ============================================================================

/// Initial packet (RFC 9000 Section 17.2.2)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialPacket<F> {
    pub version: Version,
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
    pub token: Token,
    pub packet_number: PacketNumber,
    pub frames: Vec<F>,
}

impl<F> InitialPacket<F> {
    /// Parse an Initial packet from the front of `buf`.
    ///
    /// On success `buf` is left at the next coalesced packet. On failure it
    /// is left untouched.
    pub fn parse<D>(buf: &mut Bytes, ctx: &ParseContext, decoder: &D) -> Result<Self>
    where
        D: FrameDecoder<Frame = F> + ?Sized,
    {
        let parts = parse_long(PacketType::Initial, buf, ctx, decoder)?;
        Ok(Self {
            version: parts.version,
            dcid: parts.dcid,
            scid: parts.scid,
            token: parts.token.unwrap_or_default(),
            packet_number: parts.packet_number,
            frames: parts.frames,
        })
    }
}

impl<F: Frame> InitialPacket<F> {
    fn layout(&self) -> LongLayout<'_> {
        LongLayout {
            packet_type: PacketType::Initial,
            version: self.version,
            dcid: &self.dcid,
            scid: &self.scid,
            token: Some(&self.token),
            packet_number: self.packet_number,
        }
    }

    pub fn payload_len(&self) -> usize {
        frames_len(&self.frames)
    }

    /// Exact size on the wire, AEAD tag included.
    pub fn encoded_len(&self, largest: Option<PacketNumber>, tag_len: usize) -> Result<usize> {
        let pn_len = PacketNumberCodec::encoded_len(self.packet_number, largest)?;
        self.layout()
            .encoded_len(pn_len, self.payload_len(), tag_len)
    }

    /// Size on the wire with a 4-byte packet number.
    pub fn max_encoded_len(&self, tag_len: usize) -> Result<usize> {
        self.layout()
            .encoded_len(MAX_PN_LEN, self.payload_len(), tag_len)
    }

    pub fn write_header<B: BufMut>(
        &self,
        largest: Option<PacketNumber>,
        tag_len: usize,
        buf: &mut B,
    ) -> Result<usize> {
        self.layout()
            .write_header(largest, self.payload_len(), tag_len, buf)
    }

    pub fn write_payload<B: BufMut>(&self, buf: &mut B) -> usize {
        write_frames(&self.frames, buf)
    }

    /// Serialize header and payload. The AEAD tag is not written.
    pub fn write<B: BufMut>(
        &self,
        largest: Option<PacketNumber>,
        tag_len: usize,
        buf: &mut B,
    ) -> Result<usize> {
        let header_len = self.write_header(largest, tag_len, buf)?;
        Ok(header_len + self.write_payload(buf))
    }
}

// ============================================================================
// 0-RTT / Handshake
// ============================================================================

/// 0-RTT (RFC 9000 Section 17.2.3) or Handshake (Section 17.2.4) packet.
///
/// Both share a layout; the enclosing [`super::Packet`] variant tells them
/// apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongPacket<F> {
    pub version: Version,
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
    pub packet_number: PacketNumber,
    pub frames: Vec<F>,
}

impl<F> LongPacket<F> {
    /// Parse a 0-RTT or Handshake packet (selected by `packet_type`).
    ///
    /// Any other `packet_type` is rejected with `InvalidValue`.
    pub fn parse<D>(
        packet_type: PacketType,
        buf: &mut Bytes,
        ctx: &ParseContext,
        decoder: &D,
    ) -> Result<Self>
    where
        D: FrameDecoder<Frame = F> + ?Sized,
    {
        let parts = parse_long(numbered_type(packet_type)?, buf, ctx, decoder)?;
        Ok(Self {
            version: parts.version,
            dcid: parts.dcid,
            scid: parts.scid,
            packet_number: parts.packet_number,
            frames: parts.frames,
        })
    }
}

/// `LongPacket` only carries the token-less numbered types.
fn numbered_type(packet_type: PacketType) -> Result<PacketType> {
    match packet_type {
        PacketType::ZeroRtt | PacketType::Handshake => Ok(packet_type),
        _ => Err(Error::InvalidValue),
    }
}

impl<F: Frame> LongPacket<F> {
    fn layout(&self, packet_type: PacketType) -> Result<LongLayout<'_>> {
        Ok(LongLayout {
            packet_type: numbered_type(packet_type)?,
            version: self.version,
            dcid: &self.dcid,
            scid: &self.scid,
            token: None,
            packet_number: self.packet_number,
        })
    }

    pub fn payload_len(&self) -> usize {
        frames_len(&self.frames)
    }

    pub fn encoded_len(
        &self,
        packet_type: PacketType,
        largest: Option<PacketNumber>,
        tag_len: usize,
    ) -> Result<usize> {
        let layout = self.layout(packet_type)?;
        let pn_len = PacketNumberCodec::encoded_len(self.packet_number, largest)?;
        layout.encoded_len(pn_len, self.payload_len(), tag_len)
    }

    pub fn max_encoded_len(&self, packet_type: PacketType, tag_len: usize) -> Result<usize> {
        self.layout(packet_type)?
            .encoded_len(MAX_PN_LEN, self.payload_len(), tag_len)
    }

    pub fn write_header<B: BufMut>(
        &self,
        packet_type: PacketType,
        largest: Option<PacketNumber>,
        tag_len: usize,
        buf: &mut B,
    ) -> Result<usize> {
        self.layout(packet_type)?
            .write_header(largest, self.payload_len(), tag_len, buf)
    }

    pub fn write_payload<B: BufMut>(&self, buf: &mut B) -> usize {
        write_frames(&self.frames, buf)
    }

    pub fn write<B: BufMut>(
        &self,
        packet_type: PacketType,
        largest: Option<PacketNumber>,
        tag_len: usize,
        buf: &mut B,
    ) -> Result<usize> {
        let header_len = self.write_header(packet_type, largest, tag_len, buf)?;
        Ok(header_len + self.write_payload(buf))
    }
}
