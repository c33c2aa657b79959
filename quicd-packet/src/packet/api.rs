//! High-level Packet API
//!
//! [`Packet`] is the tagged union of every QUIC v1 packet shape. Parsing
//! dispatches on the first byte and the version; serialization and size
//! prediction forward to the variant.

extern crate alloc;

use super::long::{InitialPacket, LongPacket};
use super::retry::RetryPacket;
use super::short::ShortPacket;
use super::version_negotiation::VersionNegotiationPacket;
use super::PacketType;
use crate::error::{Error, Result};
use crate::frames::{Frame, FrameDecoder};
use crate::types::{ConnectionId, PacketNumber};
use crate::version::{long_packet_type, PacketInvariants, Version};
use bytes::{Buf, BufMut, Bytes};
use tracing::debug;

/// Parse context for packet parsing
///
/// Carries what the wire does not: the largest packet number already
/// processed in the packet's number space, the DCID length of short
/// headers, and the AEAD tag length that trails protected payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseContext {
    /// Largest packet number processed in this space, `None` before the first
    pub largest_pn: Option<PacketNumber>,

    /// DCID length of short header packets (not encoded on the wire)
    pub short_dcid_len: u8,

    /// Trailing AEAD tag bytes counted by Length but not part of the frames
    pub tag_len: usize,
}

impl ParseContext {
    pub fn with_largest_pn(mut self, largest_pn: PacketNumber) -> Self {
        self.largest_pn = Some(largest_pn);
        self
    }

    pub fn with_dcid_len(mut self, dcid_len: u8) -> Self {
        self.short_dcid_len = dcid_len;
        self
    }

    pub fn with_tag_len(mut self, tag_len: usize) -> Self {
        self.tag_len = tag_len;
        self
    }
}

/// High-level QUIC packet representation
///
/// `F` is the frame type produced by the injected [`FrameDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet<F> {
    Initial(InitialPacket<F>),
    ZeroRtt(LongPacket<F>),
    Handshake(LongPacket<F>),
    Retry(RetryPacket),
    VersionNegotiation(VersionNegotiationPacket),
    OneRtt(ShortPacket<F>),
}

impl<F> Packet<F> {
    /// Packet type of the packet at the front of `buf`, without consuming it.
    ///
    /// Returns `Ok(None)` for a long header whose version is unknown: its
    /// type bits cannot be interpreted.
    pub fn peek_type(buf: &[u8]) -> Result<Option<PacketType>> {
        let Some(&first_byte) = buf.first() else {
            return Err(Error::protocol_violation());
        };
        if !PacketInvariants::is_long_header(first_byte) {
            return Ok(Some(PacketType::OneRtt));
        }
        let version =
            PacketInvariants::extract_version(buf).ok_or_else(Error::protocol_violation)?;
        Ok(Version::from_wire(version).and_then(|version| long_packet_type(version, first_byte)))
    }

    /// Parse one packet from the front of `buf`.
    ///
    /// On success `buf` is positioned at the next coalesced packet (or is
    /// empty). On failure it is left untouched and no partial packet is
    /// returned.
    ///
    /// # Errors
    /// - `PROTOCOL_VIOLATION` for any malformed field
    /// - `UnsupportedVersion` for a long header with an unknown non-zero
    ///   version; the caller may answer with Version Negotiation
    pub fn parse<D>(buf: &mut Bytes, ctx: &ParseContext, decoder: &D) -> Result<Self>
    where
        D: FrameDecoder<Frame = F> + ?Sized,
    {
        let budget = buf.remaining();

        let packet_type = match Self::peek_type(buf) {
            Ok(Some(packet_type)) => packet_type,
            Ok(None) => {
                let version = PacketInvariants::extract_version(buf).unwrap_or_default();
                debug!(version, budget, "unsupported version");
                return Err(Error::UnsupportedVersion(version));
            }
            Err(err) => {
                debug!(budget, %err, "dropping packet with unreadable header");
                return Err(err);
            }
        };

        let result = match packet_type {
            PacketType::Initial => InitialPacket::parse(buf, ctx, decoder).map(Packet::Initial),
            PacketType::ZeroRtt => {
                LongPacket::parse(packet_type, buf, ctx, decoder).map(Packet::ZeroRtt)
            }
            PacketType::Handshake => {
                LongPacket::parse(packet_type, buf, ctx, decoder).map(Packet::Handshake)
            }
            PacketType::Retry => RetryPacket::parse(buf).map(Packet::Retry),
            PacketType::VersionNegotiation => {
                VersionNegotiationPacket::parse(buf).map(Packet::VersionNegotiation)
            }
            PacketType::OneRtt => ShortPacket::parse(buf, ctx, decoder).map(Packet::OneRtt),
        };

        if let Err(err) = &result {
            debug!(?packet_type, budget, %err, "dropping malformed packet");
        }
        result
    }

    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Initial(_) => PacketType::Initial,
            Packet::ZeroRtt(_) => PacketType::ZeroRtt,
            Packet::Handshake(_) => PacketType::Handshake,
            Packet::Retry(_) => PacketType::Retry,
            Packet::VersionNegotiation(_) => PacketType::VersionNegotiation,
            Packet::OneRtt(_) => PacketType::OneRtt,
        }
    }

    /// `None` for Retry and Version Negotiation.
    pub fn packet_number(&self) -> Option<PacketNumber> {
        match self {
            Packet::Initial(p) => Some(p.packet_number),
            Packet::ZeroRtt(p) | Packet::Handshake(p) => Some(p.packet_number),
            Packet::OneRtt(p) => Some(p.packet_number),
            Packet::Retry(_) | Packet::VersionNegotiation(_) => None,
        }
    }

    pub fn dcid(&self) -> &ConnectionId {
        match self {
            Packet::Initial(p) => &p.dcid,
            Packet::ZeroRtt(p) | Packet::Handshake(p) => &p.dcid,
            Packet::Retry(p) => &p.dcid,
            Packet::VersionNegotiation(p) => &p.dcid,
            Packet::OneRtt(p) => &p.dcid,
        }
    }

    /// `None` for short headers.
    pub fn scid(&self) -> Option<&ConnectionId> {
        match self {
            Packet::Initial(p) => Some(&p.scid),
            Packet::ZeroRtt(p) | Packet::Handshake(p) => Some(&p.scid),
            Packet::Retry(p) => Some(&p.scid),
            Packet::VersionNegotiation(p) => Some(&p.scid),
            Packet::OneRtt(_) => None,
        }
    }

    /// `None` for short headers, which do not carry a version.
    pub fn version(&self) -> Option<Version> {
        match self {
            Packet::Initial(p) => Some(p.version),
            Packet::ZeroRtt(p) | Packet::Handshake(p) => Some(p.version),
            Packet::Retry(p) => Some(p.version),
            Packet::VersionNegotiation(_) => Some(Version::V0),
            Packet::OneRtt(_) => None,
        }
    }

    /// Decoded frames; empty for packets without a payload.
    pub fn frames(&self) -> &[F] {
        match self {
            Packet::Initial(p) => &p.frames,
            Packet::ZeroRtt(p) | Packet::Handshake(p) => &p.frames,
            Packet::OneRtt(p) => &p.frames,
            Packet::Retry(_) | Packet::VersionNegotiation(_) => &[],
        }
    }
}

impl<F: Frame> Packet<F> {
    /// Exact size on the wire when truncating against `largest`, with a
    /// `tag_len`-byte AEAD tag appended later.
    pub fn encoded_len(&self, largest: Option<PacketNumber>, tag_len: usize) -> Result<usize> {
        match self {
            Packet::Initial(p) => p.encoded_len(largest, tag_len),
            Packet::ZeroRtt(p) => p.encoded_len(PacketType::ZeroRtt, largest, tag_len),
            Packet::Handshake(p) => p.encoded_len(PacketType::Handshake, largest, tag_len),
            Packet::Retry(p) => Ok(p.encoded_len()),
            Packet::VersionNegotiation(p) => Ok(p.encoded_len()),
            Packet::OneRtt(p) => p.encoded_len(largest, tag_len),
        }
    }

    /// Worst-case size, assuming a 4-byte packet number.
    ///
    /// Lets a coalescing caller reserve space before `largest` is final.
    pub fn max_encoded_len(&self, tag_len: usize) -> Result<usize> {
        match self {
            Packet::Initial(p) => p.max_encoded_len(tag_len),
            Packet::ZeroRtt(p) => p.max_encoded_len(PacketType::ZeroRtt, tag_len),
            Packet::Handshake(p) => p.max_encoded_len(PacketType::Handshake, tag_len),
            Packet::Retry(p) => Ok(p.encoded_len()),
            Packet::VersionNegotiation(p) => Ok(p.encoded_len()),
            Packet::OneRtt(p) => Ok(p.max_encoded_len(tag_len)),
        }
    }

    /// Write the header up to and including the packet number.
    pub fn write_header<B: BufMut>(
        &self,
        largest: Option<PacketNumber>,
        tag_len: usize,
        buf: &mut B,
    ) -> Result<usize> {
        match self {
            Packet::Initial(p) => p.write_header(largest, tag_len, buf),
            Packet::ZeroRtt(p) => p.write_header(PacketType::ZeroRtt, largest, tag_len, buf),
            Packet::Handshake(p) => p.write_header(PacketType::Handshake, largest, tag_len, buf),
            Packet::Retry(p) => p.write_header(buf),
            Packet::VersionNegotiation(p) => Ok(p.write_header(buf)),
            Packet::OneRtt(p) => p.write_header(largest, buf),
        }
    }

    pub fn write_payload<B: BufMut>(&self, buf: &mut B) -> usize {
        match self {
            Packet::Initial(p) => p.write_payload(buf),
            Packet::ZeroRtt(p) | Packet::Handshake(p) => p.write_payload(buf),
            Packet::Retry(p) => p.write_payload(buf),
            Packet::VersionNegotiation(p) => p.write_payload(buf),
            Packet::OneRtt(p) => p.write_payload(buf),
        }
    }

    /// Serialize the packet. The AEAD tag is left to the protection layer,
    /// so `write + tag_len == encoded_len`.
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
