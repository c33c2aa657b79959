//! # QUIC Versions and Invariants (RFC 8999, RFC 9000 Section 15)
//!
//! The version field is an opaque 32-bit value. Only two values are known to
//! this layer: `0x00000000`, which marks a Version Negotiation packet, and
//! `0x00000001` (QUIC v1). Anything else maps to `None` ("unrecognized");
//! whether that is fatal is the caller's decision.
//!
//! Long-header type bits are version specific. The mapping lives in two pure
//! functions keyed by version instead of a shared table.

#![forbid(unsafe_code)]

use crate::packet::header::LONG_PACKET_TYPE_MASK;
use crate::packet::PacketType;

/// Wire value of the Version Negotiation sentinel
pub const VERSION_NEGOTIATION: u32 = 0x0000_0000;

/// Wire value of QUIC Version 1 (RFC 9000)
pub const VERSION_1: u32 = 0x0000_0001;

/// Statically known QUIC versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// Reserved zero version, used only by Version Negotiation packets
    V0,
    /// QUIC version 1
    V1,
}

impl Version {
    /// Map a wire value to a known version.
    pub fn from_wire(value: u32) -> Option<Version> {
        match value {
            VERSION_NEGOTIATION => Some(Version::V0),
            VERSION_1 => Some(Version::V1),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u32 {
        match self {
            Version::V0 => VERSION_NEGOTIATION,
            Version::V1 => VERSION_1,
        }
    }
}

/// Reserved versions for version negotiation forcing (RFC 9000 Section 15)
///
/// These versions have the form 0x?a?a?a?a.
pub fn is_reserved_version(version: u32) -> bool {
    (version & 0x0f0f_0f0f) == 0x0a0a_0a0a
}

/// Long header type bits (already shifted into bits 4-5) for `packet_type`.
///
/// Returns `None` for packet types that have no type bits in `version`
/// (Version Negotiation, 1-RTT, or anything under V0).
pub fn long_type_bits(version: Version, packet_type: PacketType) -> Option<u8> {
    match version {
        Version::V1 => match packet_type {
            PacketType::Initial => Some(0x00),
            PacketType::ZeroRtt => Some(0x10),
            PacketType::Handshake => Some(0x20),
            PacketType::Retry => Some(0x30),
            PacketType::VersionNegotiation | PacketType::OneRtt => None,
        },
        Version::V0 => None,
    }
}

/// Packet type selected by the long header type bits of `first_byte`.
pub fn long_packet_type(version: Version, first_byte: u8) -> Option<PacketType> {
    match version {
        Version::V0 => Some(PacketType::VersionNegotiation),
        Version::V1 => match first_byte & LONG_PACKET_TYPE_MASK {
            0x00 => Some(PacketType::Initial),
            0x10 => Some(PacketType::ZeroRtt),
            0x20 => Some(PacketType::Handshake),
            _ => Some(PacketType::Retry),
        },
    }
}

/// QUIC Packet Header Invariants (RFC 8999 Section 5)
///
/// Properties that hold for every QUIC version.
pub struct PacketInvariants;

impl PacketInvariants {
    /// The first bit (0x80) indicates header form: 1 = long, 0 = short.
    pub fn is_long_header(first_byte: u8) -> bool {
        (first_byte & 0x80) == 0x80
    }

    /// Extract the version field (bytes 1-4) from a long header packet.
    ///
    /// Returns `None` if the buffer is too short or not a long header.
    pub fn extract_version(packet: &[u8]) -> Option<u32> {
        if packet.len() < 5 || !Self::is_long_header(packet[0]) {
            return None;
        }
        Some(u32::from_be_bytes([packet[1], packet[2], packet[3], packet[4]]))
    }
}
