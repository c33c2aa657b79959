//! # QUIC Packet Header Bits and Types (RFC 9000 Section 17, RFC 8999)
//!
//! ```text
//! Long header first byte:   1 F T T R R P P
//! Short header first byte:  0 F S R R K P P
//!
//! F = fixed bit, TT = long packet type, RR = reserved (must be 0 once
//! header protection is removed), S = spin, K = key phase,
//! PP = packet number length - 1
//! ```

#![forbid(unsafe_code)]

use crate::error::{Error, Result};
use crate::types::{EncryptionLevel, PacketNumberSpace};

// ============================================================================
// Header Form Constants (RFC 8999 Section 5.1, RFC 9000 Section 17)
// ============================================================================

/// Header Form Bit (most significant bit)
/// 1 = Long Header, 0 = Short Header
pub const HEADER_FORM_BIT: u8 = 0x80;

/// Fixed Bit (second most significant bit)
/// MUST be set to 1 in all QUIC packets except Version Negotiation
pub const FIXED_BIT: u8 = 0x40;

/// Long Packet Type Mask (bits 4-5)
pub const LONG_PACKET_TYPE_MASK: u8 = 0x30;

/// Reserved Bits of Initial, 0-RTT and Handshake headers
pub const LONG_RESERVED_BITS: u8 = 0x0c;

/// Reserved Bits of the Short Header
pub const SHORT_RESERVED_BITS: u8 = 0x18;

/// Spin Bit (Short Header, bit 5)
pub const SPIN_BIT: u8 = 0x20;

/// Key Phase Bit (Short Header, bit 2)
pub const KEY_PHASE_BIT: u8 = 0x04;

/// Packet Number Length Mask (bottom 2 bits)
/// Encodes (packet_number_length - 1)
pub const PACKET_NUMBER_LENGTH_MASK: u8 = 0x03;

/// Bits covered by header protection in a long header (RFC 9001 Section 5.4.1)
pub const LONG_PROTECTED_BITS: u8 = 0x0f;

/// Bits covered by header protection in a short header
pub const SHORT_PROTECTED_BITS: u8 = 0x1f;

/// Fail with `PROTOCOL_VIOLATION` if any bit of `mask` is set in `bits`.
///
/// Each packet variant passes the mask matching its own header layout.
#[inline]
pub fn check_reserved_bits(bits: u8, mask: u8) -> Result<()> {
    if bits & mask != 0 {
        return Err(Error::protocol_violation());
    }
    Ok(())
}

/// Packet number length (1-4) encoded in the low bits of the first byte.
#[inline]
pub fn packet_number_len(first_byte: u8) -> usize {
    (first_byte & PACKET_NUMBER_LENGTH_MASK) as usize + 1
}

// ============================================================================
// Packet Type Enumeration
// ============================================================================

/// Packet Type (RFC 9000 Section 17)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Initial packet (Long Header, type 0x0)
    Initial,
    /// 0-RTT packet (Long Header, type 0x1)
    ZeroRtt,
    /// Handshake packet (Long Header, type 0x2)
    Handshake,
    /// Retry packet (Long Header, type 0x3)
    Retry,
    /// Version Negotiation packet (Long Header, version 0)
    VersionNegotiation,
    /// 1-RTT packet (Short Header)
    OneRtt,
}

impl PacketType {
    /// Returns true if this is a long header packet type
    pub fn is_long_header(&self) -> bool {
        !matches!(self, PacketType::OneRtt)
    }

    /// Retry and Version Negotiation packets carry no packet number.
    pub fn has_packet_number(&self) -> bool {
        !matches!(self, PacketType::Retry | PacketType::VersionNegotiation)
    }

    /// Level whose keys protect this packet type, if any.
    pub fn encryption_level(&self) -> Option<EncryptionLevel> {
        match self {
            PacketType::Initial => Some(EncryptionLevel::Initial),
            PacketType::ZeroRtt => Some(EncryptionLevel::EarlyData),
            PacketType::Handshake => Some(EncryptionLevel::Handshake),
            PacketType::OneRtt => Some(EncryptionLevel::Application),
            PacketType::Retry | PacketType::VersionNegotiation => None,
        }
    }

    /// Get the packet number space for this packet type
    pub fn packet_number_space(&self) -> Option<PacketNumberSpace> {
        self.encryption_level()
            .map(EncryptionLevel::packet_number_space)
    }

    /// Reserved-bit mask for this type's first byte.
    pub fn reserved_bits(&self) -> u8 {
        match self {
            PacketType::Initial | PacketType::ZeroRtt | PacketType::Handshake => {
                LONG_RESERVED_BITS
            }
            PacketType::OneRtt => SHORT_RESERVED_BITS,
            PacketType::Retry | PacketType::VersionNegotiation => 0,
        }
    }
}
