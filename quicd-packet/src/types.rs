//! # Core Packet Types (RFC 8999, RFC 9000)
//!
//! Wire-level identifiers shared by every packet variant. Byte-string types
//! wrap `bytes::Bytes` so parsed packets share the datagram buffer instead of
//! copying it.

#![forbid(unsafe_code)]

use bytes::Bytes;

// ============================================================================
// Connection ID (RFC 9000 Section 5.1, RFC 8999 Section 5.3)
// ============================================================================

/// Maximum length of a Connection ID representable on the wire.
///
/// Long headers prefix each ID with a single length byte. QUIC v1 further
/// restricts IDs to 20 bytes, which is a connection-level policy and is not
/// enforced by the codec.
pub const MAX_CID_LENGTH: usize = u8::MAX as usize;

/// Connection ID length limit for QUIC version 1 (RFC 9000 Section 17.2).
pub const MAX_CID_LENGTH_V1: usize = 20;

/// Connection ID - Version-independent identifier (RFC 8999 Section 5.3)
///
/// Opaque byte sequence chosen by an endpoint. Zero-length IDs are valid.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConnectionId {
    bytes: Bytes,
}

impl ConnectionId {
    /// Create a new ConnectionId from bytes
    ///
    /// Returns None if length exceeds MAX_CID_LENGTH
    pub fn new(bytes: Bytes) -> Option<Self> {
        if bytes.len() > MAX_CID_LENGTH {
            return None;
        }
        Some(Self { bytes })
    }

    /// Create from a borrowed slice (copies data)
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        Self::new(Bytes::copy_from_slice(slice))
    }

    /// Create an empty (zero-length) connection ID
    pub fn empty() -> Self {
        Self {
            bytes: Bytes::new(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length as written in a long header length byte.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl core::fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ConnectionId({:02x?})", &self.bytes[..])
    }
}

impl core::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for byte in &self.bytes[..] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

// ============================================================================
// Token (RFC 9000 Section 8.1)
// ============================================================================

/// Address Validation Token
///
/// Carried by Initial packets (length-prefixed) and Retry packets (fills
/// the space before the integrity tag).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Token {
    bytes: Bytes,
}

impl Token {
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    /// Create token from slice (copies data)
    pub fn from_slice(slice: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(slice),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ============================================================================
// Packet Number (RFC 9000 Section 12.3)
// ============================================================================

/// Packet Number - Monotonically increasing per packet number space
///
/// The "largest processed" reference used for truncation is an
/// `Option<PacketNumber>`: `None` means no packet has been processed yet in
/// that space.
pub type PacketNumber = u64;

/// Maximum packet number value (2^62 - 1)
pub const MAX_PACKET_NUMBER: u64 = (1u64 << 62) - 1;

/// Packet Number Space (RFC 9000 Section 12.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketNumberSpace {
    /// Initial packets
    Initial,
    /// Handshake packets
    Handshake,
    /// 0-RTT and 1-RTT packets
    ApplicationData,
}

/// Encryption Level (RFC 9001 Section 4)
///
/// Retry and Version Negotiation packets are never encrypted and have no
/// level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionLevel {
    Initial,
    EarlyData,
    Handshake,
    Application,
}

impl EncryptionLevel {
    pub fn packet_number_space(self) -> PacketNumberSpace {
        match self {
            EncryptionLevel::Initial => PacketNumberSpace::Initial,
            EncryptionLevel::Handshake => PacketNumberSpace::Handshake,
            EncryptionLevel::EarlyData | EncryptionLevel::Application => {
                PacketNumberSpace::ApplicationData
            }
        }
    }
}

// ============================================================================
// Constants from RFC 9000 / RFC 9001
// ============================================================================

/// Retry Integrity Tag length (RFC 9001 Section 5.8)
pub const RETRY_INTEGRITY_TAG_LEN: usize = 16;

/// Default UDP payload size (1200 bytes per RFC 9000 Section 14.1)
pub const DEFAULT_MAX_UDP_PAYLOAD_SIZE: usize = 1200;

/// Largest UDP payload over IPv4
pub const MAX_UDP_PAYLOAD_SIZE_IPV4: usize = 65527;
