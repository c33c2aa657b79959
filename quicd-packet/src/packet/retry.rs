//! # Retry Packet (RFC 9000 Section 17.2.5)
//!
//! ```text
//! Retry Packet {
//!   Header Form (1) = 1,
//!   Fixed Bit (1) = 1,
//!   Long Packet Type (2) = 3,
//!   Unused (4),
//!   Version (32),
//!   Destination Connection ID Length (8),
//!   Destination Connection ID (0..2040),
//!   Source Connection ID Length (8),
//!   Source Connection ID (0..2040),
//!   Retry Token (..),
//!   Retry Integrity Tag (128),
//! }
//! ```
//!
//! There is no Length field: the token runs until 16 bytes before the end of
//! the datagram. A Retry packet is never coalesced with anything after it.

#![forbid(unsafe_code)]

use super::codec::{check_long_type, long_prefix_len, read_long_prefix, write_connection_id};
use super::header::{FIXED_BIT, HEADER_FORM_BIT};
use super::PacketType;
use crate::error::{Error, Result};
use crate::types::{ConnectionId, Token, RETRY_INTEGRITY_TAG_LEN};
use crate::version::{long_type_bits, Version};
use bytes::{Buf, BufMut, Bytes};

/// Retry packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPacket {
    pub version: Version,
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
    pub token: Token,
    pub integrity_tag: [u8; RETRY_INTEGRITY_TAG_LEN],
}

impl RetryPacket {
    /// Parse a Retry packet, consuming the rest of `buf`.
    pub fn parse(buf: &mut Bytes) -> Result<Self> {
        let mut work = buf.clone();

        let prefix = read_long_prefix(&mut work)?;
        let version = check_long_type(&prefix, PacketType::Retry)?;

        if work.remaining() < RETRY_INTEGRITY_TAG_LEN {
            return Err(Error::protocol_violation());
        }
        let token = Token::new(work.split_to(work.remaining() - RETRY_INTEGRITY_TAG_LEN));
        let mut integrity_tag = [0u8; RETRY_INTEGRITY_TAG_LEN];
        work.copy_to_slice(&mut integrity_tag);

        *buf = work;
        Ok(Self {
            version,
            dcid: prefix.dcid,
            scid: prefix.scid,
            token,
            integrity_tag,
        })
    }

    /// Size on the wire. Retry has no packet number, so this is also the
    /// worst case.
    pub fn encoded_len(&self) -> usize {
        long_prefix_len(&self.dcid, &self.scid) + self.token.len() + RETRY_INTEGRITY_TAG_LEN
    }

    /// Header bytes: everything before the integrity tag.
    pub fn write_header<B: BufMut>(&self, buf: &mut B) -> Result<usize> {
        let type_bits = long_type_bits(self.version, PacketType::Retry)
            .ok_or(Error::UnsupportedVersion(self.version.to_wire()))?;

        buf.put_u8(HEADER_FORM_BIT | FIXED_BIT | type_bits);
        buf.put_u32(self.version.to_wire());
        write_connection_id(&self.dcid, buf);
        write_connection_id(&self.scid, buf);
        buf.put_slice(self.token.as_bytes());

        Ok(self.encoded_len() - RETRY_INTEGRITY_TAG_LEN)
    }

    pub fn write_payload<B: BufMut>(&self, buf: &mut B) -> usize {
        buf.put_slice(&self.integrity_tag);
        RETRY_INTEGRITY_TAG_LEN
    }

    pub fn write<B: BufMut>(&self, buf: &mut B) -> Result<usize> {
        let header_len = self.write_header(buf)?;
        Ok(header_len + self.write_payload(buf))
    }
}
