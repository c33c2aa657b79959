//! # Header Protection Bookkeeping (RFC 9001 Section 5.4)
//!
//! Header protection masks the low bits of the first byte and the packet
//! number. Until the mask is removed the packet number length, and so the
//! header length, is unknown. [`HeaderInfo`] carries the header fields that
//! are readable while protected, plus the offsets the protection layer needs
//! to compute the mask:
//!
//! ```text
//! | first byte | ... | packet number (1-4) | payload ...
//!                    ^ pn_offset           ^ sample_offset = pn_offset + 4
//! ```
//!
//! Computing the mask itself is the AEAD layer's job.

#![forbid(unsafe_code)]

use super::codec::{read_long_prefix, take_bytes};
use super::header::{
    packet_number_len, FIXED_BIT, HEADER_FORM_BIT, LONG_PROTECTED_BITS, SHORT_PROTECTED_BITS,
};
use super::number::MAX_PN_LEN;
use super::PacketType;
use crate::error::{Error, Result};
use crate::types::{ConnectionId, Token, RETRY_INTEGRITY_TAG_LEN};
use crate::varint::VarIntCodec;
use crate::version::{long_packet_type, Version};
use bytes::{Buf, Bytes};

/// Header fields read ahead of header protection removal.
///
/// Bits and length start out provisional. [`HeaderInfo::unprotect`] fixes
/// them exactly once; later calls change nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    bits: u8,
    version: Option<Version>,
    dcid: ConnectionId,
    scid: Option<ConnectionId>,
    token: Option<Token>,
    length: usize,
    pn_offset: Option<usize>,
    packet_len: Option<usize>,
    unprotected: bool,
}

impl HeaderInfo {
    /// Protected header with a provisional `length`.
    pub fn new(
        bits: u8,
        version: Option<Version>,
        dcid: ConnectionId,
        scid: Option<ConnectionId>,
        token: Option<Token>,
        length: usize,
    ) -> Self {
        Self {
            bits,
            version,
            dcid,
            scid,
            token,
            length,
            pn_offset: None,
            packet_len: None,
            unprotected: false,
        }
    }

    /// Read the unprotected header fields at the front of `buf` without
    /// consuming it.
    ///
    /// The provisional length is the header length assuming a 4-byte packet
    /// number. Retry and Version Negotiation headers carry nothing protected
    /// and come back already unprotected, sized to the whole of `buf`.
    ///
    /// # Errors
    /// - `PROTOCOL_VIOLATION` for truncated fields or a cleared fixed bit
    /// - `UnsupportedVersion` for a non-zero version this layer does not know
    pub fn peek(buf: &Bytes, short_dcid_len: u8) -> Result<Self> {
        let mut work = buf.clone();

        let Some(&first_byte) = buf.first() else {
            return Err(Error::protocol_violation());
        };

        if first_byte & HEADER_FORM_BIT == 0 {
            if first_byte & FIXED_BIT == 0 {
                return Err(Error::protocol_violation());
            }
            work.advance(1);
            let dcid = ConnectionId::new(take_bytes(&mut work, short_dcid_len as usize)?)
                .ok_or_else(Error::protocol_violation)?;
            let pn_offset = buf.len() - work.remaining();
            return Ok(Self {
                pn_offset: Some(pn_offset),
                packet_len: Some(buf.len()),
                ..Self::new(first_byte, None, dcid, None, None, pn_offset + MAX_PN_LEN)
            });
        }

        let prefix = read_long_prefix(&mut work)?;
        let version = Version::from_wire(prefix.version)
            .ok_or(Error::UnsupportedVersion(prefix.version))?;
        if version != Version::V0 && first_byte & FIXED_BIT == 0 {
            return Err(Error::protocol_violation());
        }

        let packet_type =
            long_packet_type(version, first_byte).ok_or_else(Error::protocol_violation)?;
        let token = match packet_type {
            PacketType::VersionNegotiation => None,
            PacketType::Retry => {
                if work.remaining() < RETRY_INTEGRITY_TAG_LEN {
                    return Err(Error::protocol_violation());
                }
                Some(Token::new(
                    work.split_to(work.remaining() - RETRY_INTEGRITY_TAG_LEN),
                ))
            }
            PacketType::Initial => {
                let token_len = VarIntCodec::decode(&mut work)?;
                if token_len > work.remaining() as u64 {
                    return Err(Error::protocol_violation());
                }
                Some(Token::new(work.split_to(token_len as usize)))
            }
            _ => None,
        };

        if !packet_type.has_packet_number() {
            return Ok(Self {
                packet_len: Some(buf.len()),
                unprotected: true,
                ..Self::new(
                    first_byte,
                    Some(version),
                    prefix.dcid,
                    Some(prefix.scid),
                    token,
                    buf.len(),
                )
            });
        }

        let length = VarIntCodec::decode(&mut work)?;
        if length > work.remaining() as u64 {
            return Err(Error::protocol_violation());
        }
        let pn_offset = buf.len() - work.remaining();
        Ok(Self {
            pn_offset: Some(pn_offset),
            packet_len: Some(pn_offset + length as usize),
            ..Self::new(
                first_byte,
                Some(version),
                prefix.dcid,
                Some(prefix.scid),
                token,
                pn_offset + MAX_PN_LEN,
            )
        })
    }

    pub fn is_unprotected(&self) -> bool {
        self.unprotected
    }

    /// First byte as currently known (masked until unprotected).
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Header length; provisional until unprotected.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn is_long_header(&self) -> bool {
        self.bits & HEADER_FORM_BIT != 0
    }

    /// `None` for short headers.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn dcid(&self) -> &ConnectionId {
        &self.dcid
    }

    pub fn scid(&self) -> Option<&ConnectionId> {
        self.scid.as_ref()
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Packet type, from the unprotected bits of the first byte.
    pub fn packet_type(&self) -> Option<PacketType> {
        match self.version {
            None => Some(PacketType::OneRtt),
            Some(version) => long_packet_type(version, self.bits),
        }
    }

    /// Offset of the packet number field.
    pub fn pn_offset(&self) -> Option<usize> {
        self.pn_offset
    }

    /// Offset of the header protection sample.
    pub fn sample_offset(&self) -> Option<usize> {
        self.pn_offset.map(|offset| offset + MAX_PN_LEN)
    }

    /// Bytes this packet occupies in the datagram, when known from a peek.
    pub fn packet_len(&self) -> Option<usize> {
        self.packet_len
    }

    /// Packet number length, once unprotected.
    pub fn pn_len(&self) -> Option<usize> {
        match (self.unprotected, self.pn_offset) {
            (true, Some(_)) => Some(packet_number_len(self.bits)),
            _ => None,
        }
    }

    /// XOR `mask` into the bits and shrink the length by `length_delta`.
    ///
    /// Only the first call has any effect.
    pub fn unprotect(&mut self, mask: u8, length_delta: usize) {
        if self.unprotected {
            return;
        }
        debug_assert!(
            length_delta <= self.length,
            "length delta {length_delta} exceeds provisional length {}",
            self.length
        );
        self.bits ^= mask;
        self.length = self.length.saturating_sub(length_delta);
        self.unprotected = true;
    }

    /// Apply the first byte of a header protection mask.
    ///
    /// Only the protected bits of the first byte are touched, and the
    /// provisional length is corrected to the revealed packet number length.
    pub fn remove_protection(&mut self, mask_byte: u8) {
        let protected = if self.is_long_header() {
            LONG_PROTECTED_BITS
        } else {
            SHORT_PROTECTED_BITS
        };
        let mask = mask_byte & protected;
        let pn_len = packet_number_len(self.bits ^ mask);
        self.unprotect(mask, MAX_PN_LEN - pn_len);
    }
}
