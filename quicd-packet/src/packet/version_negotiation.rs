//! # Version Negotiation Packet (RFC 9000 Section 17.2.1)
//!
//! ```text
//! Version Negotiation Packet {
//!   Header Form (1) = 1,
//!   Unused (7),
//!   Version (32) = 0,
//!   Destination Connection ID Length (8),
//!   Destination Connection ID (0..2040),
//!   Source Connection ID Length (8),
//!   Source Connection ID (0..2040),
//!   Supported Version (32) ...,
//! }
//! ```
//!
//! Advertised versions this layer does not know are kept as `None` in their
//! original position so the list round-trips in order.

#![forbid(unsafe_code)]

extern crate alloc;

use super::codec::{long_prefix_len, read_long_prefix, write_connection_id};
use super::header::{FIXED_BIT, HEADER_FORM_BIT};
use crate::error::{Error, Result};
use crate::types::ConnectionId;
use crate::version::{Version, VERSION_NEGOTIATION};
use alloc::vec::Vec;
use bytes::{Buf, BufMut, Bytes};

/// Version Negotiation packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNegotiationPacket {
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
    /// Wire values in order, unrecognized entries included.
    raw_versions: Vec<u32>,
}

impl VersionNegotiationPacket {
    /// Build a packet advertising the given wire versions.
    pub fn new(dcid: ConnectionId, scid: ConnectionId, supported: &[u32]) -> Self {
        Self {
            dcid,
            scid,
            raw_versions: supported.to_vec(),
        }
    }

    /// Advertised versions in wire order; `None` marks an unrecognized value.
    pub fn versions(&self) -> Vec<Option<Version>> {
        self.raw_versions
            .iter()
            .map(|&v| Version::from_wire(v))
            .collect()
    }

    /// Wire values of the advertised versions, unknown ones included.
    pub fn raw_versions(&self) -> &[u32] {
        &self.raw_versions
    }

    /// Parse a Version Negotiation packet, consuming the rest of `buf`.
    ///
    /// # Errors
    /// `PROTOCOL_VIOLATION` for a non-zero version, an empty version list or
    /// a trailer that is not a whole number of 4-byte versions.
    pub fn parse(buf: &mut Bytes) -> Result<Self> {
        let mut work = buf.clone();

        let prefix = read_long_prefix(&mut work)?;
        if prefix.version != VERSION_NEGOTIATION {
            return Err(Error::protocol_violation());
        }
        if work.remaining() == 0 || work.remaining() % 4 != 0 {
            return Err(Error::protocol_violation());
        }

        let mut raw_versions = Vec::with_capacity(work.remaining() / 4);
        while work.has_remaining() {
            raw_versions.push(work.get_u32());
        }

        *buf = work;
        Ok(Self::new(prefix.dcid, prefix.scid, &raw_versions))
    }

    /// Size on the wire. No packet number, so this is also the worst case.
    pub fn encoded_len(&self) -> usize {
        long_prefix_len(&self.dcid, &self.scid) + 4 * self.raw_versions.len()
    }

    pub fn write_header<B: BufMut>(&self, buf: &mut B) -> usize {
        buf.put_u8(HEADER_FORM_BIT | FIXED_BIT);
        buf.put_u32(VERSION_NEGOTIATION);
        write_connection_id(&self.dcid, buf);
        write_connection_id(&self.scid, buf);
        long_prefix_len(&self.dcid, &self.scid)
    }

    pub fn write_payload<B: BufMut>(&self, buf: &mut B) -> usize {
        for &version in &self.raw_versions {
            buf.put_u32(version);
        }
        4 * self.raw_versions.len()
    }

    pub fn write<B: BufMut>(&self, buf: &mut B) -> usize {
        self.write_header(buf) + self.write_payload(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_parse_version_negotiation() {
        let mut buf = Bytes::from_static(&[
            0xc0, // Long header
            0x00, 0x00, 0x00, 0x00, // Version = 0
            0x02, 0xaa, 0xbb, // DCID
            0x02, 0xcc, 0xdd, // SCID
            0x00, 0x00, 0x00, 0x01, //
            0x00, 0x00, 0x00, 0x02, //
            0x00, 0x00, 0x00, 0x00, //
        ]);

        let packet = VersionNegotiationPacket::parse(&mut buf).unwrap();
        assert_eq!(packet.dcid.as_bytes(), &[0xaa, 0xbb]);
        assert_eq!(packet.scid.as_bytes(), &[0xcc, 0xdd]);
        assert_eq!(
            packet.versions(),
            &[Some(Version::V1), None, Some(Version::V0)]
        );
        assert_eq!(packet.raw_versions(), &[1, 2, 0]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_type_bits_are_ignored() {
        for first_byte in [0x80, 0xb5, 0xf0, 0xff] {
            let mut buf = Bytes::from(vec![first_byte, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
            assert!(VersionNegotiationPacket::parse(&mut buf).is_ok());
        }
    }

    #[test]
    fn test_partial_version_rejected() {
        let mut buf = Bytes::from_static(&[0xc0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0xaa]);
        assert!(VersionNegotiationPacket::parse(&mut buf)
            .unwrap_err()
            .is_protocol_violation());
    }

    #[test]
    fn test_empty_version_list_rejected() {
        let mut buf = Bytes::from_static(&[0xc0, 0, 0, 0, 0, 0, 0]);
        assert!(VersionNegotiationPacket::parse(&mut buf).is_err());
    }

    #[test]
    fn test_non_zero_version_rejected() {
        let mut buf = Bytes::from_static(&[0xc0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1]);
        assert!(VersionNegotiationPacket::parse(&mut buf).is_err());
    }

    #[test]
    fn test_round_trip_preserves_unknown_versions() {
        let packet = VersionNegotiationPacket::new(
            ConnectionId::from_slice(&[0x01; 4]).unwrap(),
            ConnectionId::from_slice(&[0x02; 8]).unwrap(),
            &[0x1a2a_3a4a, 0x0000_0001, 0x6b33_43cf],
        );
        let mut buf = BytesMut::new();
        let written = packet.write(&mut buf);
        assert_eq!(written, buf.len());
        assert_eq!(written, packet.encoded_len());

        let parsed = VersionNegotiationPacket::parse(&mut buf.freeze()).unwrap();
        assert_eq!(parsed, packet);
        assert_eq!(parsed.versions(), &[None, Some(Version::V1), None]);
        assert_eq!(parsed.raw_versions(), &[0x1a2a_3a4a, 0x0000_0001, 0x6b33_43cf]);
    }
}
