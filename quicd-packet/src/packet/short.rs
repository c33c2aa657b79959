//! # 1-RTT Packet (RFC 9000 Section 17.3.1)
//!
//! ```text
//! 1-RTT Packet {
//!   Header Form (1) = 0,
//!   Fixed Bit (1) = 1,
//!   Spin Bit (1),
//!   Reserved Bits (2),
//!   Key Phase (1),
//!   Packet Number Length (2),
//!   Destination Connection ID (0..160),
//!   Packet Number (8..32),
//!   Packet Payload (8..),
//! }
//! ```
//!
//! The DCID length is not on the wire; it comes from [`ParseContext`]. With
//! no Length field the payload runs to the end of the datagram, so a short
//! header packet is always the last one in it.

#![forbid(unsafe_code)]

extern crate alloc;

use super::api::ParseContext;
use super::codec::{frames_len, take_bytes, write_frames};
use super::header::{
    check_reserved_bits, packet_number_len, FIXED_BIT, HEADER_FORM_BIT, KEY_PHASE_BIT,
    SHORT_RESERVED_BITS, SPIN_BIT,
};
use super::number::{PacketNumberCodec, MAX_PN_LEN};
use crate::error::{Error, Result};
use crate::frames::{decode_payload, Frame, FrameDecoder};
use crate::types::{ConnectionId, PacketNumber};
use alloc::vec::Vec;
use bytes::{Buf, BufMut, Bytes};

/// 1-RTT packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortPacket<F> {
    pub spin: bool,
    pub key_phase: bool,
    pub dcid: ConnectionId,
    pub packet_number: PacketNumber,
    pub frames: Vec<F>,
}

impl<F> ShortPacket<F> {
    /// Parse a 1-RTT packet, consuming the rest of `buf`.
    pub fn parse<D>(buf: &mut Bytes, ctx: &ParseContext, decoder: &D) -> Result<Self>
    where
        D: FrameDecoder<Frame = F> + ?Sized,
    {
        let mut work = buf.clone();

        if !work.has_remaining() {
            return Err(Error::protocol_violation());
        }
        let first_byte = work.get_u8();
        if first_byte & HEADER_FORM_BIT != 0 || first_byte & FIXED_BIT == 0 {
            return Err(Error::protocol_violation());
        }
        check_reserved_bits(first_byte, SHORT_RESERVED_BITS)?;

        let dcid = ConnectionId::new(take_bytes(&mut work, ctx.short_dcid_len as usize)?)
            .ok_or_else(Error::protocol_violation)?;

        let pn_len = packet_number_len(first_byte);
        if work.remaining() < pn_len + ctx.tag_len {
            return Err(Error::protocol_violation());
        }
        let packet_number = PacketNumberCodec::decode(&mut work, pn_len, ctx.largest_pn)?;
        let payload = work.split_to(work.remaining() - ctx.tag_len);
        let frames = decode_payload(decoder, payload)?;
        work.advance(ctx.tag_len);

        *buf = work;
        Ok(Self {
            spin: first_byte & SPIN_BIT != 0,
            key_phase: first_byte & KEY_PHASE_BIT != 0,
            dcid,
            packet_number,
            frames,
        })
    }
}

impl<F: Frame> ShortPacket<F> {
    fn fixed_len(&self) -> usize {
        1 + self.dcid.len()
    }

    pub fn payload_len(&self) -> usize {
        frames_len(&self.frames)
    }

    /// Exact size on the wire, AEAD tag included.
    pub fn encoded_len(&self, largest: Option<PacketNumber>, tag_len: usize) -> Result<usize> {
        let pn_len = PacketNumberCodec::encoded_len(self.packet_number, largest)?;
        Ok(self.fixed_len() + pn_len + self.payload_len() + tag_len)
    }

    pub fn max_encoded_len(&self, tag_len: usize) -> usize {
        self.fixed_len() + MAX_PN_LEN + self.payload_len() + tag_len
    }

    pub fn write_header<B: BufMut>(
        &self,
        largest: Option<PacketNumber>,
        buf: &mut B,
    ) -> Result<usize> {
        let pn_len = PacketNumberCodec::encoded_len(self.packet_number, largest)?;

        let mut first_byte = FIXED_BIT | (pn_len as u8 - 1);
        if self.spin {
            first_byte |= SPIN_BIT;
        }
        if self.key_phase {
            first_byte |= KEY_PHASE_BIT;
        }
        buf.put_u8(first_byte);
        buf.put_slice(self.dcid.as_bytes());
        PacketNumberCodec::encode(self.packet_number, largest, buf)?;

        Ok(self.fixed_len() + pn_len)
    }

    pub fn write_payload<B: BufMut>(&self, buf: &mut B) -> usize {
        write_frames(&self.frames, buf)
    }

    /// Serialize header and payload. The AEAD tag is not written.
    pub fn write<B: BufMut>(&self, largest: Option<PacketNumber>, buf: &mut B) -> Result<usize> {
        let header_len = self.write_header(largest, buf)?;
        Ok(header_len + self.write_payload(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{RawPayload, RawPayloadDecoder};
    use bytes::BytesMut;

    fn ctx(dcid_len: u8) -> ParseContext {
        ParseContext::default().with_dcid_len(dcid_len)
    }

    #[test]
    fn test_parse_short_header() {
        let mut buf = Bytes::from_static(&[
            0x65, // fixed, spin, key phase, pn_len=2
            0xaa, 0xbb, 0xcc, 0xdd, // DCID
            0x01, 0x02, // Packet number
            0x01, 0x00, 0x00, // Payload
        ]);

        let packet = ShortPacket::parse(&mut buf, &ctx(4), &RawPayloadDecoder).unwrap();
        assert!(packet.spin);
        assert!(packet.key_phase);
        assert_eq!(packet.dcid.as_bytes(), &[0xaa, 0xbb, 0xcc, 0xdd]);
        assert_eq!(packet.packet_number, 0x0102);
        assert_eq!(
            packet.frames,
            vec![RawPayload(Bytes::from_static(&[0x01, 0x00, 0x00]))]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_reserved_bits_rejected() {
        for first_byte in [0x48, 0x50, 0x58] {
            let mut buf = Bytes::from(vec![first_byte, 0x01, 0x01]);
            let err = ShortPacket::parse(&mut buf, &ctx(0), &RawPayloadDecoder).unwrap_err();
            assert!(err.is_protocol_violation());
            assert_eq!(buf.len(), 3);
        }
    }

    #[test]
    fn test_long_form_or_missing_fixed_bit_rejected() {
        for first_byte in [0xc0, 0x00] {
            let mut buf = Bytes::from(vec![first_byte, 0x01, 0x01]);
            assert!(ShortPacket::parse(&mut buf, &ctx(0), &RawPayloadDecoder).is_err());
        }
    }

    #[test]
    fn test_empty_payload_rejected() {
        let mut buf = Bytes::from_static(&[0x40, 0xaa, 0x07]);
        let err = ShortPacket::parse(&mut buf, &ctx(1), &RawPayloadDecoder).unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_tag_is_skipped() {
        let packet = ShortPacket {
            spin: false,
            key_phase: true,
            dcid: ConnectionId::from_slice(&[0x11; 8]).unwrap(),
            packet_number: 0x1_0000,
            frames: vec![RawPayload(Bytes::from_static(b"stream data"))],
        };
        let mut buf = BytesMut::new();
        let written = packet.write(Some(0xff00), &mut buf).unwrap();
        assert_eq!(written + 16, packet.encoded_len(Some(0xff00), 16).unwrap());
        buf.extend_from_slice(&[0x99; 16]);

        let ctx = ctx(8).with_tag_len(16).with_largest_pn(0xff00);
        let parsed = ShortPacket::parse(&mut buf.freeze(), &ctx, &RawPayloadDecoder).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn test_short_round_trip_and_lengths() {
        let packet = ShortPacket {
            spin: true,
            key_phase: false,
            dcid: ConnectionId::empty(),
            packet_number: 0xfe,
            frames: vec![RawPayload(Bytes::from_static(&[0x01]))],
        };
        let mut buf = BytesMut::new();
        let written = packet.write(None, &mut buf).unwrap();
        assert_eq!(written, packet.encoded_len(None, 0).unwrap());
        assert_eq!(written, 3);
        assert!(packet.max_encoded_len(0) >= written);

        let parsed = ShortPacket::parse(&mut buf.freeze(), &ctx(0), &RawPayloadDecoder).unwrap();
        assert_eq!(parsed, packet);
    }
}
