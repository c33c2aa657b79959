//! # Coalesced Packets (RFC 9000 Section 12.2)
//!
//! A UDP datagram may carry several QUIC packets back to back. Long headers
//! with a Length field mark their own end; a short header, Retry or Version
//! Negotiation packet runs to the end of the datagram and so is always last.

#![forbid(unsafe_code)]

extern crate alloc;

use crate::error::Result;
use crate::frames::{Frame, FrameDecoder};
use crate::packet::{Packet, PacketType, ParseContext};
use crate::types::PacketNumber;
use alloc::vec::Vec;
use bytes::{BufMut, Bytes, BytesMut};
use core::ops::Range;
use tracing::trace;

/// Iterator over the packets of one datagram.
///
/// `context` supplies the [`ParseContext`] for each packet type, so each
/// packet number space can use its own largest packet number. Iteration
/// stops after the first error, which is yielded once.
pub struct CoalescedPackets<'a, D: ?Sized, C> {
    datagram: Bytes,
    decoder: &'a D,
    context: C,
    failed: bool,
}

impl<'a, D, C> CoalescedPackets<'a, D, C>
where
    D: FrameDecoder + ?Sized,
    C: FnMut(PacketType) -> ParseContext,
{
    pub fn new(datagram: Bytes, decoder: &'a D, context: C) -> Self {
        Self {
            datagram,
            decoder,
            context,
            failed: false,
        }
    }

    /// Bytes not yet parsed. After an error this starts at the offending
    /// packet.
    pub fn remaining(&self) -> &Bytes {
        &self.datagram
    }
}

impl<D, C> Iterator for CoalescedPackets<'_, D, C>
where
    D: FrameDecoder + ?Sized,
    C: FnMut(PacketType) -> ParseContext,
{
    type Item = Result<Packet<D::Frame>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.datagram.is_empty() {
            return None;
        }

        // Unreadable headers still go through parse so the error is reported
        let ctx = match Packet::<D::Frame>::peek_type(&self.datagram) {
            Ok(Some(packet_type)) => (self.context)(packet_type),
            _ => ParseContext::default(),
        };

        let result = Packet::parse(&mut self.datagram, &ctx, self.decoder);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// Builds one datagram out of coalesced packets.
///
/// Space is reserved with [`Packet::max_encoded_len`] so a packet accepted
/// here still fits once its packet number length is final. Each packet's
/// AEAD tag is left as a zeroed placeholder for the protection layer.
#[derive(Debug)]
pub struct DatagramBuilder {
    buf: BytesMut,
    max_size: usize,
    packets: Vec<Range<usize>>,
    sealed: bool,
}

impl DatagramBuilder {
    pub fn new(max_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_size),
            max_size,
            packets: Vec::new(),
            sealed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes still available in this datagram.
    pub fn remaining(&self) -> usize {
        self.max_size.saturating_sub(self.buf.len())
    }

    /// Byte range of every packet written so far, tag placeholder included.
    pub fn packets(&self) -> &[Range<usize>] {
        &self.packets
    }

    /// True once a packet without a Length field has been added.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Append `packet` if its worst-case size fits.
    ///
    /// Returns `Ok(false)` and writes nothing when it does not fit, or when
    /// the datagram already ends with a packet that has no Length field.
    ///
    /// # Errors
    /// Encoding errors from the packet (e.g. a non-monotonic packet number).
    /// Nothing is written in that case either.
    pub fn try_push<F: Frame>(
        &mut self,
        packet: &Packet<F>,
        largest: Option<PacketNumber>,
        tag_len: usize,
    ) -> Result<bool> {
        let packet_type = packet.packet_type();
        if self.sealed {
            trace!(?packet_type, "datagram already ends with an unbounded packet");
            return Ok(false);
        }

        let reserved = packet.max_encoded_len(tag_len)?;
        if reserved > self.remaining() {
            trace!(
                ?packet_type,
                reserved,
                remaining = self.remaining(),
                "packet does not fit datagram"
            );
            return Ok(false);
        }
        // Fail before writing anything
        let tag_len = match packet_type {
            PacketType::Retry | PacketType::VersionNegotiation => 0,
            _ => tag_len,
        };
        let expected = packet.encoded_len(largest, tag_len)?;

        let start = self.buf.len();
        let written = packet.write(largest, tag_len, &mut self.buf)?;
        self.buf.put_bytes(0, tag_len);
        debug_assert_eq!(written + tag_len, expected);

        self.packets.push(start..self.buf.len());
        self.sealed = matches!(
            packet_type,
            PacketType::OneRtt | PacketType::Retry | PacketType::VersionNegotiation
        );
        Ok(true)
    }

    /// Finished datagram.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{RawPayload, RawPayloadDecoder};
    use crate::packet::{InitialPacket, LongPacket, RetryPacket, ShortPacket};
    use crate::types::{ConnectionId, Token};
    use crate::version::Version;

    fn cid(byte: u8) -> ConnectionId {
        ConnectionId::from_slice(&[byte; 8]).unwrap()
    }

    fn initial(pn: PacketNumber) -> Packet<RawPayload> {
        Packet::Initial(InitialPacket {
            version: Version::V1,
            dcid: cid(1),
            scid: cid(2),
            token: Token::default(),
            packet_number: pn,
            frames: vec![RawPayload(Bytes::from_static(&[0x06; 40]))],
        })
    }

    fn handshake(pn: PacketNumber) -> Packet<RawPayload> {
        Packet::Handshake(LongPacket {
            version: Version::V1,
            dcid: cid(1),
            scid: cid(2),
            packet_number: pn,
            frames: vec![RawPayload(Bytes::from_static(&[0x06; 60]))],
        })
    }

    fn one_rtt(pn: PacketNumber) -> Packet<RawPayload> {
        Packet::OneRtt(ShortPacket {
            spin: false,
            key_phase: false,
            dcid: cid(1),
            packet_number: pn,
            frames: vec![RawPayload(Bytes::from_static(b"application data"))],
        })
    }

    fn context(packet_type: PacketType) -> ParseContext {
        match packet_type {
            PacketType::Initial => ParseContext::default().with_largest_pn(3),
            PacketType::Handshake => ParseContext::default(),
            _ => ParseContext::default().with_dcid_len(8),
        }
    }

    #[test]
    fn test_build_and_split_datagram() {
        let mut builder = DatagramBuilder::new(1200);
        assert!(builder.try_push(&initial(4), Some(3), 0).unwrap());
        assert!(builder.try_push(&handshake(0), None, 0).unwrap());
        assert!(builder.try_push(&one_rtt(0x100), None, 0).unwrap());
        assert!(builder.is_sealed());
        assert_eq!(builder.packets().len(), 3);
        let datagram = builder.finish();

        let packets: Vec<_> = CoalescedPackets::new(datagram, &RawPayloadDecoder, context)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(packets, vec![initial(4), handshake(0), one_rtt(0x100)]);
    }

    #[test]
    fn test_iteration_stops_at_first_error() {
        let mut datagram = BytesMut::new();
        initial(4).write(Some(3), 0, &mut datagram).unwrap();
        // Handshake header with fixed bit cleared, then trailing junk
        datagram.extend_from_slice(&[0xa0, 0, 0, 0, 1, 0, 0, 2, 0, 1, 0xff, 0xff]);

        let mut iter = CoalescedPackets::new(datagram.freeze(), &RawPayloadDecoder, context);
        assert_eq!(iter.next(), Some(Ok(initial(4))));
        assert!(iter.next().unwrap().unwrap_err().is_protocol_violation());
        assert_eq!(iter.remaining().len(), 12);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_packet_that_does_not_fit() {
        let packet = handshake(0);
        let max = packet.max_encoded_len(16).unwrap();

        let mut builder = DatagramBuilder::new(max - 1);
        assert!(!builder.try_push(&packet, None, 16).unwrap());
        assert!(builder.is_empty());

        let mut builder = DatagramBuilder::new(max);
        assert!(builder.try_push(&packet, None, 16).unwrap());
        assert_eq!(builder.len(), packet.encoded_len(None, 16).unwrap());
        assert!(builder.remaining() >= 3);
    }

    #[test]
    fn test_nothing_follows_unbounded_packet() {
        let retry = Packet::<RawPayload>::Retry(RetryPacket {
            version: Version::V1,
            dcid: cid(3),
            scid: cid(4),
            token: Token::from_slice(b"token"),
            integrity_tag: [0; 16],
        });
        let mut builder = DatagramBuilder::new(1200);
        assert!(builder.try_push(&retry, None, 16).unwrap());
        assert_eq!(builder.len(), retry.encoded_len(None, 16).unwrap());
        assert!(!builder.try_push(&initial(0), None, 16).unwrap());
        assert_eq!(builder.packets(), &[0..builder.len()]);
    }

    #[test]
    fn test_encoding_error_writes_nothing() {
        let mut builder = DatagramBuilder::new(1200);
        assert!(builder.try_push(&initial(3), Some(3), 16).is_err());
        assert!(builder.is_empty());
        assert!(builder.packets().is_empty());
    }
}
