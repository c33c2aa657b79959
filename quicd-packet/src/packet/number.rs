//! # Packet Number Encoding/Decoding (RFC 9000 Section 17.1)
//!
//! Packet numbers are sent truncated to 1-4 bytes. The receiver rebuilds the
//! full 62-bit value from the truncated bytes and the largest packet number
//! it has processed in the same space.
//!
//! ## Length selection
//!
//! ```text
//! no reference:   smallest L with  pn       < 2^(8L) - 1
//!                 (the all-ones value of every length is never used)
//! reference R:    smallest L with  pn - R   < 2^(8L-1)
//! ```
//!
//! ## Reconstruction (RFC 9000 Appendix A.3)
//!
//! ```text
//! expected  = R + 1
//! win       = 2^(8L), hwin = win / 2, mask = win - 1
//! candidate = (expected & !mask) | truncated
//! candidate <= expected - hwin && candidate < 2^62 - win  =>  candidate + win
//! candidate >  expected + hwin && candidate >= win        =>  candidate - win
//! ```

#![forbid(unsafe_code)]

use crate::error::{Error, Result};
use crate::types::{PacketNumber, MAX_PACKET_NUMBER};
use bytes::{Buf, BufMut};

/// Longest truncated packet number encoding.
pub const MAX_PN_LEN: usize = 4;

/// Packet number truncation utilities
pub struct PacketNumberCodec;

impl PacketNumberCodec {
    /// Number of bytes (1-4) needed to send `pn` given the `largest`
    /// packet number already processed in its space.
    ///
    /// # Errors
    /// - `NonMonotonic` if `pn` is not greater than `largest`
    /// - `ValueTooLarge` if no 1-4 byte encoding is unambiguous
    pub fn encoded_len(pn: PacketNumber, largest: Option<PacketNumber>) -> Result<usize> {
        if pn > MAX_PACKET_NUMBER {
            return Err(Error::ValueTooLarge(pn));
        }

        match largest {
            None => (1..=MAX_PN_LEN)
                .find(|&len| pn < (1u64 << (8 * len)) - 1)
                .ok_or(Error::ValueTooLarge(pn)),
            Some(largest) => {
                if pn <= largest {
                    return Err(Error::NonMonotonic {
                        packet_number: pn,
                        largest,
                    });
                }
                let distance = pn - largest;
                (1..=MAX_PN_LEN)
                    .find(|&len| distance < 1u64 << (8 * len - 1))
                    .ok_or(Error::ValueTooLarge(pn))
            }
        }
    }

    /// Write the truncated form of `pn` big-endian, returning its length.
    pub fn encode<B: BufMut>(
        pn: PacketNumber,
        largest: Option<PacketNumber>,
        buf: &mut B,
    ) -> Result<usize> {
        let len = Self::encoded_len(pn, largest)?;
        buf.put_uint(pn, len);
        Ok(len)
    }

    /// Read a `len`-byte truncated packet number and reconstruct it.
    ///
    /// # Errors
    /// - `InvalidLength` if `len` is outside 1..=4 (caller bug)
    /// - `ValueTooLarge` if `largest` exceeds 2^62-1
    /// - `PROTOCOL_VIOLATION` if fewer than `len` bytes remain or the
    ///   rebuilt value leaves the 62-bit space
    pub fn decode<B: Buf>(
        buf: &mut B,
        len: usize,
        largest: Option<PacketNumber>,
    ) -> Result<PacketNumber> {
        if !(1..=MAX_PN_LEN).contains(&len) {
            return Err(Error::InvalidLength(len));
        }
        check_reference(largest)?;
        if buf.remaining() < len {
            return Err(Error::protocol_violation());
        }
        let truncated = buf.get_uint(len);
        Self::decode_truncated(truncated, len, largest)
    }

    /// Reconstruct a full packet number from an already-read truncated value.
    pub fn decode_truncated(
        truncated: u64,
        len: usize,
        largest: Option<PacketNumber>,
    ) -> Result<PacketNumber> {
        if !(1..=MAX_PN_LEN).contains(&len) {
            return Err(Error::InvalidLength(len));
        }
        check_reference(largest)?;

        let pn_win = 1u64 << (8 * len);
        let pn_mask = pn_win - 1;
        let truncated = truncated & pn_mask;

        // Nothing to be ambiguous against yet
        let Some(largest) = largest else {
            return Ok(truncated);
        };

        let pn_hwin = pn_win / 2;
        let expected = largest + 1;
        let candidate = (expected & !pn_mask) | truncated;

        let pn = if candidate + pn_hwin <= expected && candidate < MAX_PACKET_NUMBER + 1 - pn_win {
            candidate + pn_win
        } else if candidate > expected + pn_hwin && candidate >= pn_win {
            candidate - pn_win
        } else {
            candidate
        };

        // Only reachable once the space is exhausted
        if pn > MAX_PACKET_NUMBER {
            return Err(Error::protocol_violation());
        }
        Ok(pn)
    }
}

/// Reference packet numbers share the 62-bit packet number domain.
fn check_reference(largest: Option<PacketNumber>) -> Result<()> {
    match largest {
        Some(largest) if largest > MAX_PACKET_NUMBER => Err(Error::ValueTooLarge(largest)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    fn round_trip(pn: PacketNumber, largest: Option<PacketNumber>) -> (PacketNumber, usize) {
        let mut buf = BytesMut::new();
        let len = PacketNumberCodec::encode(pn, largest, &mut buf).unwrap();
        assert_eq!(len, buf.len());
        let mut input = buf.freeze();
        let decoded = PacketNumberCodec::decode(&mut input, len, largest).unwrap();
        assert!(input.is_empty());
        (decoded, len)
    }

    #[test]
    fn test_round_trip_without_reference() {
        for pn in [0, 1, 0x7f, 0xfe, 0xff, 0xfffe, 0xffff, 0xfffffe] {
            let (decoded, _) = round_trip(pn, None);
            assert_eq!(decoded, pn);
        }
    }

    #[test]
    fn test_all_ones_forces_next_length() {
        assert_eq!(PacketNumberCodec::encoded_len(0xfe, None).unwrap(), 1);
        assert_eq!(PacketNumberCodec::encoded_len(0xff, None).unwrap(), 2);
        assert_eq!(PacketNumberCodec::encoded_len(0xfffe, None).unwrap(), 2);
        assert_eq!(PacketNumberCodec::encoded_len(0xffff, None).unwrap(), 3);
        assert_eq!(PacketNumberCodec::encoded_len(0xfffffe, None).unwrap(), 3);
        assert_eq!(PacketNumberCodec::encoded_len(0xffffff, None).unwrap(), 4);
        assert_eq!(
            PacketNumberCodec::encoded_len(0xffff_fffe, None).unwrap(),
            4
        );
        assert_eq!(
            PacketNumberCodec::encoded_len(0xffff_ffff, None),
            Err(Error::ValueTooLarge(0xffff_ffff))
        );
    }

    #[test]
    fn test_round_trip_with_reference() {
        let references = [0u64, 1, 0x7e, 0xff, 0x1234, 33000, 0xa82f30ea, 1 << 40];
        let distances = [
            1u64,
            2,
            0x7f,
            0x80,
            0x7fff,
            0x8000,
            0x7f_ffff,
            0x80_0000,
            0x7fff_ffff,
        ];
        for &largest in &references {
            for &distance in &distances {
                let pn = largest + distance;
                let (decoded, _) = round_trip(pn, Some(largest));
                assert_eq!(decoded, pn, "pn={pn:#x} largest={largest:#x}");
            }
        }
    }

    #[test]
    fn test_length_tracks_distance() {
        assert_eq!(PacketNumberCodec::encoded_len(100, Some(99)).unwrap(), 1);
        assert_eq!(PacketNumberCodec::encoded_len(0x80, Some(0)).unwrap(), 2);
        assert_eq!(PacketNumberCodec::encoded_len(1000, Some(500)).unwrap(), 2);
        assert_eq!(
            PacketNumberCodec::encoded_len(0x80_0000, Some(0)).unwrap(),
            4
        );
        assert_eq!(
            PacketNumberCodec::encoded_len(0x8000_0000, Some(0)),
            Err(Error::ValueTooLarge(0x8000_0000))
        );
    }

    #[test]
    fn test_non_monotonic_rejected() {
        for pn in [0u64, 7, 0xa82f9b32] {
            assert_eq!(
                PacketNumberCodec::encoded_len(pn, Some(pn)),
                Err(Error::NonMonotonic {
                    packet_number: pn,
                    largest: pn
                })
            );
            assert!(matches!(
                PacketNumberCodec::encode(pn, Some(pn + 1), &mut BytesMut::new()),
                Err(Error::NonMonotonic { .. })
            ));
        }
    }

    #[test]
    fn test_packet_number_out_of_range() {
        assert_eq!(
            PacketNumberCodec::encoded_len(MAX_PACKET_NUMBER + 1, Some(MAX_PACKET_NUMBER)),
            Err(Error::ValueTooLarge(MAX_PACKET_NUMBER + 1))
        );
    }

    #[test]
    fn test_rfc_reconstruction_example() {
        // RFC 9000 Appendix A.3
        let mut input = Bytes::from_static(&[0x9b, 0x32]);
        let pn = PacketNumberCodec::decode(&mut input, 2, Some(0xa82f30ea)).unwrap();
        assert_eq!(pn, 0xa82f9b32);
    }

    #[test]
    fn test_reconstruction_window_edges() {
        let mut input = Bytes::from_static(&[0x00, 0xe9]);
        let pn = PacketNumberCodec::decode(&mut input, 2, Some(33000)).unwrap();
        assert_eq!(pn, 33001 + 32768);

        let mut input = Bytes::from_static(&[0x00, 0xea]);
        let pn = PacketNumberCodec::decode(&mut input, 2, Some(33000)).unwrap();
        assert_eq!(pn, 0xea);
    }

    #[test]
    fn test_reconstruction_moves_down_a_window() {
        // Expected 0x1_0001, received 0xffff: closest is one window below.
        let pn = PacketNumberCodec::decode_truncated(0xffff, 2, Some(0x1_0000)).unwrap();
        assert_eq!(pn, 0xffff);
    }

    #[test]
    fn test_reconstruction_never_exceeds_max() {
        let largest = MAX_PACKET_NUMBER - 1;
        let pn = PacketNumberCodec::decode_truncated(0x00, 1, Some(largest)).unwrap();
        assert!(pn <= MAX_PACKET_NUMBER);
    }

    #[test]
    fn test_decode_without_reference_is_raw() {
        let mut input = Bytes::from_static(&[0xff, 0xff, 0xff]);
        let pn = PacketNumberCodec::decode(&mut input, 3, None).unwrap();
        assert_eq!(pn, 0xffffff);
    }

    #[test]
    fn test_decode_invalid_length() {
        let mut input = Bytes::from_static(&[0x01, 0x02, 0x03, 0x04, 0x05]);
        assert_eq!(
            PacketNumberCodec::decode(&mut input, 0, None),
            Err(Error::InvalidLength(0))
        );
        assert_eq!(
            PacketNumberCodec::decode(&mut input, 5, Some(1)),
            Err(Error::InvalidLength(5))
        );
        assert_eq!(input.len(), 5);
    }

    #[test]
    fn test_decode_truncated_input() {
        let mut input = Bytes::from_static(&[0x01, 0x02]);
        let err = PacketNumberCodec::decode(&mut input, 3, Some(10)).unwrap_err();
        assert!(err.is_protocol_violation());
        assert_eq!(input.len(), 2);
    }

    #[test]
    fn test_reference_outside_62_bits_rejected() {
        for largest in [u64::MAX, 1 << 62] {
            assert_eq!(
                PacketNumberCodec::decode_truncated(0x10, 1, Some(largest)),
                Err(Error::ValueTooLarge(largest))
            );
            let mut input = Bytes::from_static(&[0x10]);
            assert_eq!(
                PacketNumberCodec::decode(&mut input, 1, Some(largest)),
                Err(Error::ValueTooLarge(largest))
            );
            assert_eq!(input.len(), 1);
        }
    }

    #[test]
    fn test_largest_valid_reference() {
        let decoded =
            PacketNumberCodec::decode_truncated(0xff, 1, Some(MAX_PACKET_NUMBER)).unwrap();
        assert_eq!(decoded, MAX_PACKET_NUMBER);
        // The space is exhausted, nothing beyond 2^62-1 can be rebuilt
        assert!(
            PacketNumberCodec::decode_truncated(0x00, 1, Some(MAX_PACKET_NUMBER))
                .unwrap_err()
                .is_protocol_violation()
        );
    }
}
