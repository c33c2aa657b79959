//! # Variable-Length Integer Encoding (RFC 9000 Section 16)
//!
//! QUIC packs integers up to 2^62 - 1 into 1, 2, 4 or 8 bytes. The two most
//! significant bits of the first byte select the length:
//!
//! ```text
//! 2MSB | Length | Usable Bits | Range
//! -----+--------+-------------+-----------------------
//! 00   | 1      | 6           | 0-63
//! 01   | 2      | 14          | 0-16383
//! 10   | 4      | 30          | 0-1073741823
//! 11   | 8      | 62          | 0-4611686018427387903
//! ```
//!
//! Decoding reads from a [`bytes::Buf`] whose `remaining()` is the caller's
//! byte budget; a successful decode advances it by exactly the encoded length.

#![forbid(unsafe_code)]

use crate::error::{Error, Result};
use bytes::{Buf, BufMut};

/// Variable-Length Integer (RFC 9000 Section 16)
pub type VarInt = u64;

/// Maximum value for VarInt (2^62 - 1)
pub const VARINT_MAX: u64 = (1u64 << 62) - 1;

/// VarInt encoding and decoding utilities
pub struct VarIntCodec;

impl VarIntCodec {
    /// Encoded size (1, 2, 4 or 8) of `value`.
    ///
    /// # Errors
    /// `ValueTooLarge` if `value` exceeds [`VARINT_MAX`].
    pub fn size(value: VarInt) -> Result<usize> {
        if value < 0x40 {
            Ok(1)
        } else if value < 0x4000 {
            Ok(2)
        } else if value < 0x4000_0000 {
            Ok(4)
        } else if value <= VARINT_MAX {
            Ok(8)
        } else {
            Err(Error::ValueTooLarge(value))
        }
    }

    /// Validate a signed value coming from an API that allows negatives.
    pub fn from_signed(value: i64) -> Result<VarInt> {
        if value < 0 {
            return Err(Error::InvalidValue);
        }
        let value = value as u64;
        if value > VARINT_MAX {
            return Err(Error::ValueTooLarge(value));
        }
        Ok(value)
    }

    /// Encode `value` into `buf`, returning the number of bytes written.
    pub fn encode<B: BufMut>(value: VarInt, buf: &mut B) -> Result<usize> {
        let size = Self::size(value)?;
        match size {
            1 => buf.put_u8(value as u8),
            2 => buf.put_u16(0x4000 | value as u16),
            4 => buf.put_u32(0x8000_0000 | value as u32),
            _ => buf.put_u64(0xc000_0000_0000_0000 | value),
        }
        Ok(size)
    }

    /// Encode the value 0 (always a single byte).
    #[inline]
    pub fn encode_zero<B: BufMut>(buf: &mut B) -> usize {
        buf.put_u8(0);
        1
    }

    /// Decode a VarInt, consuming exactly its encoded length from `buf`.
    ///
    /// # Errors
    /// `PROTOCOL_VIOLATION` if fewer bytes remain than the length prefix
    /// announces. Nothing is consumed on failure.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<VarInt> {
        if !buf.has_remaining() {
            return Err(Error::protocol_violation());
        }

        let first = buf.chunk()[0];
        let len = 1usize << (first >> 6);
        if buf.remaining() < len {
            return Err(Error::protocol_violation());
        }

        let mut value = (buf.get_u8() & 0x3f) as u64;
        for _ in 1..len {
            value = (value << 8) | buf.get_u8() as u64;
        }
        Ok(value)
    }
}
