//! Packet Codec Error Types
//!
//! Two disjoint error domains live here:
//! - **Transport errors** (RFC 9000 Section 20.1): malformed input coming off
//!   the wire. The packet layer only ever raises `PROTOCOL_VIOLATION`; the
//!   offending packet or datagram is dropped by the caller.
//! - **Encode misuse**: a caller handed the encoder a value it cannot
//!   represent (out of range, non-monotonic packet number, bad length).

#![forbid(unsafe_code)]

use core::fmt;
use thiserror::Error;

/// Transport Error Codes as defined in RFC 9000 Section 20.1
///
/// Only the codes this layer (and the frame decoders plugged into it) can
/// surface are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum TransportError {
    /// No Error (0x00)
    NoError = 0x00,

    /// Internal Error (0x01) - Implementation error
    InternalError = 0x01,

    /// Frame Encoding Error (0x07) - Raised by frame decoders
    FrameEncodingError = 0x07,

    /// Protocol Violation (0x0a) - Any structural packet problem
    ProtocolViolation = 0x0a,
}

impl TransportError {
    /// Wire value carried in a CONNECTION_CLOSE frame.
    pub fn code(self) -> u64 {
        self as u64
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportError::NoError => "NO_ERROR",
            TransportError::InternalError => "INTERNAL_ERROR",
            TransportError::FrameEncodingError => "FRAME_ENCODING_ERROR",
            TransportError::ProtocolViolation => "PROTOCOL_VIOLATION",
        };
        write!(f, "{} (0x{:02x})", name, self.code())
    }
}

/// Generic Result Type for packet codec operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the packet codec.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Malformed input (decode path).
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// Value outside the representable domain (e.g. negative).
    #[error("invalid value")]
    InvalidValue,

    /// Value too large for the target encoding.
    #[error("value {0} too large to encode")]
    ValueTooLarge(u64),

    /// Packet number not strictly greater than the reference.
    #[error("packet number {packet_number} is not greater than largest {largest}")]
    NonMonotonic { packet_number: u64, largest: u64 },

    /// Truncated packet number length outside 1..=4.
    #[error("invalid packet number length {0}")]
    InvalidLength(usize),

    /// Long header carrying a version this layer cannot interpret.
    #[error("unsupported version 0x{0:08x}")]
    UnsupportedVersion(u32),
}

impl Error {
    /// Shorthand for the only error kind the decode path raises.
    #[inline]
    pub fn protocol_violation() -> Self {
        Error::Transport(TransportError::ProtocolViolation)
    }

    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Error::Transport(TransportError::ProtocolViolation))
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}
