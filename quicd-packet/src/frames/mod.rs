//! # Frame Payload Boundary (RFC 9000 Section 12.4)
//!
//! Frame formats are not defined by this crate. A packet hands its payload
//! byte range to an injected [`FrameDecoder`] and serializes whatever
//! [`Frame`] values it carries. The only rule enforced here is that the
//! decoder consumes the declared payload exactly.

pub mod parse;
pub mod types;

pub use parse::{decode_payload, FrameDecoder, FrameIterator};
pub use types::{Frame, RawPayload, RawPayloadDecoder};
