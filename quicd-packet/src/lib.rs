//! quicd-packet: QUIC Packet Codec
//!
//! Bit-exact encoding and decoding of QUIC v1 packets as specified in
//! RFC 9000 Sections 12.2, 16 and 17, and RFC 8999.
//!
//! # Architecture
//!
//! - **Zero-copy parsing**: packets are parsed from a `bytes::Bytes` cursor and
//!   keep sub-slices of the datagram for IDs, tokens and frame payloads
//! - **All-or-nothing parse**: a failed parse leaves the cursor untouched and
//!   returns no partial packet
//! - **Pluggable frames**: payloads are handed to an injected
//!   [`frames::FrameDecoder`]; frame formats live elsewhere
//! - **Crypto-agnostic**: header protection masks and AEAD tags are computed
//!   by the caller; this crate only exposes offsets and lengths
//!
//! # Module Organization
//!
//! - `varint`: variable-length integers (RFC 9000 Section 16)
//! - `packet`: packet number truncation, header bits, the six packet
//!   shapes and the [`Packet`] dispatcher
//! - `frames`: frame payload boundary
//! - `coalesce`: splitting and building multi-packet datagrams
//! - `config`: codec settings loaded from TOML
//!
//! # Example
//!
//! ```
//! use bytes::{Bytes, BytesMut};
//! use quicd_packet::frames::{RawPayload, RawPayloadDecoder};
//! use quicd_packet::packet::ShortPacket;
//! use quicd_packet::{ConnectionId, Packet, ParseContext};
//!
//! let packet = Packet::OneRtt(ShortPacket {
//!     spin: false,
//!     key_phase: false,
//!     dcid: ConnectionId::from_slice(&[0xab; 8]).unwrap(),
//!     packet_number: 42,
//!     frames: vec![RawPayload(Bytes::from_static(b"hello"))],
//! });
//!
//! let mut buf = BytesMut::new();
//! packet.write(Some(41), 0, &mut buf).unwrap();
//!
//! let ctx = ParseContext::default().with_dcid_len(8).with_largest_pn(41);
//! let parsed = Packet::parse(&mut buf.freeze(), &ctx, &RawPayloadDecoder).unwrap();
//! assert_eq!(parsed, packet);
//! ```

pub mod coalesce;
pub mod config;
pub mod error;
pub mod frames;
pub mod packet;
pub mod types;
pub mod varint;
pub mod version;

// Re-export key types
pub use coalesce::{CoalescedPackets, DatagramBuilder};
pub use config::{CodecConfig, ConfigValidator};
pub use error::{Error, Result, TransportError};
pub use packet::{HeaderInfo, Packet, PacketNumberCodec, PacketType, ParseContext};
pub use types::{ConnectionId, EncryptionLevel, PacketNumber, PacketNumberSpace, Token};
pub use varint::{VarInt, VarIntCodec};
pub use version::Version;
