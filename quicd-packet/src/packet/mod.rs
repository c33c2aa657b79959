//! Packet definitions, parsing and serialization.

mod api;
mod codec;
pub mod header;
mod long;
pub mod number;
mod protection;
mod retry;
mod short;
mod version_negotiation;

pub use api::{Packet, ParseContext};
pub use header::{check_reserved_bits, packet_number_len, PacketType};
pub use long::{InitialPacket, LongPacket};
pub use number::{PacketNumberCodec, MAX_PN_LEN};
pub use protection::HeaderInfo;
pub use retry::RetryPacket;
pub use short::ShortPacket;
pub use version_negotiation::VersionNegotiationPacket;
