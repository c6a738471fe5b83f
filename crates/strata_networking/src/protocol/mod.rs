//! # Replication Protocol
//!
//! Binary framing of lifecycle events and entity updates.
//!
//! ## Packet Structure
//!
//! ```text
//! ┌────────────┬─────────────┬──────────────────────────────┐
//! │ type (1)   │ tick (4)    │ body (variable)              │
//! └────────────┴─────────────┴──────────────────────────────┘
//! ```
//!
//! Component payloads travel opaque: the protocol never looks inside the
//! `[u16 mask][values]` blobs produced by the component model.

mod packets;
mod serialization;

pub use packets::{framed_update_len, Packet, PacketType};
pub use serialization::{decode_packet, encode_packet, pack_updates};
