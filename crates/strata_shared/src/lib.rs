//! # STRATA Shared
//!
//! Common types used by both the simulation authority and the rendering peer.
//!
//! ## CRITICAL RULE
//!
//! Everything in this crate is part of the wire contract. Both peers are
//! built from the same definitions and never renegotiate them, so:
//! - Changing a constant here is a protocol break
//! - Records are plain data with no behaviour beyond construction
//!
//! If you need codecs or ECS types, put them in `strata_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod events;
pub mod math;
pub mod protocol;

pub use constants::{
    DEFAULT_NOTIFICATION_BACKLOG, DEFAULT_RENDER_DELAY_SECS, HEADER_SIZE, LENGTH_PREFIX_SIZE,
    MAX_PACKET_SIZE, MAX_PROPERTIES, MAX_PROPERTY_INDEX, TICK_RATE,
};
pub use events::{NetworkPolicy, Notification};
pub use math::{Color, Rect, Vec2};
pub use protocol::{ComponentPayload, EntityId, EntityUpdate, KindId};
