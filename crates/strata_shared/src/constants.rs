//! # Wire & Timing Constants
//!
//! **CRITICAL:** These values are baked into both peers.
//! Changes require rebuilding the authority and every peer.

// =============================================================================
// PROPERTY HEADER
// =============================================================================

/// Size of the property inclusion header in bytes (one 16-bit mask).
pub const HEADER_SIZE: usize = 2;

/// Number of property slots a component kind can declare.
///
/// Each slot is one bit of the 16-bit inclusion header.
pub const MAX_PROPERTIES: usize = 16;

/// Highest valid property index (inclusive).
pub const MAX_PROPERTY_INDEX: u8 = 15;

/// Size of the length/count prefix used by text and array payloads.
pub const LENGTH_PREFIX_SIZE: usize = 4;

// =============================================================================
// TIMING
// =============================================================================

/// Default simulation tick rate (ticks per second).
pub const TICK_RATE: u32 = 60;

/// Default delay between the newest received state and what the peer renders.
///
/// 100ms covers roughly six authority ticks at 60Hz, enough to always hold
/// two bracketing samples under moderate jitter.
pub const DEFAULT_RENDER_DELAY_SECS: f64 = 0.1;

// =============================================================================
// NETWORK
// =============================================================================

/// Maximum packet size (MTU-safe).
pub const MAX_PACKET_SIZE: usize = 1200;

/// Default notification backlog that triggers a warning.
pub const DEFAULT_NOTIFICATION_BACKLOG: usize = 4096;
