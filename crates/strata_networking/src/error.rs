//! Networking error types.

use strata_core::error::{CodecError, EcsError};
use strata_shared::EntityId;
use thiserror::Error;

/// Errors raised while framing, sending or receiving replication traffic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// A packet ended early or carried an impossible length.
    #[error("malformed packet: {0}")]
    Framing(#[from] CodecError),

    /// Unknown leading type byte.
    #[error("unknown packet type {0:#04x}")]
    UnknownPacketType(u8),

    /// Bytes left over after a complete packet.
    #[error("{0} trailing bytes after packet body")]
    TrailingBytes(usize),

    /// A packet exceeds the transport's size limit.
    #[error("packet of {size} bytes exceeds the {max} byte limit")]
    PacketTooLarge {
        /// Encoded size.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// A single entity update cannot fit in any packet.
    #[error("update for entity {entity} needs {size} bytes, packets hold {max}")]
    UpdateTooLarge {
        /// Entity of the update.
        entity: EntityId,
        /// Framed size of the update alone.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// The other end of the transport is gone.
    #[error("transport disconnected")]
    Disconnected,

    /// Registry rejected an operation.
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

/// Result type for networking operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
