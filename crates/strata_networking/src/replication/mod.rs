//! # Replication
//!
//! ```text
//! AUTHORITY                                   PEER
//! Registry ─> Replicator ─> Transport ─> ReplicaReceiver ─> Registry
//!   notifications    packets            decode, spawn, apply
//! ```

mod inbound;
mod outbound;

pub use inbound::{ReceiverStats, ReplicaReceiver};
pub use outbound::{ReplicationStats, Replicator};
