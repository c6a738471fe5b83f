//! # STRATA Networking
//!
//! Replication between one authority registry and its peers.
//!
//! ## Architecture
//!
//! ```text
//! AUTHORITY                                     PEER
//!   Registry                                      Registry
//!     │ notifications                               ▲ apply_batch
//!     ▼                                             │
//!   Replicator ──Packet──> Transport ──bytes──> ReplicaReceiver
//! ```
//!
//! - **Protocol**: little-endian framing, one packet per transport datagram,
//!   bounded by the MTU
//! - **Replicator**: folds change notifications into per-component dirty
//!   masks and honors each kind's send throttle
//! - **Receiver**: applies updates instantly or as interpolation samples
//! - **Tick loop**: fixed-timestep accumulator driving both sides
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_networking::{LoopbackTransport, ReplicaReceiver, Replicator};
//!
//! let (mut server_end, mut client_end) = LoopbackTransport::pair();
//! let mut replicator = Replicator::new(&authority, server_end.max_packet_size());
//! let mut receiver = ReplicaReceiver::default();
//!
//! authority.run_tick(1.0 / 60.0);
//! replicator.flush(&mut authority, &mut server_end, authority.tick())?;
//! receiver.poll(&mut peer, &mut client_end)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod protocol;
pub mod replication;
pub mod tick;
pub mod transport;

pub use error::{NetworkError, NetworkResult};
pub use protocol::{decode_packet, encode_packet, pack_updates, Packet, PacketType};
pub use replication::{ReceiverStats, ReplicaReceiver, ReplicationStats, Replicator};
pub use tick::{TickLoop, TickStats};
pub use transport::{LoopbackTransport, Transport, TransportStats};
