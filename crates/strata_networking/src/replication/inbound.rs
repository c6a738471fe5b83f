//! # Peer-side Replication
//!
//! Decodes authority packets and applies them to the local registry.
//! Malformed packets and bad updates are counted and logged, never fatal.

use strata_core::ecs::{ApplyMode, Registry};
use strata_core::error::EcsError;
use tracing::{debug, warn};

use crate::error::NetworkResult;
use crate::protocol::{decode_packet, Packet};
use crate::transport::Transport;

/// Inbound statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Packets decoded.
    pub packets_received: u64,
    /// Packets that failed to decode.
    pub malformed_packets: u64,
    /// Entities spawned on authority request.
    pub entities_spawned: u64,
    /// Destructions queued on authority request.
    pub entities_destroyed: u64,
    /// Entity updates applied.
    pub updates_applied: u64,
    /// Entity updates dropped.
    pub updates_dropped: u64,
}

/// Applies authority packets to a peer registry.
#[derive(Debug)]
pub struct ReplicaReceiver {
    mode: ApplyMode,
    last_tick: Option<u32>,
    stats: ReceiverStats,
}

impl ReplicaReceiver {
    /// Creates a receiver applying updates in `mode`.
    #[must_use]
    pub fn new(mode: ApplyMode) -> Self {
        Self {
            mode,
            last_tick: None,
            stats: ReceiverStats::default(),
        }
    }

    /// Update application mode.
    #[must_use]
    pub const fn mode(&self) -> ApplyMode {
        self.mode
    }

    /// Newest authority tick seen.
    #[must_use]
    pub const fn last_tick(&self) -> Option<u32> {
        self.last_tick
    }

    /// Inbound statistics.
    #[must_use]
    pub const fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Decodes and applies one packet.
    ///
    /// # Errors
    ///
    /// Framing errors; the registry is untouched in that case. Per-entity
    /// update failures are not errors, only counted.
    pub fn receive(&mut self, registry: &mut Registry, bytes: &[u8]) -> NetworkResult<()> {
        let packet = decode_packet(bytes).map_err(|error| {
            self.stats.malformed_packets += 1;
            warn!(len = bytes.len(), %error, "Dropping malformed packet");
            error
        })?;
        self.apply(registry, &packet);
        Ok(())
    }

    /// Applies a decoded packet.
    pub fn apply(&mut self, registry: &mut Registry, packet: &Packet) {
        self.stats.packets_received += 1;
        let tick = packet.tick();
        self.last_tick = Some(self.last_tick.map_or(tick, |last| last.max(tick)));

        match packet {
            Packet::EntityAdded { entity, .. } => match registry.create_entity(Some(*entity)) {
                Ok(_) => self.stats.entities_spawned += 1,
                Err(EcsError::EntityExists(_)) => {
                    debug!(entity = %entity, "Replicated entity already present");
                }
                Err(error) => warn!(entity = %entity, %error, "Spawn failed"),
            },
            Packet::EntityDestroyed { entity, .. } => match registry.destroy_entity(*entity) {
                Ok(()) => self.stats.entities_destroyed += 1,
                Err(error) => debug!(entity = %entity, %error, "Destroy for unknown entity"),
            },
            Packet::EntityUpdates { updates, .. } => {
                let report = registry.apply_batch(updates, self.mode);
                self.stats.updates_applied += report.applied as u64;
                self.stats.updates_dropped += report.failures.len() as u64;
            }
        }
    }

    /// Receives and applies every packet queued on `transport`. Returns the
    /// number of packets applied.
    ///
    /// # Errors
    ///
    /// [`NetworkError::Disconnected`](crate::error::NetworkError::Disconnected) once the transport is closed and
    /// drained. Malformed packets are skipped.
    pub fn poll(
        &mut self,
        registry: &mut Registry,
        transport: &mut dyn Transport,
    ) -> NetworkResult<usize> {
        let mut applied = 0;
        while let Some(bytes) = transport.recv()? {
            if self.receive(registry, &bytes).is_ok() {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

impl Default for ReplicaReceiver {
    fn default() -> Self {
        Self::new(ApplyMode::Instant)
    }
}
