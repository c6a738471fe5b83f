//! # Simulation Loop
//!
//! One side of a replicated simulation: a registry, a fixed tick and the
//! replication role that side plays.
//!
//! ```text
//! AUTHORITY tick N                     PEER tick N
//! ┌───────────────────────────┐        ┌───────────────────────────────┐
//! │ 1. run_tick (4 phases)    │        │ 1. poll transport, apply      │
//! │ 2. replicator.flush ──────┼──────> │ 2. interpolate (if enabled)   │
//! └───────────────────────────┘        │ 3. run_tick (4 phases)        │
//!                                      └───────────────────────────────┘
//! ```

use std::sync::Arc;

use strata_core::ecs::{ApplyMode, ComponentTypes, Registry, Runner, TemplateResolver, TickTime};
use strata_core::Clock;
use strata_networking::{ReplicaReceiver, Replicator, TickLoop, TickStats, Transport};
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::error::SimulationResult;

/// Replication role of one side.
#[derive(Debug)]
pub enum Role {
    /// Owns the simulation and broadcasts changes.
    Authority(Replicator),
    /// Mirrors the authority.
    Peer(ReplicaReceiver),
}

/// A registry driven at a fixed tick and wired to a transport.
pub struct Simulation {
    registry: Registry,
    ticks: TickLoop,
    role: Role,
    transport: Box<dyn Transport>,
    render_delay: f64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("registry", &self.registry)
            .field("role", &self.role)
            .field("tick", &self.ticks.tick())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Authority side.
    #[must_use]
    pub fn authority(
        config: &SimulationConfig,
        types: Arc<ComponentTypes>,
        transport: Box<dyn Transport>,
    ) -> Self {
        let registry = Registry::new(types, config.registry_for(Runner::Authority));
        let max_packet_size = config
            .replication
            .max_packet_size
            .min(transport.max_packet_size());
        let replicator = Replicator::new(&registry, max_packet_size);
        Self::assemble(config, registry, Role::Authority(replicator), transport)
    }

    /// Peer side.
    #[must_use]
    pub fn peer(
        config: &SimulationConfig,
        types: Arc<ComponentTypes>,
        transport: Box<dyn Transport>,
    ) -> Self {
        let registry = Registry::new(types, config.registry_for(Runner::Peer));
        let receiver = ReplicaReceiver::new(config.replication.mode);
        Self::assemble(config, registry, Role::Peer(receiver), transport)
    }

    fn assemble(
        config: &SimulationConfig,
        registry: Registry,
        role: Role,
        transport: Box<dyn Transport>,
    ) -> Self {
        info!(
            runner = ?registry.runner(),
            tick_rate = config.tick_rate,
            mode = ?config.replication.mode,
            "Simulation ready"
        );
        Self {
            render_delay: registry.config().render_delay_secs,
            registry,
            ticks: TickLoop::new(config.tick_rate),
            role,
            transport,
        }
    }

    /// Installs a template resolver (builder style).
    #[must_use]
    pub fn with_templates(mut self, templates: Arc<dyn TemplateResolver>) -> Self {
        self.registry = self.registry.with_templates(templates);
        self
    }

    /// Replaces the registry clock (builder style).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.registry = self.registry.with_clock(clock);
        self
    }

    /// The registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The registry, mutably. Use it to install systems and seed entities.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Replication role.
    #[must_use]
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// The transport.
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Tick timing statistics.
    #[must_use]
    pub fn tick_stats(&self) -> &TickStats {
        self.ticks.stats()
    }

    /// Runs one fixed tick.
    ///
    /// # Errors
    ///
    /// Transport errors. A peer sees
    /// [`NetworkError::Disconnected`](strata_networking::NetworkError::Disconnected)
    /// once the authority is gone and every packet was applied.
    pub fn step(&mut self) -> SimulationResult<TickTime> {
        let (_, started) = self.ticks.begin_tick();
        let delta = self.ticks.delta_secs();

        let time = match &mut self.role {
            Role::Authority(replicator) => {
                let time = self.registry.run_tick(delta);
                let sent = replicator.flush(&mut self.registry, self.transport.as_mut(), time.tick)?;
                if sent > 0 {
                    debug!(tick = time.tick, packets = sent, "Flushed");
                }
                time
            }
            Role::Peer(receiver) => {
                receiver.poll(&mut self.registry, self.transport.as_mut())?;
                if receiver.mode() == ApplyMode::Interpolated {
                    self.registry.apply_interpolation(self.render_delay);
                }
                let time = self.registry.run_tick(delta);
                // Peers do not forward notifications.
                let _ = self.registry.drain_notifications();
                time
            }
        };

        self.ticks.end_tick(started);
        Ok(time)
    }

    /// Runs `count` ticks back to back.
    ///
    /// # Errors
    ///
    /// The first [`Simulation::step`] error.
    pub fn run_ticks(&mut self, count: u64) -> SimulationResult<()> {
        for _ in 0..count {
            self.step()?;
        }
        Ok(())
    }

    /// Runs up to `max_ticks` ticks paced by wall time. Returns the ticks run.
    ///
    /// # Errors
    ///
    /// The first [`Simulation::step`] error.
    pub fn run_realtime(&mut self, max_ticks: u64) -> SimulationResult<u64> {
        let mut ran = 0;
        while ran < max_ticks {
            let due = self.ticks.poll();
            if due == 0 {
                self.ticks.sleep_until_next();
                continue;
            }
            for _ in 0..due {
                if ran == max_ticks {
                    break;
                }
                self.step()?;
                ran += 1;
            }
        }
        Ok(ran)
    }

    /// Sends every replicated entity in full, for a peer that joined late.
    /// Returns the number of packets sent; zero on a peer.
    ///
    /// # Errors
    ///
    /// Transport errors.
    pub fn resync(&mut self) -> SimulationResult<usize> {
        let Role::Authority(replicator) = &self.role else {
            return Ok(0);
        };
        let packets = replicator.full_state(&self.registry, self.registry.tick());
        for packet in &packets {
            self.transport
                .send(&strata_networking::encode_packet(packet))?;
        }
        info!(packets = packets.len(), "Full state sent");
        Ok(packets.len())
    }

    /// Order-stable hash of the registry contents.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        self.registry.content_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{self, Position, Velocity};
    use strata_networking::LoopbackTransport;

    fn instant_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.replication.mode = ApplyMode::Instant;
        config
    }

    fn pair(config: &SimulationConfig) -> (Simulation, Simulation) {
        let types = demo::component_types().unwrap();
        let templates: Arc<dyn TemplateResolver> = Arc::new(demo::templates().unwrap());
        let (a, b) = LoopbackTransport::pair();
        let mut authority = Simulation::authority(config, Arc::clone(&types), Box::new(a))
            .with_templates(templates);
        demo::install_systems(authority.registry_mut(), Arc::default()).unwrap();
        let peer = Simulation::peer(config, types, Box::new(b));
        (authority, peer)
    }

    #[test]
    fn test_peer_mirrors_authority() {
        let (mut authority, mut peer) = pair(&instant_config());
        for _ in 0..90 {
            authority.step().unwrap();
            peer.step().unwrap();
        }

        assert!(authority.registry().len() >= 4);
        assert_eq!(peer.registry().len(), authority.registry().len());
        assert_eq!(peer.content_hash(), authority.content_hash());
        assert_eq!(authority.tick_stats().total_ticks, 90);
    }

    #[test]
    fn test_resync_rebuilds_a_fresh_peer() {
        let config = instant_config();
        let (mut authority, _first_peer) = pair(&config);
        for _ in 0..45 {
            authority.step().unwrap();
        }

        let types = demo::component_types().unwrap();
        let (a, b) = LoopbackTransport::pair();
        authority.transport = Box::new(a);
        let mut late = Simulation::peer(&config, types, Box::new(b));
        assert!(authority.resync().unwrap() > 0);
        late.step().unwrap();

        assert_eq!(late.content_hash(), authority.content_hash());
        assert_eq!(late.resync().unwrap(), 0);
    }

    #[test]
    fn test_peer_reports_disconnect() {
        let (authority, mut peer) = pair(&instant_config());
        drop(authority);
        let error = peer.step().unwrap_err();
        assert!(error.is_disconnect());
    }

    #[test]
    fn test_interpolated_peer_lags_behind() {
        let mut config = SimulationConfig::default();
        config.registry.render_delay_secs = 0.05;
        let clock = Arc::new(strata_core::ManualClock::new(0.0));
        let (mut authority, peer) = pair(&config);
        let mut peer = peer.with_clock(clock.clone());

        let e = authority.registry_mut().create_entity(None).unwrap();
        authority.registry_mut().add_component(e, Position::default()).unwrap();
        authority
            .registry_mut()
            .add_component(e, Velocity { value: strata_shared::Vec2::new(60.0, 0.0) })
            .unwrap();

        for _ in 0..30 {
            clock.advance(1.0 / 60.0);
            authority.step().unwrap();
            peer.step().unwrap();
        }

        let truth = authority.registry().component::<Position>(e).unwrap().value.x;
        let seen = peer.registry().component::<Position>(e).unwrap().value.x;
        assert!((truth - 30.0).abs() < 0.01);
        assert!(seen < truth);
        assert!(seen > 20.0);
    }
}
