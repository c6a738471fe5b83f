//! # STRATA
//!
//! Replicated simulation wiring: configuration, logging, the fixed-tick
//! [`Simulation`] loop for either side, and a small demo world.
//!
//! ```text
//! ┌──────────────┐   ┌────────────────────┐   ┌──────────────┐
//! │ strata_core  │ ◄─│ strata_networking  │ ◄─│    strata    │
//! │ registry/ECS │   │ packets/replicator │   │ loop/config  │
//! └──────────────┘   └────────────────────┘   └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata::{demo, Simulation, SimulationConfig};
//! use strata_networking::LoopbackTransport;
//!
//! let config = SimulationConfig::default();
//! let types = demo::component_types()?;
//! let (a, b) = LoopbackTransport::pair();
//! let mut authority = Simulation::authority(&config, types.clone(), Box::new(a));
//! let mut peer = Simulation::peer(&config, types, Box::new(b));
//! authority.step()?;
//! peer.step()?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod demo;
pub mod error;
pub mod game_loop;
pub mod logging;

pub use config::{ReplicationConfig, SimulationConfig};
pub use error::{SimulationError, SimulationResult};
pub use game_loop::{Role, Simulation};
pub use logging::init_logging;

/// Re-export of the registry crate.
pub mod core {
    pub use strata_core::*;
}

/// Re-export of the replication crate.
pub mod networking {
    pub use strata_networking::*;
}
