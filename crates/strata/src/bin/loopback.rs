//! # STRATA Loopback
//!
//! Runs an authority and a peer in one process, connected by an in-memory
//! transport, and reports whether the peer converged.
//!
//! ```bash
//! strata_loopback [config.toml] [ticks]
//! RUST_LOG=strata_networking=debug strata_loopback
//! ```

use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use strata::core::ecs::{ApplyMode, TemplateResolver};
use strata::networking::LoopbackTransport;
use strata::{demo, init_logging, Simulation, SimulationConfig, SimulationError, SimulationResult};
use tracing::{error, info, warn};

const DEFAULT_TICKS: u64 = 600;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimulationConfig::load(path),
        None => Ok(SimulationConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("strata_loopback: {e}");
            return ExitCode::FAILURE;
        }
    };
    let ticks = args
        .next()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    if let Err(e) = init_logging(&config.log_filter) {
        eprintln!("strata_loopback: {e}");
    }

    match run(&config, ticks) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!(error = %e, "Loopback run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &SimulationConfig, ticks: u64) -> SimulationResult<bool> {
    let types = demo::component_types()?;
    let templates: Arc<dyn TemplateResolver> = match config.load_templates()? {
        Some(library) => Arc::new(library),
        None => Arc::new(demo::templates().map_err(|source| SimulationError::Parse {
            path: "<built-in>".into(),
            source,
        })?),
    };
    let (server_end, client_end) = LoopbackTransport::pair_with_mtu(config.replication.max_packet_size);

    let authority_config = config.clone();
    let authority_types = Arc::clone(&types);
    let authority = thread::Builder::new()
        .name("authority".into())
        .spawn(move || -> SimulationResult<u64> {
            let mut sim = Simulation::authority(&authority_config, authority_types, Box::new(server_end))
                .with_templates(templates);
            demo::install_systems(sim.registry_mut(), Arc::default())?;
            sim.run_realtime(ticks)?;
            let stats = sim.tick_stats();
            info!(
                entities = sim.registry().len(),
                avg_tick_us = stats.avg_tick_us,
                late_ticks = stats.late_ticks,
                bytes_sent = sim.transport().stats().bytes_sent,
                "Authority finished"
            );
            Ok(sim.content_hash())
        })
        .map_err(|source| SimulationError::Io {
            path: "<authority thread>".into(),
            source,
        })?;

    let visible = Arc::new(AtomicUsize::new(0));
    let mut peer = Simulation::peer(config, types, Box::new(client_end));
    demo::install_systems(peer.registry_mut(), Arc::clone(&visible))?;

    match peer.run_realtime(u64::MAX) {
        Err(e) if !e.is_disconnect() => return Err(e),
        _ => {}
    }
    // Destructions received in the final poll take effect on the next tick.
    peer.registry_mut().run_tick(0.0);
    if config.replication.mode == ApplyMode::Interpolated {
        // Let render time pass the last sample so every property settles.
        let delay = config.registry.render_delay_secs;
        thread::sleep(Duration::from_secs_f64(delay.max(0.0)));
        peer.registry_mut().apply_interpolation(delay);
    }

    let authority_hash = match authority.join() {
        Ok(result) => result?,
        Err(_) => {
            warn!("Authority thread panicked");
            return Ok(false);
        }
    };

    let converged = peer.content_hash() == authority_hash;
    info!(
        peer_entities = peer.registry().len(),
        visible = visible.load(Ordering::Relaxed),
        bytes_received = peer.transport().stats().bytes_received,
        converged,
        "Peer finished"
    );
    Ok(converged)
}
