//! End-to-end: config and templates from disk, authority and peer over a
//! loopback transport.

use std::path::PathBuf;
use std::sync::Arc;

use strata::core::ecs::{ApplyMode, TemplateResolver};
use strata::demo::{self, Label, Position};
use strata::networking::LoopbackTransport;
use strata::{Simulation, SimulationConfig};

const TEMPLATES: &str = r#"
[templates.drone]
[[templates.drone.components]]
kind = "Position"
value = [5.0, 5.0]

[[templates.drone.components]]
kind = "Velocity"
value = [1.0, 1.0]

[[templates.drone.components]]
kind = "Lifetime"
remaining = 0.5

[templates.scout]
extends = "drone"
[[templates.scout.components]]
kind = "Label"
text = "far scout"
"#;

fn write_templates(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("strata-{name}-{}.toml", std::process::id()));
    std::fs::write(&path, TEMPLATES).unwrap();
    path
}

fn setup(config: &SimulationConfig) -> (Simulation, Simulation) {
    let types = demo::component_types().unwrap();
    let templates: Arc<dyn TemplateResolver> = Arc::new(config.load_templates().unwrap().unwrap());
    let (a, b) = LoopbackTransport::pair_with_mtu(config.replication.max_packet_size);
    let mut authority =
        Simulation::authority(config, Arc::clone(&types), Box::new(a)).with_templates(templates);
    demo::install_systems(authority.registry_mut(), Arc::default()).unwrap();
    let peer = Simulation::peer(config, types, Box::new(b));
    (authority, peer)
}

#[test]
fn test_config_driven_session_converges() {
    let path = write_templates("converge");
    let source = format!(
        "tick_rate = 30\ntemplates = {:?}\n\n[replication]\nmode = \"instant\"\nmax_packet_size = 256\n",
        path.display().to_string()
    );
    let config = SimulationConfig::from_toml_str(&source, &PathBuf::from("inline.toml")).unwrap();
    assert_eq!(config.replication.mode, ApplyMode::Instant);
    let (mut authority, mut peer) = setup(&config);

    // Ticks count from 1. At 30 Hz the spawner fires at ticks 20, 40 and 60,
    // and each spawn lives half a second (15 ticks). Stop before tick 60.
    let mut seen_scout = false;
    let mut peak = 0;
    for _ in 0..59 {
        authority.step().unwrap();
        peer.step().unwrap();
        seen_scout |= peer
            .registry()
            .entities()
            .any(|e| e.get::<Label>().is_some_and(|l| l.text == "far scout"));
        assert_eq!(peer.content_hash(), authority.content_hash());
        assert_eq!(peer.registry().len(), authority.registry().len());
        peak = peak.max(peer.registry().len());
    }

    assert!(seen_scout);
    assert_eq!(peak, 1);
    assert_eq!(authority.registry().tick(), 59);
    assert!(authority.registry().is_empty());
    assert!(peer.registry().is_empty());
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_peer_sees_template_values() {
    let path = write_templates("values");
    let config = SimulationConfig {
        templates: Some(path.clone()),
        ..SimulationConfig::default()
    };
    let (mut authority, mut peer) = setup(&config);
    let e = authority
        .registry_mut()
        .create_entity_from_template("drone", None)
        .unwrap();

    authority.step().unwrap();
    peer.step().unwrap();

    // Interpolated peers start from the first payload.
    let position = peer.registry().component::<Position>(e).unwrap();
    assert!(position.value.x >= 5.0);
    assert!(position.value.x < 5.1);
    std::fs::remove_file(path).unwrap();
}
