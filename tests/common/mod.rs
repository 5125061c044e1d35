//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use smart_home_sim::config::ScenarioConfig;
use smart_home_sim::events::{Event, StateKey};
use smart_home_sim::sim::clock::ManualTimeSource;
use smart_home_sim::simulation::Simulation;

/// Tolerance for temperature comparisons.
pub const EPS: f64 = 1e-9;

/// Real seconds that cover `virtual_secs` at the default 60x speed.
pub fn real_secs(virtual_secs: f64) -> f64 {
    virtual_secs / 60.0
}

pub fn temp(time: u64, key: StateKey, value: i64) -> Event {
    Event::integer(time, key, value, "").unwrap()
}

pub fn toggle(time: u64, key: StateKey, on: bool) -> Event {
    Event::boolean(time, key, on, "").unwrap()
}

/// Outdoor 80 °F at 0 and 3600, thermostat 70 °F at 0, front door closed.
pub fn baseline_history() -> Vec<Event> {
    vec![
        temp(0, StateKey::OutdoorTemp, 80),
        temp(0, StateKey::ThermostatTemp, 70),
        temp(3600, StateKey::OutdoorTemp, 80),
        toggle(0, StateKey::FrontDoor, false),
    ]
}

/// Started simulation on a manual clock with `history` loaded.
pub fn started(
    config: ScenarioConfig,
    history: Vec<Event>,
) -> (ManualTimeSource, Simulation<ManualTimeSource>) {
    let source = ManualTimeSource::new();
    let sim = Simulation::with_source(config, source.clone()).unwrap();
    sim.load_baseline(history).unwrap();
    sim.start().unwrap();
    (source, sim)
}

/// Unique scratch path under the system temp directory.
pub fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("smart-home-sim-{}-{name}", std::process::id()))
}
