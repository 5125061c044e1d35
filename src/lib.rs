//! Smart-home simulation-time engine.
//!
//! A [`sim::clock::VirtualClock`] replays a recorded (or synthetic) history
//! of device state changes held in an [`events::EventStore`]. The
//! [`sim::engine::SimulationEngine`] turns each analysis window into a
//! [`sim::types::Snapshot`] of indoor temperature, electricity and water,
//! and [`simulation::Simulation`] ties everything together behind a
//! thread-safe facade that also accepts live user overrides.

pub mod config;
pub mod error;
pub mod events;
pub mod io;
pub mod runner;
/// Clock, usage model, engine and producers.
pub mod sim;
pub mod simulation;
