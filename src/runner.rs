//! Headless replay: drives a simulation on a hand-advanced clock, acting as
//! the scheduler that a server would otherwise provide.

use tracing::{debug, info};

use crate::config::CadenceConfig;
use crate::error::SimError;
use crate::sim::clock::ManualTimeSource;
use crate::sim::types::{Snapshot, TimeInfo};
use crate::simulation::Simulation;

/// Everything a replay produced.
#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    /// One snapshot per analysis tick.
    pub snapshots: Vec<Snapshot>,
    /// Number of events relayed by the forwarder.
    pub forwarded_events: usize,
    /// Number of time-info readings taken.
    pub time_infos: usize,
    /// Most recent time-info reading.
    pub last_time_info: Option<TimeInfo>,
}

/// Starts `sim` and runs its three producers on their cadences for
/// `horizon` virtual seconds after the clock's first second (or until its
/// own end).
///
/// Real time is advanced in steps no longer than the shortest cadence at
/// the current speed, so every producer fires on schedule. Cadences count
/// from the clock's start, not from virtual time zero.
///
/// # Errors
///
/// Propagates any [`SimError`] from starting, forwarding or ticking.
pub fn run_replay(
    sim: &Simulation<ManualTimeSource>,
    source: &ManualTimeSource,
    cadence: &CadenceConfig,
    horizon: f64,
) -> Result<ReplayOutcome, SimError> {
    sim.start()?;
    let start = sim.time();
    let until = (start + horizon).min(sim.clock().max_time());
    info!(start, until, speed = sim.clock_speed(), "replay started");

    let mut outcome = ReplayOutcome::default();
    let mut real = 0.0_f64;
    let mut next_time_info = cadence.time_info_real_secs;
    let mut next_events = start + cadence.events_app_secs;
    let mut next_analysis = start + cadence.analysis_app_secs;

    loop {
        let speed = sim.clock_speed();
        let step = cadence
            .time_info_real_secs
            .min(cadence.events_app_secs / speed)
            .min(cadence.analysis_app_secs / speed);
        source.advance(step);
        real += step;
        let now = sim.time();

        if real >= next_time_info {
            let info = sim.time_info();
            debug!(%info, "time info");
            outcome.time_infos += 1;
            outcome.last_time_info = Some(info);
            next_time_info += cadence.time_info_real_secs;
        }
        if now >= next_events {
            outcome.forwarded_events += sim.forward_events()?.len();
            next_events += cadence.events_app_secs;
        }
        if now >= next_analysis {
            outcome.snapshots.push(sim.tick()?);
            next_analysis += cadence.analysis_app_secs;
        }
        if now >= until || sim.is_finished() {
            break;
        }
    }

    info!(
        ticks = outcome.snapshots.len(),
        forwarded = outcome.forwarded_events,
        "replay finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::io::synthetic::TimelineGenerator;

    #[test]
    fn one_day_replay_ticks_every_half_hour() {
        let source = ManualTimeSource::new();
        let config = ScenarioConfig::baseline();
        let sim = Simulation::with_source(config.clone(), source.clone()).unwrap();
        sim.load_baseline(TimelineGenerator::new(1, 11).generate().unwrap())
            .unwrap();

        let outcome = run_replay(&sim, &source, &config.cadence, 86_400.0).unwrap();
        assert_eq!(outcome.snapshots.len(), 48);
        assert!(outcome.forwarded_events > 0);
        // 86 400 s at 60x is 1440 real seconds.
        assert_eq!(outcome.time_infos, 1440);
        assert!(outcome
            .snapshots
            .windows(2)
            .all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn replay_stops_at_clock_end() {
        let source = ManualTimeSource::new();
        let mut config = ScenarioConfig::baseline();
        config.clock.max_time = 7200;
        let sim = Simulation::with_source(config.clone(), source.clone()).unwrap();
        sim.load_baseline(TimelineGenerator::new(1, 2).generate().unwrap())
            .unwrap();

        let outcome = run_replay(&sim, &source, &config.cadence, f64::INFINITY).unwrap();
        assert_eq!(outcome.snapshots.len(), 4);
        assert!(sim.is_finished());
    }

    #[test]
    fn cadences_count_from_a_late_start() {
        let source = ManualTimeSource::new();
        let mut config = ScenarioConfig::baseline();
        config.clock.min_time = 86_400;
        config.clock.max_time = 172_800;
        let sim = Simulation::with_source(config.clone(), source.clone()).unwrap();
        sim.load_baseline(TimelineGenerator::new(2, 4).generate().unwrap())
            .unwrap();

        let outcome = run_replay(&sim, &source, &config.cadence, 86_400.0).unwrap();
        assert_eq!(outcome.snapshots.len(), 48);
        assert!((outcome.snapshots[0].time - 88_200.0 / 86_400.0).abs() < 1e-9);
        let half_hour = 1800.0 / 86_400.0;
        assert!(outcome
            .snapshots
            .windows(2)
            .all(|w| (w[1].time - w[0].time - half_hour).abs() < 1e-9));
        assert!(sim.is_finished());
    }
}
