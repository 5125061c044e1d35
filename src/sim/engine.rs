//! Analysis engine: turns each newly elapsed event window into a `Snapshot`.

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::config::SECONDS_PER_DAY;
use crate::error::SimError;
use crate::events::{Event, RangeQuery, SharedEventStore, StateKey, StateType};

use super::clock::{SystemTimeSource, TimeSource, VirtualClock};
use super::formulas;
use super::producer::SnapshotProducer;
use super::types::{ElectricityUsage, Snapshot, WaterUsage};
use super::usage::UsageAccumulator;

const OPENINGS: [StateType; 2] = [StateType::Door, StateType::Window];

/// Mutable model state, present once the engine has been prepared.
#[derive(Debug, Clone)]
struct ModelState {
    last_publish_time: u64,
    last_calculation_time: u64,
    indoor_temp: f64,
    outdoor_temp: i64,
    thermostat_temp: i64,
    usage: UsageAccumulator,
}

impl ModelState {
    /// Records a new outdoor or thermostat reading and advances the indoor
    /// temperature to the event's time. Returns the HVAC draw for that span.
    ///
    /// # Panics
    ///
    /// Panics if the event is not an outdoor or thermostat temperature.
    fn apply_temperature(&mut self, event: &Event) -> f64 {
        let value = event
            .as_integer()
            .unwrap_or_else(|| panic!("temperature model received boolean event: {event}"));
        match event.state_key() {
            StateKey::OutdoorTemp => self.outdoor_temp = value,
            StateKey::ThermostatTemp => self.thermostat_temp = value,
            other => panic!("integer event for unsupported key \"{other}\""),
        }

        let elapsed = event.time().saturating_sub(self.last_calculation_time);
        let step = formulas::indoor_temp_and_hvac_electricity(
            self.indoor_temp,
            self.outdoor_temp as f64,
            self.thermostat_temp as f64,
            elapsed as f64,
            self.usage.open_door_time() as f64,
            self.usage.open_window_time() as f64,
        );
        trace!(
            time = event.time(),
            elapsed,
            from = self.indoor_temp,
            to = step.indoor_temp,
            hvac_watts = step.hvac_electricity,
            "thermal step"
        );

        self.indoor_temp = step.indoor_temp;
        self.last_calculation_time = event.time();
        self.usage.reset_window(event.time(), Some(&OPENINGS));
        step.hvac_electricity
    }
}

/// Derives indoor temperature and utility usage from the event store.
///
/// Each [`SimulationEngine::tick`] consumes the events in
/// `[last tick, now)`: boolean events feed the usage accumulator and every
/// outdoor/thermostat change advances the thermal model up to that event.
/// The engine must be prepared before the first tick.
pub struct SimulationEngine<S: TimeSource = SystemTimeSource> {
    clock: Arc<VirtualClock<S>>,
    store: SharedEventStore,
    state: Option<ModelState>,
}

impl<S: TimeSource> SimulationEngine<S> {
    /// Creates an unprepared engine reading `clock` and `store`.
    pub fn new(clock: Arc<VirtualClock<S>>, store: SharedEventStore) -> Self {
        Self {
            clock,
            store,
            state: None,
        }
    }

    /// Resets the model to the start of the stored history.
    ///
    /// Both windows start at the store's earliest time, outdoor and
    /// thermostat temperatures come from their first events, and the indoor
    /// temperature starts at the thermostat setpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptyBaseline`] for an empty store and
    /// [`SimError::MissingInitialValue`] when either temperature has no event.
    pub fn prepare(&mut self) -> Result<(), SimError> {
        let store = self.store.read();
        let start = store.min_time().ok_or(SimError::EmptyBaseline)?;
        let initial = |key: StateKey| {
            store
                .first_event(key)
                .and_then(Event::as_integer)
                .ok_or(SimError::MissingInitialValue(key))
        };
        let outdoor_temp = initial(StateKey::OutdoorTemp)?;
        let thermostat_temp = initial(StateKey::ThermostatTemp)?;

        self.state = Some(ModelState {
            last_publish_time: start,
            last_calculation_time: start,
            indoor_temp: thermostat_temp as f64,
            outdoor_temp,
            thermostat_temp,
            usage: UsageAccumulator::new(),
        });
        info!(start, outdoor_temp, thermostat_temp, "analysis engine prepared");
        Ok(())
    }

    /// Consumes the events elapsed since the previous tick and returns the
    /// metrics for that window.
    ///
    /// Usage covers only on/off intervals completed inside the window. Once
    /// the clock reaches its end, further ticks see an empty window and keep
    /// returning valid snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotPrepared`] if [`SimulationEngine::prepare`]
    /// has not succeeded yet.
    ///
    /// # Panics
    ///
    /// Panics if the store yields an integer event for a key other than the
    /// outdoor or thermostat temperature.
    pub fn tick(&mut self) -> Result<Snapshot, SimError> {
        let state = self.state.as_mut().ok_or(SimError::NotPrepared)?;
        let start = state.last_publish_time;
        let end = self.clock.time().floor() as u64;

        state.usage.reset_window(start, None);
        let mut electricity = 0.0;
        let mut processed = 0_usize;
        {
            let store = self.store.read();
            for event in store.range(RangeQuery::all().between(start, end)) {
                if event.is_boolean() {
                    state.usage.process_event(event);
                } else {
                    electricity += state.apply_temperature(event);
                }
                processed += 1;
            }
        }
        state.last_publish_time = end.max(start);

        electricity += state.usage.electricity_usage();
        let window = end.saturating_sub(start) as f64;
        let gallons = state.usage.water_usage();
        let snapshot = Snapshot::new(
            end as f64 / SECONDS_PER_DAY as f64,
            state.indoor_temp,
            ElectricityUsage {
                watts: electricity,
                dollars: formulas::electricity_cost(electricity, window),
            },
            WaterUsage {
                gallons,
                dollars: formulas::water_cost(gallons),
            },
        );
        debug!(
            start,
            end,
            processed,
            indoor = snapshot.indoor_temp,
            watts = snapshot.electricity.watts,
            gallons = snapshot.water.gallons,
            "analysis tick"
        );
        Ok(snapshot)
    }

    /// Returns `true` once [`SimulationEngine::prepare`] has succeeded.
    pub fn is_prepared(&self) -> bool {
        self.state.is_some()
    }

    /// Modelled indoor temperature, if prepared.
    pub fn indoor_temp(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.indoor_temp)
    }

    /// End of the last consumed window, if prepared.
    pub fn last_publish_time(&self) -> Option<u64> {
        self.state.as_ref().map(|s| s.last_publish_time)
    }

    /// Usage accumulator, if prepared.
    pub fn usage(&self) -> Option<&UsageAccumulator> {
        self.state.as_ref().map(|s| &s.usage)
    }
}

impl<S: TimeSource> SnapshotProducer for SimulationEngine<S> {
    type Output = Snapshot;

    fn prepare(&mut self) -> Result<(), SimError> {
        SimulationEngine::prepare(self)
    }

    fn produce(&mut self) -> Result<Snapshot, SimError> {
        self.tick()
    }
}
