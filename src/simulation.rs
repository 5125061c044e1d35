//! Thread-safe facade over the clock, the event store and the producers.
//!
//! Request handlers and schedulers share one [`Simulation`] (usually in an
//! `Arc`) and call into it concurrently: user submissions take the store's
//! write lock, ticks hold the engine mutex and read the store.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::events::{
    Event, EventError, EventStore, EventValue, Provenance, SharedEventStore, StateKey,
};
use crate::sim::clock::{SystemTimeSource, TimeSource, VirtualClock};
use crate::sim::engine::SimulationEngine;
use crate::sim::producer::{EventForwarder, SnapshotProducer, TimeInfoProducer, events_between};
use crate::sim::types::{Snapshot, TimeInfo};

/// A running smart-home simulation.
///
/// # Examples
///
/// ```
/// use smart_home_sim::config::ScenarioConfig;
/// use smart_home_sim::events::{Event, EventValue, StateKey};
/// use smart_home_sim::sim::clock::ManualTimeSource;
/// use smart_home_sim::simulation::Simulation;
///
/// let source = ManualTimeSource::new();
/// let sim = Simulation::with_source(ScenarioConfig::baseline(), source.clone()).unwrap();
/// sim.load_baseline([
///     Event::integer(0, StateKey::OutdoorTemp, 80, "").unwrap(),
///     Event::integer(0, StateKey::ThermostatTemp, 70, "").unwrap(),
/// ])
/// .unwrap();
/// sim.start().unwrap();
///
/// source.advance(30.0); // 30 min of virtual time at 60x
/// sim.submit_user_event(StateKey::FrontDoor, EventValue::Boolean(true)).unwrap();
/// let snapshot = sim.tick().unwrap();
/// assert_eq!(snapshot.indoor_temp, 70.0);
/// ```
pub struct Simulation<S: TimeSource = SystemTimeSource> {
    config: ScenarioConfig,
    clock: Arc<VirtualClock<S>>,
    store: SharedEventStore,
    engine: Mutex<SimulationEngine<S>>,
    forwarder: Mutex<EventForwarder<S>>,
    time_info: TimeInfoProducer<S>,
}

impl Simulation<SystemTimeSource> {
    /// Creates a simulation driven by the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if `config` fails validation.
    pub fn new(config: ScenarioConfig) -> Result<Self, SimError> {
        Self::with_source(config, SystemTimeSource::default())
    }
}

impl<S: TimeSource> Simulation<S> {
    /// Creates a simulation driven by `source`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] for the first validation failure in
    /// `config`, or [`SimError::Clock`] if the clock rejects it.
    pub fn with_source(config: ScenarioConfig, source: S) -> Result<Self, SimError> {
        if let Some(err) = config.validate().into_iter().next() {
            return Err(err.into());
        }
        let clock = Arc::new(VirtualClock::with_source(&config.clock, source)?);
        let store = EventStore::new().into_shared();
        Ok(Self {
            engine: Mutex::new(SimulationEngine::new(Arc::clone(&clock), Arc::clone(&store))),
            forwarder: Mutex::new(
                EventForwarder::new(Arc::clone(&clock), Arc::clone(&store))
                    .with_provenance(Provenance::PreGenerated),
            ),
            time_info: TimeInfoProducer::new(Arc::clone(&clock), config.clock.start_date),
            config,
            clock,
            store,
        })
    }

    /// Loads the pre-generated history and returns how many events were stored.
    ///
    /// Call once before [`Simulation::start`]; events at an existing
    /// `(time, key)` replace the earlier record.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptyBaseline`] if `events` is empty.
    pub fn load_baseline(&self, events: impl IntoIterator<Item = Event>) -> Result<usize, SimError> {
        let events: Vec<Event> = events.into_iter().collect();
        if events.is_empty() {
            return Err(SimError::EmptyBaseline);
        }
        let count = self.store.write().put(Provenance::PreGenerated, events);
        info!(count, "baseline loaded");
        Ok(count)
    }

    /// Prepares every producer and starts the clock from its first second.
    ///
    /// # Errors
    ///
    /// Returns the engine's preparation error (empty baseline or a missing
    /// initial temperature); the clock is left untouched in that case.
    pub fn start(&self) -> Result<(), SimError> {
        self.engine.lock().prepare()?;
        self.forwarder.lock().prepare()?;
        self.clock.start();
        Ok(())
    }

    /// Discards user events and starts over from the beginning.
    ///
    /// # Errors
    ///
    /// See [`Simulation::start`].
    pub fn restart(&self) -> Result<(), SimError> {
        self.store.write().clear_user_generated();
        self.start()
    }

    /// Records a client change at the current virtual second.
    ///
    /// The event gets the key's default state type and a readable message
    /// such as `"Front Door is OPEN"`. Rejected submissions leave the store
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - [`SimError::NotUserSettable`] for appliances and the outdoor temperature
    /// - [`SimError::Event`] when the value kind does not match the key
    /// - [`SimError::ThermostatOutOfRange`] for setpoints outside the configured range
    pub fn submit_user_event(&self, key: StateKey, value: EventValue) -> Result<Event, SimError> {
        let message = self
            .validate_user_event(key, value)
            .inspect_err(|err| warn!(%key, %value, %err, "user event rejected"))?;

        // Stamp under the write lock: a tick that already read its end waits
        // for the insert, one that holds the read lock ends before the stamp.
        let mut store = self.store.write();
        let time = self.clock.time().floor() as u64;
        let event = Event::new(time, key.default_state_type(), key, value, message)?;
        store.put(Provenance::UserGenerated, [event.clone()]);
        drop(store);

        info!(time, %key, %value, "user event stored");
        Ok(event)
    }

    fn validate_user_event(&self, key: StateKey, value: EventValue) -> Result<String, SimError> {
        if !key.is_user_settable() {
            return Err(SimError::NotUserSettable(key));
        }
        match value {
            EventValue::Integer(temp) if key == StateKey::ThermostatTemp => {
                let range = &self.config.thermostat;
                if !range.accepts(temp) {
                    return Err(SimError::ThermostatOutOfRange {
                        value: temp,
                        min: range.min_temp,
                        max: range.max_temp,
                    });
                }
                Ok(key.describe(value))
            }
            EventValue::Boolean(_) if key != StateKey::ThermostatTemp => Ok(key.describe(value)),
            _ => Err(EventError::ValueKindMismatch {
                key,
                expected: key.value_kind(),
            }
            .into()),
        }
    }

    /// Changes the clock speed without moving virtual time.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Clock`] if `factor` is outside the configured limits.
    pub fn set_clock_speed(&self, factor: f64) -> Result<(), SimError> {
        self.clock
            .set_speedup_factor(factor)
            .inspect_err(|err| warn!(factor, %err, "clock speed rejected"))?;
        Ok(())
    }

    /// Current speedup factor.
    pub fn clock_speed(&self) -> f64 {
        self.clock.speedup_factor()
    }

    /// Runs one analysis tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TickInProgress`] if another thread is ticking,
    /// or [`SimError::NotPrepared`] before [`Simulation::start`].
    pub fn tick(&self) -> Result<Snapshot, SimError> {
        let mut engine = self.engine.try_lock().ok_or(SimError::TickInProgress)?;
        engine.tick()
    }

    /// Pre-generated events that became due since the previous call.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotPrepared`] before [`Simulation::start`].
    pub fn forward_events(&self) -> Result<Vec<Event>, SimError> {
        self.forwarder.lock().produce()
    }

    /// Events in `[last_time, now)`, user overrides preferred.
    pub fn forward_events_since(&self, last_time: u64) -> Vec<Event> {
        let now = self.clock.time().floor() as u64;
        events_between(&self.store.read(), last_time, now, None)
    }

    /// Calendar reading of the clock.
    pub fn time_info(&self) -> TimeInfo {
        self.time_info.current()
    }

    /// Current virtual time in seconds.
    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    /// Returns `true` once the clock has reached its last second.
    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<VirtualClock<S>> {
        &self.clock
    }

    pub fn store(&self) -> &SharedEventStore {
        &self.store
    }
}
