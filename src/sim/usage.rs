//! Per-appliance usage rates and the boolean-state usage accumulator.

use std::collections::BTreeMap;

use crate::events::{Event, StateKey, StateType};

use super::formulas;

/// Static consumption coefficients for one kind of boolean state.
///
/// # Examples
///
/// ```
/// use smart_home_sim::events::StateType;
/// use smart_home_sim::sim::usage::UsageRate;
///
/// let light = UsageRate::for_state_type(StateType::Light);
/// assert!((light.watts_per_sec * 3600.0 - 60.0).abs() < 1e-9);
/// assert_eq!(UsageRate::for_state_type(StateType::Door), UsageRate::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageRate {
    /// Electricity drawn per second while on (W).
    pub watts_per_sec: f64,
    /// Water drawn per second while on (gallons).
    pub gallons_per_sec: f64,
    /// Fraction of the water that is heated.
    pub hot_fraction: f64,
}

impl UsageRate {
    const fn electric(watts: f64) -> Self {
        Self {
            watts_per_sec: watts / 3600.0,
            gallons_per_sec: 0.0,
            hot_fraction: 0.0,
        }
    }

    const fn with_water(self, gallons: f64, minutes: f64, hot_fraction: f64) -> Self {
        Self {
            gallons_per_sec: gallons / minutes / 60.0,
            hot_fraction,
            ..self
        }
    }

    /// Looks up the rates for `state_type`; doors, windows and temperatures consume nothing.
    pub fn for_state_type(state_type: StateType) -> Self {
        let none = Self::default();
        match state_type {
            StateType::Light => Self::electric(60.0),
            StateType::BathExhaustFan => Self::electric(30.0),
            StateType::Refrigerator => Self::electric(150.0),
            StateType::Microwave => Self::electric(1100.0),
            StateType::Stove => Self::electric(3500.0),
            StateType::Oven => Self::electric(4000.0),
            StateType::LivingRoomTv => Self::electric(636.0),
            StateType::BedroomTv => Self::electric(100.0),
            StateType::DishWasher => Self::electric(1800.0).with_water(6.0, 45.0, 1.0),
            StateType::ClothesWasher => Self::electric(500.0).with_water(20.0, 30.0, 0.85),
            StateType::ClothesDryer => Self::electric(3000.0),
            StateType::Shower => none.with_water(25.0, 15.0, 0.65),
            StateType::Bath => none.with_water(30.0, 30.0, 0.65),
            StateType::Temp | StateType::Door | StateType::Window => none,
        }
    }
}

/// Running on/off totals for one `(state type, state key)` pair.
#[derive(Debug, Clone)]
pub struct StateTracker {
    state_type: StateType,
    state_key: StateKey,
    value: bool,
    last_true_time: u64,
    total_time_true: u64,
    rate: UsageRate,
}

impl StateTracker {
    /// Creates a tracker seeded from the first event seen for its key.
    ///
    /// # Panics
    ///
    /// Panics if `first` is not a boolean event.
    pub fn new(first: &Event) -> Self {
        let value = first
            .as_bool()
            .unwrap_or_else(|| panic!("tracker seeded with integer event: {first}"));
        Self {
            state_type: first.state_type(),
            state_key: first.state_key(),
            value,
            last_true_time: first.time(),
            total_time_true: 0,
            rate: UsageRate::for_state_type(first.state_type()),
        }
    }

    /// Applies one on/off transition; repeating the current value is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the event is for another key or is not boolean.
    pub fn process_event(&mut self, event: &Event) {
        assert_eq!(
            event.state_key(),
            self.state_key,
            "tracker for \"{}\" received an event for another key",
            self.state_key
        );
        let new_value = event
            .as_bool()
            .unwrap_or_else(|| panic!("tracker received integer event: {event}"));

        match (self.value, new_value) {
            (true, false) => {
                self.total_time_true += event.time().saturating_sub(self.last_true_time);
            }
            (false, true) => self.last_true_time = event.time(),
            _ => return,
        }
        self.value = new_value;
    }

    /// Starts a new window at `at`.
    ///
    /// A tracker that is currently on counts from `at` onward, so its total
    /// only ever covers time inside the current window.
    pub fn reset_window(&mut self, at: u64) {
        self.total_time_true = 0;
        if self.value {
            self.last_true_time = at;
        }
    }

    pub fn state_type(&self) -> StateType {
        self.state_type
    }

    pub fn state_key(&self) -> StateKey {
        self.state_key
    }

    pub fn value(&self) -> bool {
        self.value
    }

    /// Completed on-time inside the current window (s).
    pub fn total_time_true(&self) -> u64 {
        self.total_time_true
    }

    /// Appliance draw plus water-heater draw for the current window (W).
    pub fn electricity_usage(&self) -> f64 {
        let secs = self.total_time_true as f64;
        formulas::electricity_usage(self.rate.watts_per_sec, secs)
            + formulas::water_heater_electricity_usage(
                self.rate.gallons_per_sec,
                secs,
                self.rate.hot_fraction,
            )
    }

    /// Water drawn in the current window (gallons).
    pub fn water_usage(&self) -> f64 {
        formulas::water_usage(self.rate.gallons_per_sec, self.total_time_true as f64)
    }
}

/// Usage totals across every boolean piece of state seen so far.
///
/// Trackers are created lazily on the first event for a key and live until
/// [`UsageAccumulator::clear`].
#[derive(Debug, Clone, Default)]
pub struct UsageAccumulator {
    trackers: BTreeMap<StateType, BTreeMap<StateKey, StateTracker>>,
}

impl UsageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes a boolean event to its tracker, creating the tracker if needed.
    ///
    /// # Panics
    ///
    /// Panics if `event` is not boolean.
    pub fn process_event(&mut self, event: &Event) {
        self.trackers
            .entry(event.state_type())
            .or_default()
            .entry(event.state_key())
            .or_insert_with(|| StateTracker::new(event))
            .process_event(event);
    }

    /// Starts a new window at `at` for the given state types, or for all
    /// trackers when `state_types` is `None`.
    pub fn reset_window(&mut self, at: u64, state_types: Option<&[StateType]>) {
        match state_types {
            Some(types) => {
                for state_type in types {
                    if let Some(by_key) = self.trackers.get_mut(state_type) {
                        by_key.values_mut().for_each(|t| t.reset_window(at));
                    }
                }
            }
            None => self
                .trackers_mut()
                .for_each(|t| t.reset_window(at)),
        }
    }

    /// Sum of completed on-time across trackers of the given types (s).
    pub fn open_duration(&self, state_types: &[StateType]) -> u64 {
        state_types
            .iter()
            .filter_map(|t| self.trackers.get(t))
            .flat_map(|by_key| by_key.values())
            .map(StateTracker::total_time_true)
            .sum()
    }

    /// Completed open-door time in the current window (s).
    pub fn open_door_time(&self) -> u64 {
        self.open_duration(&[StateType::Door])
    }

    /// Completed open-window time in the current window (s).
    pub fn open_window_time(&self) -> u64 {
        self.open_duration(&[StateType::Window])
    }

    /// Total electricity across all trackers, water heating included (W).
    pub fn electricity_usage(&self) -> f64 {
        self.trackers().map(StateTracker::electricity_usage).sum()
    }

    /// Total water across all trackers (gallons).
    pub fn water_usage(&self) -> f64 {
        self.trackers().map(StateTracker::water_usage).sum()
    }

    /// Returns the tracker for `key`, if any event for it has been seen.
    pub fn tracker(&self, state_type: StateType, key: StateKey) -> Option<&StateTracker> {
        self.trackers.get(&state_type)?.get(&key)
    }

    /// Number of trackers.
    pub fn len(&self) -> usize {
        self.trackers.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every tracker.
    pub fn clear(&mut self) {
        self.trackers.clear();
    }

    fn trackers(&self) -> impl Iterator<Item = &StateTracker> {
        self.trackers.values().flat_map(BTreeMap::values)
    }

    fn trackers_mut(&mut self) -> impl Iterator<Item = &mut StateTracker> {
        self.trackers.values_mut().flat_map(BTreeMap::values_mut)
    }
}
