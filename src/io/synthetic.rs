//! Seeded synthetic event history for demos and tests without a database.
//!
//! Each simulated day gets an hourly outdoor temperature curve, an occasional
//! thermostat change, door and window openings, evening lights and TV, and
//! a morning shower or bath. All doors and windows start closed.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::SECONDS_PER_DAY;
use crate::events::{Event, EventError, EventValue, StateKey, StateType};

const HOUR: u64 = 3600;
const MINUTE: u64 = 60;

const DOORS: [StateKey; 5] = [
    StateKey::FrontDoor,
    StateKey::BackDoor,
    StateKey::GarageHouseDoor,
    StateKey::GarageCarDoor1,
    StateKey::GarageCarDoor2,
];

const WINDOWS: [StateKey; 4] = [
    StateKey::KitchenWindow1,
    StateKey::LivingRoomWindow1,
    StateKey::Bedroom1Window1,
    StateKey::Bedroom2Window1,
];

const EVENING_LIGHTS: [StateKey; 3] = [
    StateKey::KitchenOverheadLight,
    StateKey::LivingRoomOverheadLight,
    StateKey::LivingRoomLamp1,
];

/// Generator for a reproducible multi-day event history.
///
/// # Examples
///
/// ```
/// use smart_home_sim::io::synthetic::TimelineGenerator;
///
/// let a = TimelineGenerator::new(2, 7).generate().unwrap();
/// let b = TimelineGenerator::new(2, 7).generate().unwrap();
/// assert_eq!(a, b);
/// assert!(a.iter().all(|e| e.time() < 2 * 86_400));
/// ```
#[derive(Debug, Clone)]
pub struct TimelineGenerator {
    /// Number of days to generate.
    pub days: u64,
    /// Mean outdoor temperature (°F).
    pub mean_outdoor_f: f64,
    /// Half the daily outdoor swing (°F).
    pub outdoor_swing_f: f64,
    /// Thermostat setpoint at the start.
    pub initial_thermostat_f: i64,
    rng: StdRng,
}

impl TimelineGenerator {
    /// Creates a generator for `days` days of winter-like weather.
    pub fn new(days: u64, seed: u64) -> Self {
        Self {
            days: days.max(1),
            mean_outdoor_f: 45.0,
            outdoor_swing_f: 10.0,
            initial_thermostat_f: 70,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produces the full history, unsorted.
    ///
    /// # Errors
    ///
    /// Returns an [`EventError`] only if a generated record fails
    /// validation, which indicates a catalogue inconsistency.
    pub fn generate(mut self) -> Result<Vec<Event>, EventError> {
        let mut out = Vec::new();
        self.initial_state(&mut out)?;
        for day in 0..self.days {
            let t0 = day * SECONDS_PER_DAY;
            self.outdoor_temps(&mut out, t0)?;
            self.thermostat_change(&mut out, t0)?;
            self.door_openings(&mut out, t0)?;
            self.window_opening(&mut out, t0)?;
            self.evening_appliances(&mut out, t0)?;
            self.morning_wash(&mut out, t0)?;
        }
        Ok(out)
    }

    fn initial_state(&mut self, out: &mut Vec<Event>) -> Result<(), EventError> {
        let thermostat = self.initial_thermostat_f;
        push(out, 0, StateKey::ThermostatTemp, EventValue::Integer(thermostat))?;
        for key in DOORS.into_iter().chain(WINDOWS) {
            push(out, 0, key, EventValue::Boolean(false))?;
        }
        Ok(())
    }

    fn outdoor_temps(&mut self, out: &mut Vec<Event>, t0: u64) -> Result<(), EventError> {
        for hour in 0..24 {
            // Coldest around 03:00, warmest around 15:00.
            let phase = 2.0 * PI * (hour as f64 - 9.0) / 24.0;
            let noise: f64 = self.rng.random_range(-2.0..=2.0);
            let temp = (self.mean_outdoor_f + self.outdoor_swing_f * phase.sin() + noise)
                .round()
                .clamp(30.0, 100.0) as i64;
            push(out, t0 + hour * HOUR, StateKey::OutdoorTemp, EventValue::Integer(temp))?;
        }
        Ok(())
    }

    fn thermostat_change(&mut self, out: &mut Vec<Event>, t0: u64) -> Result<(), EventError> {
        if self.rng.random::<f64>() < 0.5 {
            let at = t0 + self.rng.random_range(6 * HOUR..22 * HOUR);
            let setpoint = self.rng.random_range(64..=76);
            push(out, at, StateKey::ThermostatTemp, EventValue::Integer(setpoint))?;
        }
        Ok(())
    }

    fn door_openings(&mut self, out: &mut Vec<Event>, t0: u64) -> Result<(), EventError> {
        // Leaving in the morning and coming home in the evening.
        for (from, to) in [(7 * HOUR, 9 * HOUR), (17 * HOUR, 19 * HOUR)] {
            let key = DOORS[self.rng.random_range(0..DOORS.len())];
            let start = t0 + self.rng.random_range(from..to);
            let open_for = self.rng.random_range(30..=120);
            interval(out, key, key.default_state_type(), start, open_for)?;
        }
        Ok(())
    }

    fn window_opening(&mut self, out: &mut Vec<Event>, t0: u64) -> Result<(), EventError> {
        if self.rng.random::<f64>() < 0.3 {
            let key = WINDOWS[self.rng.random_range(0..WINDOWS.len())];
            let start = t0 + self.rng.random_range(10 * HOUR..16 * HOUR);
            let open_for = self.rng.random_range(10 * MINUTE..=60 * MINUTE);
            interval(out, key, StateType::Window, start, open_for)?;
        }
        Ok(())
    }

    fn evening_appliances(&mut self, out: &mut Vec<Event>, t0: u64) -> Result<(), EventError> {
        for key in EVENING_LIGHTS {
            let start = t0 + 18 * HOUR + self.rng.random_range(0..30 * MINUTE);
            let on_for = self.rng.random_range(3 * HOUR..=4 * HOUR);
            interval(out, key, StateType::Light, start, on_for)?;
        }
        let start = t0 + 19 * HOUR + self.rng.random_range(0..HOUR);
        let on_for = self.rng.random_range(HOUR..=3 * HOUR);
        interval(out, StateKey::LivingRoomTv, StateType::LivingRoomTv, start, on_for)?;

        let start = t0 + 17 * HOUR + self.rng.random_range(0..HOUR);
        let on_for = self.rng.random_range(20 * MINUTE..=45 * MINUTE);
        interval(out, StateKey::KitchenStove, StateType::Stove, start, on_for)
    }

    fn morning_wash(&mut self, out: &mut Vec<Event>, t0: u64) -> Result<(), EventError> {
        let start = t0 + 6 * HOUR + self.rng.random_range(0..2 * HOUR);
        let (state_type, minutes) = if self.rng.random::<f64>() < 0.2 {
            (StateType::Bath, 30)
        } else {
            (StateType::Shower, 15)
        };
        interval(out, StateKey::Bathroom1Faucet, state_type, start, minutes * MINUTE)?;
        let fan_for = (minutes + 10) * MINUTE;
        interval(
            out,
            StateKey::Bathroom1ExhaustFan,
            StateType::BathExhaustFan,
            start,
            fan_for,
        )
    }
}

fn push(out: &mut Vec<Event>, time: u64, key: StateKey, value: EventValue) -> Result<(), EventError> {
    out.push(Event::new(
        time,
        key.default_state_type(),
        key,
        value,
        key.describe(value),
    )?);
    Ok(())
}

/// Adds an on event at `start` and an off event `duration` seconds later.
fn interval(
    out: &mut Vec<Event>,
    key: StateKey,
    state_type: StateType,
    start: u64,
    duration: u64,
) -> Result<(), EventError> {
    for (time, on) in [(start, true), (start + duration, false)] {
        let value = EventValue::Boolean(on);
        out.push(Event::new(time, state_type, key, value, key.describe(value))?);
    }
    Ok(())
}
