//! Periodic producers driven by an external scheduler.
//!
//! A producer is prepared once per (re)start and then asked to produce on
//! whatever cadence its caller chooses.

use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};

use crate::config::SECONDS_PER_DAY;
use crate::error::SimError;
use crate::events::{Event, EventStore, Provenance, RangeQuery, SharedEventStore};

use super::clock::{SystemTimeSource, TimeSource, VirtualClock};
use super::types::TimeInfo;

/// Something that emits a value each time its scheduler fires.
pub trait SnapshotProducer {
    /// Value emitted per invocation.
    type Output;

    /// Resets internal state to the start of the simulation.
    fn prepare(&mut self) -> Result<(), SimError>;

    /// Emits the next value.
    fn produce(&mut self) -> Result<Self::Output, SimError>;
}

/// Renders the virtual clock as a calendar reading.
pub struct TimeInfoProducer<S: TimeSource = SystemTimeSource> {
    clock: Arc<VirtualClock<S>>,
    start_date: NaiveDateTime,
}

impl<S: TimeSource> TimeInfoProducer<S> {
    /// Creates a producer whose virtual time zero is `start_date`.
    pub fn new(clock: Arc<VirtualClock<S>>, start_date: NaiveDateTime) -> Self {
        Self { clock, start_date }
    }

    /// Formats `time` seconds after the start date, e.g.
    /// `"12:00:00 AM\nMonday\nDay 1"`.
    pub fn format_time(&self, time: f64) -> String {
        let secs = time.max(0.0).floor() as i64;
        let day = secs / SECONDS_PER_DAY as i64 + 1;
        let at = TimeDelta::try_seconds(secs)
            .and_then(|delta| self.start_date.checked_add_signed(delta))
            .unwrap_or(NaiveDateTime::MAX);
        at.format(&format!("%I:%M:%S %p\n%A\nDay {day}")).to_string()
    }

    /// Reads the clock now.
    pub fn current(&self) -> TimeInfo {
        let time = self.clock.time();
        TimeInfo {
            time: self.format_time(time),
            days: time.floor() / SECONDS_PER_DAY as f64,
            speed: self.clock.speedup_factor(),
        }
    }
}

impl<S: TimeSource> SnapshotProducer for TimeInfoProducer<S> {
    type Output = TimeInfo;

    fn prepare(&mut self) -> Result<(), SimError> {
        Ok(())
    }

    fn produce(&mut self) -> Result<TimeInfo, SimError> {
        Ok(self.current())
    }
}

/// Collects `[start, end)` events, cloned out of the store.
pub(crate) fn events_between(
    store: &EventStore,
    start: u64,
    end: u64,
    provenance: Option<Provenance>,
) -> Vec<Event> {
    let mut query = RangeQuery::all().between(start, end);
    if let Some(p) = provenance {
        query = query.provenance(p);
    }
    store.range(query).cloned().collect()
}

/// Forwards every event that became due since the previous call.
pub struct EventForwarder<S: TimeSource = SystemTimeSource> {
    clock: Arc<VirtualClock<S>>,
    store: SharedEventStore,
    provenance: Option<Provenance>,
    last_publish_time: Option<u64>,
}

impl<S: TimeSource> EventForwarder<S> {
    /// Creates a forwarder that merges both layers, preferring overrides.
    pub fn new(clock: Arc<VirtualClock<S>>, store: SharedEventStore) -> Self {
        Self {
            clock,
            store,
            provenance: None,
            last_publish_time: None,
        }
    }

    /// Restricts forwarding to one layer.
    ///
    /// Forwarding only [`Provenance::PreGenerated`] avoids echoing a
    /// client's own submissions back to it.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// End of the last forwarded window, if prepared.
    pub fn last_publish_time(&self) -> Option<u64> {
        self.last_publish_time
    }
}

impl<S: TimeSource> SnapshotProducer for EventForwarder<S> {
    type Output = Vec<Event>;

    fn prepare(&mut self) -> Result<(), SimError> {
        let start = self.store.read().min_time().ok_or(SimError::EmptyBaseline)?;
        self.last_publish_time = Some(start);
        Ok(())
    }

    fn produce(&mut self) -> Result<Vec<Event>, SimError> {
        let start = self.last_publish_time.ok_or(SimError::NotPrepared)?;
        let end = self.clock.time().floor() as u64;
        let events = events_between(&self.store.read(), start, end, self.provenance);
        self.last_publish_time = Some(end.max(start));
        Ok(events)
    }
}
