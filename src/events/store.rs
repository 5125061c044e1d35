//! Time-indexed event store with a user-override layer.
//!
//! Events live in two independent layers (pre-generated and user-generated),
//! each a time-ordered map of one-second slots keyed by state key. Reads merge
//! the layers on the fly, preferring the user-generated event whenever both
//! layers hold one for the same `(time, key)`. Clearing overrides drops the
//! user layer wholesale and never touches the baseline.

use std::collections::{BTreeMap, BTreeSet, btree_map};
use std::iter::Peekable;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::types::{Event, Provenance, StateKey};

/// Events recorded during one simulated second, one per state key.
type Slot = BTreeMap<StateKey, Event>;

/// A single provenance layer indexed by time.
type Layer = BTreeMap<u64, Slot>;

/// Store shared between the engine, the forwarder and request handling.
pub type SharedEventStore = Arc<RwLock<EventStore>>;

/// Filter for [`EventStore::range`].
///
/// Every constraint is optional; an unset constraint is simply not applied.
///
/// # Examples
///
/// ```
/// use smart_home_sim::events::{Provenance, RangeQuery, StateKey};
///
/// let q = RangeQuery::all()
///     .between(0, 3600)
///     .keys([StateKey::FrontDoor, StateKey::BackDoor])
///     .provenance(Provenance::PreGenerated);
/// assert_eq!(q.start_time(), Some(0));
/// assert_eq!(q.end_time(), Some(3600));
///
/// let open_ended = RangeQuery::all().since(600);
/// assert_eq!(open_ended.end_time(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeQuery {
    start: Option<u64>,
    end: Option<u64>,
    keys: Option<Vec<StateKey>>,
    provenance: Option<Provenance>,
}

impl RangeQuery {
    /// A query over the whole store with override preference.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts the query to `[start, end)`.
    pub fn between(self, start: u64, end: u64) -> Self {
        self.since(start).until(end)
    }

    /// Sets the inclusive start time.
    pub fn since(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the exclusive end time.
    pub fn until(mut self, end: u64) -> Self {
        self.end = Some(end);
        self
    }

    /// Restricts results to `keys`; events sharing a second come out in
    /// this order.
    pub fn keys(mut self, keys: impl IntoIterator<Item = StateKey>) -> Self {
        self.keys = Some(keys.into_iter().collect());
        self
    }

    /// Reads a single layer instead of the merged view.
    pub fn provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start
    }

    pub fn end_time(&self) -> Option<u64> {
        self.end
    }
}

/// Store of smart-home events indexed by `(time, key, provenance)`.
#[derive(Debug, Default)]
pub struct EventStore {
    pre_generated: Layer,
    user_generated: Layer,
    /// Tightest `(min, max)` over every event ever inserted.
    bounds: Option<(u64, u64)>,
}

impl EventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a store for sharing across threads.
    pub fn into_shared(self) -> SharedEventStore {
        Arc::new(RwLock::new(self))
    }

    /// Returns `true` if the store holds no events of either provenance.
    pub fn is_empty(&self) -> bool {
        self.pre_generated.is_empty() && self.user_generated.is_empty()
    }

    /// Number of stored events in one layer.
    pub fn len(&self, provenance: Provenance) -> usize {
        self.layer(provenance).values().map(BTreeMap::len).sum()
    }

    /// Earliest event time across both layers.
    pub fn min_time(&self) -> Option<u64> {
        self.bounds.map(|(min, _)| min)
    }

    /// Latest event time across both layers.
    pub fn max_time(&self) -> Option<u64> {
        self.bounds.map(|(_, max)| max)
    }

    /// Inserts events into one layer, replacing any event already stored
    /// for the same `(time, key)` in that layer.
    ///
    /// Returns the number of events written.
    pub fn put(&mut self, provenance: Provenance, events: impl IntoIterator<Item = Event>) -> usize {
        let mut written = 0;
        for event in events {
            let time = event.time();
            self.bounds = Some(match self.bounds {
                Some((min, max)) => (min.min(time), max.max(time)),
                None => (time, time),
            });
            self.layer_mut(provenance)
                .entry(time)
                .or_default()
                .insert(event.state_key(), event);
            written += 1;
        }
        debug!(?provenance, written, "stored events");
        written
    }

    /// Removes every user-generated event. Pre-generated events and the
    /// time bounds are left untouched.
    pub fn clear_user_generated(&mut self) {
        let cleared = self.len(Provenance::UserGenerated);
        self.user_generated.clear();
        info!(cleared, "cleared user-generated events");
    }

    /// Returns the event stored for `(time, key, provenance)`.
    ///
    /// # Panics
    ///
    /// Panics if no such event exists. Callers must only use this when the
    /// event is known to be present; use [`EventStore::try_get`] otherwise.
    pub fn get(&self, time: u64, key: StateKey, provenance: Provenance) -> &Event {
        self.try_get(time, key, provenance).unwrap_or_else(|| {
            panic!("no {provenance:?} event for {key} at t={time}")
        })
    }

    /// Returns the event stored for `(time, key, provenance)`, if any.
    pub fn try_get(&self, time: u64, key: StateKey, provenance: Provenance) -> Option<&Event> {
        self.layer(provenance).get(&time)?.get(&key)
    }

    /// Iterates events matching `query` in increasing time order.
    ///
    /// Without a provenance filter the user-generated event wins over the
    /// pre-generated one at the same `(time, key)`. The returned iterator
    /// borrows the store; each call starts a fresh pass.
    pub fn range(&self, query: RangeQuery) -> Range<'_> {
        let RangeQuery {
            start,
            end,
            keys,
            provenance,
        } = query;

        let window = self.bounds.and_then(|(min, max)| {
            let start = start.unwrap_or(min);
            let end = end.unwrap_or(max.saturating_add(1));
            (start < end).then_some(start..end)
        });
        let window = window.unwrap_or(0..0);

        let pre = match provenance {
            Some(Provenance::UserGenerated) => self.pre_generated.range(0..0),
            _ => self.pre_generated.range(window.clone()),
        };
        let user = match provenance {
            Some(Provenance::PreGenerated) => self.user_generated.range(0..0),
            _ => self.user_generated.range(window),
        };

        Range {
            pre: pre.peekable(),
            user: user.peekable(),
            keys,
            pending: Vec::new().into_iter(),
        }
    }

    /// Earliest event for `key`, preferring a user override at that second.
    pub fn first_event(&self, key: StateKey) -> Option<&Event> {
        self.range(RangeQuery::all().keys([key])).next()
    }

    fn layer(&self, provenance: Provenance) -> &Layer {
        match provenance {
            Provenance::PreGenerated => &self.pre_generated,
            Provenance::UserGenerated => &self.user_generated,
        }
    }

    fn layer_mut(&mut self, provenance: Provenance) -> &mut Layer {
        match provenance {
            Provenance::PreGenerated => &mut self.pre_generated,
            Provenance::UserGenerated => &mut self.user_generated,
        }
    }
}

/// Lazy merged iterator returned by [`EventStore::range`].
pub struct Range<'a> {
    pre: Peekable<btree_map::Range<'a, u64, Slot>>,
    user: Peekable<btree_map::Range<'a, u64, Slot>>,
    keys: Option<Vec<StateKey>>,
    /// Events of the second currently being emitted.
    pending: std::vec::IntoIter<&'a Event>,
}

impl<'a> Range<'a> {
    /// Pops the next second present in either layer.
    fn next_slots(&mut self) -> Option<(Option<&'a Slot>, Option<&'a Slot>)> {
        let pre_time = self.pre.peek().map(|(t, _)| **t);
        let user_time = self.user.peek().map(|(t, _)| **t);
        let time = match (pre_time, user_time) {
            (Some(p), Some(u)) => p.min(u),
            (Some(p), None) => p,
            (None, Some(u)) => u,
            (None, None) => return None,
        };
        let pre = self.pre.next_if(|(t, _)| **t == time).map(|(_, s)| s);
        let user = self.user.next_if(|(t, _)| **t == time).map(|(_, s)| s);
        Some((pre, user))
    }

    fn collect_second(&self, pre: Option<&'a Slot>, user: Option<&'a Slot>) -> Vec<&'a Event> {
        let pick = |key: &StateKey| {
            user.and_then(|s| s.get(key))
                .or_else(|| pre.and_then(|s| s.get(key)))
        };
        match &self.keys {
            Some(keys) => keys.iter().filter_map(pick).collect(),
            None => {
                let keys: BTreeSet<&StateKey> = pre
                    .into_iter()
                    .chain(user)
                    .flat_map(BTreeMap::keys)
                    .collect();
                keys.into_iter().filter_map(pick).collect()
            }
        }
    }
}

impl<'a> Iterator for Range<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.next() {
                return Some(event);
            }
            let (pre, user) = self.next_slots()?;
            self.pending = self.collect_second(pre, user).into_iter();
        }
    }
}
