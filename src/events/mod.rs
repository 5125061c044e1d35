//! Smart-home events and the time-indexed store that holds them.

/// Two-layer event store with range queries.
pub mod store;
pub mod types;

pub use store::{EventStore, RangeQuery, SharedEventStore};
pub use types::{Event, EventError, EventValue, Provenance, StateKey, StateType, ValueKind};
