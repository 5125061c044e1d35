//! Event history ingestion, synthetic history, and snapshot export.

pub mod export;
pub mod load;
pub mod synthetic;

pub use load::{LoadError, load_boolean_events, load_integer_events, read_events};
pub use synthetic::TimelineGenerator;
