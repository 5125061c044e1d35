//! CSV ingestion of the persisted event history.
//!
//! Two relations are supported, both with the header
//! `time,state_type,state_key,new_value,message`:
//!
//! - `integer_event`: `new_value` is a signed integer
//! - `boolean_event`: `new_value` is `true`/`false` (also `t`/`f`, `1`/`0`)

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::events::{Event, EventError, EventValue, StateKey, StateType, ValueKind};

/// Errors raised while loading event history.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened.
    #[error("cannot open \"{}\": {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The CSV is malformed or a column has the wrong type.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// `new_value` is not of the relation's kind.
    #[error("row {row}: \"{value}\" is not a valid {expected} value")]
    InvalidValue {
        row: usize,
        value: String,
        expected: ValueKind,
    },

    /// The row names an unknown key or type, or the two do not fit together.
    #[error("row {row}: {source}")]
    Event {
        row: usize,
        #[source]
        source: EventError,
    },
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    time: u64,
    state_type: String,
    state_key: String,
    new_value: String,
    #[serde(default)]
    message: String,
}

impl RawEvent {
    fn parse_value(&self, kind: ValueKind, row: usize) -> Result<EventValue, LoadError> {
        let invalid = || LoadError::InvalidValue {
            row,
            value: self.new_value.clone(),
            expected: kind,
        };
        match kind {
            ValueKind::Integer => self
                .new_value
                .parse()
                .map(EventValue::Integer)
                .map_err(|_| invalid()),
            ValueKind::Boolean => match self.new_value.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(EventValue::Boolean(true)),
                "false" | "f" | "0" => Ok(EventValue::Boolean(false)),
                _ => Err(invalid()),
            },
        }
    }

    fn into_event(self, kind: ValueKind, row: usize) -> Result<Event, LoadError> {
        let value = self.parse_value(kind, row)?;
        let to_load_error = |source| LoadError::Event { row, source };
        let state_type: StateType = self.state_type.parse().map_err(to_load_error)?;
        let state_key: StateKey = self.state_key.parse().map_err(to_load_error)?;
        Event::new(self.time, state_type, state_key, value, self.message).map_err(to_load_error)
    }
}

/// Parses events of one value kind from CSV.
///
/// # Errors
///
/// Returns the first malformed row as a [`LoadError`].
pub fn read_events(reader: impl Read, kind: ValueKind) -> Result<Vec<Event>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut events = Vec::new();
    for (i, raw) in rdr.deserialize::<RawEvent>().enumerate() {
        // Header is row 1.
        let row = i + 2;
        events.push(raw?.into_event(kind, row)?);
    }
    Ok(events)
}

/// Loads the `integer_event` relation from a CSV file.
///
/// # Errors
///
/// See [`read_events`]; also fails if the file cannot be opened.
pub fn load_integer_events(path: &Path) -> Result<Vec<Event>, LoadError> {
    load(path, ValueKind::Integer)
}

/// Loads the `boolean_event` relation from a CSV file.
///
/// # Errors
///
/// See [`read_events`]; also fails if the file cannot be opened.
pub fn load_boolean_events(path: &Path) -> Result<Vec<Event>, LoadError> {
    load(path, ValueKind::Boolean)
}

fn load(path: &Path, kind: ValueKind) -> Result<Vec<Event>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Open {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let events = read_events(file, kind)?;
    info!(path = %path.display(), count = events.len(), %kind, "loaded events");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTEGER_CSV: &str = "\
time,state_type,state_key,new_value,message
0,temp,outdoorTemp,41,Outdoor Temp is 41
0,temp,thermostatTemp,70,Thermostat Temp is 70
3600,temp,outdoorTemp,39,Outdoor Temp is 39
";

    const BOOLEAN_CSV: &str = "\
time,state_type,state_key,new_value,message
10,door,frontDoor,true,Front Door is OPEN
40,door,frontDoor,f,Front Door is CLOSED
100,bath,bathroom1Faucet,1,
";

    #[test]
    fn integer_relation_parses() {
        let events = read_events(INTEGER_CSV.as_bytes(), ValueKind::Integer).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].time(), 3600);
        assert_eq!(events[2].as_integer(), Some(39));
        assert_eq!(events[1].message(), "Thermostat Temp is 70");
    }

    #[test]
    fn boolean_relation_accepts_postgres_spellings() {
        let events = read_events(BOOLEAN_CSV.as_bytes(), ValueKind::Boolean).unwrap();
        assert_eq!(
            events.iter().map(Event::as_bool).collect::<Vec<_>>(),
            vec![Some(true), Some(false), Some(true)]
        );
        assert_eq!(events[2].state_type(), StateType::Bath);
        assert_eq!(events[2].message(), "");
    }

    #[test]
    fn wrong_kind_reports_row() {
        let err = read_events(BOOLEAN_CSV.as_bytes(), ValueKind::Integer).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { row: 2, .. }), "{err}");
    }

    #[test]
    fn unknown_key_reports_row() {
        let csv = "time,state_type,state_key,new_value,message\n\
                   5,door,frontDoor,true,ok\n\
                   6,door,cellarDoor,true,bad\n";
        let err = read_events(csv.as_bytes(), ValueKind::Boolean).unwrap_err();
        assert!(
            matches!(
                err,
                LoadError::Event {
                    row: 3,
                    source: EventError::UnknownStateKey(_)
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn mismatched_type_is_rejected() {
        let csv = "time,state_type,state_key,new_value,message\n\
                   5,window,frontDoor,true,bad\n";
        let err = read_events(csv.as_bytes(), ValueKind::Boolean).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Event {
                source: EventError::StateTypeMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = load_boolean_events(Path::new("/nonexistent/boolean_event.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }
}
