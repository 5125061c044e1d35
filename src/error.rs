//! Crate-level error type for the simulation facade and engine.

use crate::config::ConfigError;
use crate::events::{EventError, StateKey};
use crate::sim::clock::ClockError;

/// Errors returned by [`crate::simulation::Simulation`] and the engine.
///
/// Validation variants are returned before any state is mutated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// The scenario configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Clock construction or speed change was rejected.
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// A submitted or loaded event is malformed (wrong value kind or state type).
    #[error(transparent)]
    Event(#[from] EventError),

    /// Thermostat setpoint outside the accepted range.
    #[error("thermostat setpoint {value} is outside [{min}, {max}]")]
    ThermostatOutOfRange {
        /// Rejected setpoint.
        value: i64,
        /// Lowest accepted setpoint.
        min: i64,
        /// Highest accepted setpoint.
        max: i64,
    },

    /// Clients may not set this piece of state.
    #[error("state key \"{0}\" is not user-settable")]
    NotUserSettable(StateKey),

    /// The baseline contained no events.
    #[error("baseline event history is empty")]
    EmptyBaseline,

    /// The baseline has no event for a key the engine needs at start.
    #[error("baseline has no initial value for \"{0}\"")]
    MissingInitialValue(StateKey),

    /// `tick` was called before `prepare`.
    #[error("engine has not been prepared")]
    NotPrepared,

    /// Another tick is already running on this engine.
    #[error("a tick is already in progress")]
    TickInProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_errors_convert_transparently() {
        let err: SimError = ClockError::SpeedupOutOfRange {
            requested: 0.5,
            min: 1.0,
            max: 3600.0,
        }
        .into();
        assert!(matches!(err, SimError::Clock(_)));
        assert_eq!(err.to_string(), "speedup factor 0.5 is outside [1, 3600]");
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = SimError::ThermostatOutOfRange {
            value: 90,
            min: 55,
            max: 85,
        };
        assert_eq!(err.to_string(), "thermostat setpoint 90 is outside [55, 85]");
        assert_eq!(
            SimError::NotUserSettable(StateKey::Refrigerator).to_string(),
            "state key \"refrigerator\" is not user-settable"
        );
    }
}
