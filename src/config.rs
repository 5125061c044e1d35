//! TOML-based simulation configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Seconds in one simulated day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Top-level configuration parsed from TOML.
///
/// All fields have defaults matching the two-month baseline run. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Virtual clock bounds and speed limits.
    #[serde(default)]
    pub clock: ClockConfig,
    /// Accepted thermostat setpoints for user submissions.
    #[serde(default)]
    pub thermostat: ThermostatConfig,
    /// Cadences used by the replay scheduler.
    #[serde(default)]
    pub cadence: CadenceConfig,
}

/// Virtual clock bounds and speed limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    /// First simulated second.
    pub min_time: u64,
    /// Last simulated second (60 days by default).
    pub max_time: u64,
    /// Speed the clock starts with (virtual seconds per real second).
    pub default_speedup: f64,
    /// Slowest accepted speed.
    pub min_speedup: f64,
    /// Fastest accepted speed.
    pub max_speedup: f64,
    /// Calendar date-time that `min_time` corresponds to.
    pub start_date: NaiveDateTime,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            min_time: 0,
            max_time: 60 * SECONDS_PER_DAY,
            default_speedup: 60.0,
            min_speedup: 1.0,
            max_speedup: 3600.0,
            start_date: NaiveDate::from_ymd_opt(2021, 11, 29)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
        }
    }
}

/// Accepted thermostat setpoints (°F).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThermostatConfig {
    pub min_temp: i64,
    pub max_temp: i64,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            min_temp: 55,
            max_temp: 85,
        }
    }
}

impl ThermostatConfig {
    /// Returns `true` if `temp` is an accepted setpoint.
    pub fn accepts(&self, temp: i64) -> bool {
        (self.min_temp..=self.max_temp).contains(&temp)
    }
}

/// How often the replay scheduler runs each producer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CadenceConfig {
    /// Time-info interval in real seconds.
    pub time_info_real_secs: f64,
    /// Event-forwarding interval in virtual seconds.
    pub events_app_secs: f64,
    /// Analysis tick interval in virtual seconds.
    pub analysis_app_secs: f64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            time_info_real_secs: 1.0,
            events_app_secs: 30.0,
            analysis_app_secs: 1800.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"clock.max_speedup"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline configuration: two months at 60x speed.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the fast-forward preset: 10-minute real-time days and hourly
    /// analysis.
    pub fn fast_forward() -> Self {
        Self {
            clock: ClockConfig {
                default_speedup: 144.0,
                ..ClockConfig::default()
            },
            cadence: CadenceConfig {
                analysis_app_secs: 3600.0,
                ..CadenceConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the one-week preset: a seven-day horizon with a narrower
    /// thermostat range.
    pub fn one_week() -> Self {
        Self {
            clock: ClockConfig {
                max_time: 7 * SECONDS_PER_DAY,
                ..ClockConfig::default()
            },
            thermostat: ThermostatConfig {
                min_temp: 62,
                max_temp: 78,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "fast_forward", "one_week"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "fast_forward" => Ok(Self::fast_forward()),
            "one_week" => Ok(Self::one_week()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let c = &self.clock;
        if c.min_time > c.max_time {
            errors.push(ConfigError::new("clock.min_time", "must be <= clock.max_time"));
        }
        if c.min_speedup <= 0.0 {
            errors.push(ConfigError::new("clock.min_speedup", "must be > 0"));
        }
        if c.min_speedup > c.max_speedup {
            errors.push(ConfigError::new(
                "clock.min_speedup",
                "must be <= clock.max_speedup",
            ));
        }
        if !(c.min_speedup..=c.max_speedup).contains(&c.default_speedup) {
            errors.push(ConfigError::new(
                "clock.default_speedup",
                format!("must be in [{}, {}]", c.min_speedup, c.max_speedup),
            ));
        }

        let t = &self.thermostat;
        if t.min_temp > t.max_temp {
            errors.push(ConfigError::new(
                "thermostat.min_temp",
                "must be <= thermostat.max_temp",
            ));
        }

        let cad = &self.cadence;
        for (field, value) in [
            ("cadence.time_info_real_secs", cad.time_info_real_secs),
            ("cadence.events_app_secs", cad.events_app_secs),
            ("cadence.analysis_app_secs", cad.analysis_app_secs),
        ] {
            if value.is_nan() || value <= 0.0 {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
        assert_eq!(cfg.clock.max_time, 5_184_000);
        assert_eq!(cfg.clock.start_date.to_string(), "2021-11-29 00:00:00");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[clock]
min_time = 0
max_time = 604800
default_speedup = 120.0
min_speedup = 1.0
max_speedup = 7200.0
start_date = "2022-01-03T06:30:00"

[thermostat]
min_temp = 60
max_temp = 80

[cadence]
time_info_real_secs = 0.5
events_app_secs = 60.0
analysis_app_secs = 900.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.clock.max_time), Some(604_800));
        assert_eq!(cfg.as_ref().map(|c| c.thermostat.max_temp), Some(80));
        assert_eq!(
            cfg.as_ref().map(|c| c.clock.start_date.to_string()),
            Some("2022-01-03 06:30:00".to_string())
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[clock]
max_time = 100
warp_drive = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[thermostat]
max_temp = 90
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.thermostat.max_temp), Some(90));
        assert_eq!(cfg.as_ref().map(|c| c.thermostat.min_temp), Some(55));
        assert_eq!(cfg.as_ref().map(|c| c.clock.default_speedup), Some(60.0));
    }

    #[test]
    fn validation_catches_inverted_speed_limits() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.clock.min_speedup = 100.0;
        cfg.clock.max_speedup = 10.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "clock.min_speedup"));
        assert!(errors.iter().any(|e| e.field == "clock.default_speedup"));
    }

    #[test]
    fn validation_catches_bad_thermostat_and_cadence() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.thermostat.min_temp = 90;
        cfg.cadence.analysis_app_secs = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "thermostat.min_temp"));
        assert!(errors.iter().any(|e| e.field == "cadence.analysis_app_secs"));
    }

    #[test]
    fn thermostat_range_is_inclusive() {
        let t = ThermostatConfig::default();
        assert!(t.accepts(55));
        assert!(t.accepts(85));
        assert!(!t.accepts(54));
        assert!(!t.accepts(86));
    }
}
