//! Values produced by the simulation: analysis snapshots and time info.

use std::fmt;

use serde::Serialize;

/// Electricity used in one analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ElectricityUsage {
    /// HVAC plus appliance draw, water heating included (W).
    pub watts: f64,
    /// Cost of `watts` over the window ($).
    pub dollars: f64,
}

/// Water used in one analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WaterUsage {
    /// Gallons drawn.
    pub gallons: f64,
    /// Cost of `gallons` ($).
    pub dollars: f64,
}

/// Point-in-time metrics derived from one tick.
///
/// Field names serialize in camelCase (`indoorTemp`, `totalDollars`) for
/// whatever transport publishes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Virtual time of the tick in days (whole seconds / 86 400).
    pub time: f64,
    /// Modelled indoor temperature (°F).
    pub indoor_temp: f64,
    pub electricity: ElectricityUsage,
    pub water: WaterUsage,
    /// Electricity plus water cost ($).
    pub total_dollars: f64,
}

impl Snapshot {
    /// Builds a snapshot, deriving `total_dollars` from the two costs.
    pub fn new(
        time: f64,
        indoor_temp: f64,
        electricity: ElectricityUsage,
        water: WaterUsage,
    ) -> Self {
        Self {
            time,
            indoor_temp,
            electricity,
            water,
            total_dollars: electricity.dollars + water.dollars,
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day={:>7.3} | indoor={:>6.2} °F | elec={:>9.2} W (${:.4}) | \
             water={:>7.2} gal (${:.4}) | total=${:.4}",
            self.time,
            self.indoor_temp,
            self.electricity.watts,
            self.electricity.dollars,
            self.water.gallons,
            self.water.dollars,
            self.total_dollars,
        )
    }
}

/// Human-facing clock reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeInfo {
    /// Wall-calendar rendering, e.g. `"12:00:00 AM\nMonday\nDay 1"`.
    pub time: String,
    /// Days elapsed since the simulation start.
    pub days: f64,
    /// Current speedup factor.
    pub speed: f64,
}

impl fmt::Display for TimeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}x", self.time.replace('\n', " | "), self.speed)
    }
}
