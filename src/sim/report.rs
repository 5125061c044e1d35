//! Post-hoc summary of a replay's snapshot series.

use std::fmt;

use super::types::Snapshot;

/// Aggregate figures derived from a complete series of snapshots.
///
/// Computed post-hoc from `&[Snapshot]` so the summary always agrees with
/// the exported rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    /// Number of analysis ticks.
    pub ticks: usize,
    /// Virtual time of the last tick (days).
    pub days: f64,
    /// Indoor temperature at the last tick (°F).
    pub final_indoor_temp: f64,
    /// Lowest indoor temperature seen at a tick (°F).
    pub min_indoor_temp: f64,
    /// Highest indoor temperature seen at a tick (°F).
    pub max_indoor_temp: f64,
    /// Sum of per-window electricity (W).
    pub electricity_watts: f64,
    /// Largest single-window electricity figure (W).
    pub peak_window_watts: f64,
    /// Sum of per-window water (gallons).
    pub water_gallons: f64,
    pub electricity_dollars: f64,
    pub water_dollars: f64,
    pub total_dollars: f64,
}

impl ReplayReport {
    /// Summarizes `snapshots`; an empty series yields an all-zero report.
    pub fn from_snapshots(snapshots: &[Snapshot]) -> Self {
        let Some(last) = snapshots.last() else {
            return Self {
                ticks: 0,
                days: 0.0,
                final_indoor_temp: 0.0,
                min_indoor_temp: 0.0,
                max_indoor_temp: 0.0,
                electricity_watts: 0.0,
                peak_window_watts: 0.0,
                water_gallons: 0.0,
                electricity_dollars: 0.0,
                water_dollars: 0.0,
                total_dollars: 0.0,
            };
        };

        let mut min_temp = f64::INFINITY;
        let mut max_temp = f64::NEG_INFINITY;
        let mut watts = 0.0;
        let mut peak = 0.0_f64;
        let mut gallons = 0.0;
        let mut elec_dollars = 0.0;
        let mut water_dollars = 0.0;

        for s in snapshots {
            min_temp = min_temp.min(s.indoor_temp);
            max_temp = max_temp.max(s.indoor_temp);
            watts += s.electricity.watts;
            peak = peak.max(s.electricity.watts);
            gallons += s.water.gallons;
            elec_dollars += s.electricity.dollars;
            water_dollars += s.water.dollars;
        }

        Self {
            ticks: snapshots.len(),
            days: last.time,
            final_indoor_temp: last.indoor_temp,
            min_indoor_temp: min_temp,
            max_indoor_temp: max_temp,
            electricity_watts: watts,
            peak_window_watts: peak,
            water_gallons: gallons,
            electricity_dollars: elec_dollars,
            water_dollars,
            total_dollars: elec_dollars + water_dollars,
        }
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Replay Report ---")?;
        writeln!(f, "Ticks:                 {} over {:.2} days", self.ticks, self.days)?;
        writeln!(
            f,
            "Indoor temperature:    {:.2} °F (min {:.2}, max {:.2})",
            self.final_indoor_temp, self.min_indoor_temp, self.max_indoor_temp
        )?;
        writeln!(
            f,
            "Electricity:           {:.1} W (peak window {:.1} W), ${:.2}",
            self.electricity_watts, self.peak_window_watts, self.electricity_dollars
        )?;
        writeln!(
            f,
            "Water:                 {:.1} gal, ${:.2}",
            self.water_gallons, self.water_dollars
        )?;
        write!(f, "Total cost:            ${:.2}", self.total_dollars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::{ElectricityUsage, WaterUsage};

    fn make_snapshot(time: f64, indoor: f64, watts: f64, gallons: f64) -> Snapshot {
        Snapshot::new(
            time,
            indoor,
            ElectricityUsage {
                watts,
                dollars: watts / 1000.0,
            },
            WaterUsage {
                gallons,
                dollars: gallons / 100.0,
            },
        )
    }

    #[test]
    fn totals_and_extremes() {
        let snapshots = [
            make_snapshot(0.5, 70.0, 100.0, 0.0),
            make_snapshot(1.0, 72.5, 400.0, 25.0),
            make_snapshot(1.5, 68.0, 50.0, 5.0),
        ];
        let report = ReplayReport::from_snapshots(&snapshots);
        assert_eq!(report.ticks, 3);
        assert_eq!(report.days, 1.5);
        assert_eq!(report.final_indoor_temp, 68.0);
        assert_eq!(report.min_indoor_temp, 68.0);
        assert_eq!(report.max_indoor_temp, 72.5);
        assert!((report.electricity_watts - 550.0).abs() < 1e-9);
        assert_eq!(report.peak_window_watts, 400.0);
        assert!((report.water_gallons - 30.0).abs() < 1e-9);
        assert!((report.total_dollars - (0.55 + 0.30)).abs() < 1e-9);
    }

    #[test]
    fn empty_series() {
        let report = ReplayReport::from_snapshots(&[]);
        assert_eq!(report.ticks, 0);
        assert_eq!(report.total_dollars, 0.0);
    }

    #[test]
    fn display_does_not_panic() {
        let report = ReplayReport::from_snapshots(&[make_snapshot(1.0, 70.0, 10.0, 1.0)]);
        assert!(format!("{report}").contains("Replay Report"));
    }
}
