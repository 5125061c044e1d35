//! Pure thermal, utility-usage and cost formulas.
//!
//! Units: seconds of virtual time, degrees Fahrenheit, watts, gallons and
//! dollars. Every "rate" is per second of virtual time.

/// Indoor drift per second per °F of indoor/outdoor difference (2 °F per hour per 10 °F).
pub const BASE_DRIFT_RATE: f64 = 2.0 / (3600.0 * 10.0);
/// Extra drift per open-door second per °F of difference (2 °F per 5 min per 10 °F).
pub const OPEN_DOOR_DRIFT_RATE: f64 = 2.0 / (300.0 * 10.0);
/// Extra drift per open-window second per °F of difference (1 °F per 5 min per 10 °F).
pub const OPEN_WINDOW_DRIFT_RATE: f64 = 1.0 / (300.0 * 10.0);

/// HVAC starts once indoor temperature strays further than this from the setpoint.
pub const HVAC_DEAD_BAND: f64 = 2.0;
/// HVAC moves indoor temperature by 1 °F per minute.
pub const HVAC_DEGREES_PER_SEC: f64 = 1.0 / 60.0;
/// HVAC draw while running (3500 W).
pub const HVAC_WATTS_PER_SEC: f64 = 3500.0 / 3600.0;

/// Water heater throughput (1 gallon per 4 minutes).
pub const WATER_HEATER_GALLONS_PER_SEC: f64 = 1.0 / 4.0 / 60.0;
/// Water heater draw while running (4500 W).
pub const WATER_HEATER_WATTS_PER_SEC: f64 = 4500.0 / 3600.0;

/// $0.12 per kWh.
pub const ELECTRICITY_DOLLARS_PER_WATT_SEC: f64 = 0.12 / 1000.0 / 3600.0;
/// $2.52 per 100 cubic feet.
pub const WATER_DOLLARS_PER_GALLON: f64 = 2.52 / 100.0 / 7.48;

/// Result of one HVAC step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HvacStep {
    /// Signed change applied to indoor temperature (°F).
    pub temp_change: f64,
    /// Electricity used while running (W).
    pub electricity: f64,
}

/// Result of a combined drift-then-HVAC step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalStep {
    /// Indoor temperature at the end of the window (°F).
    pub indoor_temp: f64,
    /// Electricity HVAC used during the window (W).
    pub hvac_electricity: f64,
}

/// Signed change in indoor temperature caused by the outdoors over `total_time`.
///
/// Drift is proportional to the indoor/outdoor difference, sped up by
/// open doors and windows, and never overshoots the outdoor temperature.
///
/// # Examples
///
/// ```
/// use smart_home_sim::sim::formulas::natural_indoor_temp_change;
///
/// // One hour, 10 °F colder outside, everything shut: 2 °F cooler.
/// let change = natural_indoor_temp_change(70.0, 60.0, 3600.0, 0.0, 0.0);
/// assert!((change + 2.0).abs() < 1e-9);
/// ```
pub fn natural_indoor_temp_change(
    indoor_temp: f64,
    outdoor_temp: f64,
    total_time: f64,
    open_door_time: f64,
    open_window_time: f64,
) -> f64 {
    let outdoor_diff = (outdoor_temp - indoor_temp).abs();
    let direction = if outdoor_temp > indoor_temp { 1.0 } else { -1.0 };

    let unclipped = BASE_DRIFT_RATE * total_time * outdoor_diff
        + OPEN_DOOR_DRIFT_RATE * open_door_time * outdoor_diff
        + OPEN_WINDOW_DRIFT_RATE * open_window_time * outdoor_diff;
    direction * unclipped.min(outdoor_diff)
}

/// Returns `true` when the indoor temperature is outside the HVAC dead band.
pub fn is_hvac_running(indoor_temp: f64, thermostat_temp: f64) -> bool {
    (thermostat_temp - indoor_temp).abs() > HVAC_DEAD_BAND
}

/// Electricity used by HVAC running for `running_time` seconds.
pub fn hvac_electricity_usage(running_time: f64) -> f64 {
    HVAC_WATTS_PER_SEC * running_time
}

/// Moves indoor temperature toward the setpoint over `total_time`.
///
/// Inside the dead band nothing happens. Otherwise the change is capped at
/// the remaining difference, and electricity covers only the seconds HVAC
/// actually ran.
pub fn hvac_step(indoor_temp: f64, thermostat_temp: f64, total_time: f64) -> HvacStep {
    if !is_hvac_running(indoor_temp, thermostat_temp) {
        return HvacStep::default();
    }
    let difference = (thermostat_temp - indoor_temp).abs();
    let direction = if thermostat_temp > indoor_temp { 1.0 } else { -1.0 };
    let change = difference.min(HVAC_DEGREES_PER_SEC * total_time);
    let running_time = change / HVAC_DEGREES_PER_SEC;
    HvacStep {
        temp_change: direction * change,
        electricity: hvac_electricity_usage(running_time),
    }
}

/// Applies natural drift, then HVAC on the drifted temperature, over one window.
pub fn indoor_temp_and_hvac_electricity(
    indoor_temp: f64,
    outdoor_temp: f64,
    thermostat_temp: f64,
    total_time: f64,
    open_door_time: f64,
    open_window_time: f64,
) -> ThermalStep {
    let drifted = indoor_temp
        + natural_indoor_temp_change(
            indoor_temp,
            outdoor_temp,
            total_time,
            open_door_time,
            open_window_time,
        );
    let hvac = hvac_step(drifted, thermostat_temp, total_time);
    ThermalStep {
        indoor_temp: drifted + hvac.temp_change,
        hvac_electricity: hvac.electricity,
    }
}

/// Generic `rate × time` usage.
pub fn usage(rate: f64, total_time: f64) -> f64 {
    rate * total_time
}

/// Electricity drawn at `watts_per_sec` for `total_time` seconds.
pub fn electricity_usage(watts_per_sec: f64, total_time: f64) -> f64 {
    usage(watts_per_sec, total_time)
}

/// Water drawn at `gallons_per_sec` for `total_time` seconds.
pub fn water_usage(gallons_per_sec: f64, total_time: f64) -> f64 {
    usage(gallons_per_sec, total_time)
}

/// Share of the water drawn that must be heated.
pub fn hot_water_usage(gallons_per_sec: f64, total_time: f64, hot_fraction: f64) -> f64 {
    water_usage(gallons_per_sec, total_time) * hot_fraction
}

/// Seconds the water heater runs to heat `gallons`.
pub fn water_heater_running_time(gallons: f64) -> f64 {
    gallons / WATER_HEATER_GALLONS_PER_SEC
}

/// Electricity the water heater uses to cover a hot-water draw.
pub fn water_heater_electricity_usage(
    gallons_per_sec: f64,
    total_time: f64,
    hot_fraction: f64,
) -> f64 {
    let hot = hot_water_usage(gallons_per_sec, total_time, hot_fraction);
    WATER_HEATER_WATTS_PER_SEC * water_heater_running_time(hot)
}

/// Dollar cost of `usage` watts over a window of `window_secs` seconds.
pub fn electricity_cost(usage: f64, window_secs: f64) -> f64 {
    ELECTRICITY_DOLLARS_PER_WATT_SEC * usage * window_secs
}

/// Dollar cost of `gallons` of water.
pub fn water_cost(gallons: f64) -> f64 {
    WATER_DOLLARS_PER_GALLON * gallons
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn no_drift_at_equilibrium() {
        assert_eq!(natural_indoor_temp_change(70.0, 70.0, 3600.0, 600.0, 600.0), 0.0);
    }

    #[test]
    fn drift_moves_toward_outdoor() {
        let warmer = natural_indoor_temp_change(70.0, 80.0, 3600.0, 0.0, 0.0);
        assert!((warmer - 2.0).abs() < EPS);
        let cooler = natural_indoor_temp_change(70.0, 60.0, 1800.0, 0.0, 0.0);
        assert!((cooler + 1.0).abs() < EPS);
    }

    #[test]
    fn open_door_and_window_add_drift() {
        // 10 °F difference, 5 minutes each: door +2, window +1.
        let change = natural_indoor_temp_change(70.0, 80.0, 0.0, 300.0, 300.0);
        assert!((change - 3.0).abs() < EPS);
    }

    #[test]
    fn drift_never_overshoots_outdoor() {
        let change = natural_indoor_temp_change(70.0, 75.0, 1_000_000.0, 0.0, 0.0);
        assert!((change - 5.0).abs() < EPS);
        let change = natural_indoor_temp_change(70.0, 40.0, 0.0, 1_000_000.0, 0.0);
        assert!((change + 30.0).abs() < EPS);
    }

    #[test]
    fn hvac_idle_inside_dead_band() {
        assert!(!is_hvac_running(72.0, 70.0));
        assert_eq!(hvac_step(72.0, 70.0, 600.0), HvacStep::default());
        assert!(is_hvac_running(72.5, 70.0));
    }

    #[test]
    fn hvac_heats_to_setpoint() {
        let step = hvac_step(60.0, 70.0, 600.0);
        assert!((step.temp_change - 10.0).abs() < EPS);
        assert!((step.electricity - 3500.0 * 600.0 / 3600.0).abs() < EPS);
    }

    #[test]
    fn hvac_change_capped_by_window() {
        // 5 minutes only moves 5 °F of the 10 °F gap.
        let step = hvac_step(80.0, 70.0, 300.0);
        assert!((step.temp_change + 5.0).abs() < EPS);
        assert!((step.electricity - 3500.0 * 300.0 / 3600.0).abs() < EPS);
    }

    #[test]
    fn hvac_stops_once_setpoint_reached() {
        // Gap closes after 240 s; the rest of the hour draws nothing.
        let step = hvac_step(66.0, 70.0, 3600.0);
        assert!((step.temp_change - 4.0).abs() < EPS);
        assert!((step.electricity - 3500.0 * 240.0 / 3600.0).abs() < EPS);
    }

    #[test]
    fn combined_step_applies_drift_then_hvac() {
        let idle = indoor_temp_and_hvac_electricity(70.0, 80.0, 70.0, 3600.0, 0.0, 0.0);
        assert!((idle.indoor_temp - 72.0).abs() < EPS);
        assert_eq!(idle.hvac_electricity, 0.0);

        // Drifts 1.6 °F to 73.6, then HVAC pulls it back to 70 in 216 s.
        let cooled = indoor_temp_and_hvac_electricity(72.0, 80.0, 70.0, 3600.0, 0.0, 0.0);
        assert!((cooled.indoor_temp - 70.0).abs() < EPS);
        assert!((cooled.hvac_electricity - 210.0).abs() < 1e-6);
    }

    #[test]
    fn water_heater_covers_hot_share() {
        // 15-minute shower: 25 gal, 16.25 hot, 3900 s of heating.
        let gallons_per_sec = 25.0 / 15.0 / 60.0;
        assert!((water_usage(gallons_per_sec, 900.0) - 25.0).abs() < EPS);
        assert!((hot_water_usage(gallons_per_sec, 900.0, 0.65) - 16.25).abs() < EPS);
        let watts = water_heater_electricity_usage(gallons_per_sec, 900.0, 0.65);
        assert!((watts - 4875.0).abs() < 1e-6);
    }

    #[test]
    fn costs_scale_linearly() {
        assert!((water_cost(748.0) - 2.52).abs() < EPS);
        let one = electricity_cost(1000.0, 3600.0);
        assert!((one - 0.12).abs() < EPS);
        assert!((electricity_cost(2000.0, 3600.0) - 2.0 * one).abs() < EPS);
        assert_eq!(electricity_cost(0.0, 1800.0), 0.0);
    }
}
