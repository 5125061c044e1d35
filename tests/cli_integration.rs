//! Runs the binary end to end on presets and CSV history.

mod common;

use std::fs;
use std::process::{Command, Output};

use smart_home_sim::io::export::HEADER;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_smart-home-sim"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("smart-home-sim process should run")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("stdout should be valid UTF-8")
}

fn parse_ticks(stdout: &str) -> usize {
    let line = stdout
        .lines()
        .find(|line| line.starts_with("Ticks:"))
        .unwrap_or_else(|| panic!("missing ticks line in output: {stdout}"));
    line.trim_start_matches("Ticks:")
        .split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("invalid ticks line `{line}`"))
}

#[test]
fn synthetic_day_reports_half_hourly_ticks() {
    let stdout = stdout_of(&run(&["--days", "1", "--seed", "3", "--quiet"]));
    assert!(stdout.contains("--- Replay Report ---"));
    assert_eq!(parse_ticks(&stdout), 48);
}

#[test]
fn fast_forward_preset_ticks_hourly() {
    let stdout = stdout_of(&run(&["--preset", "fast_forward", "--days", "2", "--quiet"]));
    assert_eq!(parse_ticks(&stdout), 48);
}

#[test]
fn toml_scenario_is_honoured() {
    let stdout = stdout_of(&run(&[
        "--config",
        "scenarios/winter_week.toml",
        "--days",
        "1",
        "--quiet",
    ]));
    assert_eq!(parse_ticks(&stdout), 24);
}

#[test]
fn late_starting_clock_keeps_cadence() {
    let config = common::scratch_path("late_start.toml");
    fs::write(&config, "[clock]\nmin_time = 86400\nmax_time = 259200\n").unwrap();

    let stdout = stdout_of(&run(&[
        "--config",
        config.to_str().unwrap(),
        "--days",
        "1",
        "--quiet",
    ]));
    assert_eq!(parse_ticks(&stdout), 48);

    let _ = fs::remove_file(config);
}

#[test]
fn config_and_preset_conflict() {
    let output = run(&["--config", "scenarios/baseline.toml", "--preset", "baseline"]);
    assert!(!output.status.success());
}

#[test]
fn unknown_preset_fails() {
    let output = run(&["--preset", "heatwave"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "stderr={stderr}");
}

#[test]
fn out_of_range_speed_fails() {
    let output = run(&["--days", "1", "--speed", "100000"]);
    assert!(!output.status.success());
}

#[test]
fn csv_history_replays_and_exports() {
    let ints = common::scratch_path("integer_event.csv");
    let bools = common::scratch_path("boolean_event.csv");
    let out = common::scratch_path("snapshots.csv");
    fs::write(
        &ints,
        "time,state_type,state_key,new_value,message\n\
         0,temp,outdoorTemp,80,Outdoor Temp is 80\n\
         0,temp,thermostatTemp,70,Thermostat Temp is 70\n\
         3600,temp,outdoorTemp,80,Outdoor Temp is 80\n",
    )
    .unwrap();
    fs::write(
        &bools,
        "time,state_type,state_key,new_value,message\n\
         0,door,frontDoor,false,Front Door is CLOSED\n\
         100,light,kitchenOverheadLight,true,Kitchen Overhead Light is ON\n\
         1000,light,kitchenOverheadLight,false,Kitchen Overhead Light is OFF\n",
    )
    .unwrap();

    let stdout = stdout_of(&run(&[
        "--integer-events",
        ints.to_str().unwrap(),
        "--boolean-events",
        bools.to_str().unwrap(),
        "--days",
        "1",
        "--snapshots-out",
        out.to_str().unwrap(),
    ]));
    assert_eq!(parse_ticks(&stdout), 48);

    let csv = fs::read_to_string(&out).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(HEADER));
    assert_eq!(lines.count(), 48);

    for path in [ints, bools, out] {
        let _ = fs::remove_file(path);
    }
}

#[test]
fn malformed_csv_fails() {
    let ints = common::scratch_path("bad_integer_event.csv");
    let bools = common::scratch_path("bad_boolean_event.csv");
    fs::write(
        &ints,
        "time,state_type,state_key,new_value,message\n0,temp,outdoorTemp,warm,\n",
    )
    .unwrap();
    fs::write(&bools, "time,state_type,state_key,new_value,message\n").unwrap();

    let output = run(&[
        "--integer-events",
        ints.to_str().unwrap(),
        "--boolean-events",
        bools.to_str().unwrap(),
    ]);
    assert!(!output.status.success());

    for path in [ints, bools] {
        let _ = fs::remove_file(path);
    }
}
