//! Smart-home simulator entry point: CLI wiring and a headless replay.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::info;

use smart_home_sim::config::{SECONDS_PER_DAY, ScenarioConfig};
use smart_home_sim::events::Event;
use smart_home_sim::io::export::export_csv;
use smart_home_sim::io::{TimelineGenerator, load_boolean_events, load_integer_events};
use smart_home_sim::runner::run_replay;
use smart_home_sim::sim::clock::ManualTimeSource;
use smart_home_sim::sim::report::ReplayReport;
use smart_home_sim::simulation::Simulation;

#[derive(Debug, Parser)]
#[command(
    name = "smart-home-sim",
    about = "Replay a smart-home event history against a virtual clock"
)]
struct Args {
    /// Load the scenario from a TOML file
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,
    /// Use a built-in preset (baseline, fast_forward, one_week)
    #[arg(long)]
    preset: Option<String>,
    /// CSV of integer state changes: time,state_type,state_key,new_value,message
    #[arg(long, requires = "boolean_events")]
    integer_events: Option<PathBuf>,
    /// CSV of boolean state changes, same columns
    #[arg(long, requires = "integer_events")]
    boolean_events: Option<PathBuf>,
    /// Seed for the synthetic history used when no CSVs are given
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Clock speed override (virtual seconds per real second)
    #[arg(long)]
    speed: Option<f64>,
    /// Stop this many virtual days after the clock's first second
    #[arg(long)]
    days: Option<u64>,
    /// Write one CSV row per analysis snapshot
    #[arg(long)]
    snapshots_out: Option<PathBuf>,
    /// Print only the final report
    #[arg(long)]
    quiet: bool,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn load_scenario(args: &Args) -> ScenarioConfig {
    let scenario = match (&args.config, &args.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path),
        (None, Some(name)) => ScenarioConfig::from_preset(name),
        (None, None) => Ok(ScenarioConfig::baseline()),
    }
    .unwrap_or_else(|e| fail(e));

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    scenario
}

fn load_history(args: &Args, synthetic_days: u64) -> Vec<Event> {
    match (&args.integer_events, &args.boolean_events) {
        (Some(ints), Some(bools)) => {
            let mut events = load_integer_events(ints).unwrap_or_else(|e| fail(e));
            events.extend(load_boolean_events(bools).unwrap_or_else(|e| fail(e)));
            info!(count = events.len(), "event history loaded from CSV");
            events
        }
        _ => {
            let events = TimelineGenerator::new(synthetic_days, args.seed)
                .generate()
                .unwrap_or_else(|e| fail(e));
            info!(count = events.len(), seed = args.seed, "synthetic event history generated");
            events
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let scenario = load_scenario(&args);
    let cadence = scenario.cadence.clone();

    let clock = &scenario.clock;
    let max_days = clock
        .max_time
        .saturating_sub(clock.min_time)
        .div_ceil(SECONDS_PER_DAY)
        .max(1);
    let days = args.days.unwrap_or(max_days).min(max_days);
    let history = load_history(&args, clock.min_time / SECONDS_PER_DAY + days);

    let source = ManualTimeSource::new();
    let sim = Simulation::with_source(scenario, source.clone()).unwrap_or_else(|e| fail(e));
    sim.load_baseline(history).unwrap_or_else(|e| fail(e));
    if let Some(speed) = args.speed {
        sim.set_clock_speed(speed).unwrap_or_else(|e| fail(e));
    }

    let horizon = (days * SECONDS_PER_DAY) as f64;
    let outcome = run_replay(&sim, &source, &cadence, horizon).unwrap_or_else(|e| fail(e));

    if !args.quiet {
        for snapshot in &outcome.snapshots {
            println!("{snapshot}");
        }
        if let Some(time_info) = &outcome.last_time_info {
            println!("\n{}", time_info.time.replace('\n', ", "));
        }
    }
    println!("\n{}", ReplayReport::from_snapshots(&outcome.snapshots));
    println!("Events forwarded:      {}", outcome.forwarded_events);

    if let Some(path) = &args.snapshots_out {
        if let Err(e) = export_csv(&outcome.snapshots, Path::new(path)) {
            fail(format!("failed to write CSV: {e}"));
        }
        eprintln!("Snapshots written to {}", path.display());
    }
}
