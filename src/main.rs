//! ramp-sim entry point: loads a scenario, runs it and prints a summary.
//!
//! Environment:
//! * `RAMP_SCENARIO` - path of a TOML scenario file
//! * `RAMP_PRESET` - built-in preset used when no file is given (default `village`)
//! * `RAMP_SEED` - seed override
//! * `RAMP_HOURLY_CSV` - write hourly profiles to this path

use std::env;
use std::path::Path;
use std::process;

use ramp_sim::config::{ScenarioConfig, build_definitions};
use ramp_sim::io::export::export_hourly_csv;
use ramp_sim::logging;
use ramp_sim::sim::stats::ProfileSummary;

const DEFAULT_PRESET: &str = "village";

fn load_scenario() -> ScenarioConfig {
    let loaded = match env::var("RAMP_SCENARIO") {
        Ok(path) => ScenarioConfig::from_toml_file(Path::new(&path)),
        Err(_) => {
            let preset = env::var("RAMP_PRESET").unwrap_or_else(|_| DEFAULT_PRESET.to_string());
            ScenarioConfig::from_preset(&preset)
        }
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Ok(raw) = env::var("RAMP_SEED") {
        match raw.parse::<u64>() {
            Ok(seed) => scenario.simulation.seed = seed,
            Err(_) => {
                eprintln!("error: RAMP_SEED value \"{raw}\" is not a valid u64");
                process::exit(1);
            }
        }
    }
    scenario
}

fn main() {
    logging::init();

    let scenario = load_scenario();
    let definitions = build_definitions(&scenario).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let result = definitions.simulate().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    for (name, profile) in &result.per_user_category {
        println!("== {name} ==");
        println!("{}\n", ProfileSummary::from_profile(profile));
    }
    println!("== total ==");
    println!("{}", ProfileSummary::from_profile(&result.total));

    if let Ok(path) = env::var("RAMP_HOURLY_CSV") {
        if let Err(e) = export_hourly_csv(&result, Path::new(&path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Hourly profiles written to {path}");
    }
}
