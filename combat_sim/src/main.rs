//! combat_sim - Headless encounter runner
//!
//! Usage: `combat_sim [opponent] [seed] [config_dir]`
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

mod policy;
mod simulation;

use combat_core::config::CombatContent;
use policy::ScriptedPolicy;
use simulation::EncounterSimulation;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_DIRS: [&str; 2] = ["combat_core/config", "../combat_core/config"];

fn load_content(explicit: Option<PathBuf>) -> CombatContent {
    let candidates: Vec<PathBuf> = match explicit {
        Some(dir) => vec![dir],
        None => CONFIG_DIRS.iter().map(PathBuf::from).collect(),
    };

    for dir in candidates.iter().filter(|d| d.is_dir()) {
        match CombatContent::load_from_dir(dir) {
            Ok(content) => {
                info!(dir = %dir.display(), "loaded combat content");
                return content;
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "failed to load combat content"),
        }
    }

    info!("using bundled combat content");
    CombatContent::defaults()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let opponent = args.next().unwrap_or_else(|| "wolf".to_string());
    let seed = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            eprintln!("Invalid seed: {}", e);
            return ExitCode::FAILURE;
        }
        None => 42,
    };
    let config_dir = args.next().map(PathBuf::from);

    let content = load_content(config_dir);
    let Some(sim) = EncounterSimulation::run(&content, &opponent, seed, &ScriptedPolicy::default()) else {
        let mut known: Vec<&str> = content.opponents.keys().map(String::as_str).collect();
        known.sort_unstable();
        eprintln!("Unknown opponent '{}'. Known: {}", opponent, known.join(", "));
        return ExitCode::FAILURE;
    };

    println!("=== {} (seed {}) ===", sim.opponent, sim.seed);
    for line in &sim.log {
        println!("  {}", line);
    }
    println!();
    println!(
        "Hits: {}  Crit rate: {:.1}%  Avg damage: {:.1}",
        sim.hit_count,
        sim.crit_rate(),
        sim.avg_damage()
    );

    match serde_json::to_string_pretty(&sim) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize summary: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
