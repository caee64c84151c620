use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aedes_sim::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Aedes aegypti population simulator")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/warm_month.yaml")]
    scenario: PathBuf,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override snapshot interval in ticks (0 disables snapshots)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Write the run report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

/// `RUST_LOG` wins over the scenario's level when set.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    init_tracing(&scenario.logging.level);
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }

    let period = scenario.build_period()?;
    let zones = scenario.build_zones();
    let mut population = scenario.build_population()?;
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_ticks);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
        lifecycle: scenario.lifecycle.clone(),
    };

    let mut engine = EngineBuilder::new(settings).with_zones(zones).build()?;
    let report = engine.run(&mut population, &period)?;
    println!("{report}");

    if let Some(path) = cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }
    Ok(())
}
