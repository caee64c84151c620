use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::{
    climate::{Period, WeatherClass},
    config::{LifecycleConfig, LoggingConfig},
    error::ConfigError,
    population::{Population, Sample},
    rng::RngStreams,
    spatial::Location,
    zones::{RankingTable, ZoneRank},
};

fn default_snapshot_interval_ticks() -> u64 {
    24
}

fn default_zone_rank() -> ZoneRank {
    ZoneRank::Good
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    pub climate: ClimateSource,
    #[serde(default)]
    pub zones: ZoneConfig,
    pub samples: Vec<Sample>,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Directory the scenario was read from; relative climate files resolve
    /// against it.
    #[serde(skip)]
    source_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClimateSource {
    Constant {
        start: NaiveDateTime,
        hours: usize,
        temperature: f64,
        /// Derived from the temperature when omitted.
        weather: Option<WeatherClass>,
    },
    Diurnal {
        start: NaiveDateTime,
        days: usize,
        mean_temperature: f64,
        amplitude: f64,
    },
    File {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    #[serde(default = "default_zone_rank")]
    pub default: ZoneRank,
    #[serde(default)]
    pub cells: Vec<ZoneCell>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            default: default_zone_rank(),
            cells: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneCell {
    pub x: f64,
    pub y: f64,
    pub rank: ZoneRank,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let mut scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .lifecycle
            .validate()
            .with_context(|| format!("Invalid lifecycle settings in {}", path.display()))?;
        scenario.source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(scenario)
    }
}

impl Scenario {
    pub fn build_period(&self) -> Result<Period> {
        let period = match &self.climate {
            ClimateSource::Constant {
                start,
                hours,
                temperature,
                weather,
            } => {
                let weather = weather.unwrap_or_else(|| WeatherClass::classify(*temperature));
                Period::constant(*start, *hours, *temperature, weather)?
            }
            ClimateSource::Diurnal {
                start,
                days,
                mean_temperature,
                amplitude,
            } => Period::diurnal(*start, *days, *mean_temperature, *amplitude)?,
            ClimateSource::File { path } => Period::load_json(self.source_dir.join(path))?,
        };
        Ok(period)
    }

    pub fn build_zones(&self) -> RankingTable {
        let mut table = RankingTable::new(self.lifecycle.location_resolution_m, self.zones.default);
        for cell in &self.zones.cells {
            table.insert(Location::new(cell.x, cell.y), cell.rank);
        }
        table
    }

    /// Seeds the initial population from the samples. Uses its own stream of
    /// the scenario seed, so the result does not depend on the engine.
    pub fn build_population(&self) -> Result<Population, ConfigError> {
        let mut rng = RngStreams::new(self.seed).seeding;
        Population::from_samples(
            &self.samples,
            self.lifecycle.location_resolution_m,
            &mut rng,
        )
    }
}
