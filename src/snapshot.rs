use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::individual::StageCounts;
use crate::population::{CellSnapshot, Population};

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub scenario: &'a str,
    pub tick: u64,
    pub timestamp: NaiveDateTime,
    pub counts: StageCounts,
    pub total_eggs: u64,
    pub cells: Vec<CellSnapshot>,
}

/// Writes `<output_dir>/<scenario>/tick_NNNNNN.json` every `interval` ticks.
/// An interval of zero disables periodic snapshots.
pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    pub fn maybe_write(
        &self,
        scenario: &str,
        tick: u64,
        timestamp: NaiveDateTime,
        population: &Population,
    ) -> Result<Option<PathBuf>> {
        if !self.is_enabled() || tick % self.interval != 0 {
            return Ok(None);
        }
        self.write(scenario, tick, timestamp, population).map(Some)
    }

    pub fn write(
        &self,
        scenario: &str,
        tick: u64,
        timestamp: NaiveDateTime,
        population: &Population,
    ) -> Result<PathBuf> {
        let dir = self.output_dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot directory {}", dir.display()))?;
        let path = dir.join(format!("tick_{tick:06}.json"));
        let snapshot = Snapshot {
            scenario,
            tick,
            timestamp,
            counts: population.stage_counts(),
            total_eggs: population.total_eggs(),
            cells: population.snapshot(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(path)
    }
}
