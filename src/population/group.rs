use rand::Rng;
use serde::Serialize;

use crate::config::RegulationConfig;
use crate::error::SimulationError;
use crate::individual::{daily_mortality, Stage, StageCounts};
use crate::spatial::LocationKey;

/// Per-location tallies backing density regulation.
///
/// A group never owns individuals; it mirrors how many of each stage have
/// their origin in its cell and how many of those are still due to die in
/// the current regulation period.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    key: LocationKey,
    counts: StageCounts,
    to_kill: StageCounts,
    killed: StageCounts,
    period: [Option<u64>; 4],
}

fn slot(stage: Stage) -> usize {
    match stage {
        Stage::Egg => 0,
        Stage::Larva => 1,
        Stage::Pupa => 2,
        Stage::Adult => 3,
    }
}

impl Group {
    pub fn new(key: LocationKey) -> Self {
        Self {
            key,
            counts: StageCounts::default(),
            to_kill: StageCounts::default(),
            killed: StageCounts::default(),
            period: [None; 4],
        }
    }

    pub fn key(&self) -> LocationKey {
        self.key
    }

    pub fn counts(&self) -> &StageCounts {
        &self.counts
    }

    pub fn to_kill(&self) -> &StageCounts {
        &self.to_kill
    }

    /// Deaths of any cause since the group was created.
    pub fn killed(&self) -> &StageCounts {
        &self.killed
    }

    pub fn last_period(&self, stage: Stage) -> Option<u64> {
        self.period[slot(stage)]
    }

    /// Computes the stage quota the first time `period` is seen and reports
    /// whether any of it is still outstanding.
    pub fn regulate<R: Rng + ?Sized>(
        &mut self,
        stage: Stage,
        temperature: f64,
        period: u64,
        config: &RegulationConfig,
        rng: &mut R,
    ) -> bool {
        let last = &mut self.period[slot(stage)];
        if *last != Some(period) {
            *last = Some(period);
            let rate = config.period_rate(daily_mortality(stage, temperature, rng));
            let quota = (self.counts[stage] as f64 * rate).ceil() as u64;
            self.to_kill[stage] = quota.min(self.counts[stage]);
        }
        self.to_kill[stage] > 0
    }

    pub fn record_birth(&mut self, stage: Stage) {
        self.counts[stage] += 1;
    }

    pub fn record_kill(&mut self, stage: Stage, regulated: bool) -> Result<(), SimulationError> {
        self.decrement(stage)?;
        if regulated {
            self.to_kill[stage] = self.to_kill[stage].saturating_sub(1);
        }
        self.killed[stage] += 1;
        Ok(())
    }

    pub fn record_transition(&mut self, from: Stage, to: Stage) -> Result<(), SimulationError> {
        self.decrement(from)?;
        self.counts[to] += 1;
        Ok(())
    }

    fn decrement(&mut self, stage: Stage) -> Result<(), SimulationError> {
        let count = &mut self.counts[stage];
        *count = count.checked_sub(1).ok_or(SimulationError::CountUnderflow {
            key: self.key,
            stage,
        })?;
        Ok(())
    }
}
