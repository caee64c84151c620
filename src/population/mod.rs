//! The set of live individuals and the per-location groups tallying them.

mod group;

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::climate::Hour;
use crate::config::{AdultModel, RegulationConfig};
use crate::error::{ConfigError, SimulationError};
use crate::individual::{
    Development, Habitat, Individual, IndividualId, Sex, Stage, StageCounts,
};
use crate::spatial::{Location, LocationKey};

pub use group::Group;

fn default_sample_stage() -> Stage {
    Stage::Larva
}

/// Individuals counted at one point before the run, e.g. a trap reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub count: i64,
    #[serde(default = "default_sample_stage")]
    pub stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Expectancy exhausted or stage age ceiling passed.
    Natural,
    /// Removed to meet a group's density quota.
    Regulated,
}

/// Immature counts of one grid cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSnapshot {
    pub col: i64,
    pub row: i64,
    pub x: f64,
    pub y: f64,
    pub egg: u64,
    pub larva: u64,
    pub pupa: u64,
}

pub struct Population {
    individuals: Vec<Individual>,
    groups: HashMap<LocationKey, Group>,
    resolution_m: f64,
    next_id: u64,
    total_eggs: u64,
}

impl Population {
    pub fn new(resolution_m: f64) -> Result<Self, ConfigError> {
        if !(resolution_m.is_finite() && resolution_m > 0.0) {
            return Err(ConfigError::InvalidResolution(resolution_m));
        }
        Ok(Self {
            individuals: Vec::new(),
            groups: HashMap::new(),
            resolution_m,
            next_id: 0,
            total_eggs: 0,
        })
    }

    pub fn from_samples<R: Rng + ?Sized>(
        samples: &[Sample],
        resolution_m: f64,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let mut population = Self::new(resolution_m)?;
        for sample in samples {
            if sample.count < 0 {
                return Err(ConfigError::NegativeCount {
                    x: sample.x,
                    y: sample.y,
                    count: sample.count,
                });
            }
            let count =
                usize::try_from(sample.count).map_err(|_| ConfigError::CountTooLarge(sample.count))?;
            if count == 0 {
                warn!(x = sample.x, y = sample.y, "sample with zero individuals");
                continue;
            }
            population.spawn_batch(count, sample.stage, Location::new(sample.x, sample.y), rng);
        }
        debug!(
            individuals = population.len(),
            groups = population.groups.len(),
            "population seeded"
        );
        Ok(population)
    }

    pub fn resolution_m(&self) -> f64 {
        self.resolution_m
    }

    pub fn key_of(&self, location: Location) -> LocationKey {
        LocationKey::quantize(location, self.resolution_m)
    }

    fn create(&mut self, stage: Stage, sex: Sex, origin: Location) -> Individual {
        let id = IndividualId(self.next_id);
        self.next_id += 1;
        Individual::new(id, stage, sex, origin)
    }

    pub fn spawn(&mut self, stage: Stage, sex: Sex, location: Location) -> IndividualId {
        let individual = self.create(stage, sex, location);
        let id = individual.id();
        self.extend(vec![individual]);
        id
    }

    /// Adds `count` individuals of random sex at `location`.
    pub fn spawn_batch<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        stage: Stage,
        location: Location,
        rng: &mut R,
    ) {
        let batch: Vec<_> = (0..count)
            .map(|_| self.create(stage, Sex::random(rng), location))
            .collect();
        self.extend(batch);
    }

    /// Registers individuals created elsewhere, typically last tick's eggs.
    pub fn extend(&mut self, batch: Vec<Individual>) {
        self.individuals.reserve(batch.len());
        for individual in batch {
            let key = self.key_of(individual.origin());
            self.groups
                .entry(key)
                .or_insert_with(|| Group::new(key))
                .record_birth(individual.stage());
            self.individuals.push(individual);
        }
    }

    pub fn develop<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        hour: &Hour,
        habitat: &Habitat<'_>,
        rng: &mut R,
    ) -> Development {
        self.individuals[index].develop(hour, habitat, rng)
    }

    fn group_mut(&mut self, key: LocationKey) -> Result<&mut Group, SimulationError> {
        self.groups
            .get_mut(&key)
            .ok_or(SimulationError::MissingGroup(key))
    }

    /// Whether the individual at `index` falls within its group's density
    /// quota for the current regulation period.
    pub fn regulate<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        temperature: f64,
        period: u64,
        config: &RegulationConfig,
        rng: &mut R,
    ) -> Result<bool, SimulationError> {
        let individual = &self.individuals[index];
        let stage = individual.stage();
        let key = self.key_of(individual.origin());
        let group = self.group_mut(key)?;
        Ok(group.regulate(stage, temperature, period, config, rng))
    }

    /// Removes the individual at `index`. The last individual takes its slot,
    /// so callers iterating by index must revisit `index`.
    pub fn kill(&mut self, index: usize, cause: DeathCause) -> Result<Individual, SimulationError> {
        let individual = &self.individuals[index];
        let stage = individual.stage();
        let key = self.key_of(individual.origin());
        self.group_mut(key)?
            .record_kill(stage, cause == DeathCause::Regulated)?;
        Ok(self.individuals.swap_remove(index))
    }

    /// Replaces the individual at `index` with its next stage.
    pub fn transition(&mut self, index: usize) -> Result<Stage, SimulationError> {
        let current = &self.individuals[index];
        let next = current
            .successor()
            .ok_or(SimulationError::TerminalStage(current.id()))?;
        let from = current.stage();
        let to = next.stage();
        let key = self.key_of(current.origin());
        self.group_mut(key)?.record_transition(from, to)?;
        self.individuals[index] = next;
        Ok(to)
    }

    /// Lets the adult at `index` advance its laying cycle and returns any
    /// eggs it laid. The eggs are not part of the population until passed
    /// to [`Population::extend`].
    pub fn oviposit<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        hour: &Hour,
        model: AdultModel,
        rng: &mut R,
    ) -> Vec<Individual> {
        let parent = &mut self.individuals[index];
        let eggs = parent.lay_eggs(hour, model, rng);
        if eggs == 0 {
            return Vec::new();
        }
        let site = parent.location();
        self.total_eggs += u64::from(eggs);
        (0..eggs)
            .map(|_| self.create(Stage::Egg, Sex::random(rng), site))
            .collect()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn total_eggs(&self) -> u64 {
        self.total_eggs
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn group(&self, key: LocationKey) -> Option<&Group> {
        self.groups.get(&key)
    }

    pub fn stage_counts(&self) -> StageCounts {
        let mut counts = StageCounts::default();
        for group in self.groups.values() {
            counts.add(group.counts());
        }
        counts
    }

    /// Deaths per stage over the whole run, natural and regulated.
    pub fn deaths(&self) -> StageCounts {
        let mut deaths = StageCounts::default();
        for group in self.groups.values() {
            deaths.add(group.killed());
        }
        deaths
    }

    /// Immature counts per occupied cell, ordered by cell. Adults are left
    /// out because they no longer live at their origin.
    pub fn snapshot(&self) -> Vec<CellSnapshot> {
        let mut cells: Vec<_> = self
            .groups
            .values()
            .filter(|group| group.counts().immature() > 0)
            .map(|group| {
                let key = group.key();
                let center = key.center(self.resolution_m);
                let counts = group.counts();
                CellSnapshot {
                    col: key.col,
                    row: key.row,
                    x: center.x,
                    y: center.y,
                    egg: counts.egg,
                    larva: counts.larva,
                    pupa: counts.pupa,
                }
            })
            .collect();
        cells.sort_by_key(|cell| (cell.col, cell.row));
        cells
    }

    /// Recounts the live individuals and compares against every group.
    pub fn check_consistency(&self) -> Result<(), SimulationError> {
        let mut actual: HashMap<LocationKey, StageCounts> = HashMap::new();
        for individual in &self.individuals {
            let key = self.key_of(individual.origin());
            if !self.groups.contains_key(&key) {
                return Err(SimulationError::MissingGroup(key));
            }
            actual.entry(key).or_default()[individual.stage()] += 1;
        }
        for (key, group) in &self.groups {
            let live = actual.get(key).copied().unwrap_or_default();
            for stage in Stage::ALL {
                if group.counts()[stage] != live[stage] {
                    return Err(SimulationError::CountMismatch {
                        key: *key,
                        stage,
                        recorded: group.counts()[stage],
                        actual: live[stage],
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::WeatherClass;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample(x: f64, y: f64, count: i64, stage: Stage) -> Sample {
        Sample { x, y, count, stage }
    }

    #[test]
    fn samples_seed_groups_by_cell() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let samples = [
            sample(0.0, 0.0, 5, Stage::Larva),
            sample(0.2, 0.1, 3, Stage::Egg),
            sample(10.0, 0.0, 2, Stage::Pupa),
        ];
        let population = Population::from_samples(&samples, 1.0, &mut rng).unwrap();

        assert_eq!(population.len(), 10);
        assert_eq!(population.groups().count(), 2);
        let origin = population.group(LocationKey { col: 0, row: 0 }).unwrap();
        assert_eq!(origin.counts().larva, 5);
        assert_eq!(origin.counts().egg, 3);
        population.check_consistency().unwrap();

        let ids: Vec<_> = population.individuals().iter().map(|i| i.id().raw()).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn negative_sample_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = Population::from_samples(&[sample(1.0, 2.0, -4, Stage::Larva)], 1.0, &mut rng)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::NegativeCount { count: -4, .. }));
    }

    #[test]
    fn bad_resolution_is_rejected() {
        assert!(matches!(
            Population::new(0.0),
            Err(ConfigError::InvalidResolution(_))
        ));
        assert!(Population::new(f64::NAN).is_err());
    }

    #[test]
    fn kill_swaps_in_the_last_individual() {
        let mut population = Population::new(1.0).unwrap();
        let first = population.spawn(Stage::Egg, Sex::Male, Location::new(0.0, 0.0));
        population.spawn(Stage::Larva, Sex::Female, Location::new(0.0, 0.0));
        let last = population.spawn(Stage::Pupa, Sex::Female, Location::new(5.0, 5.0));

        let dead = population.kill(0, DeathCause::Natural).unwrap();
        assert_eq!(dead.id(), first);
        assert_eq!(population.individuals()[0].id(), last);
        assert_eq!(population.deaths().egg, 1);
        assert_eq!(population.stage_counts().total(), 2);
        population.check_consistency().unwrap();
    }

    #[test]
    fn transition_keeps_counts_exact() {
        let mut population = Population::new(1.0).unwrap();
        let id = population.spawn(Stage::Pupa, Sex::Female, Location::new(0.0, 0.0));
        assert_eq!(population.transition(0).unwrap(), Stage::Adult);
        assert_eq!(population.individuals()[0].id(), id);
        assert_eq!(population.stage_counts().adult, 1);
        assert_eq!(population.stage_counts().pupa, 0);
        population.check_consistency().unwrap();

        assert!(matches!(
            population.transition(0),
            Err(SimulationError::TerminalStage(found)) if found == id
        ));
    }

    #[test]
    fn eggs_join_only_when_extended() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut population = Population::new(1.0).unwrap();
        population.spawn(Stage::Adult, Sex::Female, Location::new(3.0, 4.0));
        let hour = Hour::new(
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            25.0,
            WeatherClass::Normal,
        );

        let mut eggs = Vec::new();
        for _ in 0..300 {
            eggs = population.oviposit(0, &hour, AdultModel::Simple, &mut rng);
            if !eggs.is_empty() {
                break;
            }
        }
        assert!(!eggs.is_empty());
        assert_eq!(population.len(), 1);
        assert_eq!(population.total_eggs(), eggs.len() as u64);
        assert!(eggs.iter().all(|egg| egg.stage() == Stage::Egg));
        assert!(eggs.iter().all(|egg| egg.origin() == Location::new(3.0, 4.0)));

        let laid = eggs.len();
        population.extend(eggs);
        assert_eq!(population.len(), laid + 1);
        assert_eq!(population.stage_counts().egg, laid as u64);
        population.check_consistency().unwrap();
    }

    #[test]
    fn snapshot_excludes_adults_and_is_sorted() {
        let mut population = Population::new(2.0).unwrap();
        population.spawn(Stage::Adult, Sex::Male, Location::new(20.0, 0.0));
        population.spawn(Stage::Larva, Sex::Male, Location::new(4.0, 0.0));
        population.spawn(Stage::Egg, Sex::Female, Location::new(-4.0, 2.0));
        population.spawn(Stage::Egg, Sex::Female, Location::new(4.0, 0.0));

        let cells = population.snapshot();
        assert_eq!(cells.len(), 2);
        assert_eq!((cells[0].col, cells[0].row), (-2, 1));
        assert_eq!((cells[1].col, cells[1].row), (2, 0));
        assert_eq!(cells[1].larva, 1);
        assert_eq!(cells[1].egg, 1);
        assert_eq!(cells[1].x, 4.0);
    }

    #[test]
    fn consistency_check_spots_drift() {
        let mut population = Population::new(1.0).unwrap();
        population.spawn(Stage::Larva, Sex::Male, Location::new(0.0, 0.0));
        population
            .groups
            .get_mut(&LocationKey { col: 0, row: 0 })
            .unwrap()
            .record_birth(Stage::Larva);
        assert!(matches!(
            population.check_consistency(),
            Err(SimulationError::CountMismatch { stage: Stage::Larva, recorded: 2, actual: 1, .. })
        ));
    }
}
