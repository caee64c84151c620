use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    climate::{Hour, Period},
    config::LifecycleConfig,
    error::{ConfigError, SimulationError},
    individual::{Habitat, Stage},
    population::{DeathCause, Population},
    report::RunReport,
    rng::RngStreams,
    snapshot::SnapshotWriter,
    zones::{UniformRanking, ZoneRank, ZoneRanking},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
    pub lifecycle: LifecycleConfig,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    zones: Box<dyn ZoneRanking>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            zones: Box::new(UniformRanking(ZoneRank::Good)),
        }
    }

    pub fn with_zones(mut self, zones: impl ZoneRanking + 'static) -> Self {
        self.zones = Box::new(zones);
        self
    }

    pub fn build(self) -> Result<Engine, ConfigError> {
        self.settings.lifecycle.validate()?;
        Ok(Engine {
            rng: RngStreams::new(self.settings.seed),
            zones: self.zones,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
            tick: 0,
        })
    }
}

/// What happened during one hour of simulated time.
#[derive(Clone, Debug, Default)]
pub struct TickSummary {
    pub tick: u64,
    pub alive: usize,
    pub eggs_laid: u64,
    pub natural_deaths: u64,
    pub regulated_deaths: u64,
    pub transitions: u64,
    pub duration_ms: f64,
}

pub struct Engine {
    rng: RngStreams,
    zones: Box<dyn ZoneRanking>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
    tick: u64,
}

impl Engine {
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    /// Advances every live individual by one hour.
    ///
    /// Individuals are visited in place. Removal swaps the last individual
    /// into the vacated slot, which is then visited at the same index. Eggs
    /// laid during the pass join the population only after it, so they first
    /// act on the next tick.
    pub fn step(
        &mut self,
        population: &mut Population,
        hour: &Hour,
    ) -> Result<TickSummary, SimulationError> {
        let start = Instant::now();
        let lifecycle = &self.settings.lifecycle;
        let period = lifecycle.regulation.period_of(self.tick);
        let model = lifecycle.adult_model;
        let habitat = Habitat {
            zones: self.zones.as_ref(),
            adult_model: model,
        };
        let mut summary = TickSummary {
            tick: self.tick + 1,
            ..TickSummary::default()
        };
        let mut offspring = Vec::new();

        let mut index = 0;
        while index < population.len() {
            population.develop(index, hour, &habitat, &mut self.rng.lifecycle);

            if population.regulate(
                index,
                hour.temperature,
                period,
                &lifecycle.regulation,
                &mut self.rng.regulation,
            )? {
                population.kill(index, DeathCause::Regulated)?;
                summary.regulated_deaths += 1;
                continue;
            }

            let individual = &population.individuals()[index];
            if individual.is_mature() {
                population.transition(index)?;
                summary.transitions += 1;
            } else if individual.is_dead() {
                population.kill(index, DeathCause::Natural)?;
                summary.natural_deaths += 1;
                continue;
            } else if individual.stage() == Stage::Adult && individual.reproduces(hour, model) {
                let eggs = population.oviposit(index, hour, model, &mut self.rng.reproduction);
                summary.eggs_laid += eggs.len() as u64;
                offspring.extend(eggs);
            }
            index += 1;
        }
        population.extend(offspring);

        self.tick += 1;
        summary.alive = population.len();
        summary.duration_ms = start.elapsed().as_secs_f64() * 1_000.0;
        debug!(
            tick = summary.tick,
            alive = summary.alive,
            eggs = summary.eggs_laid,
            natural = summary.natural_deaths,
            regulated = summary.regulated_deaths,
            "tick complete"
        );
        Ok(summary)
    }

    pub fn run(&mut self, population: &mut Population, period: &Period) -> Result<RunReport> {
        self.run_with_hook(population, period, |_, _| {})
    }

    /// Consumes the period front to back, calling `hook` after every tick.
    pub fn run_with_hook<F>(
        &mut self,
        population: &mut Population,
        period: &Period,
        mut hook: F,
    ) -> Result<RunReport>
    where
        F: FnMut(&TickSummary, &Population),
    {
        let initial = population.stage_counts();
        let (mut natural_deaths, mut regulated_deaths) = (0, 0);
        let mut extinct = population.is_empty();
        info!(
            scenario = %self.settings.scenario_name,
            hours = period.len(),
            individuals = population.len(),
            model = ?self.settings.lifecycle.adult_model,
            "starting run"
        );

        for hour in period.hours() {
            let summary = self
                .step(population, hour)
                .with_context(|| format!("Simulation failed at {}", hour.timestamp))?;
            natural_deaths += summary.natural_deaths;
            regulated_deaths += summary.regulated_deaths;
            if population.is_empty() && !extinct {
                warn!(tick = summary.tick, "population went extinct");
                extinct = true;
            }
            self.snapshot_writer.maybe_write(
                &self.settings.scenario_name,
                summary.tick,
                hour.timestamp,
                population,
            )?;
            hook(&summary, population);
        }

        let report = RunReport {
            scenario: self.settings.scenario_name.clone(),
            ticks: self.tick,
            initial,
            final_counts: population.stage_counts(),
            deaths: population.deaths(),
            regulated_deaths,
            natural_deaths,
            total_eggs: population.total_eggs(),
        };
        info!(
            scenario = %report.scenario,
            ticks = report.ticks,
            alive = population.len(),
            eggs = report.total_eggs,
            "run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::WeatherClass;
    use crate::config::{AdultModel, RegulationConfig};
    use crate::individual::Sex;
    use crate::spatial::Location;
    use chrono::NaiveDate;

    fn settings(lifecycle: LifecycleConfig) -> EngineSettings {
        EngineSettings {
            scenario_name: "unit".into(),
            seed: 7,
            snapshot_interval_ticks: 0,
            snapshot_dir: PathBuf::from("unused"),
            lifecycle,
        }
    }

    fn quiet_lifecycle() -> LifecycleConfig {
        LifecycleConfig {
            adult_model: AdultModel::Simple,
            regulation: RegulationConfig::disabled(),
            ..LifecycleConfig::default()
        }
    }

    fn warm_period(hours: usize) -> Period {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Period::constant(start, hours, 30.0, WeatherClass::Normal).unwrap()
    }

    #[test]
    fn invalid_lifecycle_is_rejected_at_build() {
        let mut lifecycle = LifecycleConfig::default();
        lifecycle.regulation.period_hours = 0;
        assert!(matches!(
            EngineBuilder::new(settings(lifecycle)).build(),
            Err(ConfigError::ZeroRegulationPeriod)
        ));
    }

    #[test]
    fn eggs_hatch_and_ticks_advance() {
        let mut engine = EngineBuilder::new(settings(quiet_lifecycle()))
            .build()
            .unwrap();
        let mut population = Population::new(1.0).unwrap();
        for _ in 0..5 {
            population.spawn(Stage::Egg, Sex::Female, Location::new(0.0, 0.0));
        }

        let mut ticks = Vec::new();
        let report = engine
            .run_with_hook(&mut population, &warm_period(50), |summary, _| {
                ticks.push(summary.tick)
            })
            .unwrap();

        assert_eq!(ticks.first().copied(), Some(1));
        assert_eq!(ticks.last().copied(), Some(50));
        assert_eq!(engine.current_tick(), 50);
        // Full maturity is reached on tick 48 and the eggs hatch in that tick.
        assert_eq!(report.final_counts.larva, 5);
        assert_eq!(report.final_counts.egg, 0);
        assert_eq!(report.deaths.total(), 0);
    }

    #[test]
    fn dead_individuals_are_removed_in_the_same_tick() {
        let mut engine = EngineBuilder::new(settings(quiet_lifecycle()))
            .build()
            .unwrap();
        let mut population = Population::new(1.0).unwrap();
        population.spawn(Stage::Adult, Sex::Male, Location::new(0.0, 0.0));
        population.spawn(Stage::Adult, Sex::Male, Location::new(0.0, 0.0));
        let start = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let heatwave = Period::constant(start, 24, 45.0, WeatherClass::Hot).unwrap();

        let report = engine.run(&mut population, &heatwave).unwrap();
        assert!(population.is_empty());
        assert_eq!(report.deaths.adult, 2);
        assert_eq!(report.natural_deaths, 2);
        assert_eq!(report.regulated_deaths, 0);
        population.check_consistency().unwrap();
    }
}
