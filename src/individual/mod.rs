//! One simulated mosquito and its life-stage state machine.
//!
//! Every individual is the same record whatever its stage. Stage-specific
//! behaviour is selected by matching on [`Stage`], and adult-only state lives
//! in [`AdultState`], which exists from emergence onwards.

mod adult;
mod immature;
mod mortality;

use std::{
    fmt,
    ops::{Index, IndexMut},
};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::climate::Hour;
use crate::config::AdultModel;
use crate::spatial::Location;
use crate::zones::ZoneRanking;

pub use adult::{
    AdultState, Foraging, ADULT_LIFESPAN_HOURS, LETHAL_HOURLY_DECAY, MAX_BLOOD_MEAL, MAX_EGGS,
    MIN_BLOOD_MEAL_FOR_EGGS,
};
pub use mortality::daily_mortality;

/// Maturity at which an immature individual moves to the next stage.
pub const MATURITY_COMPLETE: f64 = 100.0;
// Absorbs rounding when hourly increments should sum to exactly 100.
const MATURITY_TOLERANCE: f64 = 1e-9;
pub const FULL_LIFE_EXPECTANCY: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndividualId(pub u64);

impl IndividualId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Egg,
    Larva,
    Pupa,
    Adult,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Egg, Stage::Larva, Stage::Pupa, Stage::Adult];

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Egg => Some(Stage::Larva),
            Stage::Larva => Some(Stage::Pupa),
            Stage::Pupa => Some(Stage::Adult),
            Stage::Adult => None,
        }
    }

    pub fn is_immature(self) -> bool {
        self != Stage::Adult
    }

    /// Longest an immature stage can last before the individual dies of it.
    fn age_ceiling_hours(self) -> Option<u32> {
        match self {
            Stage::Egg => Some(7 * 24),
            Stage::Larva => Some(14 * 24),
            Stage::Pupa => Some(10 * 24),
            Stage::Adult => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Egg => "egg",
            Stage::Larva => "larva",
            Stage::Pupa => "pupa",
            Stage::Adult => "adult",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Sex::Female
        } else {
            Sex::Male
        }
    }
}

/// One tally per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub egg: u64,
    pub larva: u64,
    pub pupa: u64,
    pub adult: u64,
}

impl StageCounts {
    pub fn total(&self) -> u64 {
        self.egg + self.larva + self.pupa + self.adult
    }

    pub fn immature(&self) -> u64 {
        self.egg + self.larva + self.pupa
    }

    pub fn add(&mut self, other: &StageCounts) {
        for stage in Stage::ALL {
            self[stage] += other[stage];
        }
    }
}

impl Index<Stage> for StageCounts {
    type Output = u64;

    fn index(&self, stage: Stage) -> &u64 {
        match stage {
            Stage::Egg => &self.egg,
            Stage::Larva => &self.larva,
            Stage::Pupa => &self.pupa,
            Stage::Adult => &self.adult,
        }
    }
}

impl IndexMut<Stage> for StageCounts {
    fn index_mut(&mut self, stage: Stage) -> &mut u64 {
        match stage {
            Stage::Egg => &mut self.egg,
            Stage::Larva => &mut self.larva,
            Stage::Pupa => &mut self.pupa,
            Stage::Adult => &mut self.adult,
        }
    }
}

/// What the environment looks like to a developing individual.
pub struct Habitat<'a> {
    pub zones: &'a dyn ZoneRanking,
    pub adult_model: AdultModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Development {
    /// The hour was applied.
    Developed,
    /// Maturity was already complete; the individual is waiting to be
    /// replaced by its next stage and did not age.
    Matured,
}

#[derive(Debug, Clone, Serialize)]
pub struct Individual {
    id: IndividualId,
    stage: Stage,
    sex: Sex,
    age_hours: u32,
    maturity: f64,
    life_expectancy: f64,
    origin: Location,
    location: Location,
    adult: Option<AdultState>,
}

impl Individual {
    pub fn new(id: IndividualId, stage: Stage, sex: Sex, origin: Location) -> Self {
        Self {
            id,
            stage,
            sex,
            age_hours: 0,
            maturity: 0.0,
            life_expectancy: FULL_LIFE_EXPECTANCY,
            origin,
            location: origin,
            adult: (stage == Stage::Adult).then(AdultState::default),
        }
    }

    pub fn id(&self) -> IndividualId {
        self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    /// Hours spent in the current stage.
    pub fn age_hours(&self) -> u32 {
        self.age_hours
    }

    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    pub fn life_expectancy(&self) -> f64 {
        self.life_expectancy
    }

    /// Birth site; the key the individual is grouped under.
    pub fn origin(&self) -> Location {
        self.origin
    }

    /// Current position. Only adults ever leave their origin.
    pub fn location(&self) -> Location {
        self.location
    }

    pub fn adult(&self) -> Option<&AdultState> {
        self.adult.as_ref()
    }

    pub fn is_mature(&self) -> bool {
        self.stage.is_immature() && self.maturity + MATURITY_TOLERANCE >= MATURITY_COMPLETE
    }

    /// Applies one hour of climate exposure.
    pub fn develop<R: Rng + ?Sized>(
        &mut self,
        hour: &Hour,
        habitat: &Habitat<'_>,
        rng: &mut R,
    ) -> Development {
        if self.is_mature() {
            return Development::Matured;
        }
        self.age_hours += 1;

        let response = match self.stage {
            Stage::Egg => immature::egg_response(hour.temperature, rng),
            Stage::Larva => immature::larva_response(hour.temperature, rng),
            Stage::Pupa => immature::pupa_response(hour.temperature, self.sex, rng),
            Stage::Adult => {
                self.develop_adult(hour, habitat, rng);
                return Development::Developed;
            }
        };
        self.maturity = (self.maturity + response.maturation).min(MATURITY_COMPLETE);
        self.life_expectancy -= response.expectancy_loss;
        Development::Developed
    }

    pub fn is_dead(&self) -> bool {
        if self.life_expectancy <= 0.0 {
            return true;
        }
        match self.stage.age_ceiling_hours() {
            Some(ceiling) => self.age_hours > ceiling,
            None => self.age_hours >= ADULT_LIFESPAN_HOURS,
        }
    }

    /// The same organism in its next stage: id, sex and both locations carry
    /// over, per-stage accumulators start fresh.
    pub fn successor(&self) -> Option<Individual> {
        let stage = self.stage.next()?;
        let mut next = Individual::new(self.id, stage, self.sex, self.origin);
        next.location = self.location;
        Some(next)
    }
}
