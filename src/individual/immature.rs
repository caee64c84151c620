//! Banded climate responses of the aquatic stages.
//!
//! The thresholds come from sparse field observations, so each stage uses
//! discrete temperature bands with their own rates rather than a fitted
//! curve. Band edges are discontinuities on purpose.

use rand::Rng;

use super::Sex;
use crate::rng::uniform;

/// Hourly expectancy loss giving a 30 day life in good conditions.
pub(crate) const BASELINE_DECAY: f64 = 100.0 / (30.0 * 24.0);

/// Pupal duration of a female over that of a male (2.5 d / 1.9 d).
pub(crate) const MALE_PUPA_SPEEDUP: f64 = 2.5 / 1.9;

pub(crate) struct StageResponse {
    pub maturation: f64,
    pub expectancy_loss: f64,
}

impl StageResponse {
    fn new(maturation: f64, expectancy_loss: f64) -> Self {
        Self {
            maturation,
            expectancy_loss,
        }
    }
}

/// Hourly maturity gain for a stage lasting `days`. A band with no duration
/// makes no progress.
pub(crate) fn rate_for_days(days: f64) -> f64 {
    let hours = days * 24.0;
    if hours > 0.0 {
        100.0 / hours
    } else {
        0.0
    }
}

/// Embryonic development completes in 48 h when warm and stretches to five
/// days in the cold.
pub(crate) fn egg_response<R: Rng + ?Sized>(temperature: f64, rng: &mut R) -> StageResponse {
    if temperature >= 27.0 {
        StageResponse::new(100.0 / 48.0, BASELINE_DECAY)
    } else if temperature <= 15.0 {
        StageResponse::new(100.0 / 120.0, 100.0 / 140.0)
    } else {
        let reference = uniform(rng, 27.0, 40.0);
        StageResponse::new(100.0 / 48.0 * temperature / reference, BASELINE_DECAY)
    }
}

/// Five days in optimal water, commonly seven to fourteen. Larvae hatched
/// below the cold thresholds are killed within 72 h / 96 h by the penalty.
pub(crate) fn larva_response<R: Rng + ?Sized>(temperature: f64, rng: &mut R) -> StageResponse {
    if temperature >= 34.0 {
        StageResponse::new(rate_for_days(5.0), BASELINE_DECAY)
    } else if temperature >= 20.0 {
        StageResponse::new(rate_for_days(uniform(rng, 5.0, 7.0)), BASELINE_DECAY)
    } else if temperature <= 11.0 {
        StageResponse::new(0.0, 100.0 / 72.0)
    } else if temperature <= 15.0 {
        StageResponse::new(rate_for_days(uniform(rng, 10.0, 14.0)), 100.0 / 96.0)
    } else {
        StageResponse::new(rate_for_days(uniform(rng, 7.0, 12.0)), BASELINE_DECAY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PupaBand {
    Warm,
    Mild,
    Cool,
}

impl PupaBand {
    /// Temperatures between the observed bands take the nearest one.
    fn for_temperature(temperature: f64) -> Self {
        if (27.0..=32.0).contains(&temperature) {
            PupaBand::Warm
        } else if temperature <= 20.0 {
            PupaBand::Cool
        } else if temperature < 26.0 {
            PupaBand::Mild
        } else {
            PupaBand::Warm
        }
    }

    /// Mean female pupal duration in days.
    fn female_days(self) -> f64 {
        match self {
            PupaBand::Warm => 2.5,
            PupaBand::Mild => 4.0,
            PupaBand::Cool => 7.0,
        }
    }
}

pub(crate) fn pupa_response<R: Rng + ?Sized>(
    temperature: f64,
    sex: Sex,
    rng: &mut R,
) -> StageResponse {
    let mean = PupaBand::for_temperature(temperature).female_days();
    let female_rate = rate_for_days(uniform(rng, mean * 0.8, mean * 1.2));
    let maturation = match sex {
        Sex::Female => female_rate,
        Sex::Male => female_rate * MALE_PUPA_SPEEDUP,
    };
    StageResponse::new(maturation, BASELINE_DECAY)
}
