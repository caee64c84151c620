use rand::Rng;

use super::Stage;
use crate::rng::uniform;

/// Fraction of a stage expected to die over one day at `temperature`.
///
/// Each stage has a comfortable band with low background mortality and a
/// stressed band outside it; the rate is drawn uniformly inside the band's
/// range. Adults lose about 10 % a day in the field, so half a cohort is gone
/// within the first week.
pub fn daily_mortality<R: Rng + ?Sized>(stage: Stage, temperature: f64, rng: &mut R) -> f64 {
    let (low, high) = match stage {
        Stage::Egg if (15.0..=35.0).contains(&temperature) => (0.01, 0.02),
        Stage::Egg => (0.05, 0.10),
        Stage::Larva if (20.0..=34.0).contains(&temperature) => (0.01, 0.03),
        Stage::Larva if temperature > 11.0 => (0.03, 0.06),
        Stage::Larva => (0.10, 0.20),
        Stage::Pupa if (20.0..=32.0).contains(&temperature) => (0.01, 0.02),
        Stage::Pupa => (0.05, 0.10),
        Stage::Adult if temperature > 0.0 && temperature < 40.0 => (0.08, 0.12),
        Stage::Adult => (0.50, 0.90),
    };
    uniform(rng, low, high)
}
