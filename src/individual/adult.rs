//! Adult behaviour: survival, feeding, mating, egg laying and dispersal.

use rand::Rng;
use serde::Serialize;

use super::{immature::BASELINE_DECAY, Habitat, Individual, Sex, Stage};
use crate::climate::{Hour, WeatherClass};
use crate::config::AdultModel;
use crate::zones::ZoneRank;

pub const ADULT_LIFESPAN_HOURS: u32 = 30 * 24;
/// Expectancy lost per hour on a lethal day (T ≥ 40 °C or T ≤ 0 °C).
pub const LETHAL_HOURLY_DECAY: f64 = 4.3;
/// Blood meal is tracked as the percentage of a full 2-3 mg meal retained.
pub const MAX_BLOOD_MEAL: u32 = 100;
pub const MAX_EGGS: u32 = 150;
pub const MIN_BLOOD_MEAL_FOR_EGGS: u32 = 10;

const SIMPLE_BATCH_MIN: u32 = 80;
const SIMPLE_BATCH_MAX: u32 = 150;
const SIMPLE_REPRODUCTION_THRESHOLD: f64 = 18.0;

/// Hours after emergence within which the first blood meal is taken.
const FIRST_MEAL_WINDOW: (u32, u32) = (20, 72);
const PAROUS_FEEDING_PROBABILITY: f64 = 0.5;

/// Metres per hour; 17 cm/s in still air up to ~2 km/h.
const AIRSPEED_RANGE: (f64, f64) = (1_000.0, 2_000.0);
const MAX_GROUND_SPEED: f64 = 3_000.0;
const FLIGHT_DRIFT_DEG: f64 = 45.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdultState {
    pub last_oviposition_hours: u32,
    pub inseminated: bool,
    pub last_feed_hours: u32,
    pub fed_this_cycle: bool,
    pub blood_meal: u32,
    pub feed_count: u32,
    pub oviposition_count: u32,
    pub distance_traveled: f64,
}

impl Default for AdultState {
    fn default() -> Self {
        Self {
            last_oviposition_hours: 1,
            inseminated: false,
            last_feed_hours: 1,
            fed_this_cycle: false,
            blood_meal: 0,
            feed_count: 0,
            oviposition_count: 0,
            distance_traveled: 0.0,
        }
    }
}

impl AdultState {
    /// A female is inseminated once for life. Acceptance depends on how far
    /// into her first gonotrophic cycle she is: 58 % before any blood meal,
    /// 17 % during the first, 25 % from the second meal until she first lays.
    fn accept_insemination<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.inseminated || self.oviposition_count > 0 {
            return false;
        }
        let threshold = match self.feed_count {
            0 => 58,
            1 => 17,
            _ => 25,
        };
        if rng.gen_range(1..=100u32) <= threshold {
            self.inseminated = true;
            return true;
        }
        false
    }

    fn can_feed(&self) -> bool {
        !self.fed_this_cycle || self.blood_meal < MIN_BLOOD_MEAL_FOR_EGGS
    }

    fn finish_cycle(&mut self) {
        self.fed_this_cycle = false;
        self.blood_meal = 0;
        self.oviposition_count += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Foraging {
    /// Too cold to fly, or not an adult.
    Skipped,
    /// Left a poor zone.
    Relocated { distance: f64 },
    Fed,
    Idle,
}

/// Hours from blood meal to oviposition, longer when cold.
fn gonotrophic_cycle_hours<R: Rng + ?Sized>(weather: WeatherClass, rng: &mut R) -> u32 {
    match weather {
        WeatherClass::Cold => rng.gen_range(96..=120),
        WeatherClass::Cool => rng.gen_range(72..=96),
        WeatherClass::Normal => rng.gen_range(48..=96),
        WeatherClass::Warm | WeatherClass::Hot => rng.gen_range(48..=72),
    }
}

/// Ground speed in m/h of a mosquito heading `bearing_deg` into the wind.
fn flight_speed<R: Rng + ?Sized>(wind_speed_kmh: f64, bearing_deg: f64, rng: &mut R) -> f64 {
    let airspeed = rng.gen_range(AIRSPEED_RANGE.0..=AIRSPEED_RANGE.1);
    let wind = wind_speed_kmh * 1_000.0;
    let theta = (180.0 - bearing_deg).to_radians();
    let vx = theta.sin() * airspeed - wind;
    let vy = theta.cos() * airspeed;
    vx.hypot(vy).min(MAX_GROUND_SPEED)
}

impl Individual {
    pub(super) fn develop_adult<R: Rng + ?Sized>(
        &mut self,
        hour: &Hour,
        habitat: &Habitat<'_>,
        rng: &mut R,
    ) {
        let lethal = hour.temperature >= 40.0 || hour.temperature <= 0.0;
        self.life_expectancy -= if lethal {
            LETHAL_HOURLY_DECAY
        } else {
            BASELINE_DECAY
        };

        if habitat.adult_model == AdultModel::Full && hour.weather != WeatherClass::Cold {
            let rank = habitat.zones.rank(self.location);
            self.seek_food(hour, rank, rng);
        }
    }

    /// Whether this hour is one the individual may lay eggs in. Eligibility
    /// only; the gonotrophic cycle decides in [`Individual::lay_eggs`].
    pub fn reproduces(&self, hour: &Hour, model: AdultModel) -> bool {
        let Some(adult) = self.adult.as_ref() else {
            return false;
        };
        if self.is_dead() || self.sex != Sex::Female {
            return false;
        }
        match model {
            AdultModel::Full => adult.inseminated && hour.weather != WeatherClass::Cold,
            AdultModel::Simple => hour.temperature > SIMPLE_REPRODUCTION_THRESHOLD,
        }
    }

    /// Advances the gonotrophic cycle by an hour and returns the number of
    /// eggs laid, zero when the cycle is not complete.
    pub fn lay_eggs<R: Rng + ?Sized>(&mut self, hour: &Hour, model: AdultModel, rng: &mut R) -> u32 {
        let Some(adult) = self.adult.as_mut() else {
            return 0;
        };
        match model {
            AdultModel::Full => {
                let cycle = gonotrophic_cycle_hours(hour.weather, rng);
                adult.last_oviposition_hours += 1;
                if adult.last_oviposition_hours < cycle
                    || adult.blood_meal < MIN_BLOOD_MEAL_FOR_EGGS
                {
                    return 0;
                }
                let eggs = adult.blood_meal * MAX_EGGS / MAX_BLOOD_MEAL;
                adult.last_oviposition_hours = 0;
                adult.finish_cycle();
                eggs
            }
            AdultModel::Simple => {
                let cycle = rng.gen_range(3..=4u32) * 24;
                if adult.last_oviposition_hours % cycle != 0 {
                    adult.last_oviposition_hours += 1;
                    return 0;
                }
                adult.last_oviposition_hours = 1;
                adult.oviposition_count += 1;
                rng.gen_range(SIMPLE_BATCH_MIN..=SIMPLE_BATCH_MAX)
            }
        }
    }

    /// One hour of host seeking. Adults in a poor zone disperse instead of
    /// feeding; only females take blood, mostly around dawn and dusk.
    pub fn seek_food<R: Rng + ?Sized>(&mut self, hour: &Hour, rank: ZoneRank, rng: &mut R) -> Foraging {
        if self.stage != Stage::Adult || hour.weather == WeatherClass::Cold {
            return Foraging::Skipped;
        }
        self.inseminate(hour, rng);
        if let Some(adult) = self.adult.as_mut() {
            adult.last_feed_hours += 1;
        }

        if rank.drives_dispersal() {
            let distance = self.fly(hour, rng);
            return Foraging::Relocated { distance };
        }
        if self.sex != Sex::Female || !hour.time_of_day().is_twilight() {
            return Foraging::Idle;
        }

        let age = self.age_hours;
        let Some(adult) = self.adult.as_mut() else {
            return Foraging::Skipped;
        };
        if !adult.can_feed() {
            return Foraging::Idle;
        }
        let hungry = if adult.feed_count == 0 {
            rng.gen_range(FIRST_MEAL_WINDOW.0..=FIRST_MEAL_WINDOW.1) <= age
        } else {
            rng.gen_bool(PAROUS_FEEDING_PROBABILITY)
        };
        if !hungry {
            return Foraging::Idle;
        }
        adult.fed_this_cycle = true;
        adult.last_feed_hours = 0;
        adult.feed_count += 1;
        adult.blood_meal = (adult.blood_meal + rng.gen_range(0..=MAX_BLOOD_MEAL)).min(MAX_BLOOD_MEAL);
        Foraging::Fed
    }

    /// Mating attempt. Both sexes are ready within a day of emergence and mate
    /// in flight around twilight. Returns true only when a female is newly
    /// inseminated.
    pub fn inseminate<R: Rng + ?Sized>(&mut self, hour: &Hour, rng: &mut R) -> bool {
        let age = self.age_hours;
        let sex = self.sex;
        let Some(adult) = self.adult.as_mut() else {
            return false;
        };
        if adult.inseminated || !hour.time_of_day().is_twilight() {
            return false;
        }
        if rng.gen_range(1..=24u32) > age {
            return false;
        }
        match sex {
            // Males carry no latch of their own.
            Sex::Male => false,
            Sex::Female => adult.accept_insemination(rng),
        }
    }

    /// Flies for one hour against the wind with some drift and returns the
    /// distance covered in metres.
    pub fn fly<R: Rng + ?Sized>(&mut self, hour: &Hour, rng: &mut R) -> f64 {
        let Some(adult) = self.adult.as_mut() else {
            return 0.0;
        };
        let drift = rng.gen_range(-FLIGHT_DRIFT_DEG..=FLIGHT_DRIFT_DEG);
        let bearing = (hour.wind_direction + 180.0 + drift).rem_euclid(360.0);
        let speed = flight_speed(hour.wind_speed, bearing, rng);
        self.location = self.location.moved(speed, bearing);
        adult.distance_traveled += speed;
        speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::{Development, IndividualId};
    use crate::spatial::Location;
    use crate::zones::UniformRanking;
    use chrono::{NaiveDate, NaiveDateTime};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn at(hour_of_day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(hour_of_day, 0, 0)
            .unwrap()
    }

    fn adult(sex: Sex) -> Individual {
        Individual::new(IndividualId(1), Stage::Adult, sex, Location::new(0.0, 0.0))
    }

    fn habitat(zones: &UniformRanking, adult_model: AdultModel) -> Habitat<'_> {
        Habitat { zones, adult_model }
    }

    #[test]
    fn cold_kills_adults_within_a_day() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let zones = UniformRanking(ZoneRank::Good);
        let habitat = habitat(&zones, AdultModel::Full);
        let hour = Hour::new(at(12), -5.0, WeatherClass::Cold);
        let limit = (100.0 / LETHAL_HOURLY_DECAY).ceil() as u32;

        let mut mosquito = adult(Sex::Female);
        for _ in 0..limit - 1 {
            mosquito.develop(&hour, &habitat, &mut rng);
        }
        assert!(!mosquito.is_dead());
        mosquito.develop(&hour, &habitat, &mut rng);
        assert!(mosquito.is_dead());
        assert_eq!(mosquito.age_hours(), limit);
    }

    #[test]
    fn adults_never_outlive_thirty_days() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let zones = UniformRanking(ZoneRank::Good);
        let habitat = habitat(&zones, AdultModel::Simple);
        let hour = Hour::new(at(12), 22.0, WeatherClass::Normal);

        let mut mosquito = adult(Sex::Male);
        for _ in 0..ADULT_LIFESPAN_HOURS - 1 {
            assert_eq!(mosquito.develop(&hour, &habitat, &mut rng), Development::Developed);
            assert!(!mosquito.is_dead());
        }
        mosquito.develop(&hour, &habitat, &mut rng);
        assert!(mosquito.is_dead());
    }

    #[test]
    fn insemination_latches_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let dusk = Hour::new(at(18), 28.0, WeatherClass::Warm);
        let mut female = adult(Sex::Female);
        female.age_hours = 48;

        let mut attempts = 0;
        while !female.inseminate(&dusk, &mut rng) {
            attempts += 1;
            assert!(attempts < 1_000, "female was never inseminated");
        }
        let latched = female.adult().cloned().unwrap();
        assert!(latched.inseminated);

        for _ in 0..200 {
            assert!(!female.inseminate(&dusk, &mut rng));
            assert_eq!(female.adult(), Some(&latched));
        }
    }

    #[test]
    fn males_are_never_latched() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let dawn = Hour::new(at(6), 28.0, WeatherClass::Warm);
        let mut male = adult(Sex::Male);
        male.age_hours = 48;
        for _ in 0..100 {
            assert!(!male.inseminate(&dawn, &mut rng));
        }
        assert!(!male.adult().unwrap().inseminated);
    }

    #[test]
    fn full_model_cycle_resets_after_laying() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let hour = Hour::new(at(19), 26.0, WeatherClass::Normal);
        let mut female = adult(Sex::Female);
        {
            let state = female.adult.as_mut().unwrap();
            state.inseminated = true;
            state.blood_meal = MAX_BLOOD_MEAL;
            state.fed_this_cycle = true;
        }
        assert!(female.reproduces(&hour, AdultModel::Full));

        let mut eggs = 0;
        for _ in 0..200 {
            eggs = female.lay_eggs(&hour, AdultModel::Full, &mut rng);
            if eggs > 0 {
                break;
            }
        }
        assert_eq!(eggs, MAX_EGGS);
        let state = female.adult().unwrap();
        assert_eq!(state.last_oviposition_hours, 0);
        assert_eq!(state.oviposition_count, 1);
        assert_eq!(state.blood_meal, 0);

        for expected in 1..=10 {
            assert_eq!(female.lay_eggs(&hour, AdultModel::Full, &mut rng), 0);
            assert_eq!(female.adult().unwrap().last_oviposition_hours, expected);
        }
    }

    #[test]
    fn scarce_blood_meal_lays_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let hour = Hour::new(at(19), 26.0, WeatherClass::Normal);
        let mut female = adult(Sex::Female);
        female.adult.as_mut().unwrap().blood_meal = MIN_BLOOD_MEAL_FOR_EGGS - 1;
        for _ in 0..300 {
            assert_eq!(female.lay_eggs(&hour, AdultModel::Full, &mut rng), 0);
        }
    }

    #[test]
    fn simple_model_lays_a_batch_every_few_days() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let hour = Hour::new(at(12), 25.0, WeatherClass::Normal);
        let mut female = adult(Sex::Female);
        assert!(female.reproduces(&hour, AdultModel::Simple));
        assert!(!female.reproduces(&Hour::new(at(12), 17.0, WeatherClass::Cool), AdultModel::Simple));

        let mut laid = Vec::new();
        for _ in 0..400 {
            let eggs = female.lay_eggs(&hour, AdultModel::Simple, &mut rng);
            if eggs > 0 {
                assert!((SIMPLE_BATCH_MIN..=SIMPLE_BATCH_MAX).contains(&eggs));
                assert_eq!(female.adult().unwrap().last_oviposition_hours, 1);
                laid.push(eggs);
            }
        }
        assert!(!laid.is_empty());
    }

    #[test]
    fn males_and_uninseminated_females_do_not_reproduce() {
        let hour = Hour::new(at(19), 26.0, WeatherClass::Normal);
        assert!(!adult(Sex::Male).reproduces(&hour, AdultModel::Full));
        assert!(!adult(Sex::Female).reproduces(&hour, AdultModel::Full));
    }

    #[test]
    fn poor_zone_adults_fly_away() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let hour = Hour::new(at(12), 28.0, WeatherClass::Warm);
        let mut female = adult(Sex::Female);

        let outcome = female.seek_food(&hour, ZoneRank::Terrible, &mut rng);
        let Foraging::Relocated { distance } = outcome else {
            panic!("expected relocation, got {outcome:?}");
        };
        assert!((AIRSPEED_RANGE.0..=AIRSPEED_RANGE.1).contains(&distance));
        assert!((female.location().distance_to(female.origin()) - distance).abs() < 1e-6);
        assert_eq!(female.adult().unwrap().distance_traveled, distance);
        assert_eq!(female.origin(), Location::new(0.0, 0.0));
    }

    #[test]
    fn flight_heads_into_the_wind() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        // Wind from the east sends adults westward.
        let hour = Hour::new(at(12), 28.0, WeatherClass::Warm).with_wind(5.0, 90.0);
        for _ in 0..20 {
            let mut male = adult(Sex::Male);
            let distance = male.fly(&hour, &mut rng);
            assert!(distance > 0.0 && distance <= MAX_GROUND_SPEED);
            assert!(male.location().x < 0.0);
        }
    }

    #[test]
    fn strong_wind_speed_is_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for bearing in [0.0, 90.0, 180.0, 270.0] {
            let speed = flight_speed(40.0, bearing, &mut rng);
            assert!(speed <= MAX_GROUND_SPEED);
            assert!(speed >= 0.0);
        }
    }

    #[test]
    fn foraging_is_skipped_in_the_cold() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let hour = Hour::new(at(6), 10.0, WeatherClass::Cold);
        let mut female = adult(Sex::Female);
        assert_eq!(female.seek_food(&hour, ZoneRank::Poor, &mut rng), Foraging::Skipped);
        assert_eq!(female.location(), female.origin());
    }

    #[test]
    fn females_feed_at_twilight_in_good_zones() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let dusk = Hour::new(at(18), 27.0, WeatherClass::Warm);
        let mut female = adult(Sex::Female);
        female.age_hours = 80;

        assert_eq!(female.seek_food(&dusk, ZoneRank::Good, &mut rng), Foraging::Fed);
        let state = female.adult().unwrap();
        assert!(state.fed_this_cycle);
        assert_eq!(state.last_feed_hours, 0);
        assert_eq!(state.feed_count, 1);
        assert!(state.blood_meal <= MAX_BLOOD_MEAL);

        let noon = Hour::new(at(12), 27.0, WeatherClass::Warm);
        assert_eq!(female.seek_food(&noon, ZoneRank::Good, &mut rng), Foraging::Idle);
    }
}
