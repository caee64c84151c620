use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Independent generators derived from one master seed, one per concern, so
/// that changing how often one concern draws does not shift the others.
pub struct RngStreams {
    pub seeding: ChaCha8Rng,
    pub lifecycle: ChaCha8Rng,
    pub regulation: ChaCha8Rng,
    pub reproduction: ChaCha8Rng,
}

impl RngStreams {
    pub fn new(seed: u64) -> Self {
        let mut master = ChaCha8Rng::seed_from_u64(seed);
        Self {
            seeding: derive(&mut master),
            lifecycle: derive(&mut master),
            regulation: derive(&mut master),
            reproduction: derive(&mut master),
        }
    }
}

fn derive(master: &mut ChaCha8Rng) -> ChaCha8Rng {
    let mut seed_bytes = [0u8; 32];
    master.fill_bytes(&mut seed_bytes);
    ChaCha8Rng::from_seed(seed_bytes)
}

/// Uniform draw in `[min, max]`; a collapsed range returns `min`.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}
