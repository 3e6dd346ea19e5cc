//! Seeded noise shared by the unit and integration tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `n` uniform draws in [-1, 1), the same for a given seed.
pub fn uniform_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}
