//! Seeded random helpers. Every random choice in the level flows through its rng.

use std::f64::consts::TAU;

use glam::{DVec2, DVec3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// 32 hex characters, used for entity, system and level ids.
pub fn random_id(rng: &mut ChaCha8Rng) -> String {
    format!("{:016x}{:016x}", rng.gen::<u64>(), rng.gen::<u64>())
}

/// A point `distance` away from the origin in a random direction.
/// With `flat`, the point lies in the y = 0 plane.
pub fn random_on_sphere(rng: &mut ChaCha8Rng, distance: f64, flat: bool) -> DVec3 {
    let a = rng.gen_range(0.0..TAU);
    let b = rng.gen_range(0.0..TAU);
    if flat {
        DVec3::new(distance * a.cos(), 0.0, distance * a.sin())
    } else {
        DVec3::new(
            distance * a.cos(),
            distance * a.sin() * b.cos(),
            distance * a.sin() * b.sin(),
        )
    }
}

/// A point `distance` away from the origin in the plane.
pub fn random_on_circle(rng: &mut ChaCha8Rng, distance: f64) -> DVec2 {
    let a = rng.gen_range(0.0..TAU);
    DVec2::new(distance * a.cos(), distance * a.sin())
}

/// Uniform float in `[min, max]`, tolerating an empty range.
pub fn random_between(rng: &mut ChaCha8Rng, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// Number of successes in a run of independent trials that stops at the first failure.
pub fn recursive_count(rng: &mut ChaCha8Rng, probability: f64, cap: usize) -> usize {
    let mut count = 0;
    while count < cap && rng.gen_bool(probability.clamp(0.0, 1.0)) {
        count += 1;
    }
    count
}
