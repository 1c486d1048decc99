//! Edge colorer (spec §4.1, C1). A pure function run identically on the
//! host (for routing) and on each accelerator (for residual checks) — it
//! must be bit-exact across both or the color-partitioning scheme collapses.

use crate::model::{Color, HashParams};

/// `color = ((a*id + b) mod p) mod C`.
pub fn color_of(id: u32, params: HashParams) -> Color {
    let a = params.a as u64;
    let b = params.b as u64;
    let p = params.p as u64;
    let id = id as u64;
    (((a * id + b) % p) % params.colors as u64) as Color
}

/// Draws fresh session-random hash parameters `a in [1, p-1]`, `b in [0, p-1]`.
pub fn random_params(seed: u64, colors: u32) -> HashParams {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
    let p = crate::COLOR_HASH_PRIME;
    HashParams {
        p,
        a: rng.random_range(1..p),
        b: rng.random_range(0..p),
        colors,
    }
}
