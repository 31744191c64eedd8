//! Genetic operators over blend candidates.
//!
//! All randomness comes from the caller's RNG so a seeded run is
//! reproducible. Every operator returns a candidate with three distinct
//! indices below `material_count` and a ratio from the pool.

use rand::seq::index;
use rand::Rng;

use crate::fitness::Evaluation;
use crate::ratio_pool::RatioPool;
use crate::types::{Candidate, BLEND_ARITY};

/// Three distinct material indices drawn uniformly.
///
/// `material_count` must be at least `BLEND_ARITY`.
pub fn sample_indices<R: Rng + ?Sized>(rng: &mut R, material_count: usize) -> [usize; BLEND_ARITY] {
    let picked = index::sample(rng, material_count, BLEND_ARITY);
    let mut out = [0; BLEND_ARITY];
    for (slot, i) in out.iter_mut().zip(picked.iter()) {
        *slot = i;
    }
    out
}

/// A uniformly random candidate. `None` only for an empty pool.
pub fn random_candidate<R: Rng + ?Sized>(
    rng: &mut R,
    material_count: usize,
    pool: &RatioPool,
) -> Option<Candidate> {
    let indices = sample_indices(rng, material_count);
    pool.choose(rng).map(|ratio| Candidate::new(indices, ratio))
}

/// Best of `size` distinct contestants drawn from `pool` (lowest score).
///
/// Ties go to the contestant drawn first. `pool` must not be empty.
pub fn tournament<'a, R: Rng + ?Sized>(
    rng: &mut R,
    pool: &'a [(Candidate, Evaluation)],
    size: usize,
) -> &'a Candidate {
    let k = size.clamp(1, pool.len());
    let mut winner: Option<&(Candidate, Evaluation)> = None;
    for i in index::sample(rng, pool.len(), k).iter() {
        let contestant = &pool[i];
        if winner.map_or(true, |w| contestant.1.score < w.1.score) {
            winner = Some(contestant);
        }
    }
    // k >= 1 so a winner always exists
    &winner.unwrap_or(&pool[0]).0
}

/// Single-point crossover on the index channel.
///
/// The child takes `p1`'s indices before a cut point in 1..=2 and `p2`'s
/// from it on. Repeats are dropped and the gaps refilled with random unused
/// materials. The ratio is drawn fresh from the pool.
pub fn crossover<R: Rng + ?Sized>(
    rng: &mut R,
    p1: &Candidate,
    p2: &Candidate,
    material_count: usize,
    pool: &RatioPool,
) -> Candidate {
    let cut = rng.gen_range(1..BLEND_ARITY);
    let mut indices: Vec<usize> = Vec::with_capacity(BLEND_ARITY);
    for &i in p1.indices[..cut].iter().chain(&p2.indices[cut..]) {
        if !indices.contains(&i) {
            indices.push(i);
        }
    }
    while indices.len() < BLEND_ARITY {
        let i = rng.gen_range(0..material_count);
        if !indices.contains(&i) {
            indices.push(i);
        }
    }

    let mut child = [0; BLEND_ARITY];
    child.copy_from_slice(&indices);
    let ratio = pool.choose(rng).unwrap_or(p1.ratio);
    Candidate::new(child, ratio)
}

/// Two-channel mutation with a forced perturbation.
///
/// The index channel (probability `rate`) swaps one slot for a material not
/// already in the blend. The ratio channel (probability `rate`) draws a
/// different pool ratio. If neither left the candidate changed, either a
/// different ratio is drawn or two slots are swapped, with equal odds, so
/// the result always differs from the input.
pub fn mutate<R: Rng + ?Sized>(
    rng: &mut R,
    mut candidate: Candidate,
    rate: f64,
    material_count: usize,
    pool: &RatioPool,
) -> Candidate {
    let original = candidate.key();

    if rng.gen::<f64>() < rate {
        let slot = rng.gen_range(0..BLEND_ARITY);
        let unused: Vec<usize> = (0..material_count)
            .filter(|i| !candidate.indices.contains(i))
            .collect();
        if !unused.is_empty() {
            candidate.indices[slot] = unused[rng.gen_range(0..unused.len())];
        }
    }

    if rng.gen::<f64>() < rate {
        if let Some(ratio) = pool.choose_other(rng, &candidate.ratio) {
            candidate.ratio = ratio;
        }
    }

    if candidate.key() == original {
        let redrawn = if rng.gen::<f64>() < 0.5 {
            pool
                .choose_other(rng, &candidate.ratio)
                .filter(|r| *r != candidate.ratio)
        } else {
            None
        };
        match redrawn {
            Some(ratio) => candidate.ratio = ratio,
            None => {
                let slots = index::sample(rng, BLEND_ARITY, 2);
                candidate.indices.swap(slots.index(0), slots.index(1));
            }
        }
    }

    candidate
}
