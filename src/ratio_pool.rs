//! Precomputed pool of legal three-way blend splits
//!
//! Blend proportions are never continuous: every candidate draws its split
//! from this pool. The pool holds every ordered triple of positive multiples
//! of the step that sums to exactly 100.

use rand::Rng;

use crate::types::Ratio;

/// Percentage granularity of blend proportions.
pub const DEFAULT_RATIO_STEP: u8 = 5;

/// Immutable set of valid ratios, shared read-only by every candidate in a run.
#[derive(Debug, Clone)]
pub struct RatioPool {
    step: u8,
    ratios: Vec<Ratio>,
}

impl RatioPool {
    /// Enumerate all valid ratios for `step`.
    ///
    /// A step of zero, or one that does not leave room for three positive
    /// parts, yields an empty pool.
    pub fn new(step: u8) -> Self {
        let mut ratios = Vec::new();
        if step > 0 {
            let parts: Vec<u8> = (1..100u8 / step + 1)
                .map(|k| k * step)
                .filter(|&p| p < 100)
                .collect();
            for &a in &parts {
                for &b in &parts {
                    let rest = 100i32 - i32::from(a) - i32::from(b);
                    if rest > 0 && rest % i32::from(step) == 0 {
                        // rest < 100 and a multiple of step, so it fits in u8
                        let c = rest as u8;
                        ratios.push(Ratio([a, b, c]));
                    }
                }
            }
        }
        Self { step, ratios }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    pub fn ratios(&self) -> &[Ratio] {
        &self.ratios
    }

    pub fn contains(&self, ratio: &Ratio) -> bool {
        self.ratios.binary_search(ratio).is_ok()
    }

    /// Draw one ratio uniformly. Returns `None` only for an empty pool.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Ratio> {
        if self.ratios.is_empty() {
            return None;
        }
        Some(self.ratios[rng.gen_range(0..self.ratios.len())])
    }

    /// Draw a ratio different from `current`, when the pool has one.
    pub fn choose_other<R: Rng + ?Sized>(&self, rng: &mut R, current: &Ratio) -> Option<Ratio> {
        if self.ratios.len() < 2 {
            return self.choose(rng);
        }
        loop {
            let r = self.ratios[rng.gen_range(0..self.ratios.len())];
            if r != *current {
                return Some(r);
            }
        }
    }
}
