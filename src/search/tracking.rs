//! Run bookkeeping: stagnation counter and the two uniqueness sets.

use std::collections::HashSet;

use crate::types::{Candidate, CanonicalKey};

/// Counts generations without a strictly better best score.
#[derive(Debug, Clone)]
pub struct StagnationTracker {
    best: f64,
    stale: usize,
    threshold: usize,
}

impl StagnationTracker {
    pub fn new(threshold: usize) -> Self {
        Self {
            best: f64::INFINITY,
            stale: 0,
            threshold,
        }
    }

    /// Record this generation's best score. Returns true on improvement.
    pub fn observe(&mut self, score: f64) -> bool {
        if score < self.best {
            self.best = score;
            self.stale = 0;
            true
        } else {
            self.stale += 1;
            false
        }
    }

    /// True once the stale count exceeds the threshold; the count restarts.
    pub fn take_injection(&mut self) -> bool {
        if self.stale > self.threshold {
            self.stale = 0;
            true
        } else {
            false
        }
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn stale(&self) -> usize {
        self.stale
    }
}

/// Canonical keys handed out by random initialisation in the current run.
#[derive(Debug, Default)]
pub struct InitUniqueness {
    seen: HashSet<CanonicalKey>,
}

impl InitUniqueness {
    /// Register a candidate; false if an equivalent one was already issued.
    pub fn insert(&mut self, candidate: &Candidate) -> bool {
        self.seen.insert(candidate.canonical_key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Distinct best-of-generation candidates in discovery order.
///
/// The first candidate seen for a canonical key is kept as its
/// representative, so reported materials stay paired with their own
/// percentages.
#[derive(Debug, Default)]
pub struct UniqueBlends {
    keys: HashSet<CanonicalKey>,
    blends: Vec<Candidate>,
}

impl UniqueBlends {
    pub fn record(&mut self, candidate: Candidate) -> bool {
        let fresh = self.keys.insert(candidate.canonical_key());
        if fresh {
            self.blends.push(candidate);
        }
        fresh
    }

    pub fn len(&self) -> usize {
        self.blends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blends.is_empty()
    }

    pub fn blends(&self) -> &[Candidate] {
        &self.blends
    }
}
