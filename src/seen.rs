//! Ordered, exact-equality set of discovered diversity pairs.
//!
//! Discovery order drives output order, so pairs live in an append-only `Vec`. Membership is
//! answered by an auxiliary hash set over the bit patterns of both components, which keeps the
//! check O(1) once the sweep has found thousands of pairs.

use std::collections::HashSet;

use crate::DiversityPair;

/// Hash key for exact equality. `-0.0` and `+0.0` compare equal under `==`, so both map to the
/// same key. `NaN` never reaches this type from the sweep.
fn exact_key(pair: &DiversityPair) -> (u64, u64) {
    ((pair.shannon + 0.0).to_bits(), (pair.simpson + 0.0).to_bits())
}

/// Every distinct [`DiversityPair`] seen so far, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct Discoveries {
    order: Vec<DiversityPair>,
    index: HashSet<(u64, u64)>,
}

impl Discoveries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `pair` if it has not been seen. Returns `true` on first sighting.
    pub fn insert(&mut self, pair: DiversityPair) -> bool {
        if !self.index.insert(exact_key(&pair)) {
            return false;
        }
        self.order.push(pair);
        true
    }

    #[must_use]
    pub fn contains(&self, pair: &DiversityPair) -> bool {
        self.index.contains(&exact_key(pair))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Pairs in discovery order.
    #[must_use]
    pub fn as_slice(&self) -> &[DiversityPair] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiversityPair> {
        self.order.iter()
    }
}
