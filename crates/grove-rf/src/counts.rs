//! Per-class sample counts for a node's sample set.

use crate::impurity::{gini, gini_from_sum_sq};
use crate::node::Impurity;

/// Class-count vector of a multiset of samples.
///
/// Tracks the total and the sum of squared counts alongside the counts, so
/// moving one sample between two `ClassCounts` keeps both impurities
/// available in O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCounts {
    counts: Vec<usize>,
    total: usize,
    sum_sq: u64,
}

impl ClassCounts {
    /// Create an all-zero count vector for `n_classes` classes.
    #[must_use]
    pub fn new(n_classes: usize) -> Self {
        Self {
            counts: vec![0; n_classes],
            total: 0,
            sum_sq: 0,
        }
    }

    /// Count the labels of the samples named by `indices`.
    ///
    /// Duplicate indices are counted once per occurrence.
    #[must_use]
    pub fn from_indices(labels: &[usize], indices: &[usize], n_classes: usize) -> Self {
        let mut counts = Self::new(n_classes);
        for &i in indices {
            counts.add(labels[i]);
        }
        counts
    }

    /// Add one sample of `class`.
    pub fn add(&mut self, class: usize) {
        let c = self.counts[class];
        // (c + 1)² - c² = 2c + 1
        self.sum_sq += 2 * c as u64 + 1;
        self.counts[class] = c + 1;
        self.total += 1;
    }

    /// Remove one sample of `class`. The class must currently be non-zero.
    pub fn remove(&mut self, class: usize) {
        let c = self.counts[class];
        debug_assert!(c > 0, "removing class {class} from an empty bucket");
        // c² - (c - 1)² = 2c - 1
        self.sum_sq -= 2 * c as u64 - 1;
        self.counts[class] = c - 1;
        self.total -= 1;
    }

    /// Total number of samples counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of classes tracked.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    /// The raw per-class counts.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }

    /// `true` when every counted sample has the same class (or none were counted).
    #[must_use]
    pub fn is_pure(&self) -> bool {
        self.counts.iter().all(|&c| c == 0 || c == self.total)
    }

    /// The class with the highest count; the lowest class id wins ties.
    ///
    /// Returns 0 for an empty set.
    #[must_use]
    pub fn majority(&self) -> usize {
        first_argmax(&self.counts)
    }

    /// Gini impurity of the counted samples; [`Impurity::PURE`] when empty.
    #[must_use]
    pub fn gini(&self) -> Impurity {
        if self.total == 0 {
            return Impurity::PURE;
        }
        gini(&self.counts, self.total)
    }

    /// Gini impurity via the running sum of squares. Requires a non-empty set.
    #[must_use]
    pub(crate) fn fast_gini(&self) -> f64 {
        gini_from_sum_sq(self.sum_sq, self.total)
    }
}

/// Index of the first maximal element, 0 for an empty slice.
#[must_use]
pub(crate) fn first_argmax(values: &[usize]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
