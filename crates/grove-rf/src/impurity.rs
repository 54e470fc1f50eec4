//! Gini impurity.

use crate::node::Impurity;

/// Compute the Gini impurity `1 - Σ(count_c / n)²` of a class-count vector.
///
/// `n_samples` must equal the sum of `class_counts` and be at least 1;
/// callers check for empty sets before asking for their impurity.
#[must_use]
pub fn gini(class_counts: &[usize], n_samples: usize) -> Impurity {
    debug_assert!(n_samples > 0, "gini of an empty sample set");
    let n = n_samples as f64;
    let sum_sq: f64 = class_counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    Impurity::new(1.0 - sum_sq)
}

/// Gini impurity from a precomputed sum of squared class counts.
///
/// `1 - Σcount² / n²`, which lets the split sweep update a side's impurity in
/// constant time as samples cross the boundary.
#[must_use]
pub(crate) fn gini_from_sum_sq(sum_sq: u64, n_samples: usize) -> f64 {
    debug_assert!(n_samples > 0, "gini of an empty sample set");
    let n = n_samples as f64;
    1.0 - sum_sq as f64 / (n * n)
}

#[cfg(test)]
mod tests {
    use super::{gini, gini_from_sum_sq};

    #[test]
    fn gini_pure() {
        assert_eq!(gini(&[10, 0, 0], 10).value(), 0.0);
        assert_eq!(gini(&[0, 0, 1], 1).value(), 0.0);
    }

    #[test]
    fn gini_binary_balanced() {
        assert!((gini(&[5, 5], 10).value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn gini_ten_class_uniform_hits_upper_bound() {
        let imp = gini(&[3; 10], 30).value();
        assert!((imp - 0.9).abs() < 1e-12);
    }

    #[test]
    fn gini_from_sum_sq_matches_direct() {
        let counts = [4usize, 1, 7, 0, 2];
        let n: usize = counts.iter().sum();
        let sum_sq: u64 = counts.iter().map(|&c| (c * c) as u64).sum();
        let direct = gini(&counts, n).value();
        assert!((gini_from_sum_sq(sum_sq, n) - direct).abs() < 1e-12);
    }
}
