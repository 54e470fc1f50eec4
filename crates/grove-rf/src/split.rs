use rand::Rng;

use crate::counts::ClassCounts;
use crate::node::FeatureIndex;

/// Minimum impurity reduction for a split to be accepted.
///
/// Gains at or below this are floating-point noise, not structure.
pub const MIN_GAIN: f64 = 1e-7;

/// The winning split for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SplitResult {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Midpoint between the two distinct adjacent values.
    pub(crate) threshold: f64,
    /// `parent - (n_left/n)·gini_left - (n_right/n)·gini_right`.
    pub(crate) gain: f64,
}

/// One boundary of a sorted sweep where the feature value changes.
pub(crate) struct Boundary<'a> {
    /// Largest value on the left side.
    pub(crate) below: i32,
    /// Smallest value on the right side.
    pub(crate) above: i32,
    /// Class counts of the samples at or below the boundary.
    pub(crate) left: &'a ClassCounts,
    /// Class counts of the samples above the boundary.
    pub(crate) right: &'a ClassCounts,
}

impl Boundary<'_> {
    pub(crate) fn threshold(&self) -> f64 {
        (f64::from(self.below) + f64::from(self.above)) / 2.0
    }

    pub(crate) fn gain(&self, parent_impurity: f64) -> f64 {
        let n = (self.left.total() + self.right.total()) as f64;
        parent_impurity
            - (self.left.total() as f64 / n) * self.left.fast_gini()
            - (self.right.total() as f64 / n) * self.right.fast_gini()
    }
}

/// Draw `k` distinct feature indices uniformly from `0..n_features`.
///
/// Partial Fisher-Yates: only the first `k` positions are shuffled, so the
/// number of random draws is exactly `k`.
pub(crate) fn sample_features(n_features: usize, k: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    let take = k.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
    }
    order.truncate(take);
    order
}

/// Sort the node's samples by one feature and visit every value boundary.
///
/// `sorted` is scratch space reused across features. Samples with equal
/// values keep their index order, and no boundary is reported between them.
/// A constant column produces no visits.
pub(crate) fn sweep_feature(
    column: &[i32],
    labels: &[usize],
    sample_indices: &[usize],
    parent: &ClassCounts,
    sorted: &mut Vec<(i32, usize)>,
    mut visit: impl FnMut(&Boundary<'_>),
) {
    sorted.clear();
    sorted.extend(sample_indices.iter().map(|&si| (column[si], si)));
    sorted.sort_by_key(|&(value, _)| value);

    let (Some(&(first, _)), Some(&(last, _))) = (sorted.first(), sorted.last()) else {
        return;
    };
    if first == last {
        return;
    }

    let mut left = ClassCounts::new(parent.n_classes());
    let mut right = parent.clone();

    for pair in sorted.windows(2) {
        let (value, si) = pair[0];
        let next = pair[1].0;
        let class = labels[si];
        left.add(class);
        right.remove(class);

        if value == next {
            continue;
        }
        visit(&Boundary {
            below: value,
            above: next,
            left: &left,
            right: &right,
        });
    }
}

/// Find the best split of a node among `features_per_split` randomly drawn features.
///
/// `columns` is column-major: `columns[feature][sample]`. The feature subset
/// is drawn fresh from `rng` on every call. A candidate replaces the current
/// best only on strictly greater gain, so the first candidate found wins ties
/// in draw order, then in ascending threshold order.
///
/// Returns `None` when no candidate gains more than [`MIN_GAIN`].
pub(crate) fn find_best_split(
    columns: &[Vec<i32>],
    labels: &[usize],
    sample_indices: &[usize],
    parent: &ClassCounts,
    features_per_split: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    if sample_indices.len() < 2 || columns.is_empty() {
        return None;
    }
    let parent_impurity = parent.gini().value();
    let selected = sample_features(columns.len(), features_per_split, rng);

    let mut sorted = Vec::with_capacity(sample_indices.len());
    let mut best_gain = 0.0;
    let mut best: Option<SplitResult> = None;

    for feature in selected {
        sweep_feature(
            &columns[feature],
            labels,
            sample_indices,
            parent,
            &mut sorted,
            |boundary| {
                let gain = boundary.gain(parent_impurity);
                if gain > best_gain {
                    best_gain = gain;
                    best = Some(SplitResult {
                        feature: FeatureIndex::new(feature),
                        threshold: boundary.threshold(),
                        gain,
                    });
                }
            },
        );
    }

    best.filter(|split| split.gain > MIN_GAIN)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{find_best_split, sample_features, sweep_feature};
    use crate::counts::ClassCounts;

    fn columns_of(rows: &[Vec<i32>]) -> Vec<Vec<i32>> {
        (0..rows[0].len())
            .map(|f| rows.iter().map(|r| r[f]).collect())
            .collect()
    }

    #[test]
    fn perfect_separator_wins_with_full_parent_gain() {
        let rows = vec![vec![0, 5], vec![0, 8], vec![1, 5], vec![1, 9]];
        let labels = vec![0, 0, 1, 1];
        let indices: Vec<usize> = (0..4).collect();
        let parent = ClassCounts::from_indices(&labels, &indices, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let split = find_best_split(&columns_of(&rows), &labels, &indices, &parent, 2, &mut rng)
            .expect("feature 0 separates the classes");
        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 0.5).abs() < f64::EPSILON);
        assert!((split.gain - 0.5).abs() < 1e-12);
    }

    #[test]
    fn constant_features_yield_no_split() {
        let columns = vec![vec![5, 5, 5, 5], vec![2, 2, 2, 2]];
        let labels = vec![0, 0, 1, 1];
        let indices: Vec<usize> = (0..4).collect();
        let parent = ClassCounts::from_indices(&labels, &indices, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        assert!(find_best_split(&columns, &labels, &indices, &parent, 2, &mut rng).is_none());
    }

    #[test]
    fn uninformative_feature_yields_no_split() {
        // Each value holds one sample of each class: every boundary has zero gain.
        let columns = vec![vec![1, 1, 2, 2]];
        let labels = vec![0, 1, 0, 1];
        let indices: Vec<usize> = (0..4).collect();
        let parent = ClassCounts::from_indices(&labels, &indices, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        assert!(find_best_split(&columns, &labels, &indices, &parent, 1, &mut rng).is_none());
    }

    #[test]
    fn equal_gain_keeps_first_feature_drawn() {
        // Features 0 and 1 are identical perfect separators; whichever is
        // drawn first must win.
        let columns = vec![vec![0, 0, 1, 1], vec![0, 0, 1, 1]];
        let labels = vec![0, 0, 1, 1];
        let indices: Vec<usize> = (0..4).collect();
        let parent = ClassCounts::from_indices(&labels, &indices, 2);

        for seed in 0..16 {
            let mut draw_rng = ChaCha8Rng::seed_from_u64(seed);
            let first_drawn = sample_features(2, 2, &mut draw_rng)[0];

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let split =
                find_best_split(&columns, &labels, &indices, &parent, 2, &mut rng).unwrap();
            assert_eq!(split.feature.index(), first_drawn, "seed {seed}");
        }
    }

    #[test]
    fn equal_gain_keeps_lowest_threshold() {
        // Boundaries at 0.5 and 1.5 give the same gain; the first in sorted
        // order is kept.
        let columns = vec![vec![0, 1, 2]];
        let labels = vec![0, 1, 0];
        let indices: Vec<usize> = (0..3).collect();
        let parent = ClassCounts::from_indices(&labels, &indices, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let split = find_best_split(&columns, &labels, &indices, &parent, 1, &mut rng).unwrap();
        assert!((split.threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn sweep_skips_repeated_values() {
        let column = vec![3, 3, 3, 7, 7, 9];
        let labels = vec![0, 1, 0, 1, 1, 0];
        let indices: Vec<usize> = (0..6).collect();
        let parent = ClassCounts::from_indices(&labels, &indices, 2);
        let mut sorted = Vec::new();
        let mut thresholds = Vec::new();

        sweep_feature(&column, &labels, &indices, &parent, &mut sorted, |b| {
            thresholds.push(b.threshold());
        });
        assert_eq!(thresholds, vec![5.0, 8.0]);
    }

    #[test]
    fn sweep_counts_duplicated_bootstrap_indices() {
        let column = vec![1, 2];
        let labels = vec![0, 1];
        let indices = vec![0, 0, 0, 1];
        let parent = ClassCounts::from_indices(&labels, &indices, 2);
        let mut sorted = Vec::new();
        let mut seen = Vec::new();

        sweep_feature(&column, &labels, &indices, &parent, &mut sorted, |b| {
            seen.push((b.left.as_slice().to_vec(), b.right.as_slice().to_vec()));
        });
        assert_eq!(seen, vec![(vec![3, 0], vec![0, 1])]);
    }

    #[test]
    fn sample_features_draws_distinct_indices() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut drawn = sample_features(50, 12, &mut rng);
        assert_eq!(drawn.len(), 12);
        drawn.sort_unstable();
        drawn.dedup();
        assert_eq!(drawn.len(), 12);
        assert!(drawn.iter().all(|&f| f < 50));
    }

    #[test]
    fn single_sample_has_no_split() {
        let columns = vec![vec![1, 2]];
        let labels = vec![0, 1];
        let parent = ClassCounts::from_indices(&labels, &[1], 2);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(find_best_split(&columns, &labels, &[1], &parent, 1, &mut rng).is_none());
    }

    proptest::proptest! {
        #[test]
        fn sweep_conserves_counts_and_skips_ties(
            rows in proptest::collection::vec((0i32..6, 0usize..4), 2..40),
        ) {
            let column: Vec<i32> = rows.iter().map(|r| r.0).collect();
            let labels: Vec<usize> = rows.iter().map(|r| r.1).collect();
            let indices: Vec<usize> = (0..rows.len()).collect();
            let parent = ClassCounts::from_indices(&labels, &indices, 4);
            let mut sorted = Vec::new();
            let mut n_boundaries = 0;

            sweep_feature(&column, &labels, &indices, &parent, &mut sorted, |b| {
                n_boundaries += 1;
                for class in 0..4 {
                    assert_eq!(
                        b.left.as_slice()[class] + b.right.as_slice()[class],
                        parent.as_slice()[class]
                    );
                }
                assert!(b.below < b.above);
                let threshold = b.threshold();
                assert!(column.iter().all(|&v| {
                    let v = f64::from(v);
                    v < threshold || v > threshold
                }));
                let n_left = column.iter().filter(|&&v| f64::from(v) <= threshold).count();
                assert_eq!(n_left, b.left.total());
            });

            let mut distinct = column.clone();
            distinct.sort_unstable();
            distinct.dedup();
            proptest::prop_assert_eq!(n_boundaries, distinct.len() - 1);
        }
    }
}
