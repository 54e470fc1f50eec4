//! Random forest training: bootstrap sampling and tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{MAX_CLASSES, RandomForestConfig, TrainingMode};
use crate::error::RfError;
use crate::result::{TrainingMetadata, TrainingResult};
use crate::tree::{DecisionTree, TreeBuilder, TreeParams};

/// A fitted random forest ensemble.
///
/// Owns its trees; the training data is not retained.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

/// Draw `n_samples` indices from `0..n_samples` with replacement.
pub(crate) fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// The independent random stream of tree `tree_index` in parallel mode.
pub(crate) fn tree_rng(seed: u64, tree_index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(tree_index as u64);
    rng
}

/// Check shapes and labels; returns `(n_features, n_classes)`.
fn validate(
    config: &RandomForestConfig,
    features: &[Vec<i32>],
    labels: &[usize],
) -> Result<(usize, usize), RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    if features.len() != labels.len() {
        return Err(RfError::LabelCountMismatch {
            n_rows: features.len(),
            n_labels: labels.len(),
        });
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
    }

    let n_classes = match config.n_classes {
        Some(0) => return Err(RfError::InvalidClassCount),
        Some(n) => n,
        None => {
            let Some((sample_index, &max_label)) =
                labels.iter().enumerate().max_by_key(|&(_, &l)| l)
            else {
                return Err(RfError::EmptyDataset);
            };
            max_label.checked_add(1).ok_or(RfError::LabelOutOfRange {
                label: max_label,
                sample_index,
                n_classes: usize::MAX,
            })?
        }
    };
    if n_classes > MAX_CLASSES {
        return Err(RfError::TooManyClasses {
            n_classes,
            max: MAX_CLASSES,
        });
    }
    if let Some((sample_index, &label)) = labels
        .iter()
        .enumerate()
        .find(|&(_, &l)| l >= n_classes)
    {
        return Err(RfError::LabelOutOfRange {
            label,
            sample_index,
            n_classes,
        });
    }

    if config.min_leaf_size == 0 {
        return Err(RfError::InvalidMinLeafSize { min_leaf_size: 0 });
    }

    Ok((n_features, n_classes))
}

/// Train the random forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<i32>],
    labels: &[usize],
) -> Result<TrainingResult, RfError> {
    let (n_features, n_classes) = validate(config, features, labels)?;
    let features_per_split = config.features_per_split.resolve(n_features)?;
    let n_samples = features.len();

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        features_per_split,
        max_depth = config.max_depth,
        min_leaf_size = config.min_leaf_size,
        mode = ?config.training_mode,
        "training random forest"
    );

    // Column-major copy so each split sweep reads one contiguous column.
    let columns: Vec<Vec<i32>> = (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect();

    let builder = TreeBuilder::new(
        &columns,
        labels,
        n_classes,
        TreeParams {
            max_depth: config.max_depth,
            min_leaf_size: config.min_leaf_size,
            features_per_split,
        },
    );

    let built: Vec<(DecisionTree, Vec<usize>)> = match config.training_mode {
        TrainingMode::Sequential => {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            (0..config.n_trees)
                .map(|tree_index| {
                    // Bootstrap draw first, then the tree's feature draws.
                    let bootstrap = bootstrap_sample(n_samples, &mut rng);
                    let tree = builder.build(&bootstrap, &mut rng);
                    debug!(tree_index, n_nodes = tree.n_nodes(), "tree trained");
                    (tree, bootstrap)
                })
                .collect()
        }
        TrainingMode::Parallel => (0..config.n_trees)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = tree_rng(config.seed, tree_index);
                let bootstrap = bootstrap_sample(n_samples, &mut rng);
                let tree = builder.build(&bootstrap, &mut rng);
                debug!(tree_index, n_nodes = tree.n_nodes(), "tree trained");
                (tree, bootstrap)
            })
            .collect(),
    };

    let (trees, bootstrap_samples): (Vec<DecisionTree>, Vec<Vec<usize>>) =
        built.into_iter().unzip();

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
    };

    info!(
        node_count = forest.node_count(),
        average_leaf_depth = forest.average_leaf_depth(),
        "random forest training complete"
    );

    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_samples,
        n_features,
        n_classes,
        features_per_split,
        training_mode: config.training_mode,
    };

    Ok(TrainingResult::new(forest, bootstrap_samples, metadata))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{bootstrap_sample, tree_rng};
    use crate::config::{FeaturesPerSplit, MAX_CLASSES, RandomForestConfig, TrainingMode};
    use crate::error::RfError;

    /// Three well-separated classes along feature 0, plus a noise column.
    fn make_separable_data() -> (Vec<Vec<i32>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for class in 0..3 {
            for i in 0..20 {
                features.push(vec![class * 100 + i, (i * 7) % 5]);
                labels.push(class as usize);
            }
        }
        (features, labels)
    }

    fn accuracy(predictions: &[usize], labels: &[usize]) -> f64 {
        let correct = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
        correct as f64 / labels.len() as f64
    }

    #[test]
    fn three_class_separable_accuracy() {
        let (features, labels) = make_separable_data();
        let result = RandomForestConfig::new(20)
            .unwrap()
            .with_min_leaf_size(1)
            .with_features_per_split(FeaturesPerSplit::All)
            .fit(&features, &labels)
            .unwrap();
        let predictions = result.forest().predict_batch(&features).unwrap();
        assert!(accuracy(&predictions, &labels) > 0.95);
    }

    #[test]
    fn parallel_mode_three_class_accuracy() {
        let (features, labels) = make_separable_data();
        let result = RandomForestConfig::new(20)
            .unwrap()
            .with_min_leaf_size(1)
            .with_features_per_split(FeaturesPerSplit::All)
            .with_training_mode(TrainingMode::Parallel)
            .fit(&features, &labels)
            .unwrap();
        let predictions = result.forest().predict_batch(&features).unwrap();
        assert!(accuracy(&predictions, &labels) > 0.95);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels) = make_separable_data();
        for mode in [TrainingMode::Sequential, TrainingMode::Parallel] {
            let config = RandomForestConfig::new(8)
                .unwrap()
                .with_seed(99)
                .with_training_mode(mode);
            let first = config.fit(&features, &labels).unwrap();
            let second = config.fit(&features, &labels).unwrap();
            assert_eq!(first.forest(), second.forest(), "mode {mode:?}");
            assert_eq!(first.bootstrap_samples(), second.bootstrap_samples());
        }
    }

    #[test]
    fn bootstrap_samples_are_full_size_multisets() {
        let (features, labels) = make_separable_data();
        let result = RandomForestConfig::new(4).unwrap().fit(&features, &labels).unwrap();
        assert_eq!(result.bootstrap_samples().len(), 4);
        for sample in result.bootstrap_samples() {
            assert_eq!(sample.len(), features.len());
            assert!(sample.iter().all(|&i| i < features.len()));
        }
        // Every root saw the full bootstrap multiset.
        for tree in result.forest().trees() {
            assert_eq!(tree.nodes()[0].n_samples(), features.len());
        }
    }

    #[test]
    fn sequential_trees_share_one_stream() {
        // The second tree's bootstrap draw starts where the first tree's
        // feature draws ended, so it differs from a fresh stream's draw.
        let (features, labels) = make_separable_data();
        let result = RandomForestConfig::new(2)
            .unwrap()
            .with_seed(5)
            .fit(&features, &labels)
            .unwrap();
        let mut fresh = ChaCha8Rng::seed_from_u64(5);
        let first = bootstrap_sample(features.len(), &mut fresh);
        assert_eq!(result.bootstrap_samples()[0], first);
        assert_ne!(result.bootstrap_samples()[1], bootstrap_sample(features.len(), &mut fresh));
    }

    #[test]
    fn parallel_streams_are_keyed_by_tree_index() {
        let (features, labels) = make_separable_data();
        let result = RandomForestConfig::new(3)
            .unwrap()
            .with_seed(11)
            .with_training_mode(TrainingMode::Parallel)
            .fit(&features, &labels)
            .unwrap();
        for (tree_index, sample) in result.bootstrap_samples().iter().enumerate() {
            let mut rng = tree_rng(11, tree_index);
            assert_eq!(*sample, bootstrap_sample(features.len(), &mut rng));
        }
    }

    #[test]
    fn empty_dataset_error() {
        let err = RandomForestConfig::new(3).unwrap().fit(&[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn zero_width_rows_error() {
        let err = RandomForestConfig::new(3)
            .unwrap()
            .fit(&[vec![], vec![]], &[0, 1])
            .unwrap_err();
        assert!(matches!(err, RfError::ZeroFeatures));
    }

    #[test]
    fn ragged_rows_error() {
        let err = RandomForestConfig::new(3)
            .unwrap()
            .fit(&[vec![1, 2], vec![3]], &[0, 1])
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::FeatureCountMismatch { expected: 2, got: 1, sample_index: 1 }
        ));
    }

    #[test]
    fn label_count_mismatch_error() {
        let err = RandomForestConfig::new(3)
            .unwrap()
            .fit(&[vec![1], vec![2]], &[0])
            .unwrap_err();
        assert!(matches!(err, RfError::LabelCountMismatch { n_rows: 2, n_labels: 1 }));
    }

    #[test]
    fn label_out_of_range_error() {
        let err = RandomForestConfig::new(3)
            .unwrap()
            .with_n_classes(Some(2))
            .fit(&[vec![1], vec![2]], &[0, 2])
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::LabelOutOfRange { label: 2, sample_index: 1, n_classes: 2 }
        ));
    }

    #[test]
    fn zero_min_leaf_size_error() {
        let err = RandomForestConfig::new(3)
            .unwrap()
            .with_min_leaf_size(0)
            .fit(&[vec![1], vec![2]], &[0, 1])
            .unwrap_err();
        assert!(matches!(err, RfError::InvalidMinLeafSize { .. }));
    }

    #[test]
    fn largest_possible_label_is_rejected() {
        let err = RandomForestConfig::new(1)
            .unwrap()
            .fit(&[vec![1], vec![2]], &[0, usize::MAX])
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::LabelOutOfRange { label: usize::MAX, sample_index: 1, .. }
        ));
    }

    #[test]
    fn derived_class_count_above_cap_is_rejected() {
        let err = RandomForestConfig::new(1)
            .unwrap()
            .fit(&[vec![1]], &[MAX_CLASSES])
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::TooManyClasses { n_classes, max: MAX_CLASSES } if n_classes == MAX_CLASSES + 1
        ));
    }

    #[test]
    fn configured_class_count_above_cap_is_rejected() {
        let err = RandomForestConfig::new(1)
            .unwrap()
            .with_n_classes(Some(MAX_CLASSES + 1))
            .fit(&[vec![1]], &[0])
            .unwrap_err();
        assert!(matches!(err, RfError::TooManyClasses { .. }));
    }

    #[test]
    fn class_count_at_cap_is_accepted() {
        let result = RandomForestConfig::new(1)
            .unwrap()
            .fit(&[vec![1], vec![2]], &[0, MAX_CLASSES - 1])
            .unwrap();
        assert_eq!(result.forest().n_classes(), MAX_CLASSES);
    }

    #[test]
    fn configured_class_count_is_kept() {
        let result = RandomForestConfig::new(2)
            .unwrap()
            .with_n_classes(Some(10))
            .fit(&[vec![1], vec![2]], &[0, 1])
            .unwrap();
        assert_eq!(result.forest().n_classes(), 10);
        assert_eq!(result.metadata().n_classes, 10);
    }
}
