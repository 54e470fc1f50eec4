//! Configuration builder for random forest training.

use crate::error::RfError;
use crate::result::TrainingResult;

/// Largest class count a forest may vote over.
///
/// Every node allocates one counter per class.
pub const MAX_CLASSES: usize = 1 << 16;

/// How many features each node examines when searching for a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeaturesPerSplit {
    /// `floor(sqrt(n_features))`, at least 1.
    Sqrt,
    /// A fixed count in `[1, n_features]`.
    Fixed(usize),
    /// Every feature (no subsampling).
    All,
}

impl FeaturesPerSplit {
    /// Resolve to a concrete count for a dataset with `n_features` columns.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidFeaturesPerSplit`] when the count is 0 or
    /// exceeds `n_features`.
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let resolved = match self {
            FeaturesPerSplit::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
            FeaturesPerSplit::Fixed(k) => k,
            FeaturesPerSplit::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(RfError::InvalidFeaturesPerSplit {
                features_per_split: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// How the trees of a forest draw their randomness and where they are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingMode {
    /// One random stream shared by all trees, built one after another.
    ///
    /// Each tree consumes its bootstrap draw and then its per-node feature
    /// draws before the next tree starts, so the forest depends on tree order.
    Sequential,
    /// One random stream per tree, keyed by `(seed, tree_index)`; trees are
    /// built in parallel with rayon.
    ///
    /// Reproducible for a fixed seed and tree count, but not identical to
    /// [`TrainingMode::Sequential`].
    Parallel,
}

/// Configuration for random forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default      |
/// |----------------------|--------------|
/// | `max_depth`          | 12           |
/// | `min_leaf_size`      | 5            |
/// | `features_per_split` | `Sqrt`       |
/// | `seed`               | 42           |
/// | `n_classes`          | `None` (max label + 1) |
/// | `training_mode`      | `Sequential` |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_depth: usize,
    pub(crate) min_leaf_size: usize,
    pub(crate) features_per_split: FeaturesPerSplit,
    pub(crate) seed: u64,
    pub(crate) n_classes: Option<usize>,
    pub(crate) training_mode: TrainingMode,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_depth: 12,
            min_leaf_size: 5,
            features_per_split: FeaturesPerSplit::Sqrt,
            seed: 42,
            n_classes: None,
            training_mode: TrainingMode::Sequential,
        })
    }

    // --- Setters ---

    /// Set the maximum tree depth. The root is depth 0, so `0` grows stumps
    /// with no splits at all.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the leaf size: nodes with this many samples or fewer are not split.
    #[must_use]
    pub fn with_min_leaf_size(mut self, min_leaf_size: usize) -> Self {
        self.min_leaf_size = min_leaf_size;
        self
    }

    /// Set the number of features examined per split.
    #[must_use]
    pub fn with_features_per_split(mut self, features_per_split: FeaturesPerSplit) -> Self {
        self.features_per_split = features_per_split;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fix the number of classes. `None` derives it from the largest label.
    #[must_use]
    pub fn with_n_classes(mut self, n_classes: Option<usize>) -> Self {
        self.n_classes = n_classes;
        self
    }

    /// Set how trees are scheduled and seeded.
    #[must_use]
    pub fn with_training_mode(mut self, training_mode: TrainingMode) -> Self {
        self.training_mode = training_mode;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the leaf size.
    #[must_use]
    pub fn min_leaf_size(&self) -> usize {
        self.min_leaf_size
    }

    /// Return the features-per-split strategy.
    #[must_use]
    pub fn features_per_split(&self) -> FeaturesPerSplit {
        self.features_per_split
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the configured class count, if fixed.
    #[must_use]
    pub fn n_classes(&self) -> Option<usize> {
        self.n_classes
    }

    /// Return the training mode.
    #[must_use]
    pub fn training_mode(&self) -> TrainingMode {
        self.training_mode
    }

    /// Train a random forest on the provided dataset.
    ///
    /// `features[sample_idx][feature_idx]` is row-major; `labels[sample_idx]`
    /// is the zero-based class of each row. Both are only borrowed.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                             |
    /// |--------------------------------------|--------------------------------------------------|
    /// | [`RfError::EmptyDataset`]            | `features` is empty                              |
    /// | [`RfError::ZeroFeatures`]            | rows have zero feature columns                   |
    /// | [`RfError::LabelCountMismatch`]      | `features` and `labels` differ in length         |
    /// | [`RfError::FeatureCountMismatch`]    | rows have inconsistent lengths                   |
    /// | [`RfError::InvalidClassCount`]       | `n_classes` is `Some(0)`                         |
    /// | [`RfError::TooManyClasses`]          | the class count exceeds [`MAX_CLASSES`]          |
    /// | [`RfError::LabelOutOfRange`]         | a label is `>= n_classes` or is `usize::MAX`     |
    /// | [`RfError::InvalidMinLeafSize`]      | `min_leaf_size` is zero                          |
    /// | [`RfError::InvalidFeaturesPerSplit`] | the count resolves outside `[1, n_features]`     |
    pub fn fit(&self, features: &[Vec<i32>], labels: &[usize]) -> Result<TrainingResult, RfError> {
        crate::forest::train(self, features, labels)
    }
}
