//! Training result types.

use crate::config::TrainingMode;
use crate::forest::RandomForest;

/// Metadata about the training run.
#[derive(Debug, Clone)]
pub struct TrainingMetadata {
    /// Number of trees trained.
    pub n_trees: usize,
    /// Number of training samples.
    pub n_samples: usize,
    /// Number of features per sample.
    pub n_features: usize,
    /// Number of classes.
    pub n_classes: usize,
    /// Resolved number of features examined per split.
    pub features_per_split: usize,
    /// How the trees were seeded and scheduled.
    pub training_mode: TrainingMode,
}

/// Result of random forest training.
///
/// Holds the fitted forest alongside the bootstrap multiset each tree was
/// grown from (`bootstrap_samples()[t]` belongs to `forest().trees()[t]`).
#[derive(Debug)]
pub struct TrainingResult {
    forest: RandomForest,
    bootstrap_samples: Vec<Vec<usize>>,
    metadata: TrainingMetadata,
}

impl TrainingResult {
    pub(crate) fn new(
        forest: RandomForest,
        bootstrap_samples: Vec<Vec<usize>>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            bootstrap_samples,
            metadata,
        }
    }

    /// Borrow the fitted forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Consume the result and return the fitted forest.
    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Return the bootstrap sample indices of every tree, in tree order.
    #[must_use]
    pub fn bootstrap_samples(&self) -> &[Vec<usize>] {
        &self.bootstrap_samples
    }

    /// Return training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
