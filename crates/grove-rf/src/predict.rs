//! Majority-vote prediction for the forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::counts::first_argmax;
use crate::error::RfError;
use crate::forest::RandomForest;
use crate::tree::DecisionTree;

impl RandomForest {
    /// Predict the class label for a single sample.
    ///
    /// Every tree votes for the label of the leaf the sample reaches; the
    /// class with the most votes wins, the lowest class id on ties.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyForest`] | the forest holds no trees |
    /// | [`RfError::PredictionFeatureMismatch`] | `sample.len() != n_features` |
    pub fn predict(&self, sample: &[i32]) -> Result<usize, RfError> {
        Ok(first_argmax(&self.votes(sample)?))
    }

    /// Return the per-class vote counts for a single sample.
    ///
    /// The returned `Vec` has length `n_classes` and sums to `n_trees`.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::predict`].
    pub fn votes(&self, sample: &[i32]) -> Result<Vec<usize>, RfError> {
        if self.trees.is_empty() {
            return Err(RfError::EmptyForest);
        }
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.leaf_label(sample)] += 1;
        }
        Ok(votes)
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first error [`RandomForest::predict`] reports for any sample.
    pub fn predict_batch(&self, features: &[Vec<i32>]) -> Result<Vec<usize>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the trees in training order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RfError;
    use crate::forest::RandomForest;
    use crate::node::{Impurity, Node};
    use crate::tree::DecisionTree;

    fn constant_tree(label: usize) -> DecisionTree {
        DecisionTree {
            nodes: vec![Node::Leaf {
                label,
                impurity: Impurity::PURE,
                n_samples: 1,
            }],
            n_features: 1,
            n_classes: 10,
        }
    }

    fn forest_of(labels: &[usize]) -> RandomForest {
        RandomForest {
            trees: labels.iter().map(|&l| constant_tree(l)).collect(),
            n_features: 1,
            n_classes: 10,
        }
    }

    #[test]
    fn majority_wins() {
        let forest = forest_of(&[4, 9, 4]);
        assert_eq!(forest.predict(&[0]).unwrap(), 4);
        let votes = forest.votes(&[0]).unwrap();
        assert_eq!(votes[4], 2);
        assert_eq!(votes[9], 1);
        assert_eq!(votes.iter().sum::<usize>(), 3);
    }

    #[test]
    fn vote_tie_resolves_to_lowest_class() {
        let forest = forest_of(&[7, 3, 7, 3]);
        assert_eq!(forest.predict(&[0]).unwrap(), 3);
    }

    #[test]
    fn empty_forest_fails_loudly() {
        let forest = forest_of(&[]);
        assert!(matches!(forest.predict(&[0]), Err(RfError::EmptyForest)));
    }

    #[test]
    fn wrong_width_rejected() {
        let forest = forest_of(&[1]);
        assert!(matches!(
            forest.predict(&[0, 0]),
            Err(RfError::PredictionFeatureMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn batch_matches_individual() {
        let forest = forest_of(&[2, 2, 5]);
        let samples = vec![vec![1], vec![-3], vec![255]];
        let batch = forest.predict_batch(&samples).unwrap();
        for (sample, predicted) in samples.iter().zip(batch) {
            assert_eq!(forest.predict(sample).unwrap(), predicted);
        }
    }
}
