use rand::Rng;
use tracing::trace;

use crate::{
    RfError,
    counts::ClassCounts,
    node::{Impurity, Node, NodeIndex},
    split::find_best_split,
};

/// Stopping rules and feature subsampling shared by every tree of a forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TreeParams {
    /// Nodes at this depth become leaves. The root is depth 0.
    pub(crate) max_depth: usize,
    /// Nodes holding this many samples or fewer become leaves.
    pub(crate) min_leaf_size: usize,
    /// Features examined per node, drawn without replacement.
    pub(crate) features_per_split: usize,
}

/// Grows one tree from a multiset of sample indices.
///
/// Borrows the column-major training matrix and the label vector; neither is
/// copied or modified, bootstrap duplicates are represented by repeated
/// indices.
pub(crate) struct TreeBuilder<'a> {
    columns: &'a [Vec<i32>],
    labels: &'a [usize],
    n_classes: usize,
    params: TreeParams,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(
        columns: &'a [Vec<i32>],
        labels: &'a [usize],
        n_classes: usize,
        params: TreeParams,
    ) -> Self {
        Self {
            columns,
            labels,
            n_classes,
            params,
        }
    }

    /// Build a tree on `sample_indices`, drawing feature subsets from `rng`.
    pub(crate) fn build(&self, sample_indices: &[usize], rng: &mut impl Rng) -> DecisionTree {
        let mut arena = Vec::new();
        let root = self.grow(sample_indices, 0, rng, &mut arena);
        debug_assert_eq!(root, NodeIndex::ROOT);
        trace!(n_nodes = arena.len(), "tree built");
        DecisionTree {
            nodes: arena,
            n_features: self.columns.len(),
            n_classes: self.n_classes,
        }
    }

    /// Grow the subtree for `sample_indices` and return its arena index.
    ///
    /// Recursion depth is bounded by `max_depth`.
    fn grow(
        &self,
        sample_indices: &[usize],
        depth: usize,
        rng: &mut impl Rng,
        arena: &mut Vec<Node>,
    ) -> NodeIndex {
        let n_samples = sample_indices.len();
        let counts = ClassCounts::from_indices(self.labels, sample_indices, self.n_classes);
        let impurity = counts.gini();

        let leaf = |arena: &mut Vec<Node>| -> NodeIndex {
            let idx = arena.len();
            arena.push(Node::Leaf {
                // Majority class, or 0 when no sample reached this node.
                label: counts.majority(),
                impurity,
                n_samples,
            });
            NodeIndex::new(idx)
        };

        if n_samples == 0 {
            // Unreachable through the stopping rules; a split always leaves
            // samples on both sides.
            return leaf(arena);
        }
        if counts.is_pure()
            || depth >= self.params.max_depth
            || n_samples <= self.params.min_leaf_size
        {
            return leaf(arena);
        }

        let Some(split) = find_best_split(
            self.columns,
            self.labels,
            sample_indices,
            &counts,
            self.params.features_per_split,
            rng,
        ) else {
            return leaf(arena);
        };

        let column = &self.columns[split.feature.index()];
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
            .iter()
            .partition(|&&si| f64::from(column[si]) <= split.threshold);

        // Reserve this node's slot so the root stays at index 0, then
        // overwrite it once both children exist.
        let node_idx = arena.len();
        arena.push(Node::Leaf {
            label: 0,
            impurity,
            n_samples,
        });

        let left = self.grow(&left_indices, depth + 1, rng, arena);
        let right = self.grow(&right_indices, depth + 1, rng, arena);

        arena[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity,
            n_samples,
            gain: split.gain,
        };

        NodeIndex::new(node_idx)
    }
}

/// A fitted decision tree.
///
/// Stored as an arena `Vec<Node>` with the root at index 0.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the class label for a single sample.
    ///
    /// Traverses from the root: at each split, goes left when
    /// `sample[feature] <= threshold`, right otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[i32]) -> Result<usize, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(self.leaf_label(sample))
    }

    /// Label of the leaf `sample` lands in. The width must already be checked.
    pub(crate) fn leaf_label(&self, sample: &[i32]) -> usize {
        let mut idx = NodeIndex::ROOT.index();
        loop {
            match &self.nodes[idx] {
                Node::Leaf { label, .. } => return *label,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if f64::from(sample[feature.index()]) <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// The node arena; index 0 is the root.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of features this tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of classes this tree was trained on.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Impurity at the root node.
    #[must_use]
    pub fn root_impurity(&self) -> Impurity {
        self.nodes
            .first()
            .map_or(Impurity::PURE, Node::impurity)
    }
}
