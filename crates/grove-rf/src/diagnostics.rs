//! Tree-shape statistics: node counts and leaf depths.

use crate::forest::RandomForest;
use crate::node::{Node, NodeIndex};
use crate::tree::DecisionTree;

/// Shape summary of a fitted forest.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ForestShape {
    /// Number of trees.
    pub n_trees: usize,
    /// Total nodes (splits and leaves) across all trees.
    pub node_count: usize,
    /// Total leaves across all trees.
    pub leaf_count: usize,
    /// Mean depth of all leaves across all trees (root is depth 0).
    pub average_leaf_depth: f64,
    /// Deepest leaf in any tree.
    pub max_depth: usize,
}

impl DecisionTree {
    /// Depth of every leaf, in depth-first order. The root is depth 0.
    fn leaf_depths(&self) -> Vec<usize> {
        let mut depths = Vec::new();
        if self.nodes.is_empty() {
            return depths;
        }
        let mut stack = vec![(NodeIndex::ROOT, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match &self.nodes[idx.index()] {
                Node::Leaf { .. } => depths.push(depth),
                Node::Split { left, right, .. } => {
                    stack.push((*right, depth + 1));
                    stack.push((*left, depth + 1));
                }
            }
        }
        depths
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the depth of the deepest leaf; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.leaf_depths().into_iter().max().unwrap_or(0)
    }

    /// Return the sum of all leaf depths.
    #[must_use]
    pub fn leaf_depth_sum(&self) -> usize {
        self.leaf_depths().into_iter().sum()
    }
}

impl RandomForest {
    /// Total number of nodes across all trees.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }

    /// Mean leaf depth over every leaf of every tree; 0.0 without leaves.
    #[must_use]
    pub fn average_leaf_depth(&self) -> f64 {
        let (depth_sum, leaves) = self.trees.iter().fold((0usize, 0usize), |(sum, n), tree| {
            (sum + tree.leaf_depth_sum(), n + tree.n_leaves())
        });
        if leaves == 0 {
            0.0
        } else {
            depth_sum as f64 / leaves as f64
        }
    }

    /// Summarize the forest's shape.
    #[must_use]
    pub fn shape(&self) -> ForestShape {
        ForestShape {
            n_trees: self.trees.len(),
            node_count: self.node_count(),
            leaf_count: self.trees.iter().map(DecisionTree::n_leaves).sum(),
            average_leaf_depth: self.average_leaf_depth(),
            max_depth: self.trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
        }
    }
}
