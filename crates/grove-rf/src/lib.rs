//! Random forest classification over fixed-width integer feature vectors.
//!
//! Trees are grown by greedy Gini-minimizing binary splits, examining a fresh
//! random subset of features at every node, each on its own bootstrap
//! resample of the training set. The forest predicts by majority vote.
//! Training is reproducible from a single seed, sequentially or with one
//! rayon task per tree.

mod config;
mod confusion;
mod counts;
mod diagnostics;
mod error;
mod forest;
mod impurity;
mod node;
mod predict;
mod result;
mod serialize;
mod split;
mod tree;

pub use config::{FeaturesPerSplit, MAX_CLASSES, RandomForestConfig, TrainingMode};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use counts::ClassCounts;
pub use diagnostics::ForestShape;
pub use error::RfError;
pub use forest::RandomForest;
pub use impurity::gini;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use result::{TrainingMetadata, TrainingResult};
pub use split::MIN_GAIN;
pub use tree::DecisionTree;
