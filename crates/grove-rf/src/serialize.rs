//! Model persistence via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::config::MAX_CLASSES;
use crate::error::RfError;
use crate::forest::RandomForest;
use crate::node::Node;
use crate::tree::DecisionTree;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    forest: RandomForest,
}

impl RandomForest {
    /// Save the model to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | file write failed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            forest: self.clone(),
        };

        let bytes =
            bincode::serialize(&envelope).map_err(|e| RfError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| RfError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(size_bytes = bytes.len(), n_trees = self.trees.len(), "model saved");
        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file read failed |
    /// | [`RfError::DeserializeModel`] | bincode decoding failed |
    /// | [`RfError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`RfError::CorruptModel`] | the decoded trees are not well-formed arenas |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| RfError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| RfError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        check_forest(&envelope.forest).map_err(|reason| RfError::CorruptModel {
            path: path.to_path_buf(),
            reason,
        })?;

        debug!(
            n_trees = envelope.forest.trees.len(),
            n_features = envelope.forest.n_features,
            n_classes = envelope.forest.n_classes,
            "model loaded"
        );
        Ok(envelope.forest)
    }
}

/// Structural checks that prediction and diagnostics rely on.
///
/// Leaf labels must index the vote array, split features must index a
/// sample, and children must sit strictly after their parent in the arena.
/// The last rule holds for every tree the builder grows and makes every
/// traversal terminate.
fn check_forest(forest: &RandomForest) -> Result<(), String> {
    if forest.n_classes == 0 || forest.n_classes > MAX_CLASSES {
        return Err(format!(
            "n_classes {} outside [1, {MAX_CLASSES}]",
            forest.n_classes
        ));
    }
    for (tree_index, tree) in forest.trees.iter().enumerate() {
        if tree.n_features != forest.n_features || tree.n_classes != forest.n_classes {
            return Err(format!(
                "tree {tree_index} has shape {}x{}, forest has {}x{}",
                tree.n_features, tree.n_classes, forest.n_features, forest.n_classes
            ));
        }
        check_tree(tree).map_err(|reason| format!("tree {tree_index}: {reason}"))?;
    }
    Ok(())
}

fn check_tree(tree: &DecisionTree) -> Result<(), String> {
    if tree.nodes.is_empty() {
        return Err("no nodes".to_string());
    }
    let n_nodes = tree.nodes.len();
    for (idx, node) in tree.nodes.iter().enumerate() {
        match node {
            Node::Leaf { label, .. } => {
                if *label >= tree.n_classes {
                    return Err(format!(
                        "leaf {idx} has label {label}, n_classes is {}",
                        tree.n_classes
                    ));
                }
            }
            Node::Split {
                feature,
                left,
                right,
                ..
            } => {
                if feature.index() >= tree.n_features {
                    return Err(format!(
                        "split {idx} tests feature {feature}, n_features is {}",
                        tree.n_features
                    ));
                }
                for child in [left.index(), right.index()] {
                    if child <= idx || child >= n_nodes {
                        return Err(format!(
                            "split {idx} points to node {child}, expected ({idx}, {n_nodes})"
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}
