//! Domain types for grove-io.

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A labelled dataset of integer feature rows.
///
/// Produced by [`LabeledCsvReader`](crate::LabeledCsvReader). Every row has
/// exactly `n_features` values and `labels[i]` is the class of `features[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledDataset {
    /// Feature values: `features[sample_index][feature_index]`.
    features: Vec<Vec<i32>>,
    /// Zero-based class label per row.
    labels: Vec<usize>,
    n_features: usize,
}

impl LabeledDataset {
    pub(crate) fn new(features: Vec<Vec<i32>>, labels: Vec<usize>, n_features: usize) -> Self {
        debug_assert_eq!(features.len(), labels.len());
        debug_assert!(features.iter().all(|row| row.len() == n_features));
        Self {
            features,
            labels,
            n_features,
        }
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<i32>] {
        &self.features
    }

    /// Return the label vector.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Return the feature width every row was padded to.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Largest label plus one.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.labels.iter().max().map_or(0, |&max| max + 1)
    }

    /// Split into `(features, labels)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Vec<i32>>, Vec<usize>) {
        (self.features, self.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("mnist-run_01".to_string());
        assert!(name.is_ok());
        assert_eq!(name.unwrap().as_str(), "mnist-run_01");
    }

    #[test]
    fn experiment_name_rejects_empty() {
        let name = ExperimentName::new(String::new());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn experiment_name_rejects_special_chars() {
        let name = ExperimentName::new("../escape".to_string());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn dataset_class_count_from_max_label() {
        let ds = LabeledDataset::new(vec![vec![0], vec![1]], vec![0, 4], 1);
        assert_eq!(ds.n_classes(), 5);
        assert_eq!(ds.n_samples(), 2);
        let (features, labels) = ds.into_parts();
        assert_eq!(features, vec![vec![0], vec![1]]);
        assert_eq!(labels, vec![0, 4]);
    }
}
