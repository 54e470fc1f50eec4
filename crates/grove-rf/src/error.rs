use std::path::PathBuf;

/// Errors from forest training, prediction, evaluation, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when min_leaf_size is zero.
    #[error("min_leaf_size must be at least 1, got {min_leaf_size}")]
    InvalidMinLeafSize {
        /// The invalid min_leaf_size value provided.
        min_leaf_size: usize,
    },

    /// Returned when features_per_split resolves to 0 or exceeds n_features.
    #[error("features_per_split resolved to {features_per_split}, but must be in [1, {n_features}]")]
    InvalidFeaturesPerSplit {
        /// The resolved features_per_split value.
        features_per_split: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when an explicit class count of zero is configured.
    #[error("n_classes must be at least 1")]
    InvalidClassCount,

    /// Returned when the class count exceeds [`MAX_CLASSES`](crate::MAX_CLASSES).
    #[error("n_classes {n_classes} exceeds the supported maximum of {max}")]
    TooManyClasses {
        /// The requested class count.
        n_classes: usize,
        /// The largest supported class count.
        max: usize,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the feature matrix and label vector differ in length.
    #[error("{n_rows} feature rows but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_rows: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a label is not in `[0, n_classes)`.
    #[error("label {label} at sample {sample_index} is outside [0, {n_classes})")]
    LabelOutOfRange {
        /// The offending label.
        label: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The number of classes.
        n_classes: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when predicting with a forest that holds no trees.
    #[error("forest has no trees; fit a forest before predicting")]
    EmptyForest,

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },

    /// Returned when a decoded model is structurally inconsistent.
    #[error("corrupt model in {path}: {reason}")]
    CorruptModel {
        /// Path to the model file.
        path: PathBuf,
        /// What the structural check found.
        reason: String,
    },
}
