//! Prediction and run-summary writers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Everything an `evaluate` run reports.
///
/// Plain primitives so the writer has no dependency on `grove-rf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of trees in the forest.
    pub n_trees: usize,
    /// Configured maximum depth.
    pub max_depth: usize,
    /// Configured leaf size.
    pub min_leaf_size: usize,
    /// Resolved features examined per split.
    pub features_per_split: usize,
    /// Random seed.
    pub seed: u64,
    /// `"sequential"` or `"parallel"`.
    pub training_mode: String,
    /// Training rows.
    pub n_train: usize,
    /// Test rows.
    pub n_test: usize,
    /// Number of classes the forest votes over.
    pub n_classes: usize,
    /// Macro-averaged F1 on the training set.
    pub train_macro_f1: f64,
    /// Macro-averaged F1 on the test set.
    pub test_macro_f1: f64,
    /// Total nodes across all trees.
    pub node_count: usize,
    /// Mean root-to-leaf depth over every leaf.
    pub average_leaf_depth: f64,
    /// Wall-clock seconds spent fitting.
    pub train_seconds: f64,
    /// Wall-clock seconds spent predicting both sets.
    pub predict_seconds: f64,
}

/// Writes predicted labels and run summaries under one experiment name.
///
/// Creates the output directory on construction if it does not exist.
/// Predictions go to `{experiment}_{split}.csv`, one label per line with no
/// header; the summary goes to `{experiment}_summary.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write one predicted label per line to `{experiment}_{split}.csv`.
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] or [`IoError::WriteCsv`] if the file
    /// cannot be written.
    #[instrument(skip(self, predictions), fields(n = predictions.len()))]
    pub fn write_predictions(
        &self,
        split: &str,
        predictions: &[usize],
    ) -> Result<PathBuf, IoError> {
        let path = self.predictions_path(split);
        let file = fs::File::create(&path).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        for label in predictions {
            wtr.write_record([label.to_string()])
                .map_err(|e| IoError::WriteCsv {
                    path: path.clone(),
                    source: e,
                })?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Write a run summary to `{experiment}_summary.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::EncodeSummary`] or [`IoError::WriteFile`].
    #[instrument(skip_all)]
    pub fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_summary.json", self.experiment.as_str()));

        let artifact = SummaryArtifact {
            experiment: self.experiment.as_str(),
            summary,
        };
        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::EncodeSummary {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "summary written");
        Ok(path)
    }

    /// Path of the predictions file for `split`. Nothing is written.
    #[must_use]
    pub fn predictions_path(&self, split: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{split}.csv", self.experiment.as_str()))
    }
}

#[derive(Serialize)]
struct SummaryArtifact<'a> {
    experiment: &'a str,
    #[serde(flatten)]
    summary: &'a RunSummary,
}
