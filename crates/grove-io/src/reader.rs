//! CSV reader for labelled integer feature rows.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::IoError;
use crate::domain::LabeledDataset;

/// Reads a labelled dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required and skipped (its length fixes the default width)
/// - `f0,f1,...,fN,label`: integer features, then the integer class label
/// - Rows with fewer features than the width are zero-padded on the right
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | Width resolves to zero |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::RowTooLong`] | Row has more features than the width |
/// | [`IoError::InvalidValue`] | Cell is not an integer |
/// | [`IoError::NegativeLabel`] | Label column is below zero |
pub struct LabeledCsvReader {
    path: PathBuf,
    feature_width: Option<usize>,
}

impl LabeledCsvReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            feature_width: None,
        }
    }

    /// Fix the feature width instead of deriving it from the header.
    #[must_use]
    pub fn with_feature_width(mut self, feature_width: Option<usize>) -> Self {
        self.feature_width = feature_width;
        self
    }

    /// Read and validate the CSV file, returning a [`LabeledDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<LabeledDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets short rows through to be padded.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let width = self
            .feature_width
            .unwrap_or_else(|| header.len().saturating_sub(1));
        if width == 0 {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        debug!(header_cols = header.len(), width, "read CSV header");

        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut n_padded = 0usize;

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let cells: Vec<&str> = record.iter().collect();
            let Some((&raw_label, feature_cells)) = cells.split_last() else {
                continue;
            };

            if feature_cells.len() > width {
                return Err(IoError::RowTooLong {
                    path: self.path.clone(),
                    row_index,
                    expected: width,
                    got: feature_cells.len(),
                });
            }

            let mut row = Vec::with_capacity(width);
            for (col_index, &raw) in feature_cells.iter().enumerate() {
                let value: i32 = raw
                    .parse()
                    .map_err(|_| self.invalid_value(row_index, col_index, raw))?;
                row.push(value);
            }
            if row.len() < width {
                n_padded += 1;
                row.resize(width, 0);
            }

            let label: i64 = raw_label
                .parse()
                .map_err(|_| self.invalid_value(row_index, feature_cells.len(), raw_label))?;
            let label = usize::try_from(label).map_err(|_| IoError::NegativeLabel {
                path: self.path.clone(),
                row_index,
                label,
            })?;

            features.push(row);
            labels.push(label);
        }

        if labels.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }
        if n_padded > 0 {
            warn!(n_padded, width, "short rows zero-padded");
        }

        let dataset = LabeledDataset::new(features, labels, width);
        info!(
            n_samples = dataset.n_samples(),
            n_features = width,
            n_classes = dataset.n_classes(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    fn invalid_value(&self, row_index: usize, col_index: usize, raw: &str) -> IoError {
        IoError::InvalidValue {
            path: self.path.clone(),
            row_index,
            col_index,
            raw: raw.to_string(),
        }
    }
}
