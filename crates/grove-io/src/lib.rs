//! Dataset loading and result writing for the grove pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, LabeledDataset};
pub use error::IoError;
pub use reader::LabeledCsvReader;
pub use writer::{ResultWriter, RunSummary};
