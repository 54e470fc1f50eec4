use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use grove_io::{ExperimentName, LabeledCsvReader, LabeledDataset, ResultWriter, RunSummary};
use grove_rf::{
    ConfusionMatrix, FeaturesPerSplit, ForestShape, RandomForest, RandomForestConfig,
    TrainingMode,
};

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Random forest classification of fixed-width integer feature vectors")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Forest hyperparameters shared by `train` and `evaluate`.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the forest
    #[arg(long, default_value_t = 50)]
    n_trees: usize,

    /// Maximum tree depth (the root is depth 0)
    #[arg(long, default_value_t = 12)]
    max_depth: usize,

    /// Nodes with this many samples or fewer become leaves
    #[arg(long, default_value_t = 5)]
    min_leaf_size: usize,

    /// Features examined per split: "sqrt", "all", or a count
    #[arg(long, default_value = "sqrt")]
    features_per_split: String,

    /// Number of classes (derived from the largest training label if not set)
    #[arg(long)]
    n_classes: Option<usize>,

    /// Build trees in parallel with one random stream per tree
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Feature width rows are padded to (header width minus the label if not set)
    #[arg(long)]
    feature_width: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Fit a forest on a labelled CSV and save it
    Train {
        /// Path to the training CSV file
        #[arg(long)]
        data: PathBuf,

        /// Where to write the model binary
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Predict labels for a CSV with a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the CSV file to classify
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Fit on a training CSV, then score both the training and test sets
    Evaluate {
        /// Path to the training CSV file
        #[arg(long)]
        train: PathBuf,

        /// Path to the test CSV file
        #[arg(long)]
        test: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        forest: ForestArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    model: String,
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    features_per_split: usize,
    train_seconds: f64,
    shape: ForestShape,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_samples: usize,
    predictions: String,
    macro_f1: f64,
    model_n_trees: usize,
    model_n_features: usize,
    model_n_classes: usize,
}

fn parse_features_per_split(s: &str) -> Result<FeaturesPerSplit> {
    match s {
        "sqrt" => Ok(FeaturesPerSplit::Sqrt),
        "all" => Ok(FeaturesPerSplit::All),
        other => other.parse().map(FeaturesPerSplit::Fixed).map_err(|_| {
            anyhow::anyhow!("unknown features-per-split: {other} (expected sqrt, all, or a count)")
        }),
    }
}

fn build_config(args: &ForestArgs, seed: u64) -> Result<RandomForestConfig> {
    let mode = if args.parallel {
        TrainingMode::Parallel
    } else {
        TrainingMode::Sequential
    };
    Ok(RandomForestConfig::new(args.n_trees)?
        .with_max_depth(args.max_depth)
        .with_min_leaf_size(args.min_leaf_size)
        .with_features_per_split(parse_features_per_split(&args.features_per_split)?)
        .with_n_classes(args.n_classes)
        .with_training_mode(mode)
        .with_seed(seed))
}

fn read_dataset(path: &Path, feature_width: Option<usize>) -> Result<LabeledDataset> {
    LabeledCsvReader::new(path)
        .with_feature_width(feature_width)
        .read()
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Confusion of `predicted` against the dataset labels, over the forest's classes.
fn confusion(
    forest: &RandomForest,
    dataset: &LabeledDataset,
    predicted: &[usize],
) -> Result<ConfusionMatrix> {
    ConfusionMatrix::from_labels(dataset.labels(), predicted, forest.n_classes())
        .context("data holds a label the model has no class for")
}

fn mode_name(mode: TrainingMode) -> &'static str {
    match mode {
        TrainingMode::Sequential => "sequential",
        TrainingMode::Parallel => "parallel",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            model,
            forest,
        } => {
            let config = build_config(&forest, cli.seed)?;
            let dataset = read_dataset(&data, forest.feature_width)?;

            let start = Instant::now();
            let result = config
                .fit(dataset.features(), dataset.labels())
                .context("training failed")?;
            let train_seconds = start.elapsed().as_secs_f64();

            let metadata = result.metadata().clone();
            let rf = result.into_forest();
            rf.save(&model)
                .with_context(|| format!("failed to save model to {}", model.display()))?;
            info!(path = %model.display(), "model saved");

            let output = TrainOutput {
                model: model.display().to_string(),
                n_samples: metadata.n_samples,
                n_features: metadata.n_features,
                n_classes: metadata.n_classes,
                features_per_split: metadata.features_per_split,
                train_seconds,
                shape: rf.shape(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            data,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let rf = RandomForest::load(&model)
                .with_context(|| format!("failed to load model from {}", model.display()))?;
            info!(
                n_trees = rf.n_trees(),
                n_features = rf.n_features(),
                "model loaded"
            );

            let dataset = read_dataset(&data, Some(rf.n_features()))?;
            let predicted = rf
                .predict_batch(dataset.features())
                .context("prediction failed")?;
            let macro_f1 = confusion(&rf, &dataset, &predicted)?.macro_f1();

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let path = writer.write_predictions("predict", &predicted)?;

            let output = PredictOutput {
                experiment,
                n_samples: dataset.n_samples(),
                predictions: path.display().to_string(),
                macro_f1,
                model_n_trees: rf.n_trees(),
                model_n_features: rf.n_features(),
                model_n_classes: rf.n_classes(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            train,
            test,
            experiment,
            output_dir,
            forest,
        } => {
            let experiment_name = ExperimentName::new(experiment)?;
            let config = build_config(&forest, cli.seed)?;

            let train_set = read_dataset(&train, forest.feature_width)?;
            // Test rows are padded to the training width.
            let test_set = read_dataset(&test, Some(train_set.n_features()))?;

            let start = Instant::now();
            let result = config
                .fit(train_set.features(), train_set.labels())
                .context("training failed")?;
            let train_seconds = start.elapsed().as_secs_f64();
            let metadata = result.metadata().clone();
            let rf = result.into_forest();
            info!(train_seconds, "forest trained");

            let start = Instant::now();
            let train_pred = rf
                .predict_batch(train_set.features())
                .context("prediction on training set failed")?;
            let test_pred = rf
                .predict_batch(test_set.features())
                .context("prediction on test set failed")?;
            let predict_seconds = start.elapsed().as_secs_f64();

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_predictions("train", &train_pred)?;
            writer.write_predictions("test", &test_pred)?;

            let train_confusion = confusion(&rf, &train_set, &train_pred)?;
            let test_confusion = confusion(&rf, &test_set, &test_pred)?;
            if cli.verbose {
                eprintln!("test confusion matrix:\n{test_confusion}");
            }

            let summary = RunSummary {
                n_trees: metadata.n_trees,
                max_depth: config.max_depth(),
                min_leaf_size: config.min_leaf_size(),
                features_per_split: metadata.features_per_split,
                seed: config.seed(),
                training_mode: mode_name(metadata.training_mode).to_string(),
                n_train: train_set.n_samples(),
                n_test: test_set.n_samples(),
                n_classes: rf.n_classes(),
                train_macro_f1: train_confusion.macro_f1(),
                test_macro_f1: test_confusion.macro_f1(),
                node_count: rf.node_count(),
                average_leaf_depth: rf.average_leaf_depth(),
                train_seconds,
                predict_seconds,
            };
            info!(
                train_macro_f1 = summary.train_macro_f1,
                test_macro_f1 = summary.test_macro_f1,
                test_accuracy = test_confusion.accuracy(),
                "evaluation complete"
            );
            writer.write_summary(&summary)?;

            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
