// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and their flags. Flags shared
// between subcommands live in small argument groups that are
// flattened into each subcommand that needs them:
//
//   train            = Training + Columns + Parser + Model
//   continue         = Training + Columns + Parser
//   predict          = Columns + Parser
//   cross-validation = Columns

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    cross_validation_use_case::CrossValidationConfig,
    predict_use_case::PredictConfig,
    train_use_case::{ModelParameters, TrainConfig, Validation},
    ParserConfig,
};
use crate::data::{generator::DEFAULT_BLOCK_SIZE, loader::ColumnNames};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a new model
    Train(TrainArgs),

    /// Continue training an existing model
    Continue(ContinueArgs),

    /// Use a model to predict the equivalence of text pairs
    Predict(PredictArgs),

    /// Create cross validation data partitions
    #[command(name = "cross-validation")]
    CrossValidation(CrossValidationArgs),
}

// ─── Shared Argument Groups ──────────────────────────────────────────────────

/// Map other column names onto text1, text2 and label
#[derive(Args, Debug, Clone, Default)]
pub struct ColumnArgs {
    /// Name of the column to use as the first text
    #[arg(long = "text-1-name", value_name = "NAME")]
    pub text_1_name: Option<String>,

    /// Name of the column to use as the second text
    #[arg(long = "text-2-name", value_name = "NAME")]
    pub text_2_name: Option<String>,

    /// Name of the column to use as the label
    #[arg(long = "label-name", value_name = "NAME")]
    pub label_name: Option<String>,
}

impl From<ColumnArgs> for ColumnNames {
    fn from(a: ColumnArgs) -> Self {
        ColumnNames {
            text_1: a.text_1_name,
            text_2: a.text_2_name,
            label:  a.label_name,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ParserArgs {
    /// Number of parallel text parsing threads; -1 uses as many as possible
    #[arg(long, value_name = "THREADS", default_value_t = -1, allow_negative_numbers = true)]
    pub parser_threads: i32,

    /// Number of samples to parse together
    #[arg(long, value_name = "SAMPLES", default_value_t = DEFAULT_BLOCK_SIZE)]
    pub parser_batch_size: usize,

    /// Word vector file (GloVe or word2vec text format)
    #[arg(long, value_name = "PATH", env = "BISEMANTIC_EMBEDDINGS")]
    pub embeddings: PathBuf,
}

impl From<ParserArgs> for ParserConfig {
    fn from(a: ParserArgs) -> Self {
        ParserConfig {
            embeddings: a.embeddings,
            threads:    usize::try_from(a.parser_threads).ok().filter(|&t| t > 0),
            batch_size: a.parser_batch_size,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Number of LSTM hidden units
    #[arg(long, default_value_t = 128)]
    pub units: usize,

    /// Dropout rate before the classifier; no dropout if not given
    #[arg(long)]
    pub dropout: Option<f64>,

    /// Texts are clipped to this many tokens; defaults to the longest training text
    #[arg(long)]
    pub maximum_tokens: Option<usize>,
}

impl From<ModelArgs> for ModelParameters {
    fn from(a: ModelArgs) -> Self {
        ModelParameters {
            units:          a.units,
            dropout:        a.dropout,
            maximum_tokens: a.maximum_tokens,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    /// Training data file
    pub training: PathBuf,

    /// Validation data file
    #[arg(long, value_name = "FILE", conflicts_with = "validation_fraction")]
    pub validation_set: Option<PathBuf>,

    /// Portion of the training data to hold out for validation
    #[arg(long, value_name = "FRACTION")]
    pub validation_fraction: Option<f64>,

    /// Number of training epochs
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Train on only the first n samples
    #[arg(long)]
    pub n: Option<usize>,

    /// Batch size
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 0.001)]
    pub learning_rate: f64,

    /// Random seed for shuffles and weight initialization
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[command(flatten)]
    pub columns: ColumnArgs,

    #[command(flatten)]
    pub parser: ParserArgs,
}

impl TrainingArgs {
    fn validation(&self) -> Validation {
        match (&self.validation_set, self.validation_fraction) {
            (Some(path), _)     => Validation::File(path.clone()),
            (None, Some(f))     => Validation::Fraction(f),
            (None, None)        => Validation::None,
        }
    }

    /// Application config for training into `model_directory`
    pub fn into_config(self, model_directory: Option<PathBuf>) -> TrainConfig {
        TrainConfig {
            validation:      self.validation(),
            training:        self.training,
            columns:         self.columns.into(),
            parser:          self.parser.into(),
            epochs:          self.epochs,
            batch_size:      self.batch_size,
            learning_rate:   self.learning_rate,
            samples:         self.n,
            seed:            self.seed,
            model_directory,
        }
    }
}

// ─── Subcommand Arguments ────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub training: TrainingArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Directory in which to save the model; not saved if omitted
    #[arg(long = "model-directory-name", alias = "model", value_name = "MODEL")]
    pub model_directory_name: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ContinueArgs {
    #[command(flatten)]
    pub training: TrainingArgs,

    /// Directory of the model to keep training
    pub model: PathBuf,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Model directory
    pub model: PathBuf,

    /// Data file of text pairs
    pub test: PathBuf,

    /// Predict only the first n samples
    #[arg(long)]
    pub n: Option<usize>,

    #[command(flatten)]
    pub columns: ColumnArgs,

    #[command(flatten)]
    pub parser: ParserArgs,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            model_directory: a.model,
            test:            a.test,
            columns:         a.columns.into(),
            parser:          a.parser.into(),
            samples:         a.n,
        }
    }
}

#[derive(Args, Debug)]
pub struct CrossValidationArgs {
    /// Data file to partition
    pub data: PathBuf,

    /// Portion of each split used for training
    pub fraction: f64,

    /// Number of splits
    pub k: usize,

    /// Name prefix of the partition files
    #[arg(long, default_value = "data")]
    pub prefix: String,

    /// Where to write the partition files
    #[arg(long, default_value = ".")]
    pub output_directory: PathBuf,

    /// Use only the first n samples
    #[arg(long)]
    pub n: Option<usize>,

    /// Random seed for the shuffles
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[command(flatten)]
    pub columns: ColumnArgs,
}

impl From<CrossValidationArgs> for CrossValidationConfig {
    fn from(a: CrossValidationArgs) -> Self {
        CrossValidationConfig {
            data:             a.data,
            fraction:         a.fraction,
            k:                a.k,
            prefix:           a.prefix,
            output_directory: a.output_directory,
            columns:          a.columns.into(),
            samples:          a.n,
            seed:             a.seed,
        }
    }
}
