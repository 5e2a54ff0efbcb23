// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates training, for a new model or a saved one:
//
//   Step 1: Load labeled training data      (Layer 4 - data)
//   Step 2: Pick validation data            (Layer 4 - data)
//   Step 3: Load word vectors               (Layer 6 - infra)
//   Step 4: Build or restore model + Adam   (Layers 5, 6)
//   Step 5: Run the training loop           (Layer 5 - ml)
//   Step 6: Save model and history          (Layer 6 - infra)

use anyhow::{bail, ensure, Context, Result};
use burn::{optim::AdamConfig, prelude::Backend};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use crate::application::ParserConfig;
use crate::data::{
    loader::{load_labeled_pairs, ColumnNames},
    partition::cross_validation_partitions,
};
use crate::domain::{text_pair::TextPair, traits::TextEmbedder};
use crate::infra::{metrics::History, model_directory::ModelDirectory};
use crate::ml::{
    default_device,
    model::{EquivalenceModel, EquivalenceModelConfig},
    trainer::{fit, FitSettings},
    TrainBackend,
};

/// Where validation data comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    None,
    /// A separate labeled data file
    File(PathBuf),
    /// This portion of the training data is held out
    Fraction(f64),
}

/// Architecture of a new model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    pub units:          usize,
    pub dropout:        Option<f64>,
    /// `None` means the longest text in the training data
    pub maximum_tokens: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainMode {
    /// Train a new model with these parameters
    New(ModelParameters),
    /// Keep training the model in the model directory
    Continue,
}

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub training:        PathBuf,
    pub validation:      Validation,
    pub columns:         ColumnNames,
    pub parser:          ParserConfig,
    pub epochs:          usize,
    pub batch_size:      usize,
    pub learning_rate:   f64,
    /// Use only the first n training samples
    pub samples:         Option<usize>,
    pub seed:            u64,
    /// Required when continuing; optional for a new model
    pub model_directory: Option<PathBuf>,
}

/// What a training run produced
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model:         EquivalenceModelConfig,
    pub samples:       usize,
    pub training_time: Duration,
    pub history:       History,
}

pub struct TrainUseCase {
    config: TrainConfig,
    mode:   TrainMode,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, mode: TrainMode) -> Self {
        Self { config, mode }
    }

    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;

        // ── Step 1: Load training data ────────────────────────────────────────
        let training = load_labeled_pairs(&cfg.training, &cfg.columns, cfg.samples)?;

        // ── Step 2: Validation data ───────────────────────────────────────────
        let (training, validation) = match &cfg.validation {
            Validation::None => (training, None),
            Validation::File(path) => {
                let validation = load_labeled_pairs(path, &cfg.columns, None)?;
                (training, Some(validation))
            }
            Validation::Fraction(fraction) => {
                let (training, validation) =
                    cross_validation_partitions(&training, 1.0 - fraction, 1, cfg.seed)?.remove(0);
                (training, Some(validation))
            }
        };
        ensure!(!training.is_empty(), "No training data in '{}'", cfg.training.display());
        let validation = validation.filter(|v| {
            if v.is_empty() {
                tracing::warn!("Validation set is empty; training without validation");
            }
            !v.is_empty()
        });
        tracing::info!(
            "{} training pairs, {} validation pairs",
            training.len(),
            validation.as_ref().map_or(0, Vec::len)
        );

        // ── Step 3: Word vectors and parser threads ───────────────────────────
        let embedder = cfg.parser.load_embeddings()?;
        let pool     = cfg.parser.pool()?;

        // ── Step 4: Model and optimizer ───────────────────────────────────────
        let directory = match (&self.mode, &cfg.model_directory) {
            (TrainMode::Continue, Some(dir)) => Some(ModelDirectory::open(dir)?),
            (TrainMode::Continue, None) => bail!("Continuing training needs a model directory"),
            (TrainMode::New(_), Some(dir)) => Some(ModelDirectory::create(dir)?),
            (TrainMode::New(_), None) => {
                tracing::warn!("No model directory given; the trained model will not be saved");
                None
            }
        };

        let device = default_device();
        <TrainBackend as Backend>::seed(cfg.seed);
        let mut optim = AdamConfig::new().init::<TrainBackend, EquivalenceModel<TrainBackend>>();

        let (model_config, model) = match &self.mode {
            TrainMode::New(parameters) => {
                let maximum_tokens = parameters
                    .maximum_tokens
                    .unwrap_or_else(|| longest_text(&training, &embedder, &pool));
                let config = EquivalenceModelConfig::new(
                    maximum_tokens,
                    embedder.embedding_size(),
                    parameters.units,
                )
                .with_dropout(parameters.dropout);
                let model = config.init::<TrainBackend>(&device);
                (config, model)
            }
            TrainMode::Continue => {
                let dir = directory.as_ref().context("Missing model directory")?;
                let (config, model) = dir.restore::<TrainBackend>(&device)?;
                optim = dir.load_optimizer::<TrainBackend, _>(optim, &device)?;
                (config, model)
            }
        };
        ensure!(
            model_config.embedding_size == embedder.embedding_size(),
            "Word vectors have size {} but the model expects {}",
            embedder.embedding_size(),
            model_config.embedding_size
        );
        tracing::info!("Model ready: {}", model_config.description());
        tracing::debug!("Model parameters {}", model_config.parameters());

        // ── Step 5: Training loop ─────────────────────────────────────────────
        let metrics = directory
            .as_ref()
            .map(ModelDirectory::metrics_logger)
            .transpose()?;
        let settings = FitSettings {
            epochs:         cfg.epochs,
            batch_size:     cfg.batch_size,
            block_size:     cfg.parser.batch_size,
            learning_rate:  cfg.learning_rate,
            maximum_tokens: model_config.maximum_tokens,
        };

        let start = Instant::now();
        let (model, history) = fit(
            model,
            &mut optim,
            &training,
            validation.as_deref(),
            &embedder,
            &pool,
            &settings,
            &device,
            metrics.as_ref(),
        )?;
        let training_time = start.elapsed();

        // ── Step 6: Save ──────────────────────────────────────────────────────
        if let Some(dir) = &directory {
            dir.save_config(&model_config)?;
            dir.save_model(&model)?;
            dir.save_optimizer::<TrainBackend, _>(&optim)?;
            dir.save_info(&model_config)?;
            let runs = dir.update_history(training_time, training.len(), history.clone())?;
            tracing::info!("Saved model to '{}' ({})", dir.path().display(), runs);
        }

        Ok(TrainingReport {
            model: model_config,
            samples: training.len(),
            training_time,
            history,
        })
    }
}

/// Token count of the longest text in the data, at least 1
fn longest_text<E: TextEmbedder + Sync>(pairs: &[TextPair], embedder: &E, pool: &ThreadPool) -> usize {
    let longest = pool.install(|| {
        pairs
            .par_iter()
            .map(|p| embedder.token_count(&p.text1).max(embedder.token_count(&p.text2)))
            .max()
            .unwrap_or(0)
    });
    tracing::debug!("Longest text has {} tokens", longest);
    longest.max(1)
}
