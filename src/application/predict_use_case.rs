// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a trained model from its directory and predicts
// equivalence for every pair in a data file. Any label column
// in the file is ignored.

use anyhow::Result;
use std::path::PathBuf;

use crate::application::ParserConfig;
use crate::data::{
    generator::DEFAULT_BATCH_SIZE,
    loader::{load_pairs, ColumnNames},
};
use crate::infra::model_directory::ModelDirectory;
use crate::ml::{default_device, inferencer::Predictor, InferBackend};

#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub model_directory: PathBuf,
    pub test:            PathBuf,
    pub columns:         ColumnNames,
    pub parser:          ParserConfig,
    /// Predict only the first n pairs
    pub samples:         Option<usize>,
}

/// One prediction, keyed by the pair's position among the
/// pairs that were loaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub index:      usize,
    pub equivalent: bool,
}

pub struct PredictUseCase {
    config: PredictConfig,
}

impl PredictUseCase {
    pub fn new(config: PredictConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<Prediction>> {
        let cfg = &self.config;

        // Open the model first: a bad directory should fail before
        // the word vectors are read
        let directory = ModelDirectory::open(&cfg.model_directory)?;
        let predictor = Predictor::<InferBackend>::from_directory(&directory, default_device())?;

        let pairs = load_pairs(&cfg.test, &cfg.columns, cfg.samples)?;
        tracing::info!("Predict labels for {} pairs", pairs.len());

        let embedder    = cfg.parser.load_embeddings()?;
        let pool        = cfg.parser.pool()?;
        let predictions = predictor.predict(
            &pairs,
            &embedder,
            &pool,
            DEFAULT_BATCH_SIZE,
            cfg.parser.batch_size,
        )?;

        // Rows dropped for null values are not counted
        Ok(predictions
            .into_iter()
            .enumerate()
            .map(|(index, equivalent)| Prediction { index, equivalent })
            .collect())
    }
}

/// Render predictions as CSV: an unnamed index column and a
/// `predicted` column of 0/1.
pub fn predictions_csv(predictions: &[Prediction]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["", "predicted"])?;
    for p in predictions {
        writer.write_record([p.index.to_string(), u8::from(p.equivalent).to_string()])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
