// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case wires the data, ml and infra layers together
// for one command. No printing here (that's Layer 1) and no
// tensor code (that's Layer 5).

use anyhow::Result;
use rayon::ThreadPool;
use std::path::PathBuf;

use crate::data::generator::parser_pool;
use crate::infra::embeddings::WordVectors;

// Train a new model or continue training a saved one
pub mod train_use_case;

// Predict equivalence with a saved model
pub mod predict_use_case;

// Write cross-validation partition files
pub mod cross_validation_use_case;

/// How text is turned into vectors
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Word vector file
    pub embeddings: PathBuf,
    /// Parallel embedding threads, `None` for as many as possible
    pub threads:    Option<usize>,
    /// Pairs embedded together in one block
    pub batch_size: usize,
}

impl ParserConfig {
    pub fn load_embeddings(&self) -> Result<WordVectors> {
        WordVectors::load(&self.embeddings)
    }

    pub fn pool(&self) -> Result<ThreadPool> {
        parser_pool(self.threads)
    }
}
