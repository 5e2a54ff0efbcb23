// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Predicts equivalence for unlabeled pairs with a trained model.
//
// The generator hands back pairs sorted by length, so every
// prediction is written back to the slot of the pair it
// belongs to. The result is in input order.

use anyhow::{ensure, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use rayon::ThreadPool;

use crate::data::{batcher::PairBatcher, generator::EmbeddingGenerator};
use crate::domain::{text_pair::TextPair, traits::TextEmbedder};
use crate::infra::model_directory::ModelDirectory;
use crate::ml::model::{predicted_classes, EquivalenceModel, EquivalenceModelConfig};

pub struct Predictor<B: Backend> {
    config: EquivalenceModelConfig,
    model:  EquivalenceModel<B>,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    pub fn new(config: EquivalenceModelConfig, model: EquivalenceModel<B>, device: B::Device) -> Self {
        Self { config, model, device }
    }

    pub fn from_directory(directory: &ModelDirectory, device: B::Device) -> Result<Self> {
        let (config, model) = directory.restore::<B>(&device)?;
        Ok(Self::new(config, model, device))
    }

    /// Predict whether each pair is equivalent, in input order.
    pub fn predict<E: TextEmbedder + Sync>(
        &self,
        pairs:      &[TextPair],
        embedder:   &E,
        pool:       &ThreadPool,
        batch_size: usize,
        block_size: usize,
    ) -> Result<Vec<bool>> {
        ensure!(
            embedder.embedding_size() == self.config.embedding_size,
            "Word vectors have size {} but the model expects {}",
            embedder.embedding_size(),
            self.config.embedding_size
        );

        let generator = EmbeddingGenerator::new(pairs, embedder, pool, self.config.maximum_tokens)
            .with_batch_size(batch_size)
            .with_block_size(block_size);
        let batcher = PairBatcher::<B>::new(self.device.clone(), self.config.embedding_size);

        let mut predictions = vec![false; pairs.len()];
        for group in generator.iter().take(generator.batches_per_epoch()) {
            let batch   = batcher.batch(group);
            let classes = predicted_classes(self.model.forward(batch.text1, batch.text2));
            for (position, class) in batch.positions.iter().zip(classes.into_data().iter::<i64>()) {
                predictions[*position] = class == 1;
            }
        }

        tracing::debug!(
            "{} of {} pairs predicted equivalent",
            predictions.iter().filter(|&&p| p).count(),
            predictions.len()
        );
        Ok(predictions)
    }
}
