// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over the embedding generator with Adam.
//
//   for each epoch:
//     take batches_per_epoch batches from the training generator
//       forward → cross-entropy loss → backward → Adam step
//     if there is validation data:
//       model.valid() → same network on the inner backend
//       (no autodiff graph, dropout disabled)
//       one pass over the validation generator
//
// The generators cycle forever, so the trainer decides where
// an epoch ends.

use anyhow::{Context, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rayon::ThreadPool;

use crate::data::{
    batcher::PairBatcher,
    generator::EmbeddingGenerator,
};
use crate::domain::{text_pair::TextPair, traits::TextEmbedder};
use crate::infra::metrics::{EpochMetrics, Evaluation, History, MetricsLogger};
use crate::ml::model::{correct_predictions, EquivalenceModel};

/// Settings of one call to `fit`
#[derive(Debug, Clone)]
pub struct FitSettings {
    pub epochs:         usize,
    pub batch_size:     usize,
    pub block_size:     usize,
    pub learning_rate:  f64,
    pub maximum_tokens: usize,
}

/// Running totals over the batches of one pass
#[derive(Default)]
struct Tally {
    loss_sum: f64,
    correct:  usize,
    samples:  usize,
}

impl Tally {
    fn add(&mut self, loss: f64, correct: usize, samples: usize) {
        // Mean batch loss weighted by batch size
        self.loss_sum += loss * samples as f64;
        self.correct  += correct;
        self.samples  += samples;
    }

    /// `None` when no samples were seen
    fn evaluation(&self) -> Option<Evaluation> {
        if self.samples == 0 {
            return None;
        }
        Some(Evaluation {
            loss:     self.loss_sum / self.samples as f64,
            accuracy: self.correct as f64 / self.samples as f64,
        })
    }
}

/// Train `model` on labeled `training` pairs for `settings.epochs` epochs.
#[allow(clippy::too_many_arguments)]
pub fn fit<B, O, E>(
    mut model:  EquivalenceModel<B>,
    optim:      &mut O,
    training:   &[TextPair],
    validation: Option<&[TextPair]>,
    embedder:   &E,
    pool:       &ThreadPool,
    settings:   &FitSettings,
    device:     &B::Device,
    metrics:    Option<&MetricsLogger>,
) -> Result<(EquivalenceModel<B>, History)>
where
    B: AutodiffBackend,
    O: Optimizer<EquivalenceModel<B>, B>,
    E: TextEmbedder + Sync,
{
    let train_generator = EmbeddingGenerator::new(training, embedder, pool, settings.maximum_tokens)
        .with_batch_size(settings.batch_size)
        .with_block_size(settings.block_size);
    let train_batcher = PairBatcher::<B>::new(device.clone(), embedder.embedding_size());
    let steps         = train_generator.batches_per_epoch();
    let mut batches   = train_generator.iter();

    let validation = validation.filter(|pairs| !pairs.is_empty());
    let validation_generator = validation.map(|pairs| {
        EmbeddingGenerator::new(pairs, embedder, pool, settings.maximum_tokens)
            .with_batch_size(settings.batch_size)
            .with_block_size(settings.block_size)
    });

    tracing::info!(
        "Training on {} pairs, {} batches per epoch{}",
        training.len(),
        steps,
        validation.map_or(String::new(), |v| format!(", validating on {} pairs", v.len()))
    );

    let mut history = History::default();

    for epoch in 1..=settings.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut tally = Tally::default();

        for group in batches.by_ref().take(steps) {
            let batch   = train_batcher.batch(group);
            let labels  = batch.labels.context("Training batch has unlabeled pairs")?;
            let samples = batch.positions.len();

            let (loss, logits) = model.forward_loss(batch.text1, batch.text2, labels.clone());
            let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();
            tally.add(loss_value, correct_predictions(logits, labels), samples);

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(settings.learning_rate, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let validation = match &validation_generator {
            Some(generator) => Some(evaluate(&model.valid(), generator, embedder.embedding_size(), device)?),
            None => None,
        };

        let training = tally.evaluation().context("No training batches in epoch")?;
        let m = EpochMetrics { epoch, training, validation };
        match m.validation {
            Some(v) => println!(
                "Epoch {:>3}/{} | loss={:.4} | accuracy={:.4} | val_loss={:.4} | val_accuracy={:.4}",
                epoch, settings.epochs, m.training.loss, m.training.accuracy, v.loss, v.accuracy,
            ),
            None => println!(
                "Epoch {:>3}/{} | loss={:.4} | accuracy={:.4}",
                epoch, settings.epochs, m.training.loss, m.training.accuracy,
            ),
        }

        history.record(&m);
        if let Some(logger) = metrics {
            logger.log(&m)?;
        }
    }

    tracing::info!("Training complete after {} epochs", settings.epochs);
    Ok((model, history))
}

/// One pass over labeled data without updating the model.
pub fn evaluate<B, E>(
    model:          &EquivalenceModel<B>,
    generator:      &EmbeddingGenerator<'_, E>,
    embedding_size: usize,
    device:         &B::Device,
) -> Result<Evaluation>
where
    B: Backend,
    E: TextEmbedder + Sync,
{
    let batcher   = PairBatcher::<B>::new(device.clone(), embedding_size);
    let mut tally = Tally::default();

    for group in generator.iter().take(generator.batches_per_epoch()) {
        let batch   = batcher.batch(group);
        let labels  = batch.labels.context("Validation batch has unlabeled pairs")?;
        let samples = batch.positions.len();

        let (loss, logits) = model.forward_loss(batch.text1, batch.text2, labels.clone());
        tally.add(loss.into_scalar().elem::<f64>(), correct_predictions(logits, labels), samples);
    }

    tally.evaluation().context("No labeled pairs to evaluate")
}
