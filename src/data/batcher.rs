// ============================================================
// Layer 4 — Pair Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a group of embedded
// pairs into tensors.
//
//   Input:  N EmbeddedPairs, texts of varying token counts
//   Output: PairBatch with text tensors of shape [N, T, D]
//           T = longest text in the group (at least 1)
//           D = embedding size
//
// Shorter texts are padded with zero vectors at the FRONT:
//
//   tokens:  [a b c]      T = 5
//   padded:  [0 0 a b c]
//
// so the recurrent encoder's final state is reached right
// after the last real token.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::generator::EmbeddedPair;

// ─── PairBatch ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct PairBatch<B: Backend> {
    /// First texts — shape: [batch_size, tokens, embedding_size]
    pub text1: Tensor<B, 3>,

    /// Second texts — shape: [batch_size, tokens, embedding_size]
    pub text2: Tensor<B, 3>,

    /// 1 = equivalent, 0 = not — shape: [batch_size].
    /// `None` unless every pair in the batch is labeled.
    pub labels: Option<Tensor<B, 1, Int>>,

    /// Input positions of the pairs, in batch order
    pub positions: Vec<usize>,
}

// ─── PairBatcher ──────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct PairBatcher<B: Backend> {
    device:         B::Device,
    embedding_size: usize,
}

impl<B: Backend> PairBatcher<B> {
    pub fn new(device: B::Device, embedding_size: usize) -> Self {
        Self { device, embedding_size }
    }

    /// Pre-pad every text to `tokens` rows and flatten to [N * T * D].
    fn stack<'t>(
        &self,
        texts:  impl Iterator<Item = &'t Vec<Vec<f32>>>,
        count:  usize,
        tokens: usize,
    ) -> Tensor<B, 3> {
        let d        = self.embedding_size;
        let mut flat = vec![0.0f32; count * tokens * d];

        for (i, text) in texts.enumerate() {
            let padding = tokens - text.len();
            for (t, vector) in text.iter().enumerate() {
                let offset = (i * tokens + padding + t) * d;
                flat[offset..offset + d].copy_from_slice(&vector[..d]);
            }
        }

        Tensor::<B, 3>::from_data(TensorData::new(flat, [count, tokens, d]), &self.device)
    }
}

impl<B: Backend> Batcher<EmbeddedPair, PairBatch<B>> for PairBatcher<B> {
    fn batch(&self, items: Vec<EmbeddedPair>) -> PairBatch<B> {
        let count  = items.len();
        let tokens = items.iter().map(EmbeddedPair::tokens).max().unwrap_or(0).max(1);

        let text1 = self.stack(items.iter().map(|p| &p.text1), count, tokens);
        let text2 = self.stack(items.iter().map(|p| &p.text2), count, tokens);

        let labels: Option<Vec<i32>> = items
            .iter()
            .map(|p| p.label.map(i32::from))
            .collect();
        let labels = labels
            .filter(|l| !l.is_empty())
            .map(|l| Tensor::<B, 1, Int>::from_ints(l.as_slice(), &self.device));

        PairBatch {
            text1,
            text2,
            labels,
            positions: items.iter().map(|p| p.position).collect(),
        }
    }
}
