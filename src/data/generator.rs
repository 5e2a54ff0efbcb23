// ============================================================
// Layer 4 — Length-Bucketed Embedding Generator
// ============================================================
// Turns text pairs into groups of embedded pairs, ready for
// the batcher, and keeps doing so for as many epochs as the
// trainer asks for.
//
// How one epoch is produced:
//
//   pairs:  [p0 p1 p2 ... p99]          block_size = 50
//              │
//              ▼
//   blocks: [p0..p49] [p50..p99]        embedded one block at a time,
//              │                        pairs in parallel on a rayon pool
//              ▼
//   sort each block by length           (longest of the two texts)
//              │
//              ▼
//   cut into batch_size groups          [32, 18] [32, 18]
//
// Because a batch only contains pairs of similar length, the
// batcher pads each batch to its own longest text instead of
// to the longest text in the whole data set.
//
// After the last block the generator starts again at the first,
// producing exactly the same batches in the same order.
// Nothing is cached between epochs: each block is re-embedded,
// so only one block of vectors is in memory at a time.

use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::VecDeque;

use crate::domain::text_pair::TextPair;
use crate::domain::traits::TextEmbedder;

pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_BLOCK_SIZE: usize = 1000;

/// One pair after embedding. Each text is one row per token,
/// already clipped to the generator's maximum number of tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedPair {
    /// Position of the pair in the generator's input slice
    pub position: usize,
    pub text1:    Vec<Vec<f32>>,
    pub text2:    Vec<Vec<f32>>,
    pub label:    Option<bool>,
}

impl EmbeddedPair {
    /// Token count of the longer text
    pub fn tokens(&self) -> usize {
        self.text1.len().max(self.text2.len())
    }
}

/// Build the pool that embeds text in parallel.
/// `None` uses as many threads as rayon sees fit.
pub fn parser_pool(threads: Option<usize>) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(0))
        .thread_name(|i| format!("text-parser-{i}"))
        .build()
        .context("Cannot start text parser threads")
}

pub struct EmbeddingGenerator<'a, E> {
    pairs:          &'a [TextPair],
    embedder:       &'a E,
    pool:           &'a ThreadPool,
    maximum_tokens: usize,
    batch_size:     usize,
    block_size:     usize,
}

impl<'a, E: TextEmbedder + Sync> EmbeddingGenerator<'a, E> {
    pub fn new(
        pairs:          &'a [TextPair],
        embedder:       &'a E,
        pool:           &'a ThreadPool,
        maximum_tokens: usize,
    ) -> Self {
        Self {
            pairs,
            embedder,
            pool,
            maximum_tokens,
            batch_size: DEFAULT_BATCH_SIZE,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    fn blocks(&self) -> usize {
        self.pairs.len().div_ceil(self.block_size)
    }

    /// Number of batches the iterator yields before repeating
    pub fn batches_per_epoch(&self) -> usize {
        self.pairs
            .chunks(self.block_size)
            .map(|block| block.len().div_ceil(self.batch_size))
            .sum()
    }

    /// Embed one block and cut it into length-sorted batches.
    pub fn embed_block(&self, block: usize) -> Vec<Vec<EmbeddedPair>> {
        let start = block * self.block_size;
        let end   = (start + self.block_size).min(self.pairs.len());
        let pairs = &self.pairs[start..end];

        let mut embedded: Vec<EmbeddedPair> = self.pool.install(|| {
            pairs
                .par_iter()
                .enumerate()
                .map(|(offset, pair)| EmbeddedPair {
                    position: start + offset,
                    text1:    self.embedder.embed(&pair.text1, self.maximum_tokens),
                    text2:    self.embedder.embed(&pair.text2, self.maximum_tokens),
                    label:    pair.label,
                })
                .collect()
        });

        // Stable sort, so equal lengths keep their input order
        embedded.sort_by_key(EmbeddedPair::tokens);

        let mut batches = Vec::with_capacity(embedded.len().div_ceil(self.batch_size));
        let mut rest    = embedded.into_iter().peekable();
        while rest.peek().is_some() {
            batches.push(rest.by_ref().take(self.batch_size).collect());
        }

        tracing::trace!("Embedded block {} ({} pairs, {} batches)", block, end - start, batches.len());
        batches
    }

    /// Endless iterator over batches, epoch after epoch.
    /// Yields nothing when there is no data.
    pub fn iter(&self) -> Batches<'_, 'a, E> {
        Batches {
            generator:  self,
            next_block: 0,
            pending:    VecDeque::new(),
        }
    }
}

pub struct Batches<'g, 'a, E> {
    generator:  &'g EmbeddingGenerator<'a, E>,
    next_block: usize,
    pending:    VecDeque<Vec<EmbeddedPair>>,
}

impl<E: TextEmbedder + Sync> Iterator for Batches<'_, '_, E> {
    type Item = Vec<EmbeddedPair>;

    fn next(&mut self) -> Option<Self::Item> {
        let blocks = self.generator.blocks();
        if blocks == 0 {
            return None;
        }
        while self.pending.is_empty() {
            self.pending.extend(self.generator.embed_block(self.next_block));
            self.next_block = (self.next_block + 1) % blocks;
        }
        self.pending.pop_front()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::loader::{load_pairs, tests::resource, ColumnNames};

    /// Splits on whitespace and embeds every token as its
    /// length repeated `size` times.
    pub(crate) struct LengthEmbedder {
        pub size: usize,
    }

    impl TextEmbedder for LengthEmbedder {
        fn embedding_size(&self) -> usize {
            self.size
        }

        fn tokenize(&self, text: &str) -> Vec<String> {
            text.split_whitespace().map(str::to_string).collect()
        }

        fn embed(&self, text: &str, maximum_tokens: usize) -> Vec<Vec<f32>> {
            self.tokenize(text)
                .into_iter()
                .take(maximum_tokens)
                .map(|t| vec![t.len() as f32; self.size])
                .collect()
        }
    }

    fn train() -> Vec<TextPair> {
        load_pairs(resource("train.csv"), &ColumnNames::default(), None).unwrap()
    }

    fn test() -> Vec<TextPair> {
        load_pairs(resource("test.csv"), &ColumnNames::default(), None).unwrap()
    }

    fn batch_sizes(batches: &[Vec<EmbeddedPair>]) -> Vec<usize> {
        batches.iter().map(Vec::len).collect()
    }

    /// Two epochs' worth of batches must repeat exactly.
    fn assert_repeats(batches: &[Vec<EmbeddedPair>], per_epoch: usize) {
        for i in 0..per_epoch {
            assert_eq!(batches[i], batches[i + per_epoch]);
        }
    }

    #[test]
    fn test_small_labeled_data() {
        let (pairs, embedder, pool) = (train(), LengthEmbedder { size: 4 }, parser_pool(Some(2)).unwrap());
        let g = EmbeddingGenerator::new(&pairs, &embedder, &pool, 40);
        assert_eq!(g.batches_per_epoch(), 4);

        let batches: Vec<_> = g.iter().take(8).collect();
        assert_eq!(batch_sizes(&batches), vec![32, 32, 32, 4, 32, 32, 32, 4]);
        assert_repeats(&batches, 4);
        assert!(batches.iter().flatten().all(|p| p.label.is_some()));
        assert!(batches.iter().flatten().flat_map(|p| &p.text1).all(|v| v.len() == 4));
    }

    #[test]
    fn test_big_labeled_data() {
        let (pairs, embedder, pool) = (train(), LengthEmbedder { size: 4 }, parser_pool(None).unwrap());
        let g = EmbeddingGenerator::new(&pairs, &embedder, &pool, 40).with_block_size(50);
        assert_eq!(g.batches_per_epoch(), 4);

        let batches: Vec<_> = g.iter().take(8).collect();
        assert_eq!(batch_sizes(&batches), vec![32, 18, 32, 18, 32, 18, 32, 18]);
        assert_repeats(&batches, 4);
    }

    #[test]
    fn test_small_unlabeled_data() {
        let (pairs, embedder, pool) = (test(), LengthEmbedder { size: 4 }, parser_pool(Some(1)).unwrap());
        let g = EmbeddingGenerator::new(&pairs, &embedder, &pool, 20);
        assert_eq!(g.batches_per_epoch(), 1);

        let batches: Vec<_> = g.iter().take(2).collect();
        assert_eq!(batch_sizes(&batches), vec![9, 9]);
        assert_eq!(batches[0], batches[1]);
        assert!(batches[0].iter().all(|p| p.label.is_none()));
    }

    #[test]
    fn test_maximum_tokens_clips_texts() {
        let (pairs, embedder, pool) = (train(), LengthEmbedder { size: 2 }, parser_pool(Some(1)).unwrap());
        let g = EmbeddingGenerator::new(&pairs, &embedder, &pool, 5);
        let batches: Vec<_> = g.iter().take(4).collect();
        assert!(batches.iter().flatten().all(|p| p.tokens() <= 5));
    }

    #[test]
    fn test_batches_are_sorted_by_length() {
        let (pairs, embedder, pool) = (train(), LengthEmbedder { size: 1 }, parser_pool(Some(1)).unwrap());
        let g = EmbeddingGenerator::new(&pairs, &embedder, &pool, 100);
        let lengths: Vec<usize> = g.iter().take(4).flatten().map(|p| p.tokens()).collect();

        let mut sorted = lengths.clone();
        sorted.sort_unstable();
        assert_eq!(lengths, sorted);
    }

    #[test]
    fn test_every_position_appears_once_per_epoch() {
        let (pairs, embedder, pool) = (train(), LengthEmbedder { size: 1 }, parser_pool(Some(3)).unwrap());
        let g = EmbeddingGenerator::new(&pairs, &embedder, &pool, 40)
            .with_batch_size(7)
            .with_block_size(30);
        let mut positions: Vec<usize> = g
            .iter()
            .take(g.batches_per_epoch())
            .flatten()
            .map(|p| p.position)
            .collect();
        positions.sort_unstable();
        assert_eq!(positions, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_no_data_yields_nothing() {
        let (embedder, pool) = (LengthEmbedder { size: 1 }, parser_pool(Some(1)).unwrap());
        let g = EmbeddingGenerator::new(&[], &embedder, &pool, 10);
        assert_eq!(g.batches_per_epoch(), 0);
        assert!(g.iter().next().is_none());
    }
}
