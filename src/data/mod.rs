// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a CSV file on disk and tensor batches.
//
//   CSV file
//       │
//       ▼
//   DataFile          → reads rows, drops rows with nulls
//       │
//       ▼
//   fix_columns       → maps columns to text1 / text2 / label
//       │
//       ▼
//   partition         → shuffled train / validate splits
//       │
//       ▼
//   EmbeddingGenerator→ embeds blocks of pairs, buckets by length
//       │
//       ▼
//   PairBatcher       → pads and stacks a bucket into tensors

/// CSV loading, column mapping and writing
pub mod loader;

/// Cross-validation partitions
pub mod partition;

/// Length-bucketed embedding batches that cycle over epochs
pub mod generator;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Data-layer error type
pub mod error;
