// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Files on disk that outlive a single command:
//
//   embeddings.rs      — Pretrained word vectors
//                        Reads a GloVe / word2vec text file and
//                        embeds tokenized text.
//
//   model_directory.rs — Everything a trained model leaves behind
//                        Model config, weights, optimizer state
//                        and a human-readable description.
//
//   history.rs         — training-history.json, one entry per run
//
//   metrics.rs         — Per-epoch metrics and metrics.csv

/// Word vectors and tokenization
pub mod embeddings;

/// Model saving and loading
pub mod model_directory;

/// Training run history
pub mod history;

/// Training metrics and CSV logger
pub mod metrics;
