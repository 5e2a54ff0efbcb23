// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The generator and the model only need "something that turns
// text into one vector per token". The word-vector file in
// Layer 6 is one implementation; tests use a tiny fake.

/// Any component that embeds text as a sequence of token vectors.
///
/// Implementations:
///   - WordVectors → pretrained GloVe / word2vec text files
pub trait TextEmbedder {
    /// Length of every vector returned by `embed`
    fn embedding_size(&self) -> usize;

    /// Split a text into tokens
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Embed the first `maximum_tokens` tokens of a text.
    /// The result has one row per token, each `embedding_size` long.
    fn embed(&self, text: &str, maximum_tokens: usize) -> Vec<Vec<f32>>;

    /// Number of tokens in a text
    fn token_count(&self, text: &str) -> usize {
        self.tokenize(text).len()
    }
}
