// ============================================================
// Layer 6 — Pretrained Word Vectors
// ============================================================
// Loads a table of pretrained word embeddings and uses it to
// turn text into one vector per token.
//
// Accepted file format (GloVe / word2vec text):
//
//   400000 300                    ← optional "count size" header
//   the 0.0418 0.2498 -0.4124 ...
//   cat 0.2309 0.2828 0.6318 ...
//
// Tokens come from the `tokenizers` whitespace pre-tokenizer,
// which splits on word boundaries and keeps punctuation runs
// as their own tokens:
//
//   "The cat sat." → ["The", "cat", "sat", "."]
//
// A token is looked up as written, then lowercased. Tokens
// missing from the table embed as zero vectors.

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use thiserror::Error;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

use crate::domain::traits::TextEmbedder;

#[derive(Debug, Error, PartialEq)]
pub enum EmbeddingError {
    #[error("line {line} has {found} values, expected {expected}")]
    Dimension { line: usize, expected: usize, found: usize },

    #[error("line {line}: '{token}' is not a number")]
    Parse { line: usize, token: String },

    #[error("no word vectors found")]
    Empty,
}

pub struct WordVectors {
    vectors:  HashMap<String, Vec<f32>>,
    size:     usize,
    splitter: Whitespace,
}

impl WordVectors {
    /// Load word vectors from a text file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading word vectors from '{}'", path.display());

        let file = File::open(path)
            .with_context(|| format!("Cannot open word vectors '{}'", path.display()))?;
        let vectors = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Cannot read word vectors '{}'", path.display()))?;

        tracing::info!(
            "Loaded {} word vectors of size {}",
            vectors.len(),
            vectors.size
        );
        Ok(vectors)
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut vectors = HashMap::new();
        let mut size    = 0usize;

        for (n, line) in reader.lines().enumerate() {
            let line   = line?;
            let number = n + 1;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else { continue };
            let values: Vec<&str> = fields.collect();

            if n == 0 && is_header(word, &values) {
                continue;
            }

            let vector = values
                .iter()
                .map(|v| {
                    v.parse::<f32>().map_err(|_| EmbeddingError::Parse {
                        line:  number,
                        token: v.to_string(),
                    })
                })
                .collect::<Result<Vec<f32>, _>>()?;

            if size == 0 {
                size = vector.len();
            }
            if vector.is_empty() || vector.len() != size {
                return Err(EmbeddingError::Dimension {
                    line:     number,
                    expected: size,
                    found:    vector.len(),
                }
                .into());
            }

            vectors.insert(word.to_string(), vector);
        }

        if vectors.is_empty() {
            return Err(EmbeddingError::Empty.into());
        }

        Ok(Self { vectors, size, splitter: Whitespace {} })
    }

    /// Number of words in the table
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn lookup(&self, token: &str) -> Option<&Vec<f32>> {
        self.vectors
            .get(token)
            .or_else(|| self.vectors.get(&token.to_lowercase()))
    }
}

/// word2vec files start with "<count> <size>"
fn is_header(word: &str, values: &[&str]) -> bool {
    values.len() == 1 && word.parse::<usize>().is_ok() && values[0].parse::<usize>().is_ok()
}

// The table itself is too big to print
impl fmt::Debug for WordVectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordVectors")
            .field("words", &self.vectors.len())
            .field("size", &self.size)
            .finish()
    }
}

impl TextEmbedder for WordVectors {
    fn embedding_size(&self) -> usize {
        self.size
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut pretokenized = PreTokenizedString::from(text);
        if let Err(e) = self.splitter.pre_tokenize(&mut pretokenized) {
            tracing::warn!("Falling back to whitespace split: {e}");
            return text.split_whitespace().map(str::to_string).collect();
        }
        pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(token, _, _)| token.to_string())
            .collect()
    }

    fn embed(&self, text: &str, maximum_tokens: usize) -> Vec<Vec<f32>> {
        self.tokenize(text)
            .iter()
            .take(maximum_tokens)
            .map(|token| {
                self.lookup(token)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.size])
            })
            .collect()
    }
}
