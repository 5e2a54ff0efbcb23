// ============================================================
// Layer 3 — TextPair Domain Type
// ============================================================
// One row of a data file after its columns have been mapped
// to text1 / text2 / label.
//
//   text1: "The cat saw a dog."
//   text2: "The cat noticed a dog."
//   label: Some(true)   → equivalent
//          Some(false)  → not equivalent
//          None         → unlabeled (test data)

use serde::{Deserialize, Serialize};

/// A pair of texts whose equivalence is known or to be predicted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPair {
    /// Position of the row in the file it was read from.
    /// Survives null-dropping and shuffling so partitions and
    /// predictions can be traced back to the source data.
    pub index: usize,

    pub text1: String,
    pub text2: String,

    /// `None` for unlabeled data
    pub label: Option<bool>,
}

impl TextPair {
    pub fn new(
        index: usize,
        text1: impl Into<String>,
        text2: impl Into<String>,
        label: Option<bool>,
    ) -> Self {
        Self {
            index,
            text1: text1.into(),
            text2: text2.into(),
            label,
        }
    }

    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }
}

/// True when every pair carries a label. An empty slice counts as labeled.
pub fn all_labeled(pairs: &[TextPair]) -> bool {
    pairs.iter().all(TextPair::is_labeled)
}
