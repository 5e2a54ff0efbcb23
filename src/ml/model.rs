// ============================================================
// Layer 5 — Textual Equivalence Model (Burn)
// ============================================================
//
//   text1 [batch, tokens, embedding]     text2 [batch, tokens, embedding]
//          │                                    │
//          ▼                                    ▼
//        LSTM  ──────────── shared weights ──── LSTM
//          │ final hidden state                 │ final hidden state
//          ▼                                    ▼
//          └────────────── concatenate ─────────┘
//                              │  [batch, 2 * units]
//                              ▼
//                           dropout
//                              │
//                              ▼
//                     linear → 2 logits
//                     (0 = not equivalent, 1 = equivalent)

use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone, Display and
// Serialize/Deserialize — do NOT add them again.
#[derive(Config, Debug)]
pub struct EquivalenceModelConfig {
    /// Texts are clipped to this many tokens
    pub maximum_tokens: usize,
    /// Size of the word vectors fed to the LSTM
    pub embedding_size: usize,
    /// LSTM hidden layer size
    pub lstm_units:     usize,
    /// Dropout rate before the classifier, `None` for no dropout
    pub dropout:        Option<f64>,
}

impl EquivalenceModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> EquivalenceModel<B> {
        let encoder    = LstmConfig::new(self.embedding_size, self.lstm_units, true).init(device);
        let dropout    = DropoutConfig::new(self.dropout.unwrap_or(0.0)).init();
        let classifier = LinearConfig::new(2 * self.lstm_units, 2).init(device);
        EquivalenceModel { encoder, dropout, classifier }
    }

    /// Hyper-parameters as a JSON object
    pub fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "maximum_tokens": self.maximum_tokens,
            "embedding_size": self.embedding_size,
            "lstm_units":     self.lstm_units,
            "dropout":        self.dropout,
        })
    }

    /// One-line summary, also written to model.info.txt
    pub fn description(&self) -> String {
        let dropout = match self.dropout {
            Some(rate) => format!("dropout = {rate:.2}"),
            None       => "No dropout".to_string(),
        };
        format!(
            "TextualEquivalenceModel(LSTM units = {}, maximum tokens = {}, embedding size = {}, {})",
            self.lstm_units, self.maximum_tokens, self.embedding_size, dropout
        )
    }
}

#[derive(Module, Debug)]
pub struct EquivalenceModel<B: Backend> {
    pub encoder:    Lstm<B>,
    pub dropout:    Dropout,
    pub classifier: Linear<B>,
}

impl<B: Backend> EquivalenceModel<B> {
    /// [batch, tokens, embedding] → final hidden state [batch, units]
    fn encode(&self, text: Tensor<B, 3>) -> Tensor<B, 2> {
        let (_, state) = self.encoder.forward(text, None);
        state.hidden
    }

    /// text1, text2: [batch, tokens, embedding] → logits: [batch, 2]
    pub fn forward(&self, text1: Tensor<B, 3>, text2: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = Tensor::cat(vec![self.encode(text1), self.encode(text2)], 1);
        let x = self.dropout.forward(x);
        self.classifier.forward(x)
    }

    pub fn forward_loss(
        &self,
        text1:  Tensor<B, 3>,
        text2:  Tensor<B, 3>,
        labels: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(text1, text2);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);
        (loss, logits)
    }
}

/// Most likely class per row: [batch, 2] → [batch]
pub fn predicted_classes<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    // argmax(1) returns [batch, 1]
    logits.argmax(1).flatten::<1>(0, 1)
}

/// Number of rows whose most likely class matches the label
pub fn correct_predictions<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    predicted_classes(logits)
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}
