// ============================================================
// Layer 6 — Training Metrics
// ============================================================
// Per-epoch numbers produced by the training loop, the history
// of one training run, and a CSV log of every epoch.
//
// Output file: <model directory>/metrics.csv
//
//   run,epoch,loss,accuracy,val_loss,val_accuracy
//   1,1,0.693100,0.512500,0.690200,0.550000
//   1,2,0.671800,0.600000,0.684400,0.600000
//   2,1,0.650300,0.637500,,
//
// Rows from later runs (the `continue` command) are appended
// to the same file. Validation columns stay empty when a run
// had no validation data.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fs::OpenOptions, path::{Path, PathBuf}};

/// Loss and accuracy over one pass through a data set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
}

/// Everything measured in one training epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch:      usize,
    pub training:   Evaluation,
    pub validation: Option<Evaluation>,
}

/// Per-epoch values of one training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default, deserialize_with = "scores")]
    pub acc: Vec<f64>,
    #[serde(default, deserialize_with = "scores")]
    pub loss: Vec<f64>,
    #[serde(default, deserialize_with = "scores", skip_serializing_if = "Vec::is_empty")]
    pub val_acc: Vec<f64>,
    #[serde(default, deserialize_with = "scores", skip_serializing_if = "Vec::is_empty")]
    pub val_loss: Vec<f64>,
}

// JSON has no NaN: a diverged loss is written as null
fn scores<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    let values = Vec::<Option<f64>>::deserialize(deserializer)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

impl History {
    pub fn record(&mut self, m: &EpochMetrics) {
        self.acc.push(m.training.accuracy);
        self.loss.push(m.training.loss);
        if let Some(v) = m.validation {
            self.val_acc.push(v.accuracy);
            self.val_loss.push(v.loss);
        }
    }

    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    /// Training scores of the final epoch
    pub fn last_training(&self) -> Option<Evaluation> {
        Some(Evaluation {
            loss:     *self.loss.last()?,
            accuracy: *self.acc.last()?,
        })
    }

    /// Validation scores of the final epoch
    pub fn last_validation(&self) -> Option<Evaluation> {
        Some(Evaluation {
            loss:     *self.val_loss.last()?,
            accuracy: *self.val_acc.last()?,
        })
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
    run:      usize,
}

impl MetricsLogger {
    /// Log into `<dir>/metrics.csv`, tagging rows with `run`.
    /// The header is written only when the file is new.
    pub fn new(dir: impl AsRef<Path>, run: usize) -> Result<Self> {
        let csv_path = dir.as_ref().join("metrics.csv");

        if !csv_path.exists() {
            let mut w = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            w.write_record(["run", "epoch", "loss", "accuracy", "val_loss", "val_accuracy"])?;
            w.flush()?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path, run })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        let (val_loss, val_accuracy) = match m.validation {
            Some(v) => (format!("{:.6}", v.loss), format!("{:.6}", v.accuracy)),
            None    => (String::new(), String::new()),
        };
        w.write_record([
            self.run.to_string(),
            m.epoch.to_string(),
            format!("{:.6}", m.training.loss),
            format!("{:.6}", m.training.accuracy),
            val_loss,
            val_accuracy,
        ])?;
        w.flush()?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
