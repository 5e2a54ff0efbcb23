// ============================================================
// Layer 6 — Training History
// ============================================================
// Record of every training run made on a model: when it ran,
// how long it took, how many samples it saw and the per-epoch
// scores. Stored as <model directory>/training-history.json:
//
//   [
//       {
//           "history": { "acc": [...], "loss": [...], ... },
//           "run-date": "2026-10-17 09:12:44",
//           "samples": 80,
//           "training-time": "0:00:03.512204"
//       }
//   ]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, time::Duration};

use crate::infra::metrics::History;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRun {
    pub history: History,
    #[serde(rename = "run-date")]
    pub run_date: String,
    pub samples: usize,
    #[serde(rename = "training-time")]
    pub training_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingHistory {
    runs: Vec<TrainingRun>,
}

impl TrainingHistory {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read training history '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed training history '{}'", path.display()))
    }

    /// Load the history if the file exists, otherwise start a new one
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn add_run(&mut self, training_time: Duration, samples: usize, history: History) {
        self.runs.push(TrainingRun {
            history,
            run_date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            samples,
            training_time: format_duration(training_time),
        });
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(&self.runs)?)
            .with_context(|| format!("Cannot write training history '{}'", path.display()))
    }

    pub fn runs(&self) -> &[TrainingRun] {
        &self.runs
    }
}

impl fmt::Display for TrainingHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Training history, {} runs", self.runs.len())
    }
}

/// Format a duration as `H:MM:SS` with microseconds when non-zero,
/// e.g. `0:01:05.250000`. Whole days are written in front:
/// `2 days, 3:00:00`.
pub fn format_duration(d: Duration) -> String {
    let total   = d.as_secs();
    let days    = total / 86_400;
    let hours   = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    let micros  = d.subsec_micros();

    let mut s = match days {
        0 => String::new(),
        1 => "1 day, ".to_string(),
        n => format!("{n} days, "),
    };
    s.push_str(&format!("{hours}:{minutes:02}:{seconds:02}"));
    if micros > 0 {
        s.push_str(&format!(".{micros:06}"));
    }
    s
}
