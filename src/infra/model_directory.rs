// ============================================================
// Layer 6 — Model Directory
// ============================================================
// A trained model is a directory. `train` creates it,
// `continue` reads and updates it, `predict` reads it.
//
//   model/
//     model.json              ← hyper-parameters (rebuilds the network)
//     model.mpk.gz            ← network weights (Burn CompactRecorder)
//     optimizer.mpk.gz        ← Adam moments, so training can resume
//     model.info.txt          ← one-line description of the model
//     training-history.json   ← one entry per training run
//     metrics.csv             ← one row per epoch of every run
//
// The config must be read first: the weights can only be
// loaded into a network with exactly the same architecture.

use anyhow::{anyhow, Context, Result};
use burn::{
    optim::Optimizer,
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::infra::history::TrainingHistory;
use crate::infra::metrics::{History, MetricsLogger};
use crate::ml::model::{EquivalenceModel, EquivalenceModelConfig};

const CONFIG_FILE:    &str = "model.json";
const WEIGHTS_FILE:   &str = "model";
const OPTIMIZER_FILE: &str = "optimizer";
// OPTIMIZER_FILE as written by CompactRecorder
const OPTIMIZER_STATE: &str = "optimizer.mpk.gz";
const INFO_FILE:      &str = "model.info.txt";
const HISTORY_FILE:   &str = "training-history.json";

pub struct ModelDirectory {
    dir: PathBuf,
}

impl ModelDirectory {
    /// Use `dir` for a new model, creating it if needed
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open the directory of a previously trained model
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.join(CONFIG_FILE).is_file() {
            return Err(anyhow!(
                "'{}' is not a model directory. Have you run 'train' first?",
                dir.display()
            ));
        }
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn save_config(&self, config: &EquivalenceModelConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        config
            .save(&path)
            .with_context(|| format!("Cannot write model config '{}'", path.display()))
    }

    pub fn load_config(&self) -> Result<EquivalenceModelConfig> {
        let path = self.dir.join(CONFIG_FILE);
        EquivalenceModelConfig::load(&path)
            .map_err(|e| anyhow!("Cannot read model config '{}': {e}", path.display()))
    }

    /// Save network weights to model.mpk.gz
    pub fn save_model<B: Backend>(&self, model: &EquivalenceModel<B>) -> Result<()> {
        let path = self.dir.join(WEIGHTS_FILE);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;
        tracing::debug!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Load weights into a network built from this directory's config
    pub fn load_model<B: Backend>(
        &self,
        model:  EquivalenceModel<B>,
        device: &B::Device,
    ) -> Result<EquivalenceModel<B>> {
        let path   = self.dir.join(WEIGHTS_FILE);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load model weights '{}'", path.display()))?;
        Ok(model.load_record(record))
    }

    /// Build the network described by model.json and load its weights
    pub fn restore<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(EquivalenceModelConfig, EquivalenceModel<B>)> {
        let config = self.load_config()?;
        let model  = self.load_model(config.init::<B>(device), device)?;
        tracing::info!("Restored {}", config.description());
        Ok((config, model))
    }

    pub fn save_optimizer<B, O>(&self, optim: &O) -> Result<()>
    where
        B: AutodiffBackend,
        O: Optimizer<EquivalenceModel<B>, B>,
    {
        let path = self.dir.join(OPTIMIZER_FILE);
        <CompactRecorder as Recorder<B>>::record(&CompactRecorder::new(), optim.to_record(), path.clone())
            .with_context(|| format!("Failed to save optimizer state to '{}'", path.display()))
    }

    /// Restore the optimizer state if one was saved; otherwise the
    /// optimizer is returned unchanged. A state file that cannot be
    /// read is an error.
    pub fn load_optimizer<B, O>(&self, optim: O, device: &B::Device) -> Result<O>
    where
        B: AutodiffBackend,
        O: Optimizer<EquivalenceModel<B>, B>,
    {
        if !self.dir.join(OPTIMIZER_STATE).is_file() {
            tracing::warn!(
                "No optimizer state in '{}'; starting with a fresh optimizer",
                self.dir.display()
            );
            return Ok(optim);
        }
        let path   = self.dir.join(OPTIMIZER_FILE);
        let record = <CompactRecorder as Recorder<B>>::load(&CompactRecorder::new(), path.clone(), device)
            .with_context(|| format!("Cannot load optimizer state '{}'", path.display()))?;
        Ok(optim.load_record(record))
    }

    /// Write model.info.txt
    pub fn save_info(&self, config: &EquivalenceModelConfig) -> Result<()> {
        let path = self.dir.join(INFO_FILE);
        fs::write(&path, format!("{}\n", config.description()))
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    pub fn training_history(&self) -> Result<TrainingHistory> {
        TrainingHistory::load_or_default(self.history_path())
    }

    /// Append a run to training-history.json
    pub fn update_history(
        &self,
        training_time: Duration,
        samples:       usize,
        history:       History,
    ) -> Result<TrainingHistory> {
        let mut training_history = self.training_history()?;
        training_history.add_run(training_time, samples, history);
        training_history.save(self.history_path())?;
        Ok(training_history)
    }

    /// Metrics logger for the next training run
    pub fn metrics_logger(&self) -> Result<MetricsLogger> {
        let run = self.training_history()?.runs().len() + 1;
        MetricsLogger::new(&self.dir, run)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::{AdamConfig, GradientsParams};
    use burn::tensor::Distribution;

    type TestBackend = NdArray;
    type Train       = Autodiff<TestBackend>;

    #[test]
    fn test_serialization() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let config = EquivalenceModelConfig::new(40, 8, 16).with_dropout(Some(0.5));
        let model  = config.init::<TestBackend>(&device);

        let directory = ModelDirectory::create(dir.path().join("model")).unwrap();
        directory.save_config(&config).unwrap();
        directory.save_model(&model).unwrap();
        directory.save_info(&config).unwrap();
        assert!(directory.path().join("model.mpk.gz").is_file());

        let reopened = ModelDirectory::open(directory.path()).unwrap();
        let (loaded_config, loaded) = reopened.restore::<TestBackend>(&device).unwrap();
        assert_eq!(loaded_config.maximum_tokens, 40);
        assert_eq!(loaded_config.embedding_size, 8);
        assert_eq!(loaded_config.lstm_units, 16);
        assert_eq!(loaded_config.dropout, Some(0.5));

        let text = Tensor::<TestBackend, 3>::ones([1, 3, 8], &device);
        let before: Vec<f32> = model.forward(text.clone(), text.clone()).into_data().iter::<f32>().collect();
        let after:  Vec<f32> = loaded.forward(text.clone(), text).into_data().iter::<f32>().collect();
        for (a, b) in before.iter().zip(&after) {
            // Compact records store half precision
            assert!((a - b).abs() < 1e-2, "{a} != {b}");
        }

        let info = std::fs::read_to_string(directory.path().join("model.info.txt")).unwrap();
        assert_eq!(info.trim(), config.description());
    }

    #[test]
    fn test_open_requires_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ModelDirectory::open(dir.path()).is_err());
    }

    /// One step on random input, so the optimizer holds state
    fn step<O: Optimizer<EquivalenceModel<Train>, Train>>(mut optim: O) -> O {
        let device = Default::default();
        let model  = EquivalenceModelConfig::new(3, 2, 4).init::<Train>(&device);

        let text   = Tensor::<Train, 3>::random([2, 3, 2], Distribution::Default, &device);
        let labels = Tensor::<Train, 1, Int>::from_ints([0, 1], &device);
        let (loss, _) = model.forward_loss(text.clone(), text, labels);
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        let _ = optim.step(1e-3, model, grads);
        optim
    }

    #[test]
    fn test_missing_optimizer_state_keeps_optimizer() {
        let dir       = tempfile::tempdir().unwrap();
        let directory = ModelDirectory::create(dir.path()).unwrap();
        let optim     = AdamConfig::new().init::<Train, EquivalenceModel<Train>>();
        let optim     = directory.load_optimizer::<Train, _>(optim, &Default::default()).unwrap();
        assert!(optim.to_record().is_empty());
    }

    #[test]
    fn test_saved_optimizer_state_is_restored() {
        let dir       = tempfile::tempdir().unwrap();
        let directory = ModelDirectory::create(dir.path()).unwrap();

        let trained = step(AdamConfig::new().init::<Train, EquivalenceModel<Train>>());
        let saved   = trained.to_record().len();
        assert!(saved > 0);
        directory.save_optimizer::<Train, _>(&trained).unwrap();

        let fresh    = AdamConfig::new().init::<Train, EquivalenceModel<Train>>();
        let restored = directory.load_optimizer::<Train, _>(fresh, &Default::default()).unwrap();
        assert_eq!(restored.to_record().len(), saved);
    }

    #[test]
    fn test_corrupt_optimizer_state_fails() {
        let dir       = tempfile::tempdir().unwrap();
        let directory = ModelDirectory::create(dir.path()).unwrap();
        std::fs::write(dir.path().join("optimizer.mpk.gz"), b"not a record").unwrap();

        let optim = AdamConfig::new().init::<Train, EquivalenceModel<Train>>();
        assert!(directory.load_optimizer::<Train, _>(optim, &Default::default()).is_err());
    }

    #[test]
    fn test_history_runs_accumulate() {
        let dir       = tempfile::tempdir().unwrap();
        let directory = ModelDirectory::create(dir.path()).unwrap();

        directory.update_history(Duration::from_secs(2), 10, History::default()).unwrap();
        let history = directory.update_history(Duration::from_secs(2), 10, History::default()).unwrap();
        assert_eq!(history.to_string(), "Training history, 2 runs");
        assert_eq!(directory.training_history().unwrap().runs().len(), 2);
    }
}
