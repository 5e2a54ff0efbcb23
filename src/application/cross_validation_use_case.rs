// ============================================================
// Layer 2 — CrossValidationUseCase
// ============================================================
// Splits a data file into k shuffled train/validate pairs of
// files. Labels are carried over when the data has them.
//
//   {output}/{prefix}.1.train.csv   {output}/{prefix}.1.validate.csv
//   ...
//   {output}/{prefix}.k.train.csv   {output}/{prefix}.k.validate.csv

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::{
    loader::{load_pairs, write_pairs, ColumnNames},
    partition::cross_validation_partitions,
};

#[derive(Debug, Clone)]
pub struct CrossValidationConfig {
    pub data:             PathBuf,
    /// Portion of each split used for training
    pub fraction:         f64,
    pub k:                usize,
    pub prefix:           String,
    pub output_directory: PathBuf,
    pub columns:          ColumnNames,
    pub samples:          Option<usize>,
    pub seed:             u64,
}

/// Paths of one written split
#[derive(Debug, Clone, PartialEq)]
pub struct SplitFiles {
    pub train:    PathBuf,
    pub validate: PathBuf,
}

pub struct CrossValidationUseCase {
    config: CrossValidationConfig,
}

impl CrossValidationUseCase {
    pub fn new(config: CrossValidationConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<SplitFiles>> {
        let cfg  = &self.config;
        let data = load_pairs(&cfg.data, &cfg.columns, cfg.samples)?;
        let splits = cross_validation_partitions(&data, cfg.fraction, cfg.k, cfg.seed)?;

        fs::create_dir_all(&cfg.output_directory).with_context(|| {
            format!("Cannot create output directory '{}'", cfg.output_directory.display())
        })?;

        let mut files = Vec::with_capacity(splits.len());
        for (i, (train, validate)) in splits.iter().enumerate() {
            let split = SplitFiles {
                train:    cfg.output_directory.join(format!("{}.{}.train.csv", cfg.prefix, i + 1)),
                validate: cfg.output_directory.join(format!("{}.{}.validate.csv", cfg.prefix, i + 1)),
            };
            write_pairs(&split.train, train)?;
            write_pairs(&split.validate, validate)?;
            tracing::info!(
                "Split {}: {} training, {} validation pairs",
                i + 1,
                train.len(),
                validate.len()
            );
            files.push(split);
        }
        Ok(files)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{tests::resource, DataFile};

    fn config(output_directory: PathBuf) -> CrossValidationConfig {
        CrossValidationConfig {
            data:             resource("train.csv"),
            fraction:         0.8,
            k:                3,
            prefix:           "data".into(),
            output_directory,
            columns:          ColumnNames::default(),
            samples:          None,
            seed:             0,
        }
    }

    #[test]
    fn test_writes_k_split_files() {
        let dir   = tempfile::tempdir().unwrap();
        let out   = dir.path().join("splits");
        let files = CrossValidationUseCase::new(config(out.clone())).execute().unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(files[0].train, out.join("data.1.train.csv"));
        assert_eq!(files[2].validate, out.join("data.3.validate.csv"));

        for split in &files {
            let train    = load_pairs(&split.train, &ColumnNames::default(), None).unwrap();
            let validate = load_pairs(&split.validate, &ColumnNames::default(), None).unwrap();
            assert_eq!((train.len(), validate.len()), (80, 20));
            assert!(train.iter().chain(&validate).all(|p| p.label.is_some()));
        }
    }

    #[test]
    fn test_unlabeled_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().to_path_buf());
        cfg.data = resource("test.csv");
        cfg.k    = 2;

        let files = CrossValidationUseCase::new(cfg).execute().unwrap();
        for split in &files {
            let train    = DataFile::load(&split.train).unwrap();
            let validate = DataFile::load(&split.validate).unwrap();
            assert_eq!(train.columns(), ["", "text1", "text2"]);
            assert_eq!(validate.columns(), ["", "text1", "text2"]);
            // round(9 * 0.8) = 7
            assert_eq!((train.len(), validate.len()), (7, 2));
        }
    }

    #[test]
    fn test_first_n_samples() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().to_path_buf());
        cfg.samples = Some(10);
        cfg.k       = 1;

        let files = CrossValidationUseCase::new(cfg).execute().unwrap();
        let train = load_pairs(&files[0].train, &ColumnNames::default(), None).unwrap();
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_invalid_fraction() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().to_path_buf());
        cfg.fraction = 1.5;
        assert!(CrossValidationUseCase::new(cfg).execute().is_err());
    }
}
