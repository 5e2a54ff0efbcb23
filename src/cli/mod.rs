// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with `clap`, hands everything else to
// Layer 2 (application) and prints what comes back.
//
//   bisemantic train             train a new model
//   bisemantic continue          keep training a saved model
//   bisemantic predict           predict with a saved model
//   bisemantic cross-validation  write train/validate splits

pub mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use commands::{Commands, ContinueArgs, CrossValidationArgs, PredictArgs, TrainArgs};

use crate::application::{
    cross_validation_use_case::CrossValidationUseCase,
    predict_use_case::{predictions_csv, PredictUseCase},
    train_use_case::{TrainMode, TrainUseCase, TrainingReport},
};
use crate::infra::history::format_duration;

/// Text pair equivalence detection
#[derive(Parser, Debug)]
#[command(name = "bisemantic", version, about = "Text pair equivalence detector")]
pub struct Cli {
    /// Logging level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "WARNING")]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Default tracing filter for the `--log` level
    pub fn log_directive(&self) -> String {
        match self.log.to_ascii_uppercase().as_str() {
            "DEBUG"              => "debug".to_string(),
            "INFO"               => "info".to_string(),
            "WARNING" | "WARN"   => "warn".to_string(),
            "ERROR" | "CRITICAL" => "error".to_string(),
            _                    => self.log.to_ascii_lowercase(),
        }
    }

    pub fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Train(args))           => run_train(args),
            Some(Commands::Continue(args))        => run_continue(args),
            Some(Commands::Predict(args))         => run_predict(args),
            Some(Commands::CrossValidation(args)) => run_cross_validation(args),
            None => {
                println!("{}", Cli::command().render_usage());
                Ok(())
            }
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let mode   = TrainMode::New(args.model.into());
    let config = args.training.into_config(args.model_directory_name);
    let report = TrainUseCase::new(config, mode).execute()?;
    println!("{}", training_summary(&report));
    Ok(())
}

fn run_continue(args: ContinueArgs) -> Result<()> {
    let config = args.training.into_config(Some(args.model));
    let report = TrainUseCase::new(config, TrainMode::Continue).execute()?;
    println!("{}", training_summary(&report));
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let predictions = PredictUseCase::new(args.into()).execute()?;
    print!("{}", predictions_csv(&predictions)?);
    Ok(())
}

fn run_cross_validation(args: CrossValidationArgs) -> Result<()> {
    let files = CrossValidationUseCase::new(args.into()).execute()?;
    tracing::info!("Wrote {} partitions", files.len());
    Ok(())
}

/// Training time and last-epoch scores
fn training_summary(report: &TrainingReport) -> String {
    let mut lines = vec![format!("Training time {}", format_duration(report.training_time))];
    if let Some(t) = report.history.last_training() {
        lines.push(format!("Training: accuracy={:.4}, loss={:.4}", t.accuracy, t.loss));
    }
    if let Some(v) = report.history.last_validation() {
        lines.push(format!("Validation: accuracy={:.4}, loss={:.4}", v.accuracy, v.loss));
    }
    lines.join("\n")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::Validation;
    use crate::infra::metrics::{EpochMetrics, Evaluation, History};
    use crate::ml::model::EquivalenceModelConfig;
    use clap::error::ErrorKind;
    use std::{path::PathBuf, time::Duration};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("bisemantic").chain(args.iter().copied()))
    }

    #[test]
    fn test_version() {
        let err = parse(&["--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert_eq!(err.to_string(), "bisemantic 1.0.0\n");
    }

    #[test]
    fn test_no_subcommand() {
        let cli = parse(&[]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_directive(), "warn");
    }

    #[test]
    fn test_log_levels() {
        for (level, directive) in [("DEBUG", "debug"), ("info", "info"), ("CRITICAL", "error"), ("trace", "trace")] {
            let cli = parse(&["--log", level]).unwrap();
            assert_eq!(cli.log_directive(), directive);
        }
    }

    #[test]
    fn test_train_arguments() {
        let cli = parse(&[
            "train", "train.csv", "--embeddings", "vectors.txt", "--model", "out",
            "--units", "64", "--dropout", "0.5", "--validation-fraction", "0.2",
            "--parser-threads", "-1", "--text-1-name", "question1",
        ])
        .unwrap();
        let Some(Commands::Train(args)) = cli.command else { panic!("not train") };
        assert_eq!(args.model_directory_name, Some(PathBuf::from("out")));
        assert_eq!(args.model.units, 64);
        assert_eq!(args.model.dropout, Some(0.5));

        let config = args.training.into_config(args.model_directory_name);
        assert_eq!(config.validation, Validation::Fraction(0.2));
        assert_eq!(config.parser.threads, None);
        assert_eq!(config.parser.batch_size, 1000);
        assert_eq!(config.columns.text_1.as_deref(), Some("question1"));
        assert_eq!(config.epochs, 10);
        assert_eq!(config.batch_size, 32);
    }

    #[test]
    fn test_validation_options_conflict() {
        let err = parse(&[
            "train", "train.csv", "--embeddings", "v.txt",
            "--validation-set", "v.csv", "--validation-fraction", "0.2",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_continue_arguments() {
        let cli = parse(&["continue", "train.csv", "model", "--embeddings", "v.txt", "--parser-threads", "4"]).unwrap();
        let Some(Commands::Continue(args)) = cli.command else { panic!("not continue") };
        let config = args.training.into_config(Some(args.model));
        assert_eq!(config.model_directory, Some(PathBuf::from("model")));
        assert_eq!(config.parser.threads, Some(4));
        assert_eq!(config.validation, Validation::None);
    }

    #[test]
    fn test_predict_and_cross_validation_arguments() {
        let cli = parse(&["predict", "model", "test.csv", "--embeddings", "v.txt", "--n", "5"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Predict(PredictArgs { n: Some(5), .. }))));

        let cli = parse(&["cross-validation", "data.csv", "0.8", "5", "--prefix", "fold"]).unwrap();
        let Some(Commands::CrossValidation(args)) = cli.command else { panic!("not cross-validation") };
        assert_eq!((args.fraction, args.k), (0.8, 5));
        assert_eq!(args.prefix, "fold");
        assert_eq!(args.output_directory, PathBuf::from("."));
    }

    #[test]
    fn test_training_summary() {
        let mut history = History::default();
        history.record(&EpochMetrics {
            epoch:      1,
            training:   Evaluation { loss: 0.5, accuracy: 0.75 },
            validation: Some(Evaluation { loss: 0.6, accuracy: 0.5 }),
        });
        let report = TrainingReport {
            model:         EquivalenceModelConfig::new(10, 8, 16),
            samples:       100,
            training_time: Duration::from_millis(65_250),
            history,
        };
        assert_eq!(
            training_summary(&report),
            "Training time 0:01:05.250000\n\
             Training: accuracy=0.7500, loss=0.5000\n\
             Validation: accuracy=0.5000, loss=0.6000"
        );
    }
}
