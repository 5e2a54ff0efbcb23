use thiserror::Error;

/// Failures in reading or reshaping text-pair data that callers
/// may want to tell apart.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("Missing column {0}")]
    MissingColumn(String),

    #[error("Invalid label '{value}' in row {row}")]
    InvalidLabel { row: usize, value: String },

    #[error("{0} has no label column")]
    Unlabeled(String),

    #[error("Fraction {0} is not between 0 and 1")]
    InvalidFraction(f64),
}
