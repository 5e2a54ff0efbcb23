// ============================================================
// Layer 4 — Data File Loader
// ============================================================
// Reads a CSV of text pairs into memory.
//
// A data file is any CSV with a header row. Training data has
// three relevant columns, test data two:
//
//   text1,text2,label
//   The cat saw a dog.,The cat noticed a dog.,1
//
// Columns may be called something else; ColumnNames maps them
// onto text1 / text2 / label. Extra columns are ignored.
//
// A field left empty is a null. Any row containing a null is
// dropped when the file is loaded.

use anyhow::{Context, Result};
use std::path::Path;

use crate::data::error::DataError;
use crate::domain::text_pair::{all_labeled, TextPair};

pub const TEXT_1: &str = "text1";
pub const TEXT_2: &str = "text2";
pub const LABEL: &str = "label";

/// Optional renames for the three columns the model reads.
/// `None` means the file already uses the standard name.
#[derive(Debug, Clone, Default)]
pub struct ColumnNames {
    pub text_1: Option<String>,
    pub text_2: Option<String>,
    pub label:  Option<String>,
}

/// A CSV file held in memory with its null rows removed.
#[derive(Debug, Clone)]
pub struct DataFile {
    columns: Vec<String>,
    /// (row position in the file, fields)
    rows: Vec<(usize, Vec<String>)>,
}

impl DataFile {
    /// Load a data file, dropping every row that has an empty field.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Cannot open data file '{}'", path.display()))?;

        let columns: Vec<String> = reader
            .headers()
            .with_context(|| format!("Cannot read header of '{}'", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows  = Vec::new();
        let mut total = 0usize;

        for (index, record) in reader.records().enumerate() {
            let record = record
                .with_context(|| format!("Malformed row {} in '{}'", index + 1, path.display()))?;
            total += 1;

            if record.iter().any(str::is_empty) {
                continue;
            }
            rows.push((index, record.iter().map(str::to_string).collect()));
        }

        let dropped = total - rows.len();
        if dropped > 0 {
            tracing::info!(
                "Dropped {} lines with null values from {}",
                dropped,
                path.display()
            );
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only the first `n` rows. `None` keeps everything.
    pub fn head(mut self, n: Option<usize>) -> Self {
        if let Some(n) = n {
            self.rows.truncate(n);
        }
        self
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Map the file's columns onto text pairs.
    ///
    /// Every rename given must name an existing column. The label
    /// column is optional: without it the pairs are unlabeled.
    pub fn fix_columns(&self, names: &ColumnNames) -> Result<Vec<TextPair>, DataError> {
        for name in [&names.text_1, &names.text_2, &names.label].into_iter().flatten() {
            if self.position(name).is_none() {
                return Err(DataError::MissingColumn(name.clone()));
            }
        }

        let required = |rename: &Option<String>, standard: &str| {
            let name = rename.as_deref().unwrap_or(standard);
            self.position(name)
                .ok_or_else(|| DataError::MissingColumn(name.to_string()))
        };
        let text_1 = required(&names.text_1, TEXT_1)?;
        let text_2 = required(&names.text_2, TEXT_2)?;
        let label  = self.position(names.label.as_deref().unwrap_or(LABEL));

        self.rows
            .iter()
            .map(|(index, fields)| -> Result<TextPair, DataError> {
                let label = match label {
                    Some(column) => Some(parse_label(&fields[column]).ok_or_else(|| {
                        DataError::InvalidLabel {
                            row:   *index,
                            value: fields[column].clone(),
                        }
                    })?),
                    None => None,
                };
                Ok(TextPair::new(
                    *index,
                    fields[text_1].as_str(),
                    fields[text_2].as_str(),
                    label,
                ))
            })
            .collect()
    }
}

/// Load a data file, limit it to `n` rows and map its columns.
pub fn load_pairs(
    path:  impl AsRef<Path>,
    names: &ColumnNames,
    n:     Option<usize>,
) -> Result<Vec<TextPair>> {
    let path  = path.as_ref();
    let pairs = DataFile::load(path)?
        .head(n)
        .fix_columns(names)
        .with_context(|| format!("Cannot use data in '{}'", path.display()))?;
    tracing::debug!("Loaded {} pairs from '{}'", pairs.len(), path.display());
    Ok(pairs)
}

/// Like `load_pairs`, but every row must carry a label.
pub fn load_labeled_pairs(
    path:  impl AsRef<Path>,
    names: &ColumnNames,
    n:     Option<usize>,
) -> Result<Vec<TextPair>> {
    let path  = path.as_ref();
    let pairs = load_pairs(path, names, n)?;
    if !all_labeled(&pairs) {
        return Err(DataError::Unlabeled(path.display().to_string()).into());
    }
    Ok(pairs)
}

/// Write pairs as CSV. The first, unnamed column holds each
/// pair's original row index; the label column is written only
/// when every pair has a label.
pub fn write_pairs(path: impl AsRef<Path>, pairs: &[TextPair]) -> Result<()> {
    let path    = path.as_ref();
    let labeled = all_labeled(pairs);
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;

    if labeled {
        writer.write_record(["", TEXT_1, TEXT_2, LABEL])?;
    } else {
        writer.write_record(["", TEXT_1, TEXT_2])?;
    }

    for pair in pairs {
        let index = pair.index.to_string();
        match pair.label {
            Some(label) if labeled => writer.write_record([
                index.as_str(),
                pair.text1.as_str(),
                pair.text2.as_str(),
                if label { "1" } else { "0" },
            ])?,
            _ => writer.write_record([index.as_str(), pair.text1.as_str(), pair.text2.as_str()])?,
        }
    }

    writer.flush()?;
    Ok(())
}

fn parse_label(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true"  => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}
