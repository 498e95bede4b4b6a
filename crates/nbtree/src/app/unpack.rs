//! Writing reconstructed files back to disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::app::extract::extract;
use crate::domain::errors::NbtreeError;
use crate::domain::model::{Document, FileRecord};

/// Policy applied when a record's target file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Write every record, replacing existing files.
    Always,
    /// Leave byte-identical files alone; overwrite the rest.
    SkipUnchanged,
    /// Ask before replacing any existing file.
    Confirm,
    /// Leave identical files alone and ask before replacing changed ones.
    #[default]
    SkipUnchangedThenConfirm,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Always => "always",
            WriteMode::SkipUnchanged => "skip-unchanged",
            WriteMode::Confirm => "confirm",
            WriteMode::SkipUnchangedThenConfirm => "skip-unchanged-then-confirm",
        }
    }

    fn skips_unchanged(&self) -> bool {
        matches!(
            self,
            WriteMode::SkipUnchanged | WriteMode::SkipUnchangedThenConfirm
        )
    }

    fn confirms(&self) -> bool {
        matches!(self, WriteMode::Confirm | WriteMode::SkipUnchangedThenConfirm)
    }
}

impl FromStr for WriteMode {
    type Err = WriteModeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" | "unconditional" | "force" => Ok(WriteMode::Always),
            "skip-unchanged" => Ok(WriteMode::SkipUnchanged),
            "confirm" | "confirm-overwrite" => Ok(WriteMode::Confirm),
            "skip-unchanged-then-confirm" => Ok(WriteMode::SkipUnchangedThenConfirm),
            other => Err(WriteModeParseError::UnknownMode(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`WriteMode`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum WriteModeParseError {
    #[error("unknown write mode '{0}'")]
    UnknownMode(String),
}

/// What to do when a notebook yields no file records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum EmptyResultPolicy {
    /// Report that nothing was found and finish successfully.
    #[default]
    Succeed,
    /// Treat an empty notebook as an error.
    Fail,
}

/// Decides whether an existing file may be overwritten.
pub trait Confirm {
    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool, NbtreeError>;
}

impl<F> Confirm for F
where
    F: FnMut(&Path) -> Result<bool, NbtreeError>,
{
    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool, NbtreeError> {
        self(path)
    }
}

/// Result of writing a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
    Declined,
}

/// Tally of outcomes across an unpack run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub declined: Vec<PathBuf>,
}

impl UnpackReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.unchanged.len() + self.declined.len()
    }
}

/// Runtime options for [`unpack`].
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    pub target_root: PathBuf,
    pub mode: WriteMode,
    pub on_empty: EmptyResultPolicy,
}

impl UnpackOptions {
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        Self {
            target_root: target_root.into(),
            mode: WriteMode::default(),
            on_empty: EmptyResultPolicy::default(),
        }
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_on_empty(mut self, on_empty: EmptyResultPolicy) -> Self {
        self.on_empty = on_empty;
        self
    }
}

/// Extract every record from `document` and write it under the target root.
///
/// `source` only labels the error raised when the policy rejects an empty result.
pub fn unpack(
    document: &Document,
    source: &Path,
    options: &UnpackOptions,
    confirmer: &mut dyn Confirm,
) -> Result<UnpackReport, NbtreeError> {
    let records = extract(document);
    if records.is_empty() {
        return match options.on_empty {
            EmptyResultPolicy::Succeed => {
                tracing::info!(notebook = %source.display(), "no file records found");
                Ok(UnpackReport::default())
            }
            EmptyResultPolicy::Fail => Err(NbtreeError::NoRecords(source.to_path_buf())),
        };
    }

    let mut report = UnpackReport::default();
    for record in &records {
        let path = options.target_root.join(&record.path);
        match write_record(&options.target_root, record, options.mode, confirmer)? {
            WriteOutcome::Written => report.written.push(path),
            WriteOutcome::Unchanged => report.unchanged.push(path),
            WriteOutcome::Declined => report.declined.push(path),
        }
    }
    Ok(report)
}

/// Write one record beneath `target_root`, honouring the overwrite policy.
pub fn write_record(
    target_root: &Path,
    record: &FileRecord,
    mode: WriteMode,
    confirmer: &mut dyn Confirm,
) -> Result<WriteOutcome, NbtreeError> {
    let path = target_root.join(&record.path);

    if path.is_file() {
        if mode.skips_unchanged() {
            let existing = fs::read(&path).map_err(|err| NbtreeError::io(&path, err))?;
            if existing == record.content.as_bytes() {
                tracing::debug!(path = %path.display(), "unchanged, skipping");
                return Ok(WriteOutcome::Unchanged);
            }
        }
        if mode.confirms() && !confirmer.confirm_overwrite(&path)? {
            tracing::info!(path = %path.display(), "skipped writing");
            return Ok(WriteOutcome::Declined);
        }
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| NbtreeError::io(parent, err))?;
    }
    fs::write(&path, &record.content).map_err(|err| NbtreeError::io(&path, err))?;
    tracing::info!(path = %path.display(), "wrote file");
    Ok(WriteOutcome::Written)
}
