//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NbtreeError {
    #[error("source path '{}' does not exist or is not a directory", .0.display())]
    InvalidSource(PathBuf),
    #[error("notebook '{}' does not exist or is not a file", .0.display())]
    InvalidNotebook(PathBuf),
    #[error("preamble file '{}' does not exist", .0.display())]
    MissingPreamble(PathBuf),
    #[error("no file path and code pairs found in '{}'", .0.display())]
    NoRecords(PathBuf),
    #[error("i/o error on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse notebook '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl NbtreeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NbtreeError::Io {
            path: path.into(),
            source,
        }
    }
}
