//! Packing a source tree into a notebook document.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::extract::format_heading;
use crate::app::scan::{IgnoreSet, scan};
use crate::domain::model::{Document, Entry};
use crate::infra::notebook::{NOTEBOOK_EXTENSION, write_notebook};

/// Runtime options controlling what gets packed.
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    pub ignore: IgnoreSet,
    /// Text placed in a leading markdown cell, before any file.
    pub preamble: Option<String>,
    /// Prefix heading paths with the root directory's own name.
    pub include_root_name: bool,
}

impl PackOptions {
    pub fn new(ignore: IgnoreSet) -> Self {
        Self {
            ignore,
            ..Self::default()
        }
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    pub fn with_root_name(mut self, include: bool) -> Self {
        self.include_root_name = include;
        self
    }
}

/// Summary of a pack run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    /// Heading paths in the order they were emitted.
    pub packed: Vec<String>,
    /// Files left out: unreadable as text, or named with a line break.
    pub skipped: Vec<PathBuf>,
    pub cells: usize,
}

#[derive(Debug, Clone)]
pub struct PackOutput {
    pub document: Document,
    pub report: PackReport,
}

/// Build a document from every non-ignored file under `root`.
///
/// Files that cannot be read as UTF-8 text, or whose path contains a line
/// break and so cannot be written on a single heading line, are logged and
/// left out.
pub fn pack(root: &Path, options: &PackOptions) -> Result<PackOutput> {
    let files = scan(root, &options.ignore)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    let prefix = if options.include_root_name {
        root_name(root)
    } else {
        None
    };

    let mut document = Document::new();
    let mut report = PackReport::default();

    if let Some(preamble) = &options.preamble {
        document.push(Entry::Heading(preamble.clone()));
    }

    for file in files {
        let heading_path = match &prefix {
            Some(prefix) => format!("{prefix}/{}", file.display_path),
            None => file.display_path,
        };
        if heading_path.contains(['\n', '\r']) {
            tracing::warn!(path = %file.path.display(), "skipping file with a line break in its name");
            report.skipped.push(file.path);
            continue;
        }

        let content = match fs::read_to_string(&file.path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %file.path.display(), error = %err, "skipping unreadable file");
                report.skipped.push(file.path);
                continue;
            }
        };

        document.push(Entry::Heading(format_heading(&heading_path)));
        document.push(Entry::Content(content));
        report.packed.push(heading_path);
    }

    report.cells = document.len();
    Ok(PackOutput { document, report })
}

/// Pack `root` and write the notebook to `output`.
///
/// Any existing file at `output` is removed first so a notebook inside the
/// tree is never packed into itself.
pub fn pack_to_path(root: &Path, output: &Path, options: &PackOptions) -> Result<PackReport> {
    match fs::remove_file(output) {
        Ok(()) => tracing::debug!(path = %output.display(), "removed previous notebook"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to remove existing {}", output.display()));
        }
    }

    let PackOutput { document, report } = pack(root, options)?;
    write_notebook(output, &document)
        .with_context(|| format!("failed to save notebook {}", output.display()))?;
    tracing::info!(
        path = %output.display(),
        files = report.packed.len(),
        cells = report.cells,
        "notebook saved"
    );
    Ok(report)
}

/// Force the notebook extension onto `path`, replacing any other extension.
pub fn normalize_output_path(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(NOTEBOOK_EXTENSION));
    if has_extension {
        path.to_path_buf()
    } else {
        path.with_extension(NOTEBOOK_EXTENSION)
    }
}

fn root_name(root: &Path) -> Option<String> {
    let resolved = match root.canonicalize() {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::warn!(path = %root.display(), error = %err, "cannot resolve root name");
            return None;
        }
    };
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
