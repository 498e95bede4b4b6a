//! Source tree scanning with exact-name ignore rules.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

/// Names and root-relative paths excluded from a pack.
///
/// A bare name (`node_modules`, `.env`) matches any path component exactly.
/// An entry containing `/` matches that path relative to the root, and
/// everything beneath it when it names a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    names: BTreeSet<String>,
    paths: BTreeSet<String>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: &str) {
        let trimmed = item.trim().trim_matches('/');
        if trimmed.is_empty() {
            return;
        }
        if trimmed.contains('/') {
            self.paths.insert(trimmed.to_owned());
        } else {
            self.names.insert(trimmed.to_owned());
        }
    }

    pub fn len(&self) -> usize {
        self.names.len() + self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.paths.is_empty()
    }

    /// Whether `rel`, a path relative to the scan root, is excluded.
    pub fn is_ignored(&self, rel: &Path) -> bool {
        let components: Vec<_> = rel
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
            .collect();

        if components.iter().any(|name| self.names.contains(&**name)) {
            return true;
        }

        if self.paths.is_empty() {
            return false;
        }
        let rel_posix = components.join("/");
        self.paths.iter().any(|path| {
            rel_posix == *path
                || rel_posix
                    .strip_prefix(path.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Load an ignore file: one entry per line, blank lines and `#` comments skipped.
    ///
    /// A missing file yields an empty set with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        let mut set = Self::new();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "ignore file not found");
            return Ok(set);
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read ignore file {}", path.display()))?;
        for line in data.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            set.insert(trimmed);
        }
        Ok(set)
    }
}

impl<S: AsRef<str>> Extend<S> for IgnoreSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for item in iter {
            self.insert(item.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for IgnoreSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// A file discovered under the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated.
    pub display_path: String,
}

/// Walk `root` and return every regular file not excluded by `ignore`, sorted by relative path.
pub fn scan(root: &Path, ignore: &IgnoreSet) -> Result<Vec<SourceFile>> {
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false).follow_links(false);

    let filter_root = root.to_path_buf();
    let filter_ignore = ignore.clone();
    builder.filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        let rel = entry
            .path()
            .strip_prefix(&filter_root)
            .unwrap_or(entry.path());
        !filter_ignore.is_ignored(rel)
    });

    let mut files = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "scanner error");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }
        files.push(SourceFile {
            display_path: to_display_path(root, entry.path()),
            path: entry.into_path(),
        });
    }

    files.sort_by(|a, b| a.display_path.cmp(&b.display_path));
    Ok(files)
}

fn to_display_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
