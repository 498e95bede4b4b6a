//! Domain models for notebook entries and reconstructed files.

/// One cell of a notebook, reduced to what the pairing protocol cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Descriptive text cell. Carries a file path when it follows the heading convention.
    Heading(String),
    /// Code cell holding a file's full text.
    Content(String),
}

/// Ordered list of entries. Position is the only link between a heading and its content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub entries: Vec<Entry>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<Entry>> for Document {
    fn from(entries: Vec<Entry>) -> Self {
        Self { entries }
    }
}

/// A file reconstructed from a notebook, with its path relative to the tree root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}
