//! Jupyter notebook (nbformat 4) persistence for [`Document`].
//!
//! Reading is lenient: missing keys default to empty, `source` may be a string
//! or a list of strings, and cells that are neither markdown nor code (or that
//! fail to deserialize at all) are dropped. Writing always produces the same
//! layout, one markdown or code cell per entry.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::domain::errors::NbtreeError;
use crate::domain::model::{Document, Entry};

/// File extension every notebook written by the packer carries.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

const NBFORMAT: u32 = 4;
const NBFORMAT_MINOR: u32 = 0;

#[derive(Debug, Deserialize)]
struct RawNotebook {
    #[serde(default)]
    cells: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(default)]
    cell_type: String,
    #[serde(default)]
    source: Source,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Source {
    Lines(Vec<String>),
    Text(String),
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

impl Source {
    fn into_text(self) -> String {
        match self {
            Source::Lines(lines) => lines.concat(),
            Source::Text(text) => text,
        }
    }
}

#[derive(Debug, Serialize)]
struct NotebookOut {
    cells: Vec<CellOut>,
    metadata: Value,
    nbformat: u32,
    nbformat_minor: u32,
}

#[derive(Debug, Serialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
enum CellOut {
    Markdown {
        metadata: Map<String, Value>,
        source: Vec<String>,
    },
    Code {
        execution_count: Option<u32>,
        metadata: Map<String, Value>,
        outputs: Vec<Value>,
        source: Vec<String>,
    },
}

impl From<&Entry> for CellOut {
    fn from(entry: &Entry) -> Self {
        match entry {
            Entry::Heading(text) => CellOut::Markdown {
                metadata: Map::new(),
                source: split_source(text),
            },
            Entry::Content(text) => CellOut::Code {
                execution_count: None,
                metadata: Map::new(),
                outputs: Vec::new(),
                source: split_source(text),
            },
        }
    }
}

/// Split text into newline-terminated source lines; empty text becomes a single empty line.
fn split_source(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    text.split_inclusive('\n').map(str::to_owned).collect()
}

fn notebook_metadata() -> Value {
    json!({
        "colab": { "provenance": [] },
        "kernelspec": { "display_name": "Python 3", "name": "python3" },
        "language_info": { "name": "python" }
    })
}

/// Parse notebook JSON into a typed document.
pub fn parse_notebook(json: &str) -> Result<Document, serde_json::Error> {
    let raw: RawNotebook = serde_json::from_str(json)?;
    let mut document = Document::new();

    for (index, value) in raw.cells.into_iter().enumerate() {
        let cell = match serde_json::from_value::<RawCell>(value) {
            Ok(cell) => cell,
            Err(err) => {
                tracing::debug!(index, error = %err, "skipping malformed cell");
                continue;
            }
        };
        match cell.cell_type.as_str() {
            "markdown" => document.push(Entry::Heading(cell.source.into_text())),
            "code" => document.push(Entry::Content(cell.source.into_text())),
            other => tracing::debug!(index, cell_type = other, "skipping cell"),
        }
    }

    Ok(document)
}

/// Render a document as pretty-printed notebook JSON.
pub fn render_notebook(document: &Document) -> Result<String, serde_json::Error> {
    let notebook = NotebookOut {
        cells: document.entries.iter().map(CellOut::from).collect(),
        metadata: notebook_metadata(),
        nbformat: NBFORMAT,
        nbformat_minor: NBFORMAT_MINOR,
    };
    serde_json::to_string_pretty(&notebook)
}

pub fn read_notebook(path: &Path) -> Result<Document, NbtreeError> {
    let data = fs::read_to_string(path).map_err(|err| NbtreeError::io(path, err))?;
    parse_notebook(&data).map_err(|source| NbtreeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_notebook(path: &Path, document: &Document) -> Result<(), NbtreeError> {
    let rendered = render_notebook(document).map_err(|source| NbtreeError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| NbtreeError::io(parent, err))?;
    }
    fs::write(path, rendered).map_err(|err| NbtreeError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_string_and_list_sources() {
        let json = r###"{
            "cells": [
                {"cell_type": "markdown", "source": "## 📁 `a.py`\n"},
                {"cell_type": "code", "source": ["x = 1\n", "y = 2\n"]}
            ]
        }"###;

        let document = parse_notebook(json).unwrap();
        assert_eq!(
            document.entries,
            vec![
                Entry::Heading("## 📁 `a.py`\n".into()),
                Entry::Content("x = 1\ny = 2\n".into()),
            ]
        );
    }

    #[test]
    fn missing_keys_default_to_empty() {
        assert!(parse_notebook("{}").unwrap().is_empty());

        let document = parse_notebook(r#"{"cells": [{"cell_type": "code"}, {}]}"#).unwrap();
        assert_eq!(document.entries, vec![Entry::Content(String::new())]);
    }

    #[test]
    fn skips_unknown_and_malformed_cells() {
        let json = r#"{
            "cells": [
                {"cell_type": "raw", "source": "ignored"},
                42,
                {"cell_type": "code", "source": {"not": "text"}},
                {"cell_type": "markdown", "source": ["kept"]}
            ]
        }"#;

        let document = parse_notebook(json).unwrap();
        assert_eq!(document.entries, vec![Entry::Heading("kept".into())]);
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_notebook("not json").is_err());
    }

    #[test]
    fn written_cells_follow_nbformat_layout() {
        let document = Document::from(vec![
            Entry::Heading("## 📁 `a.py`".into()),
            Entry::Content("a\r\nb".into()),
            Entry::Content(String::new()),
        ]);

        let value: Value = serde_json::from_str(&render_notebook(&document).unwrap()).unwrap();

        assert_eq!(value["nbformat"], 4);
        assert_eq!(value["metadata"]["kernelspec"]["name"], "python3");
        assert_eq!(value["cells"][0]["cell_type"], "markdown");
        assert_eq!(value["cells"][1]["cell_type"], "code");
        assert_eq!(value["cells"][1]["source"], json!(["a\r\n", "b"]));
        assert_eq!(value["cells"][1]["execution_count"], Value::Null);
        assert_eq!(value["cells"][1]["outputs"], json!([]));
        assert_eq!(value["cells"][2]["source"], json!([""]));
    }

    #[test]
    fn rendered_notebook_reads_back() {
        let document = Document::from(vec![
            Entry::Heading("Preamble\n\nwith lines\n".into()),
            Entry::Heading("## 📁 `a.py`".into()),
            Entry::Content("# not a heading\nprint()\n".into()),
        ]);

        let rendered = render_notebook(&document).unwrap();
        assert_eq!(parse_notebook(&rendered).unwrap(), document);
    }

    #[test]
    fn write_then_read_from_disk() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("out/book.ipynb");
        let document = Document::from(vec![Entry::Content("x".into())]);

        write_notebook(&path, &document)?;
        assert_eq!(read_notebook(&path)?, document);
        Ok(())
    }

    #[test]
    fn read_reports_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let result = read_notebook(&temp.path().join("missing.ipynb"));
        assert!(matches!(result, Err(NbtreeError::Io { .. })));
    }
}
