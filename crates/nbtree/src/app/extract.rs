//! Pairing heading entries with the content entries that follow them.
//!
//! A packed notebook alternates between a heading naming a file and a code cell
//! holding that file's text. Extraction walks the entries in order and pairs
//! each recognised heading with the next entry, provided that entry is content.
//! Anything that does not fit the pattern is dropped rather than reported.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::model::{Document, Entry, FileRecord};

/// Glyph placed between the heading markers and the path.
pub const HEADING_GLYPH: &str = "📁";

// Markers and an optional glyph; the remainder holds the path.
static HEADING_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<marks>#*)\s*(?:\p{So}\x{FE0F}?\s*)?(?P<rest>.*)$")
        .expect("heading pattern is valid")
});

/// Render the heading text that [`parse_heading`] maps back to `path`.
///
/// The path is written as a markdown code span whose fence is longer than any
/// backtick run inside it, padded with spaces where the span would otherwise
/// lose characters at its edges.
pub fn format_heading(path: &str) -> String {
    let fence = "`".repeat(longest_backtick_run(path) + 1);
    let padded = path.starts_with('`')
        || path.ends_with('`')
        || (path.starts_with(' ') && path.ends_with(' ') && !only_spaces(path));
    if padded {
        format!("## {HEADING_GLYPH} {fence} {path} {fence}")
    } else {
        format!("## {HEADING_GLYPH} {fence}{path}{fence}")
    }
}

/// Recover a file path from heading text.
///
/// Only the first non-blank line is considered. Any number of `#` markers is
/// accepted, including none, but a path without markers must be a code span
/// so plain prose is never mistaken for a file name.
pub fn parse_heading(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let caps = HEADING_PREFIX.captures(line)?;
    let rest = caps.name("rest").map_or("", |rest| rest.as_str());

    let path = match code_span(rest) {
        Some(span) => span.to_owned(),
        None if caps["marks"].is_empty() || rest.starts_with('#') => return None,
        None => rest.replace('`', "").trim().to_owned(),
    };

    (!path.is_empty()).then_some(path)
}

/// Contents of `text` when the whole of it is a single code span.
///
/// Follows CommonMark: the closing fence matches the opening one in length,
/// and one space is stripped from each side when both sides have one.
fn code_span(text: &str) -> Option<&str> {
    let fence_len = text.len() - text.trim_start_matches('`').len();
    if fence_len == 0 {
        return None;
    }
    let inner = text[fence_len..].strip_suffix(&text[..fence_len])?;
    if inner.ends_with('`') {
        return None;
    }

    if inner.len() > 2 && inner.starts_with(' ') && inner.ends_with(' ') && !only_spaces(inner) {
        Some(&inner[1..inner.len() - 1])
    } else {
        Some(inner)
    }
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

fn only_spaces(text: &str) -> bool {
    text.bytes().all(|byte| byte == b' ')
}

#[derive(Debug)]
enum PairState {
    Seeking,
    Pending(String),
}

/// Rebuild file records from an ordered list of entries.
pub fn extract(document: &Document) -> Vec<FileRecord> {
    let mut records = Vec::new();
    let mut state = PairState::Seeking;

    for entry in &document.entries {
        state = match (entry, state) {
            (Entry::Heading(text), previous) => {
                if let PairState::Pending(dropped) = previous {
                    tracing::debug!(path = %dropped, "heading without content, dropping");
                }
                match parse_heading(text) {
                    Some(path) => PairState::Pending(path),
                    None => PairState::Seeking,
                }
            }
            (Entry::Content(content), PairState::Pending(path)) => {
                records.push(FileRecord::new(path, content.clone()));
                PairState::Seeking
            }
            (Entry::Content(_), PairState::Seeking) => PairState::Seeking,
        };
    }

    if let PairState::Pending(path) = state {
        tracing::debug!(path = %path, "trailing heading without content, dropping");
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(text: &str) -> Entry {
        Entry::Heading(text.to_owned())
    }

    fn content(text: &str) -> Entry {
        Entry::Content(text.to_owned())
    }

    #[test]
    fn extracts_demo_notebook() {
        let document = Document::from(vec![
            heading("## 📁 `demo/main.py`"),
            content("print(1)\n"),
            heading("## 📁 `demo/utils/x.py`"),
            content(""),
        ]);

        assert_eq!(
            extract(&document),
            vec![
                FileRecord::new("demo/main.py", "print(1)\n"),
                FileRecord::new("demo/utils/x.py", ""),
            ]
        );
    }

    #[test]
    fn heading_followed_by_heading_drops_first() {
        let document = Document::from(vec![
            heading("## 📁 `lost.py`"),
            heading("## 📁 `kept.py`"),
            content("x"),
        ]);

        assert_eq!(extract(&document), vec![FileRecord::new("kept.py", "x")]);
    }

    #[test]
    fn content_without_heading_is_ignored() {
        let document = Document::from(vec![
            content("orphan"),
            heading("## 📁 `a.py`"),
            content("a"),
            content("second content after pairing"),
        ]);

        assert_eq!(extract(&document), vec![FileRecord::new("a.py", "a")]);
    }

    #[test]
    fn unmatched_heading_resets_pending_path() {
        let document = Document::from(vec![
            heading("## 📁 `a.py`"),
            heading("Some notes about the project"),
            content("not a file"),
        ]);

        assert!(extract(&document).is_empty());
    }

    #[test]
    fn trailing_heading_is_discarded() {
        let document = Document::from(vec![
            heading("## 📁 `a.py`"),
            content("a"),
            heading("## 📁 `b.py`"),
        ]);

        assert_eq!(extract(&document), vec![FileRecord::new("a.py", "a")]);
    }

    #[test]
    fn empty_document_yields_nothing() {
        assert!(extract(&Document::new()).is_empty());
    }

    #[test]
    fn parses_heading_variants() {
        let cases = [
            ("## 📁 `demo/main.py`\n", Some("demo/main.py")),
            ("##`demo/main.py`\n", Some("demo/main.py")),
            ("# src/lib.rs", Some("src/lib.rs")),
            ("#### 📁 deep/path.txt", Some("deep/path.txt")),
            ("`bare/quoted.rs`", Some("bare/quoted.rs")),
            ("📁 `glyph/only.rs`", Some("glyph/only.rs")),
            ("\n\n  ## 📁 `indented.py`  \n", Some("indented.py")),
            ("## 📁 `a.py` (entry point)", Some("a.py (entry point)")),
            ("plain prose", None),
            ("##", None),
            ("## 📁 ``", None),
            ("", None),
        ];

        for (text, expected) in cases {
            assert_eq!(parse_heading(text).as_deref(), expected, "heading {text:?}");
        }
    }

    #[test]
    fn format_round_trips_through_parse() {
        let paths = [
            "main.py",
            "nested/dir/file name.txt",
            "weird#name.md",
            "a`b.txt",
            "a``b```c.txt",
            "`leading.txt",
            "trailing.txt`",
            " lead.txt",
            "trail.txt ",
            " both sides ",
            "dir/ spaced /x.txt",
        ];
        for path in paths {
            let heading = format_heading(path);
            assert_eq!(parse_heading(&heading).as_deref(), Some(path), "heading {heading:?}");
        }
    }

    #[test]
    fn fence_outgrows_backticks_in_path() {
        assert_eq!(format_heading("main.py"), "## 📁 `main.py`");
        assert_eq!(format_heading("a`b.txt"), "## 📁 ``a`b.txt``");
        assert_eq!(format_heading("`x`"), "## 📁 `` `x` ``");
        assert_eq!(format_heading(" both "), "## 📁 `  both  `");
    }

    #[test]
    fn mismatched_fences_fall_back_to_bare_path() {
        assert_eq!(parse_heading("## ``a.py`").as_deref(), Some("a.py"));
        assert_eq!(parse_heading("``a.py`"), None);
    }
}
