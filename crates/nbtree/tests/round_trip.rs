use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use nbtree::app::extract::extract;
use nbtree::app::pack::{PackOptions, pack, pack_to_path};
use nbtree::app::scan::IgnoreSet;
use nbtree::app::unpack::{UnpackOptions, WriteMode, unpack};
use nbtree::domain::errors::NbtreeError;
use nbtree::domain::model::FileRecord;
use nbtree::infra::notebook::read_notebook;

fn write_tree(root: &Path, files: &BTreeMap<&str, &str>) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn read_tree(root: &Path, rels: impl IntoIterator<Item = String>) -> BTreeMap<String, String> {
    rels.into_iter()
        .map(|rel| {
            let content = fs::read_to_string(root.join(&rel)).unwrap();
            (rel, content)
        })
        .collect()
}

fn no_prompt(path: &Path) -> Result<bool, NbtreeError> {
    panic!("unexpected prompt for {}", path.display())
}

#[test]
fn tree_survives_pack_and_unpack() {
    let files = BTreeMap::from([
        ("src/app.py", "import os\n\n# comment with ## 📁 `fake.py`\n"),
        ("src/empty.py", ""),
        ("docs/notes.md", "## Heading inside a file\nno trailing newline"),
        ("z_last.txt", "crlf\r\nline\r\n"),
        ("ünïcode/файл.txt", "多字节\n"),
    ]);
    let source = tempfile::tempdir().unwrap();
    write_tree(source.path(), &files);

    let workspace = tempfile::tempdir().unwrap();
    let notebook = workspace.path().join("tree.ipynb");
    let report = pack_to_path(source.path(), &notebook, &PackOptions::default()).unwrap();
    assert_eq!(report.packed.len(), files.len());
    assert!(report.skipped.is_empty());

    let target = tempfile::tempdir().unwrap();
    let document = read_notebook(&notebook).unwrap();
    let options = UnpackOptions::new(target.path()).with_mode(WriteMode::SkipUnchanged);
    let unpacked = unpack(&document, &notebook, &options, &mut no_prompt).unwrap();
    assert_eq!(unpacked.written.len(), files.len());

    let restored = read_tree(target.path(), files.keys().map(|rel| rel.to_string()));
    let expected: BTreeMap<String, String> = files
        .iter()
        .map(|(rel, content)| (rel.to_string(), content.to_string()))
        .collect();
    assert_eq!(restored, expected);

    let again = unpack(&document, &notebook, &options, &mut no_prompt).unwrap();
    assert!(again.written.is_empty());
    assert_eq!(again.unchanged.len(), files.len());
}

#[test]
fn empty_tree_round_trips_to_no_records() {
    let source = tempfile::tempdir().unwrap();
    let output = pack(source.path(), &PackOptions::default()).unwrap();

    assert!(output.document.is_empty());
    assert!(extract(&output.document).is_empty());
}

#[test]
fn packed_entries_are_sorted_and_filtered() {
    let files = BTreeMap::from([
        ("zeta/a.txt", "z"),
        ("alpha.txt", "a"),
        ("mid/node_modules/pkg/index.js", "ignored"),
        ("mid/keep.js", "kept"),
        ("secrets.env", "ignored"),
        ("Beta.txt", "upper"),
    ]);
    let source = tempfile::tempdir().unwrap();
    write_tree(source.path(), &files);

    let ignore: IgnoreSet = ["node_modules", "secrets.env"].into_iter().collect();
    let output = pack(source.path(), &PackOptions::new(ignore)).unwrap();

    assert_eq!(
        extract(&output.document),
        vec![
            FileRecord::new("Beta.txt", "upper"),
            FileRecord::new("alpha.txt", "a"),
            FileRecord::new("mid/keep.js", "kept"),
            FileRecord::new("zeta/a.txt", "z"),
        ]
    );
}

#[test]
fn awkward_file_names_survive_pack_and_unpack() {
    let files = BTreeMap::from([
        ("a`b.txt", "single backtick\n"),
        ("``double``.md", "fenced\n"),
        (" lead.txt", "leading space\n"),
        ("trail.txt ", "trailing space\n"),
        ("dir/#hash.py", "# hash\n"),
    ]);
    let source = tempfile::tempdir().unwrap();
    write_tree(source.path(), &files);

    let output = pack(source.path(), &PackOptions::default()).unwrap();
    assert!(output.report.skipped.is_empty());

    let target = tempfile::tempdir().unwrap();
    let options = UnpackOptions::new(target.path()).with_mode(WriteMode::Always);
    let unpacked = unpack(&output.document, Path::new("names.ipynb"), &options, &mut no_prompt)
        .unwrap();
    assert_eq!(unpacked.written.len(), files.len());

    let restored = read_tree(target.path(), files.keys().map(|rel| rel.to_string()));
    let expected: BTreeMap<String, String> = files
        .iter()
        .map(|(rel, content)| (rel.to_string(), content.to_string()))
        .collect();
    assert_eq!(restored, expected);
}
