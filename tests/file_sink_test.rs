//! Tests for FileSink-backed stores on a real filesystem

use std::path::Path;

use tempfile::TempDir;

use prefman::domain::{LoadOutcome, PreferenceStore, SaveOutcome, StoreFormat};
use prefman::infrastructure::FileSink;

fn open(path: &Path) -> PreferenceStore {
    PreferenceStore::with_sink(
        Box::new(FileSink::real(path)),
        StoreFormat::from_path(path),
    )
}

#[test]
fn given_java_properties_file_when_loading_then_reads_entries() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("prefs.properties");
    std::fs::write(
        &path,
        "#user preferences\n#Tue Oct 15 10:00:00 CEST 2024\nerich=schroeter\npath=C\\:\\\\temp\n",
    )
    .unwrap();

    let mut store = open(&path);

    assert_eq!(store.load().unwrap(), LoadOutcome::Loaded { entries: 2 });
    assert_eq!(store.read("erich"), Some("schroeter"));
    assert_eq!(store.read("path"), Some("C:\\temp"));
}

#[test]
fn given_new_store_when_saving_then_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/prefs.properties");
    let mut store = open(&path).with_description("user preferences");

    assert_eq!(store.load().unwrap(), LoadOutcome::NotFound);
    store.put("width", "800");
    assert_eq!(store.save().unwrap(), SaveOutcome::Written);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "# user preferences");
    assert!(lines[1].starts_with("# "), "timestamp comment");
    assert_eq!(lines[2], "width=800");
}

#[test]
fn given_xml_path_when_saving_then_writes_preference_elements() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("prefs.xml");
    let mut store = open(&path);
    store.put("a", "<1>");
    store.save().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("<preferences>"));
    assert!(content.contains(r#"<preference id="a" value="&lt;1&gt;"/>"#));

    let mut reopened = open(&path);
    reopened.load().unwrap();
    assert_eq!(reopened.read("a"), Some("<1>"));
}

#[test]
fn given_unchanged_store_when_saving_then_file_not_touched() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("prefs.properties");
    let mut store = open(&path);
    store.set_default("w", "600");

    assert_eq!(store.save().unwrap(), SaveOutcome::Unchanged);
    assert!(!path.exists());
}
