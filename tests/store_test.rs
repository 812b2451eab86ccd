//! Tests for PreferenceStore: defaults, dirty tracking, persistence through sinks

use std::io;

use rstest::rstest;

use prefman::domain::{
    DomainError, LoadOutcome, PreferenceStore, SaveOutcome, StoreFormat, StoreSink,
};
use prefman::infrastructure::MemorySink;

/// Sink whose reads always fail.
struct BrokenSink;

impl StoreSink for BrokenSink {
    fn read(&self) -> io::Result<Option<String>> {
        Err(io::Error::other("disk on fire"))
    }

    fn write(&mut self, _content: &str) -> io::Result<()> {
        Err(io::Error::other("disk on fire"))
    }

    fn location(&self) -> String {
        "broken".to_string()
    }
}

#[test]
fn given_default_only_when_reading_then_returns_default() {
    let mut store = PreferenceStore::new();
    store.set_default("w", "600");

    assert_eq!(store.read("w"), Some("600"));
    assert!(store.is_default("w"));
    assert!(!store.is_dirty());
}

#[test]
fn given_override_when_resetting_then_default_returns() {
    let mut store = PreferenceStore::new();
    store.set_default("w", "600");
    assert_eq!(store.read("w"), Some("600"));

    store.update("w", "800");
    assert!(!store.is_default("w"));
    assert_eq!(store.read("w"), Some("800"));

    assert!(store.reset("w"));
    assert_eq!(store.read("w"), Some("600"));
    assert!(store.is_default("w"));
}

#[test]
fn given_value_without_default_when_resetting_then_kept() {
    let mut store = PreferenceStore::new();
    store.create("color", "red");

    assert!(!store.reset("color"));
    assert_eq!(store.read("color"), Some("red"));
    assert!(!store.is_default("color"));
}

#[rstest]
#[case(StoreFormat::Properties)]
#[case(StoreFormat::Xml)]
fn given_no_mutation_when_saving_twice_then_written_once(#[case] format: StoreFormat) {
    let sink = MemorySink::new();
    let mut store = PreferenceStore::with_sink(Box::new(sink.clone()), format);
    store.put("a", "1");

    assert_eq!(store.save().unwrap(), SaveOutcome::Written);
    assert_eq!(store.save().unwrap(), SaveOutcome::Unchanged);

    assert_eq!(sink.write_count(), 1);
}

#[rstest]
#[case(StoreFormat::Properties)]
#[case(StoreFormat::Xml)]
fn given_saved_store_when_loading_fresh_store_then_same_values(#[case] format: StoreFormat) {
    let sink = MemorySink::new();
    let mut first = PreferenceStore::with_sink(Box::new(sink.clone()), format)
        .with_defaults([("w", "600")]);
    first.put("h", "400");
    first.put("title", "a=b: #1 ünïcödé");
    first.save().unwrap();

    let mut second = PreferenceStore::with_sink(Box::new(sink.clone()), format);
    let outcome = second.load().unwrap();

    assert_eq!(outcome, LoadOutcome::Loaded { entries: 2 });
    assert_eq!(second.read("title"), Some("a=b: #1 ünïcödé"));
    assert_eq!(second.read("w"), None, "defaults are never persisted");
}

#[test]
fn given_unset_sink_when_loading_then_not_found() {
    let mut store = PreferenceStore::with_sink(Box::new(MemorySink::new()), StoreFormat::Properties);
    assert_eq!(store.load().unwrap(), LoadOutcome::NotFound);
    assert_eq!(PreferenceStore::new().load().unwrap(), LoadOutcome::NotFound);
}

#[test]
fn given_malformed_content_when_loading_then_values_and_dirty_untouched() {
    let sink = MemorySink::with_content("<settings/>");
    let mut store = PreferenceStore::with_sink(Box::new(sink), StoreFormat::Xml);
    store.put("keep", "me");

    let err = store.load().unwrap_err();

    assert!(matches!(err, DomainError::MalformedStore { format: "xml", .. }));
    assert_eq!(store.read("keep"), Some("me"));
    assert!(store.is_dirty());
}

#[test]
fn given_failing_sink_when_loading_or_saving_then_store_io_and_still_dirty() {
    let mut store = PreferenceStore::with_sink(Box::new(BrokenSink), StoreFormat::Properties);
    store.put("a", "1");

    assert!(matches!(store.load(), Err(DomainError::StoreIo { .. })));
    assert!(matches!(store.save(), Err(DomainError::StoreIo { .. })));

    assert!(store.is_dirty());
    assert_eq!(store.read("a"), Some("1"));
}

#[test]
fn given_unsaved_key_when_loading_then_merged_with_file_values() {
    let sink = MemorySink::with_content("a=1\n");
    let mut store = PreferenceStore::with_sink(Box::new(sink), StoreFormat::Properties);
    store.put("unsaved", "keep");

    store.load().unwrap();

    assert_eq!(store.keys().collect::<Vec<_>>(), ["a", "unsaved"]);
    assert_eq!(store.read("unsaved"), Some("keep"));
    assert!(!store.is_dirty());
}

#[test]
fn given_unsaved_key_when_reloading_then_replaced_by_file_values() {
    let sink = MemorySink::with_content("a=1\n");
    let mut store = PreferenceStore::with_sink(Box::new(sink), StoreFormat::Properties);
    store.put("stale", "x");

    store.reload().unwrap();

    assert_eq!(store.keys().collect::<Vec<_>>(), ["a"]);
    assert!(!store.is_dirty());
}

#[test]
fn given_writer_when_saving_to_then_always_writes_description() {
    let mut store = PreferenceStore::new().with_description("user preferences");
    store.put("a", "1");
    let mut out = Vec::new();

    store.save_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.starts_with("# user preferences\n"));
    let mut fresh = PreferenceStore::new();
    assert_eq!(fresh.load_from(&mut text.as_bytes()).unwrap(), 1);
    assert_eq!(fresh.read("a"), Some("1"));
}
