//! Store service
//!
//! Edits a shared store and persists each change right away.

use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::domain::{SaveOutcome, SharedStore};

/// One row of a store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub key: String,
    pub value: String,
    /// Effective value equals the registered default (or only the default exists)
    pub is_default: bool,
}

/// Service for command-style access to a store.
pub struct StoreService {
    store: SharedStore,
}

impl StoreService {
    /// Create a new store service.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Effective value: current value, else default.
    pub fn get(&self, key: &str) -> Option<String> {
        self.store.borrow().read(key).map(str::to_string)
    }

    /// Set a value and save.
    #[instrument(level = "debug", skip(self, value))]
    pub fn set(&self, key: &str, value: &str) -> ApplicationResult<SaveOutcome> {
        let mut store = self.store.borrow_mut();
        store.put(key, value);
        Ok(store.save()?)
    }

    /// Delete the current value and save. `false` when there was nothing to delete.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, key: &str) -> ApplicationResult<bool> {
        let mut store = self.store.borrow_mut();
        let removed = store.delete(key);
        store.save()?;
        Ok(removed)
    }

    /// Revert a key to its default and save. `false` when no default is registered
    /// or the key held no override.
    #[instrument(level = "debug", skip(self))]
    pub fn reset(&self, key: &str) -> ApplicationResult<bool> {
        let mut store = self.store.borrow_mut();
        let reset = store.reset(key);
        store.save()?;
        Ok(reset)
    }

    /// Current values in key order; with `include_defaults`, every effective value.
    pub fn list(&self, include_defaults: bool) -> Vec<StoreEntry> {
        let store = self.store.borrow();
        let entries: Vec<StoreEntry> = if include_defaults {
            store
                .effective()
                .into_iter()
                .map(|(key, value)| StoreEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                    is_default: store.is_default(key),
                })
                .collect()
        } else {
            store
                .iter()
                .map(|(key, value)| StoreEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                    is_default: store.is_default(key),
                })
                .collect()
        };
        debug!("list: {} entries", entries.len());
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{shared, PreferenceStore, StoreFormat};
    use crate::infrastructure::MemorySink;

    fn service(sink: &MemorySink) -> StoreService {
        let store = PreferenceStore::with_sink(Box::new(sink.clone()), StoreFormat::Properties)
            .with_defaults([("width", "600"), ("height", "400")]);
        StoreService::new(shared(store))
    }

    #[test]
    fn given_new_value_when_setting_then_saved_once() {
        let sink = MemorySink::new();
        let service = service(&sink);

        assert_eq!(service.set("width", "800").unwrap(), SaveOutcome::Written);

        assert_eq!(service.get("width").as_deref(), Some("800"));
        assert!(sink.content().is_some_and(|c| c.contains("width=800")));
    }

    #[test]
    fn given_absent_key_when_deleting_then_nothing_written() {
        let sink = MemorySink::new();
        let service = service(&sink);

        assert!(!service.delete("missing").unwrap());
        assert_eq!(sink.write_count(), 0);
    }

    #[test]
    fn given_override_when_resetting_then_default_visible_again() {
        let sink = MemorySink::new();
        let service = service(&sink);
        service.set("height", "100").unwrap();

        assert!(service.reset("height").unwrap());

        assert_eq!(service.get("height").as_deref(), Some("400"));
        assert_eq!(sink.write_count(), 2);
    }

    #[test]
    fn given_defaults_and_overrides_when_listing_then_flags_defaults() {
        let sink = MemorySink::new();
        let service = service(&sink);
        service.set("width", "600").unwrap();
        service.set("color", "red").unwrap();

        let current = service.list(false);
        let all = service.list(true);

        assert_eq!(
            current.iter().map(|e| e.key.as_str()).collect::<Vec<_>>(),
            ["color", "width"]
        );
        assert_eq!(all.len(), 3);
        let flags: Vec<(&str, bool)> = all.iter().map(|e| (e.key.as_str(), e.is_default)).collect();
        assert_eq!(flags, [("color", false), ("height", true), ("width", true)]);
    }
}
