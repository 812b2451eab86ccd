//! Preference store: flat key space with layered defaults and dirty tracking

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::rc::Rc;

use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::format::StoreFormat;

/// Backing byte sink for a store.
///
/// Implementations decide where bytes live (a file, a buffer); the store decides what they are.
pub trait StoreSink {
    /// Previously persisted content, `None` when nothing has been written yet.
    fn read(&self) -> std::io::Result<Option<String>>;

    fn write(&mut self, content: &str) -> std::io::Result<()>;

    /// Human-readable location for logs and errors.
    fn location(&self) -> String;
}

/// Store shared between the manager and every page that edits it.
pub type SharedStore = Rc<RefCell<PreferenceStore>>;

pub fn shared(store: PreferenceStore) -> SharedStore {
    Rc::new(RefCell::new(store))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { entries: usize },
    /// No sink, or the sink holds nothing yet
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// Nothing to write: store not dirty, or memory-only
    Unchanged,
}

/// Current values over a separate layer of defaults.
///
/// Defaults are metadata: registering one never marks the store dirty and defaults
/// are never persisted.
#[derive(Default)]
pub struct PreferenceStore {
    values: BTreeMap<String, String>,
    defaults: BTreeMap<String, String>,
    dirty: bool,
    description: Option<String>,
    format: StoreFormat,
    sink: Option<Box<dyn StoreSink>>,
}

impl fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("values", &self.values)
            .field("defaults", &self.defaults)
            .field("dirty", &self.dirty)
            .field("format", &self.format)
            .field("sink", &self.sink.as_ref().map(|s| s.location()))
            .finish()
    }
}

impl PreferenceStore {
    /// Memory-only store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Box<dyn StoreSink>, format: StoreFormat) -> Self {
        Self {
            sink: Some(sink),
            format,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_defaults<K, V>(mut self, defaults: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in defaults {
            self.set_default(k, v);
        }
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    pub fn location(&self) -> Option<String> {
        self.sink.as_ref().map(|s| s.location())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write a value. Creation and update are the same operation.
    pub fn put(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.values.insert(id.into(), value.into());
        self.dirty = true;
    }

    /// Alias of [`put`](Self::put).
    pub fn create(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.put(id, value);
    }

    /// Alias of [`put`](Self::put).
    pub fn update(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.put(id, value);
    }

    /// Current value, else the default, else `None`.
    pub fn read(&self, id: &str) -> Option<&str> {
        self.values
            .get(id)
            .or_else(|| self.defaults.get(id))
            .map(String::as_str)
    }

    /// True iff a current value existed and was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.values.remove(id).is_some();
        self.dirty |= removed;
        removed
    }

    pub fn set_default(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.defaults.insert(id.into(), value.into());
    }

    pub fn default_value(&self, id: &str) -> Option<&str> {
        self.defaults.get(id).map(String::as_str)
    }

    /// Drop the override so the default shows through. No-op when no default is registered.
    pub fn reset(&mut self, id: &str) -> bool {
        if !self.defaults.contains_key(id) {
            return false;
        }
        self.delete(id)
    }

    /// Reset every key that has a default. Returns the number of overrides dropped.
    pub fn reset_all(&mut self) -> usize {
        let keys: Vec<String> = self
            .values
            .keys()
            .filter(|k| self.defaults.contains_key(*k))
            .cloned()
            .collect();
        keys.iter().filter(|k| self.reset(k)).count()
    }

    /// True iff the current value equals the default, or there is no current value.
    pub fn is_default(&self, id: &str) -> bool {
        match (self.values.get(id), self.defaults.get(id)) {
            (Some(value), Some(default)) => value == default,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id) || self.defaults.contains_key(id)
    }

    /// Number of current (non-default) values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Current values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Effective values: defaults overlaid with current values, in key order.
    pub fn effective(&self) -> BTreeMap<&str, &str> {
        let mut merged: BTreeMap<&str, &str> = self
            .defaults
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        merged.extend(self.iter());
        merged
    }

    /// Merge the sink's content into the current values.
    ///
    /// Loaded entries overwrite values with the same key; other values survive.
    /// Decoding completes before anything is merged: on error the values and the
    /// dirty flag are untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&mut self) -> DomainResult<LoadOutcome> {
        let Some(sink) = self.sink.as_ref() else {
            return Ok(LoadOutcome::NotFound);
        };
        let location = sink.location();
        let content = sink
            .read()
            .map_err(|e| DomainError::store_io(format!("read {location}"), e))?;
        let Some(content) = content else {
            return Ok(LoadOutcome::NotFound);
        };
        let entries = self.apply(&content)?;
        debug!("loaded {} entries from {}", entries, location);
        Ok(LoadOutcome::Loaded { entries })
    }

    /// Discard every current value and load the sink's content afresh.
    ///
    /// On error the values and the dirty flag are untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn reload(&mut self) -> DomainResult<LoadOutcome> {
        let Some(sink) = self.sink.as_ref() else {
            return Ok(LoadOutcome::NotFound);
        };
        let location = sink.location();
        let content = sink
            .read()
            .map_err(|e| DomainError::store_io(format!("read {location}"), e))?;
        let (values, outcome) = match content {
            Some(content) => {
                let values = self.format.decode(&content)?;
                let entries = values.len();
                (values, LoadOutcome::Loaded { entries })
            }
            None => (BTreeMap::new(), LoadOutcome::NotFound),
        };
        self.values = values;
        self.dirty = false;
        debug!("reloaded {:?} from {}", outcome, location);
        Ok(outcome)
    }

    /// Persist current values to the sink, only when something changed.
    #[instrument(level = "debug", skip(self))]
    pub fn save(&mut self) -> DomainResult<SaveOutcome> {
        if !self.dirty || self.sink.is_none() {
            return Ok(SaveOutcome::Unchanged);
        }
        let content = self.encode()?;
        let Some(sink) = self.sink.as_mut() else {
            return Ok(SaveOutcome::Unchanged);
        };
        sink.write(&content)
            .map_err(|e| DomainError::store_io(format!("write {}", sink.location()), e))?;
        debug!("saved {} entries to {}", self.values.len(), sink.location());
        self.dirty = false;
        Ok(SaveOutcome::Written)
    }

    /// Merge values from any reader, in this store's format.
    pub fn load_from(&mut self, reader: &mut impl Read) -> DomainResult<usize> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| DomainError::store_io("read from stream", e))?;
        self.apply(&content)
    }

    /// Write current values to any writer, in this store's format. Always writes.
    pub fn save_to(&mut self, writer: &mut impl Write) -> DomainResult<()> {
        let content = self.encode()?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| DomainError::store_io("write to stream", e))?;
        self.dirty = false;
        Ok(())
    }

    fn apply(&mut self, content: &str) -> DomainResult<usize> {
        let values = self.format.decode(content)?;
        let entries = values.len();
        self.values.extend(values);
        self.dirty = false;
        Ok(entries)
    }

    fn encode(&self) -> DomainResult<String> {
        self.format.encode(&self.values, self.description.as_deref())
    }
}
