//! Store-backed pages built from a catalogue

use std::rc::Rc;

use tracing::{debug, warn};

use crate::domain::{PageRef, PreferencePage, SharedStore};

/// Page whose values live in a shared store.
///
/// Save and cancel act on the whole store; reset only touches the keys this page
/// registered defaults for.
pub struct CataloguePage {
    title: String,
    description: String,
    keys: Vec<String>,
    store: SharedStore,
}

impl CataloguePage {
    pub fn new(title: impl Into<String>, store: SharedStore) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            keys: Vec::new(),
            store,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_keys(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.keys = keys.into_iter().collect();
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn shared(self) -> PageRef {
        Rc::new(self)
    }
}

impl std::fmt::Debug for CataloguePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CataloguePage")
            .field("title", &self.title)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl PreferencePage for CataloguePage {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn save_changes(&self) -> bool {
        let Ok(mut store) = self.store.try_borrow_mut() else {
            warn!("{}: store busy, not saved", self.title);
            return false;
        };
        match store.save() {
            Ok(outcome) => {
                debug!("{}: save {:?}", self.title, outcome);
                true
            }
            Err(e) => {
                warn!("{}: save failed: {}", self.title, e);
                false
            }
        }
    }

    fn cancel_changes(&self) -> bool {
        let Ok(mut store) = self.store.try_borrow_mut() else {
            warn!("{}: store busy, not reloaded", self.title);
            return false;
        };
        match store.reload() {
            Ok(outcome) => {
                debug!("{}: reload {:?}", self.title, outcome);
                true
            }
            Err(e) => {
                warn!("{}: reload failed: {}", self.title, e);
                false
            }
        }
    }

    fn reset_to_defaults(&self) -> bool {
        let Ok(mut store) = self.store.try_borrow_mut() else {
            warn!("{}: store busy, not reset", self.title);
            return false;
        };
        let reset = self.keys.iter().filter(|key| store.reset(key)).count();
        debug!("{}: reset {} keys", self.title, reset);
        true
    }

    fn can_leave(&self) -> bool {
        true
    }
}
