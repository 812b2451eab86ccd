//! Service container for dependency injection
//!
//! Wires up the store and services from settings.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::services::{CatalogueService, StoreService};
use crate::config::Settings;
use crate::domain::{shared, PreferenceStore, SharedStore, StoreFormat};
use crate::infrastructure::sink::FileSink;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding settings and I/O dependencies.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs }
    }

    /// Open the configured store: file sink, description, defaults file, then load.
    #[instrument(level = "debug", skip(self), fields(path = %self.settings.store_path.display()))]
    pub fn open_store(&self) -> InfraResult<SharedStore> {
        let settings = &self.settings;
        let sink = FileSink::new(&settings.store_path, self.fs.clone());
        let mut store = PreferenceStore::with_sink(Box::new(sink), settings.store_format());
        if let Some(description) = &settings.description {
            store = store.with_description(description.as_str());
        }
        if let Some(defaults_path) = &settings.defaults_path {
            store = store.with_defaults(self.read_defaults(defaults_path)?);
        }

        let outcome = store.load()?;
        debug!("open_store: {:?}", outcome);
        Ok(shared(store))
    }

    pub fn store_service(&self) -> InfraResult<StoreService> {
        Ok(StoreService::new(self.open_store()?))
    }

    pub fn catalogue_service(&self) -> CatalogueService {
        CatalogueService::new(self.fs.clone())
    }

    /// Defaults file in the format its extension implies.
    fn read_defaults(&self, path: &Path) -> InfraResult<BTreeMap<String, String>> {
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read defaults {}", path.display()), e))?;
        Ok(StoreFormat::from_path(path).decode(&content)?)
    }
}
