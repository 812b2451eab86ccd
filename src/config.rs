//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/prefman/prefman.toml`
//! 3. Local config: `<dir>/.prefman.toml` (usually the working directory)
//! 4. Environment variables: `PREFMAN_*` prefix

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::StoreFormat;

const ENV_PREFIX: &str = "PREFMAN";

/// Raw settings for intermediate parsing; `None` means "not specified, inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_path: Option<PathBuf>,
    pub format: Option<StoreFormat>,
    pub description: Option<String>,
    pub defaults_path: Option<PathBuf>,
}

/// Unified configuration for prefman.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Store file (default: `$XDG_DATA_HOME/prefman/preferences.properties`)
    pub store_path: PathBuf,
    /// Store format; derived from the store file extension when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<StoreFormat>,
    /// Leading comment of a properties store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File of default values, read in the format its extension implies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            format: None,
            description: None,
            defaults_path: None,
        }
    }
}

fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", "prefman")
        .map(|dirs| dirs.data_dir().join("preferences.properties"))
        .unwrap_or_else(|| PathBuf::from("preferences.properties"))
}

/// Get the XDG config directory for prefman.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "prefman").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("prefman.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".prefman.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Format actually used for the store: explicit, else from the file extension.
    pub fn store_format(&self) -> StoreFormat {
        self.format
            .unwrap_or_else(|| StoreFormat::from_path(&self.store_path))
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        self.store_path = expand_path(&self.store_path);
        self.defaults_path = self.defaults_path.as_deref().map(expand_path);
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            store_path: overlay
                .store_path
                .clone()
                .unwrap_or_else(|| self.store_path.clone()),
            format: overlay.format.or(self.format),
            description: overlay
                .description
                .clone()
                .or_else(|| self.description.clone()),
            defaults_path: overlay
                .defaults_path
                .clone()
                .or_else(|| self.defaults_path.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory searched for `.prefman.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/prefman/prefman.toml`
    /// 3. Local config: `<local_dir>/.prefman.toml`
    /// 4. Environment variables: `PREFMAN_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path();
        let local = local_dir.map(local_config_path);
        Self::load_layers(global.as_deref(), local.as_deref(), None)
    }

    /// Layered loading from explicit file locations.
    ///
    /// Missing files are skipped. `env` replaces the process environment as the
    /// source of `PREFMAN_*` variables when given.
    pub fn load_layers(
        global: Option<&Path>,
        local: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        for path in [global, local].into_iter().flatten() {
            if path.exists() {
                debug!("config layer: {}", path.display());
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current, env)?;
        current.expand_paths();
        Ok(current)
    }

    /// Apply PREFMAN_* environment variables as explicit overrides.
    fn apply_env_overrides(
        mut settings: Self,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(env),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("store_path") {
            settings.store_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("format") {
            let format = val
                .parse::<StoreFormat>()
                .map_err(|message| ApplicationError::Config { message })?;
            settings.format = Some(format);
        }
        if let Ok(val) = config.get_string("description") {
            settings.description = Some(val);
        }
        if let Ok(val) = config.get_string("defaults_path") {
            settings.defaults_path = Some(PathBuf::from(val));
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# prefman configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/prefman/prefman.toml
#   Local:  ./.prefman.toml
#   Env:    PREFMAN_* environment variables (e.g. PREFMAN_STORE_PATH)

# Store file holding the current values
# store_path = "~/.local/share/prefman/preferences.properties"

# Store format: "properties" or "xml" (default: from the store file extension)
# format = "properties"

# Leading comment written into a properties store
# description = "user preferences"

# File with default values, same formats as the store
# defaults_path = "~/.config/prefman/defaults.properties"
"#
        .to_string()
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            debug!("leaving {} unexpanded: {}", raw, e);
            path.to_path_buf()
        }
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
