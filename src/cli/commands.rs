//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, StoreCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{shared, PreferenceStore, SaveOutcome};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => cmd_config(command, &load_settings(cli)?),
        Commands::Store { command } => {
            let container = ServiceContainer::new(load_settings(cli)?);
            cmd_store(command, &container)
        }
        Commands::Tree { catalogue } => {
            let container = ServiceContainer::new(load_settings(cli)?);
            cmd_tree(catalogue, &container)
        }
        Commands::Select { catalogue, path } => {
            let container = ServiceContainer::new(load_settings(cli)?);
            cmd_select(catalogue, path, &container)
        }
    }
}

/// Layered settings with command line flags on top.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
    let mut settings = Settings::load(Some(&cwd))?;
    if let Some(store) = &cli.store {
        settings.store_path = store.clone();
    }
    if let Some(format) = cli.format {
        settings.format = Some(format);
    }
    if let Some(defaults) = &cli.defaults {
        settings.defaults_path = Some(defaults.clone());
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

#[instrument(level = "debug", skip(container))]
fn cmd_store(command: &StoreCommands, container: &ServiceContainer) -> CliResult<()> {
    let service = container.store_service()?;
    match command {
        StoreCommands::Get { key } => match service.get(key) {
            Some(value) => output::info(&value),
            None => return Err(CliError::KeyNotFound(key.clone())),
        },
        StoreCommands::Set { key, value } => match service.set(key, value)? {
            SaveOutcome::Written => output::action("set", &format!("{key}={value}")),
            SaveOutcome::Unchanged => output::detail(&format!("{key} unchanged")),
        },
        StoreCommands::Delete { key } => {
            if service.delete(key)? {
                output::action("deleted", key);
            } else {
                output::warning(&format!("no value for {key}"));
            }
        }
        StoreCommands::Reset { key } => {
            if service.reset(key)? {
                output::action("reset", key);
            } else {
                output::warning(&format!("{key}: no override with a default to revert to"));
            }
        }
        StoreCommands::List { all } => {
            for entry in service.list(*all) {
                output::entry(&entry.key, &entry.value, *all && entry.is_default);
            }
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_tree(catalogue: &Path, container: &ServiceContainer) -> CliResult<()> {
    // structure only: defaults go to a throwaway store
    let store = shared(PreferenceStore::new());
    let manager = container.catalogue_service().build(catalogue, store)?;
    output::info(&manager.tree().to_tree_string());
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_select(catalogue: &Path, path: &str, container: &ServiceContainer) -> CliResult<()> {
    let store = container.open_store()?;
    let mut manager = container.catalogue_service().build(catalogue, store)?;
    manager.add_current_page_listener(|page| debug!("current page: {}", page.title()));

    manager.set_current_page_by_path(path)?;

    let page = manager.current_page();
    output::header(&page.title());
    if !page.description().is_empty() {
        output::detail(&page.description());
    }
    if let Some(current) = manager.current_path() {
        output::detail(&format!("path: {current}"));
    }
    Ok(())
}

fn cmd_config(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let cwd =
                std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
            let locations = [
                ("global", global_config_path()),
                ("local", Some(local_config_path(&cwd))),
            ];
            for (scope, path) in locations {
                match path {
                    Some(path) => {
                        let state = if path.exists() { "" } else { " (not found)" };
                        output::info(&format!("{scope}: {}{state}", path.display()));
                    }
                    None => output::info(&format!("{scope}: unavailable")),
                }
            }
            output::info(&format!("store: {}", settings.store_path.display()));
        }
    }
    Ok(())
}
