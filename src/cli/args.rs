//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::StoreFormat;

/// Preference pages and stores: inspect a store file, render and navigate a page catalogue
#[derive(Parser, Debug)]
#[command(name = "prefman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Store file (overrides configuration)
    #[arg(short, long, global = true, env = "PREFMAN_STORE", value_hint = ValueHint::FilePath)]
    pub store: Option<PathBuf>,

    /// Store format (default: from configuration or store file extension)
    #[arg(short, long, global = true, value_parser = parse_format)]
    pub format: Option<StoreFormat>,

    /// File with default values (properties or xml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub defaults: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_format(s: &str) -> Result<StoreFormat, String> {
    s.parse()
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read and edit store values
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },

    /// Show a page catalogue as tree
    Tree {
        /// Catalogue file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        catalogue: PathBuf,
    },

    /// Select a page by identifier path and show it
    Select {
        /// Catalogue file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        catalogue: PathBuf,
        /// Slash-separated path starting at `root`, e.g. root/general/display
        path: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Print the effective value of a key
    Get { key: String },

    /// Set a value and save
    Set { key: String, value: String },

    /// Delete the current value and save
    Delete { key: String },

    /// Revert a key to its default and save
    Reset { key: String },

    /// List current values
    List {
        /// Include defaults, marking values that are default
        #[arg(short, long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
