// src/cli.rs
//! CLI definitions for mspm
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mspm")]
#[command(author = "mspm Contributors")]
#[command(version)]
#[command(about = "Minimal software package manager with a content-addressed catalog", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = mspm::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Catalog server URL (overrides [client] catalog)
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Install root (overrides [client] root)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    // =========================================================================
    // Catalog server
    // =========================================================================
    /// Run the catalog server
    Serve {
        /// Address to listen on (overrides [server] listen)
        #[arg(long)]
        listen: Option<String>,

        /// Staging area for uploads (overrides [storage] playground)
        #[arg(long)]
        playground: Option<PathBuf>,

        /// Durable archive store (overrides [storage] store)
        #[arg(long)]
        store: Option<PathBuf>,
    },

    // =========================================================================
    // Catalog queries and updates
    // =========================================================================
    /// Upload a directory tree as a new version of a package
    Upload {
        /// Package name
        package: String,

        /// Directory holding the package tree
        dir: PathBuf,

        /// Labels to apply to the new version
        #[arg(short, long = "label")]
        labels: Vec<String>,
    },

    /// List all versions of a package known to the catalog
    Info {
        /// Package name
        package: String,
    },

    /// Point labels at a version
    Label {
        /// Package name
        package: String,

        /// Version-id or existing label
        designator: String,

        /// Labels to set
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Show the version a designator resolves to
    Show {
        /// Package name
        package: String,

        /// Version-id or label
        #[arg(default_value = "latest")]
        designator: String,
    },

    // =========================================================================
    // Local installation
    // =========================================================================
    /// Download and unpack a version into the install root
    Fetch {
        /// Package name
        package: String,

        /// Version-id or label
        #[arg(default_value = "latest")]
        designator: String,

        /// Activate the version once fetched
        #[arg(long)]
        activate: bool,
    },

    /// Make a fetched version the active one
    Activate {
        /// Package name
        package: String,

        /// Version-id or label
        #[arg(default_value = "latest")]
        designator: String,
    },

    /// Remove the active pointer of a package
    Deactivate {
        /// Package name
        package: String,

        /// Version-id or label
        #[arg(default_value = "latest")]
        designator: String,
    },

    /// Run the start entry point of the active version
    Start {
        /// Package name
        package: String,
    },

    /// Run the stop entry point of the active version
    Stop {
        /// Package name
        package: String,
    },

    /// Delete local versions that are not active
    Purge {
        /// Package name
        package: String,

        /// Only purge the versions these labels name
        labels: Vec<String>,
    },

    /// Show local versions and the active one
    Status {
        /// Package name
        package: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}
