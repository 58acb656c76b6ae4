// src/lib.rs

//! mspm - a minimal software package manager
//!
//! A central catalog stores immutable, content-addressed package versions;
//! clients fetch, label, activate and garbage-collect local installations.
//!
//! # Architecture
//!
//! - Content addressing: a version-id is the SHA-512 of the staged tree
//!   (paths, owners, modes and contents, in canonical order)
//! - Labels: mutable aliases ("latest", "stable", ...) naming one version each
//! - Catalog: in-memory registry with one lock per package
//! - Client: version directories `<package>-<version>/` plus an atomically
//!   swapped `<package>` symlink naming the active one

pub mod archive;
pub mod catalog;
pub mod client;
pub mod config;
mod error;
pub mod hash;
pub mod protocol;
pub mod service;

#[cfg(feature = "server")]
pub mod server;

pub use catalog::{DataStore, Package, PackageVersion, StagedVersion, StoreLock, LATEST_LABEL};
pub use client::{Client, FetchOutcome, HttpCatalog, PurgeReport, ScriptOutput};
pub use config::MspmConfig;
pub use error::{Error, Result};
pub use hash::{mode_string, FileMeta};
pub use service::{CatalogServer, CatalogService, UnimplementedCatalog};
