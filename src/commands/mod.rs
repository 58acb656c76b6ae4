// src/commands/mod.rs
//! Command handlers for the mspm CLI

mod catalog;
mod install;
mod server;

pub use catalog::{cmd_info, cmd_label, cmd_show, cmd_upload};
pub use install::{
    cmd_activate, cmd_deactivate, cmd_fetch, cmd_purge, cmd_start, cmd_status, cmd_stop,
};
pub use server::cmd_serve;

/// Shorten a version-id for display
pub(crate) fn short_version(version: &str) -> &str {
    version.get(..16).unwrap_or(version)
}
