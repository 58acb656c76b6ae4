// src/client/purge.rs

//! Local status and retention
//!
//! Purge deletes fetched version directories. The active version is always
//! kept. Without labels every other local version goes; with labels only
//! the versions those labels name in the catalog do.

use super::Client;
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Outcome of a purge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Versions whose directories were deleted
    pub removed: Vec<String>,
    /// Active version spared from deletion
    pub kept_active: Option<String>,
    /// Versions selected for deletion that were not on disk
    pub missing: Vec<String>,
    /// Labels that did not resolve to any version
    pub unresolved: Vec<String>,
}

/// Version-ids are lowercase hex
fn is_version_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Extract the version from a `<package>-<version>` path
pub(crate) fn split_package_version(path: &Path, package: &str) -> Result<String> {
    let target = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    match target
        .strip_prefix(package)
        .and_then(|rest| rest.strip_prefix('-'))
    {
        Some(version) if !version.is_empty() => Ok(version.to_string()),
        _ => {
            error!(package, target, "malformed version path");
            Err(Error::MalformedLink {
                link: path.to_path_buf(),
                target: target.to_string(),
            })
        }
    }
}

impl Client {
    /// Version-ids fetched locally for a package, sorted
    pub fn installed_versions(&self, package: &str) -> Result<Vec<String>> {
        let pattern = format!(
            "{}/{}-*",
            glob::Pattern::escape(&self.root.to_string_lossy()),
            glob::Pattern::escape(package)
        );
        debug!(package, %pattern, "listing local versions");

        let entries = glob::glob(&pattern)
            .map_err(|e| Error::InvalidPath(format!("{}: {}", pattern, e)))?;

        let mut versions = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(package, error = %e, "unreadable entry in install root");
                    continue;
                }
            };
            if !fs::symlink_metadata(&path).map(|m| m.is_dir()).unwrap_or(false) {
                continue;
            }
            match split_package_version(&path, package) {
                Ok(version) if is_version_id(&version) => versions.push(version),
                Ok(_) | Err(_) => debug!(path = %path.display(), "not a version directory of this package"),
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// Version the package's pointer names, if there is a pointer
    ///
    /// Fails with [`Error::NotASymlink`] if something other than a symlink
    /// sits where the pointer belongs.
    pub fn active_version(&self, package: &str) -> Result<Option<String>> {
        let link = self.pointer_path(package);
        match fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => {}
            Ok(_) => return Err(Error::NotASymlink(link)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        }

        let target = fs::read_link(&link)?;
        split_package_version(&target, package).map(Some)
    }

    /// Delete local versions of a package, never the active one
    ///
    /// Unresolvable labels and already-absent directories are skipped with a
    /// warning. The first failed deletion aborts the purge.
    pub fn purge(&self, package: &str, labels: &[String]) -> Result<PurgeReport> {
        let mut report = PurgeReport::default();

        let avoid = match self.active_version(package) {
            Ok(active) => active,
            Err(Error::NotASymlink(path)) => {
                warn!(package, path = %path.display(), "pointer is not a symlink, treating package as inactive");
                None
            }
            Err(e) => {
                error!(package, error = %e, "failed to resolve active pointer");
                return Err(e);
            }
        };

        let zap: BTreeSet<String> = if labels.is_empty() {
            self.installed_versions(package)?.into_iter().collect()
        } else {
            let label_map = self.full_label_map(package)?;
            let mut zap = BTreeSet::new();
            for label in labels {
                match label_map.get(label) {
                    Some(version) => {
                        zap.insert(version.clone());
                    }
                    None => {
                        warn!(package, %label, "label is not set, skipping");
                        report.unresolved.push(label.clone());
                    }
                }
            }
            zap
        };
        debug!(package, avoid = ?avoid, zap = ?zap, "purge");

        for version in zap {
            let dir = self.version_dir(package, &version);
            if avoid.as_deref() == Some(version.as_str()) {
                info!(package, %version, path = %dir.display(), "currently active, not purging");
                report.kept_active = Some(version);
                continue;
            }

            if fs::symlink_metadata(&dir).is_err() {
                warn!(package, %version, path = %dir.display(), "version not present, nothing to purge");
                report.missing.push(version);
                continue;
            }

            fs::remove_dir_all(&dir).map_err(|e| {
                error!(package, %version, path = %dir.display(), error = %e, "failed deleting version directory");
                e
            })?;
            info!(package, %version, "purged");
            report.removed.push(version);
        }

        if report.kept_active.is_none() {
            report.kept_active = avoid;
        }
        Ok(report)
    }
}
