// src/client/activate.rs

//! Switching the active version of a package
//!
//! The pointer `<root>/<package>` is replaced by creating a temporary
//! symlink next to it and renaming it over the old one, so the package is
//! never left without a pointer mid-switch.

use super::Client;
use crate::archive::version_dir_name;
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error, info, warn};

/// Require `path` to be an existing directory (not followed through symlinks)
pub(super) fn check_version_dir(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(meta) => {
            error!(path = %path.display(), file_type = ?meta.file_type(), "version path is not a directory");
            Err(Error::NotADirectory(path.to_path_buf()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            error!(path = %path.display(), "version directory is missing");
            Err(Error::Missing(path.to_path_buf()))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

/// Atomically point `link` at `./<target_name>`
fn replace_pointer(link: &Path, target_name: &str) -> Result<()> {
    let parent = link.parent().unwrap_or_else(|| Path::new("."));
    let file_name = link
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidPath(link.display().to_string()))?;
    let temp_link: PathBuf = parent.join(format!(".{}.tmp-{}", file_name, process::id()));

    match fs::remove_file(&temp_link) {
        Ok(()) => debug!(path = %temp_link.display(), "removed stale temporary pointer"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::Io(e)),
    }

    symlink(format!("./{}", target_name), &temp_link)?;
    if let Err(e) = fs::rename(&temp_link, link) {
        error!(link = %link.display(), error = %e, "failed to move pointer into place");
        let _ = fs::remove_file(&temp_link);
        return Err(Error::Io(e));
    }
    Ok(())
}

impl Client {
    /// Make the version designated by `designator` the active one
    ///
    /// The version must already be fetched; activation never downloads.
    /// Returns the activated version-id.
    pub fn activate(&self, package: &str, designator: &str) -> Result<String> {
        debug!(package, designator, "activate");

        let version = self.resolve(package, designator)?;
        let target_name = version_dir_name(package, &version);
        check_version_dir(&self.root.join(&target_name))?;

        let link = self.pointer_path(package);
        replace_pointer(&link, &target_name)?;

        info!(package, %version, link = %link.display(), "activated");
        Ok(version)
    }

    /// Remove the package's pointer
    ///
    /// The designator is resolved and its version directory validated, then
    /// the pointer is removed whichever version it names. A pointer naming a
    /// different version is removed too, with a warning.
    pub fn deactivate(&self, package: &str, designator: &str) -> Result<()> {
        debug!(package, designator, "deactivate");

        let version = self.resolve(package, designator)?;
        check_version_dir(&self.version_dir(package, &version))?;

        let link = self.pointer_path(package);
        if fs::symlink_metadata(&link).is_err() {
            debug!(package, "no pointer to remove");
            return Ok(());
        }

        match self.active_version(package) {
            Ok(Some(active)) if active != version => {
                warn!(
                    package,
                    %version,
                    %active,
                    "pointer names a different version than requested, removing anyway"
                );
            }
            Ok(_) => {}
            Err(e) => warn!(package, error = %e, "could not read current pointer"),
        }

        fs::remove_file(&link).map_err(|e| {
            error!(link = %link.display(), error = %e, "failed removing pointer");
            e
        })?;
        info!(package, %version, "deactivated");
        Ok(())
    }
}
