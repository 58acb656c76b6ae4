// src/client/upload.rs

//! Producer side: uploading a local directory tree as a new version

use super::Client;
use crate::error::{Error, Result};
use crate::protocol::{FileEntry, NewPackage, PackageInformation};
use nix::unistd::{Uid, User};
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Resolve uids to user names, falling back to the numeric uid
#[derive(Debug, Default)]
struct OwnerCache {
    names: HashMap<u32, String>,
}

impl OwnerCache {
    fn name(&mut self, uid: u32) -> String {
        self.names
            .entry(uid)
            .or_insert_with(|| match User::from_uid(Uid::from_raw(uid)) {
                Ok(Some(user)) => user.name,
                Ok(None) => uid.to_string(),
                Err(e) => {
                    warn!(uid, error = %e, "user lookup failed, using numeric owner");
                    uid.to_string()
                }
            })
            .clone()
    }
}

/// Collect every directory and regular file under `dir` as upload entries
///
/// Symlinks and special files are skipped.
pub fn collect_entries(dir: &Path) -> Result<Vec<FileEntry>> {
    let meta = fs::metadata(dir)?;
    if !meta.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }

    let mut owners = OwnerCache::default();
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| Error::InvalidPath(entry.path().display().to_string()))?;
        let name = relative
            .to_str()
            .ok_or_else(|| Error::InvalidPath(relative.display().to_string()))?;

        let metadata = entry.metadata().map_err(|e| Error::Io(e.into()))?;
        let owner = owners.name(metadata.uid());
        let mode = metadata.mode() & 0o777;

        if metadata.is_dir() {
            entries.push(FileEntry::dir(name, owner, mode));
        } else if metadata.is_file() {
            entries.push(FileEntry::file(name, owner, mode, fs::read(entry.path())?));
        } else {
            warn!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    debug!(dir = %dir.display(), entries = entries.len(), "collected upload entries");
    Ok(entries)
}

impl Client {
    /// Upload the tree under `dir` as a new version of `package`
    pub fn upload(&self, package: &str, dir: &Path) -> Result<PackageInformation> {
        let files = collect_entries(dir)?;
        let info = self.catalog.upload_package(NewPackage {
            package_name: package.to_string(),
            files,
        })?;
        info!(package, version = %info.version, "uploaded");
        Ok(info)
    }
}
