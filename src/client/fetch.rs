// src/client/fetch.rs

//! Downloading and unpacking versions into the install root
//!
//! The archive is downloaded to a temporary file and unpacked into a
//! temporary directory inside the install root; the finished version
//! directory is then renamed into place, so `<package>-<version>/` either
//! exists complete or not at all.

use super::Client;
use crate::archive::{self, version_dir_name};
use crate::error::Result;
use crate::protocol::GetPackageRequest;
use std::fs;
use std::io::{Seek, SeekFrom};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Result of [`Client::fetch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub version: String,
    pub path: PathBuf,
    /// False when the version was already present locally
    pub downloaded: bool,
}

impl Client {
    /// Make the version designated by `designator` available locally
    pub fn fetch(&self, package: &str, designator: &str) -> Result<FetchOutcome> {
        let version = self.resolve(package, designator)?;
        let dir_name = version_dir_name(package, &version);
        let target = self.root.join(&dir_name);

        if fs::symlink_metadata(&target).is_ok() {
            super::activate::check_version_dir(&target)?;
            debug!(package, %version, "version already present");
            return Ok(FetchOutcome {
                version,
                path: target,
                downloaded: false,
            });
        }

        fs::create_dir_all(&self.root)?;
        let mut download = tempfile::Builder::new()
            .prefix(".mspm-download-")
            .tempfile_in(&self.root)?;
        let request = GetPackageRequest {
            package_name: package.to_string(),
            designator: version.clone(),
        };
        let bytes = self.catalog.download_package(&request, download.as_file_mut())?;
        download.as_file_mut().seek(SeekFrom::Start(0))?;

        let unpack_dir = tempfile::Builder::new()
            .prefix(".mspm-fetch-")
            .tempdir_in(&self.root)?;
        let entries = archive::unpack(download.as_file_mut(), unpack_dir.path(), &dir_name)
            .map_err(|e| {
                error!(package, %version, error = %e, "unpacking archive");
                e
            })?;

        let unpacked = unpack_dir.path().join(&dir_name);
        fs::create_dir_all(&unpacked)?;
        fs::rename(&unpacked, &target).map_err(|e| {
            error!(package, %version, path = %target.display(), error = %e, "moving version into place");
            e
        })?;

        info!(package, %version, bytes, entries, path = %target.display(), "fetched");
        Ok(FetchOutcome {
            version,
            path: target,
            downloaded: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::{FileEntry, NewPackage};
    use crate::service::{CatalogServer, CatalogService};
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Client) {
        let dir = TempDir::new().unwrap();
        let server =
            CatalogServer::open(dir.path().join("playground"), dir.path().join("store")).unwrap();
        server
            .upload_package(NewPackage {
                package_name: "bob".into(),
                files: vec![
                    FileEntry::dir("bin", "root", 0o750),
                    FileEntry::file("bin/start", "root", 0o755, "#!/bin/sh\necho hi\n"),
                    FileEntry::file("README", "root", 0o640, "bob"),
                ],
            })
            .unwrap();
        let client = Client::new(Arc::new(server), dir.path().join("root"));
        (dir, client)
    }

    #[test]
    fn test_fetch_unpacks_version() {
        let (_dir, client) = setup();
        let outcome = client.fetch("bob", "latest").unwrap();
        assert!(outcome.downloaded);
        assert_eq!(outcome.path, client.version_dir("bob", &outcome.version));

        let readme = outcome.path.join("README");
        assert_eq!(fs::read_to_string(&readme).unwrap(), "bob");
        assert_eq!(fs::metadata(&readme).unwrap().permissions().mode() & 0o777, 0o640);
        let bin = outcome.path.join("bin");
        assert_eq!(fs::metadata(&bin).unwrap().permissions().mode() & 0o777, 0o750);

        // only the version directory remains in the root
        let names: Vec<_> = fs::read_dir(client.root())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_fetch_twice_is_noop() {
        let (_dir, client) = setup();
        let first = client.fetch("bob", "latest").unwrap();
        fs::write(first.path.join("local-state"), "keep").unwrap();

        let second = client.fetch("bob", &first.version).unwrap();
        assert!(!second.downloaded);
        assert!(second.path.join("local-state").exists());
    }

    #[test]
    fn test_fetch_unknown_designator() {
        let (_dir, client) = setup();
        assert!(matches!(client.fetch("bob", "dexter"), Err(Error::NotFound { .. })));
        assert!(!client.root().exists());
    }

    #[test]
    fn test_fetch_then_activate() {
        let (_dir, client) = setup();
        let outcome = client.fetch("bob", "latest").unwrap();
        client.activate("bob", "latest").unwrap();
        assert_eq!(client.active_version("bob").unwrap(), Some(outcome.version));
    }
}
