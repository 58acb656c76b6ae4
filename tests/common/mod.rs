// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use mspm::protocol::{FileEntry, NewPackage};
use mspm::{CatalogServer, Client};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// An in-process catalog plus a client wired straight to it.
///
/// Keep the `TempDir` alive to prevent cleanup.
pub struct Fixture {
    pub dir: TempDir,
    pub server: Arc<CatalogServer>,
    pub client: Client,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let server = Arc::new(
            CatalogServer::open(dir.path().join("playground"), dir.path().join("store")).unwrap(),
        );
        let client = Client::new(server.clone(), dir.path().join("root"));
        Self { dir, server, client }
    }

    pub fn root(&self) -> &Path {
        self.client.root()
    }

    pub fn store(&self) -> PathBuf {
        self.dir.path().join("store")
    }
}

/// Upload request for a service package whose start script prints `message`.
pub fn service_package(name: &str, message: &str) -> NewPackage {
    NewPackage {
        package_name: name.to_string(),
        files: vec![
            FileEntry::file("start", "root", 0o755, format!("#!/bin/sh\necho {}\n", message)),
            FileEntry::file("stop", "root", 0o755, "#!/bin/sh\nexit 0\n"),
            FileEntry::dir("etc", "root", 0o755),
            FileEntry::file("etc/app.conf", "root", 0o644, format!("message={}\n", message)),
        ],
    }
}

/// Build a small on-disk tree for producer-side uploads.
pub fn write_tree(root: &Path, message: &str) {
    fs::create_dir_all(root.join("etc")).unwrap();
    fs::create_dir_all(root.join("lib/plugins")).unwrap();
    fs::write(root.join("etc/app.conf"), format!("message={}\n", message)).unwrap();
    fs::write(root.join("lib/plugins/a.so"), b"\x7fELF").unwrap();

    let start = root.join("start");
    fs::write(&start, format!("#!/bin/sh\necho {}\n", message)).unwrap();
    fs::set_permissions(&start, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Names of entries directly under `dir`, sorted.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
