// src/catalog/mod.rs

//! The catalog store: package name -> package -> versions and labels
//!
//! The catalog lives in memory for the lifetime of the process. It owns two
//! directories: the playground, where uploads are staged and sealed, and the
//! store, where sealed archives are kept.
//!
//! # Locking
//!
//! Each [`Package`] has its own mutex. The store-wide mutex only guards the
//! name -> package map and is released before a package lock is taken; the
//! one exception is a brand-new package, which receives its first version
//! before it becomes visible in the map. No operation ever holds two package
//! locks, and no filesystem I/O happens while any lock is held.

mod lock;
mod package;
mod staging;
mod version;

pub use crate::hash::FileMeta;
pub use lock::{StoreLock, LOCK_FILE};
pub use package::{Package, LATEST_LABEL};
pub use staging::StagedVersion;
pub use version::PackageVersion;

pub(crate) use staging::staged_key;

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reject package names that cannot be used as a path component
pub fn validate_package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRequest("no package name specified".to_string()));
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(Error::InvalidPath(format!("invalid package name: {}", name)));
    }
    Ok(())
}

/// Process-wide package registry
#[derive(Debug)]
pub struct DataStore {
    playground: PathBuf,
    store: PathBuf,
    packages: Mutex<HashMap<String, Arc<Package>>>,
}

impl DataStore {
    /// Open a catalog over `playground` and `store`, creating both directories
    pub fn open<P: AsRef<Path>, S: AsRef<Path>>(playground: P, store: S) -> Result<Self> {
        let playground = playground.as_ref().to_path_buf();
        let store = store.as_ref().to_path_buf();

        for dir in [&playground, &store] {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                debug!(path = %dir.display(), "created catalog directory");
            }
        }

        Ok(Self {
            playground,
            store,
            packages: Mutex::new(HashMap::new()),
        })
    }

    pub fn playground(&self) -> &Path {
        &self.playground
    }

    pub fn store(&self) -> &Path {
        &self.store
    }

    /// Begin staging a new version of `name`
    pub fn new_package_version(&self, name: &str) -> Result<StagedVersion> {
        validate_package_name(name)?;
        StagedVersion::begin(&self.playground, name)
    }

    /// Look up a package without creating it
    pub fn package(&self, name: &str) -> Option<Arc<Package>> {
        self.packages.lock().get(name).cloned()
    }

    /// Names of all known packages, sorted
    pub fn package_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.packages.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Register a sealed version and move `latest` to it
    ///
    /// A payload still in the playground is renamed into the store first. A
    /// failed rename is logged and the version keeps its playground path.
    /// A version-id already known for the package is rejected with
    /// [`Error::DuplicateVersion`]; its staged archive is discarded and the
    /// catalog is left unchanged.
    pub fn add_package_version(&self, mut pv: PackageVersion) -> Result<PackageVersion> {
        validate_package_name(&pv.name)?;

        if let Some(existing) = self.package(&pv.name)
            && existing.has_version(&pv.version)
        {
            warn!(package = %pv.name, version = %pv.version, "rejecting duplicate version");
            self.discard_staged_payload(&pv.data_path);
            return Err(Error::DuplicateVersion {
                package: pv.name,
                version: pv.version,
            });
        }

        if pv.data_path.starts_with(&self.playground) {
            pv.data_path = self.relocate(&pv);
        }

        let name = pv.name.clone();
        let version = pv.version.clone();
        let package = {
            let mut packages = self.packages.lock();
            match packages.get(&name) {
                Some(package) => Arc::clone(package),
                None => {
                    let package = Package::new(&name);
                    package.add_version(pv)?;
                    let package = Arc::new(package);
                    packages.insert(name.clone(), Arc::clone(&package));
                    info!(package = %name, %version, "registered first version of package");
                    return package.get_version(&version).ok_or_else(|| Error::NotFound {
                        package: name.clone(),
                        designator: version.clone(),
                    });
                }
            }
        };

        package.add_version(pv)?;
        info!(package = %name, %version, "registered version");
        package.get_version(&version).ok_or(Error::NotFound {
            package: name,
            designator: version,
        })
    }

    /// Move a sealed archive from the playground into the store
    fn relocate(&self, pv: &PackageVersion) -> PathBuf {
        let Some(file_name) = pv.data_path.file_name() else {
            return pv.data_path.clone();
        };
        let target = self.store.join(file_name);

        match fs::rename(&pv.data_path, &target) {
            Ok(()) => {
                debug!(package = %pv.name, version = %pv.version, path = %target.display(), "relocated archive into store");
                target
            }
            Err(e) => {
                warn!(
                    package = %pv.name,
                    version = %pv.version,
                    path = %pv.data_path.display(),
                    error = %e,
                    "failed to relocate archive, keeping playground path"
                );
                pv.data_path.clone()
            }
        }
    }

    fn discard_staged_payload(&self, path: &Path) {
        if !path.starts_with(&self.playground) {
            return;
        }
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove staged archive"),
        }
    }

    /// Point `new_label` at the version of `package` designated by `designator`
    pub fn set_label(&self, package: &str, designator: &str, new_label: &str) -> Result<String> {
        let Some(p) = self.package(package) else {
            error!(package, designator, new_label, "package not found");
            return Err(Error::PackageNotFound(package.to_string()));
        };
        p.set_label(designator, new_label)
    }

    /// All versions of a package, or `None` when the package is unknown
    pub fn get_package_versions(&self, package: &str) -> Option<Vec<PackageVersion>> {
        match self.package(package) {
            Some(p) => Some(p.versions()),
            None => {
                warn!(package, "no package with that name");
                None
            }
        }
    }

    /// The version of `package` designated by a version-id or label
    pub fn get_package_version(&self, package: &str, designator: &str) -> Result<PackageVersion> {
        let p = self
            .package(package)
            .ok_or_else(|| Error::PackageNotFound(package.to_string()))?;
        p.get_version(designator).ok_or_else(|| Error::NotFound {
            package: package.to_string(),
            designator: designator.to_string(),
        })
    }
}
