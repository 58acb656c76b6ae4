// src/catalog/package.rs

//! A named package: its versions and the labels aliasing them
//!
//! All state sits behind one mutex per package, so a label move (detach
//! from the old version, attach to the new one, rebind the alias) is a
//! single critical section and readers never see the label unbound.

use super::version::PackageVersion;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Label moved to every newly added version
pub const LATEST_LABEL: &str = "latest";

#[derive(Debug, Default)]
struct PackageState {
    /// version-id -> version
    versions: HashMap<String, PackageVersion>,
    /// label -> version-id
    labels: HashMap<String, String>,
}

impl PackageState {
    /// Resolve a designator: an exact version-id wins over a label
    fn resolve(&self, designator: &str) -> Option<String> {
        if self.versions.contains_key(designator) {
            return Some(designator.to_string());
        }
        self.labels.get(designator).cloned()
    }

    fn set_label(&mut self, package: &str, designator: &str, new_label: &str) -> Result<String> {
        let target = self.resolve(designator).ok_or_else(|| Error::NotFound {
            package: package.to_string(),
            designator: designator.to_string(),
        })?;

        if let Some(old) = self.labels.get(new_label)
            && *old != target
            && let Some(old_version) = self.versions.get_mut(old)
        {
            old_version.labels.remove(new_label);
        }

        if let Some(version) = self.versions.get_mut(&target) {
            version.labels.insert(new_label.to_string());
        }
        let previous = self.labels.insert(new_label.to_string(), target.clone());

        debug!(
            package,
            label = new_label,
            version = %target,
            previous = ?previous,
            "label set"
        );
        Ok(target)
    }
}

/// All versions of one package
#[derive(Debug)]
pub struct Package {
    name: String,
    state: Mutex<PackageState>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(PackageState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point `new_label` at the version designated by `designator`
    ///
    /// If the label is bound to another version it is detached there in the
    /// same critical section. Returns the version-id the label now names.
    pub fn set_label(&self, designator: &str, new_label: &str) -> Result<String> {
        self.state.lock().set_label(&self.name, designator, new_label)
    }

    /// Snapshot of the version designated by a version-id or label
    pub fn get_version(&self, designator: &str) -> Option<PackageVersion> {
        let state = self.state.lock();
        let version = state.resolve(designator)?;
        state.versions.get(&version).cloned()
    }

    /// Resolve a designator to a version-id without copying the version
    pub fn resolve(&self, designator: &str) -> Option<String> {
        self.state.lock().resolve(designator)
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.state.lock().versions.contains_key(version)
    }

    /// Snapshot of every version, in no particular order
    pub fn versions(&self) -> Vec<PackageVersion> {
        self.state.lock().versions.values().cloned().collect()
    }

    /// Version-id the label currently names
    pub fn label_target(&self, label: &str) -> Option<String> {
        self.state.lock().labels.get(label).cloned()
    }

    /// Insert a new version and move `latest` to it
    ///
    /// Versions are append-only: an existing version-id is rejected with
    /// [`Error::DuplicateVersion`] and the package is left untouched.
    pub fn add_version(&self, version: PackageVersion) -> Result<()> {
        let mut state = self.state.lock();
        let id = version.version.clone();

        if state.versions.contains_key(&id) {
            return Err(Error::DuplicateVersion {
                package: self.name.clone(),
                version: id,
            });
        }

        // Labels are owned by the package's label map, never by the caller.
        let mut version = version;
        version.labels.clear();
        state.versions.insert(id.clone(), version);
        state.set_label(&self.name, &id, LATEST_LABEL)?;
        Ok(())
    }
}
