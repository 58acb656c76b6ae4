// src/catalog/version.rs

//! One immutable, content-addressed release of a package

use crate::hash::FileMeta;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// A sealed package version
///
/// The version-id is the digest of the file set in `files` plus their
/// contents; once a version is registered under that id its content never
/// changes. Only `labels` and `data_path` are touched after registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersion {
    /// Package name
    pub name: String,
    /// Hex SHA-512 version-id
    pub version: String,
    /// Labels currently pointing at this version
    pub labels: BTreeSet<String>,
    /// Absolute path of the archive holding the payload
    pub data_path: PathBuf,
    /// Registered metadata for every path in the payload
    pub files: HashMap<String, FileMeta>,
    /// When the version was sealed
    pub uploaded_at: DateTime<Utc>,
}

impl PackageVersion {
    /// Create an unlabeled version record
    pub fn new(name: impl Into<String>, version: impl Into<String>, data_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            labels: BTreeSet::new(),
            data_path: data_path.into(),
            files: HashMap::new(),
            uploaded_at: Utc::now(),
        }
    }

    /// All labels, in sorted order
    pub fn all_labels(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}
