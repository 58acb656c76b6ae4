// src/protocol.rs

//! Request and response records exchanged with the catalog
//!
//! These are plain serde structures; the HTTP transport sends them as JSON
//! with file contents base64-encoded.

use crate::catalog::PackageVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of an upload
///
/// A name with a trailing `/` denotes a directory and carries no contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub owner: String,
    pub mode: u32,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<u8>,
}

impl FileEntry {
    pub fn dir(name: impl Into<String>, owner: impl Into<String>, mode: u32) -> Self {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        Self {
            name,
            owner: owner.into(),
            mode,
            contents: Vec::new(),
        }
    }

    pub fn file(name: impl Into<String>, owner: impl Into<String>, mode: u32, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            mode,
            contents: contents.into(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// `UploadPackage` request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPackage {
    pub package_name: String,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// Version record returned by every catalog operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInformation {
    pub package_name: String,
    pub version: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl PackageInformation {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

impl From<&PackageVersion> for PackageInformation {
    fn from(pv: &PackageVersion) -> Self {
        Self {
            package_name: pv.name.clone(),
            version: pv.version.clone(),
            labels: pv.all_labels(),
            uploaded_at: Some(pv.uploaded_at),
        }
    }
}

impl From<PackageVersion> for PackageInformation {
    fn from(pv: PackageVersion) -> Self {
        Self::from(&pv)
    }
}

/// `GetPackageInformation` request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageInformationRequest {
    pub package_name: String,
}

/// `GetPackageInformation` response; empty when the package is unknown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageInformationResponse {
    #[serde(default)]
    pub package_data: Vec<PackageInformation>,
}

/// `SetLabels` request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetLabelRequest {
    pub package_name: String,
    /// Version-id or label designating the target version
    pub version: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// A label that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFailure {
    pub label: String,
    pub reason: String,
}

/// `SetLabels` response: the version's current state plus any failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetLabelsResponse {
    pub package: PackageInformation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<LabelFailure>,
}

/// `GetPackage` request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetPackageRequest {
    pub package_name: String,
    pub designator: String,
}

/// `GetPackage` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPackageResponse {
    pub package: PackageInformation,
}

/// Error body sent by the HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Designator, version, staged path or reason, depending on `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}
