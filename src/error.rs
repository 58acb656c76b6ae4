// src/error.rs

//! Error types shared by the catalog, the service facade and the client

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by catalog and client operations
#[derive(Error, Debug)]
pub enum Error {
    /// The package has never been uploaded to the catalog
    #[error("package {0} not found")]
    PackageNotFound(String),

    /// No version of the package matches the designator (version-id or label)
    #[error("package {package}: no version designated by '{designator}'")]
    NotFound { package: String, designator: String },

    /// The version-id is already registered for this package
    #[error("package {package} already has a version {version}")]
    DuplicateVersion { package: String, version: String },

    /// A staged path has no registered metadata
    #[error("package {package}: staged path '{path}' was never registered")]
    CorruptVersion { package: String, path: String },

    /// A path expected to be a directory is something else
    #[error("expected {0} to be a directory")]
    NotADirectory(PathBuf),

    /// A version directory does not exist locally
    #[error("{0} does not exist")]
    Missing(PathBuf),

    /// The package pointer is absent or not a symlink
    #[error("{0} is not a symlink")]
    NotASymlink(PathBuf),

    /// The package pointer targets something that is not a version directory
    #[error("malformed pointer {link}: target '{target}' does not belong to the package")]
    MalformedLink { link: PathBuf, target: String },

    /// A path supplied by a caller escapes its root or is otherwise unusable
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A request is missing a required field
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An archive entry could not be unpacked safely
    #[error("archive error: {0}")]
    Archive(String),

    /// The catalog service does not implement this operation
    #[error("{0} is not implemented by this catalog")]
    Unimplemented(&'static str),

    /// The remote catalog answered with an error
    #[error("remote catalog error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Configuration file could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem or archive I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for both the unknown-package and unknown-designator cases
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PackageNotFound(_) | Self::NotFound { .. })
    }

    /// Short machine-readable tag, used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PackageNotFound(_) | Self::NotFound { .. } => "not_found",
            Self::DuplicateVersion { .. } => "duplicate_version",
            Self::CorruptVersion { .. } => "corrupt_version",
            Self::NotADirectory(_) => "not_a_directory",
            Self::Missing(_) => "missing",
            Self::NotASymlink(_) => "not_a_symlink",
            Self::MalformedLink { .. } => "malformed_link",
            Self::InvalidPath(_) => "invalid_path",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Archive(_) => "archive",
            Self::Unimplemented(_) => "unimplemented",
            Self::Remote { .. } => "remote",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }

    /// Structured fields carried next to [`Error::kind`] on the wire
    ///
    /// Returns the package name and the variant's detail (designator,
    /// version, staged path or bare reason), when the variant has them.
    pub fn wire_fields(&self) -> (Option<String>, Option<String>) {
        match self {
            Self::PackageNotFound(package) => (Some(package.clone()), None),
            Self::NotFound { package, designator } => (Some(package.clone()), Some(designator.clone())),
            Self::DuplicateVersion { package, version } => (Some(package.clone()), Some(version.clone())),
            Self::CorruptVersion { package, path } => (Some(package.clone()), Some(path.clone())),
            Self::InvalidPath(reason) | Self::InvalidRequest(reason) => (None, Some(reason.clone())),
            _ => (None, None),
        }
    }

    /// Rebuild a typed error from its wire form
    ///
    /// Kinds without a typed counterpart on the client come back as
    /// [`Error::Remote`].
    pub fn from_wire(
        status: u16,
        kind: &str,
        message: String,
        package: Option<String>,
        detail: Option<String>,
    ) -> Self {
        match (kind, package, detail) {
            ("not_found", Some(package), None) => Self::PackageNotFound(package),
            ("not_found", Some(package), Some(designator)) => Self::NotFound { package, designator },
            ("duplicate_version", Some(package), Some(version)) => {
                Self::DuplicateVersion { package, version }
            }
            ("corrupt_version", Some(package), Some(path)) => Self::CorruptVersion { package, path },
            ("invalid_path", _, Some(reason)) => Self::InvalidPath(reason),
            ("invalid_request", _, Some(reason)) => Self::InvalidRequest(reason),
            _ => Self::Remote { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_covers_both_variants() {
        assert!(Error::PackageNotFound("bob".into()).is_not_found());
        assert!(
            Error::NotFound {
                package: "bob".into(),
                designator: "dexter".into(),
            }
            .is_not_found()
        );
        assert!(!Error::InvalidRequest("x".into()).is_not_found());
    }

    #[test]
    fn test_display_carries_context() {
        let err = Error::DuplicateVersion {
            package: "bob".into(),
            version: "deadbeef".into(),
        };
        assert_eq!(err.to_string(), "package bob already has a version deadbeef");
        assert_eq!(err.kind(), "duplicate_version");
    }

    #[test]
    fn test_wire_form_rebuilds_typed_errors() {
        let errors = [
            Error::PackageNotFound("bob".into()),
            Error::NotFound {
                package: "bob".into(),
                designator: "rc/1".into(),
            },
            Error::DuplicateVersion {
                package: "bob".into(),
                version: "deadbeef".into(),
            },
            Error::CorruptVersion {
                package: "bob".into(),
                path: "lib/".into(),
            },
            Error::InvalidPath("../x".into()),
            Error::InvalidRequest("no package name specified".into()),
        ];
        for err in errors {
            let (package, detail) = err.wire_fields();
            let rebuilt = Error::from_wire(400, err.kind(), err.to_string(), package, detail);
            assert_eq!(rebuilt.to_string(), err.to_string());
            assert_eq!(rebuilt.kind(), err.kind());
        }
    }

    #[test]
    fn test_untyped_wire_kinds_stay_remote() {
        let err = Error::from_wire(500, "io", "I/O error: disk full".into(), None, None);
        assert!(matches!(err, Error::Remote { status: 500, .. }));
        assert_eq!(err.to_string(), "remote catalog error (500): I/O error: disk full");
    }
}
