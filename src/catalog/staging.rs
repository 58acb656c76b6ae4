// src/catalog/staging.rs

//! In-flight uploads
//!
//! A [`StagedVersion`] owns a scratch directory under
//! `<playground>/tmp/<package>/`. Files and directories are added in any
//! order, each registering its owner and mode. [`StagedVersion::finish`]
//! hashes the tree, writes the archive and only then hands back a sealed
//! [`PackageVersion`]; the scratch directory is removed when the staged
//! version is dropped.

use super::version::PackageVersion;
use crate::archive;
use crate::error::{Error, Result};
use crate::hash::{self, FileMeta};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

/// Normalize an upload path into (relative filesystem path, metadata key)
///
/// Leading slashes are stripped; `..` and empty paths are rejected.
/// Directory keys carry a trailing `/`.
pub(crate) fn staged_key(path: &str, is_dir: bool) -> Result<(PathBuf, String)> {
    let relative = path.trim_start_matches('/');
    let mut normalized = PathBuf::new();
    let mut parts = Vec::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => {
                let part = c
                    .to_str()
                    .ok_or_else(|| Error::InvalidPath(path.to_string()))?;
                normalized.push(part);
                parts.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                warn!(path, "path traversal attempt in upload");
                return Err(Error::InvalidPath(format!("path traversal detected: {}", path)));
            }
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if parts.is_empty() {
        return Err(Error::InvalidPath(format!("empty path: '{}'", path)));
    }

    let mut key = parts.join("/");
    if is_dir {
        key.push('/');
    }
    Ok((normalized, key))
}

/// An unsealed package version being assembled in the playground
#[derive(Debug)]
pub struct StagedVersion {
    name: String,
    dir: TempDir,
    files: HashMap<String, FileMeta>,
}

impl StagedVersion {
    /// Begin a new version of `name` inside `playground`
    pub fn begin(playground: &Path, name: &str) -> Result<Self> {
        let parent = playground.join("tmp").join(name);
        fs::create_dir_all(&parent)?;
        let dir = tempfile::Builder::new()
            .prefix("tmp-")
            .tempdir_in(&parent)
            .map_err(|e| {
                error!(package = name, path = %parent.display(), error = %e, "creating staging dir");
                e
            })?;

        debug!(package = name, path = %dir.path().display(), "staging new version");
        Ok(Self {
            name: name.to_string(),
            dir,
            files: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scratch directory holding the staged tree
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Registered metadata, keyed by relative path
    pub fn files(&self) -> &HashMap<String, FileMeta> {
        &self.files
    }

    /// Add a directory; an already-existing directory is not an error
    pub fn add_dir(&mut self, path: &str, owner: &str, mode: u32) -> Result<()> {
        let (relative, key) = staged_key(path, true)?;
        fs::create_dir_all(self.dir.path().join(&relative))?;
        self.files.insert(key, FileMeta::new(owner, mode));
        Ok(())
    }

    /// Add a file with its full contents
    ///
    /// Missing parent directories are created, but they still have to be
    /// registered with [`add_dir`](Self::add_dir) before the version can be
    /// sealed.
    pub fn add_file(&mut self, path: &str, owner: &str, mode: u32, contents: &[u8]) -> Result<()> {
        let (relative, key) = staged_key(path, false)?;
        let target = self.dir.path().join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = fs::File::create(&target).map_err(|e| {
            error!(package = %self.name, path = %target.display(), error = %e, "opening staged file");
            e
        })?;
        out.write_all(contents)?;

        self.files.insert(key, FileMeta::new(owner, mode));
        Ok(())
    }

    /// Hash the tree, archive it into `archive_dir` and seal the version
    ///
    /// The version-id is assigned only once the archive is complete, so a
    /// failed archival never yields a version that could be registered.
    pub fn finish(self, archive_dir: &Path) -> Result<PackageVersion> {
        let paths = hash::paths_under_root(self.dir.path())?;
        let version = hash::digest_paths(&self.name, self.dir.path(), &paths, &self.files)
            .map_err(|e| {
                error!(package = %self.name, error = %e, "hashing staged version");
                e
            })?;

        let archive_path = archive_dir.join(archive::archive_file_name(&self.name, &version));
        archive::write_archive(
            &self.name,
            &version,
            self.dir.path(),
            &paths,
            &self.files,
            &archive_path,
        )?;

        info!(package = %self.name, %version, archive = %archive_path.display(), "sealed version");
        Ok(PackageVersion {
            name: self.name,
            version,
            labels: Default::default(),
            data_path: archive_path,
            files: self.files,
            uploaded_at: Utc::now(),
        })
    }
}
