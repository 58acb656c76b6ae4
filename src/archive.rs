// src/archive.rs

//! Package archives
//!
//! A sealed version is packaged as a gzip-compressed tar stream whose
//! entries are all rooted at `<package>-<version>/`. Permission bits come
//! from the registered metadata (low 9 bits only) and numeric owner/group
//! ids are forced to 0 so no host identity leaks into the archive.

use crate::error::{Error, Result};
use crate::hash::FileMeta;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use tar::{Builder, EntryType, Header};
use tracing::{debug, error, warn};

/// Name of the directory a version unpacks into (`<package>-<version>`)
pub fn version_dir_name(package: &str, version: &str) -> String {
    format!("{}-{}", package, version)
}

/// Name of the archive file for a version (`<package>-<version>.tgz`)
pub fn archive_file_name(package: &str, version: &str) -> String {
    format!("{}.tgz", version_dir_name(package, version))
}

/// Write the archive for a sealed tree to `out_path`
///
/// `paths` must be the canonical traversal of `root` (see
/// [`crate::hash::paths_under_root`]). On any failure the partially written
/// archive is removed before the error is returned.
pub fn write_archive(
    package: &str,
    version: &str,
    root: &Path,
    paths: &[String],
    meta: &HashMap<String, FileMeta>,
    out_path: &Path,
) -> Result<()> {
    let result = write_archive_inner(package, version, root, paths, meta, out_path);
    if let Err(ref e) = result {
        error!(
            package,
            version,
            archive = %out_path.display(),
            error = %e,
            "archiving failed"
        );
        if let Err(rm) = fs::remove_file(out_path)
            && rm.kind() != io::ErrorKind::NotFound
        {
            warn!(archive = %out_path.display(), error = %rm, "failed to remove partial archive");
        }
    }
    result
}

fn write_archive_inner(
    package: &str,
    version: &str,
    root: &Path,
    paths: &[String],
    meta: &HashMap<String, FileMeta>,
    out_path: &Path,
) -> Result<()> {
    let prefix = version_dir_name(package, version);
    let output = File::create(out_path)?;
    let mut archive = Builder::new(GzEncoder::new(output, Compression::default()));

    for name in paths {
        let info = meta.get(name).ok_or_else(|| Error::CorruptVersion {
            package: package.to_string(),
            path: name.clone(),
        })?;
        let fs_path = root.join(name.trim_end_matches('/'));
        let tar_name = format!("{}/{}", prefix, name);
        let metadata = fs::metadata(&fs_path)?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut header = Header::new_gnu();
        header.set_mode(info.mode & 0o777);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(mtime);

        if name.ends_with('/') {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            archive.append_data(&mut header, &tar_name, io::empty())?;
        } else {
            let file = File::open(&fs_path)?;
            header.set_entry_type(EntryType::Regular);
            header.set_size(metadata.len());
            archive.append_data(&mut header, &tar_name, file)?;
        }
    }

    let encoder = archive.into_inner()?;
    let file = encoder.finish()?;
    file.sync_all()?;

    debug!(package, version, entries = paths.len(), archive = %out_path.display(), "wrote archive");
    Ok(())
}

/// Check that an archive entry path stays inside `<prefix>/`
fn checked_entry_path(path: &Path, prefix: &str) -> Result<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(c) => clean.push(c),
            Component::CurDir => {}
            _ => {
                return Err(Error::Archive(format!(
                    "entry {} escapes the version directory",
                    path.display()
                )));
            }
        }
    }

    if !clean.starts_with(prefix) {
        return Err(Error::Archive(format!(
            "entry {} is not rooted at {}/",
            path.display(),
            prefix
        )));
    }
    Ok(clean)
}

/// Unpack a version archive into `dest`
///
/// Only directories and regular files rooted at `<prefix>/` are accepted.
/// Directory permissions are applied after all files are written so a
/// read-only directory does not block its own contents. Returns the number
/// of entries unpacked.
pub fn unpack<R: Read>(reader: R, dest: &Path, prefix: &str) -> Result<usize> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut directories = Vec::new();
    let mut count = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative = checked_entry_path(&entry.path()?, prefix)?;
        let target = dest.join(&relative);
        let mode = entry.header().mode()? & 0o777;

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&target)?;
                directories.push((target, mode));
            }
            EntryType::Regular => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                entry.unpack(&target)?;
                fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
            }
            other => {
                return Err(Error::Archive(format!(
                    "unsupported entry type {:?} for {}",
                    other,
                    relative.display()
                )));
            }
        }
        count += 1;
    }

    for (dir, mode) in directories.iter().rev() {
        fs::set_permissions(dir, fs::Permissions::from_mode(*mode))?;
    }

    debug!(dest = %dest.display(), prefix, entries = count, "unpacked archive");
    Ok(count)
}
