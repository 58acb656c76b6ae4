// src/hash.rs

//! Version identity for staged file trees
//!
//! A version-id is the lowercase hex SHA-512 digest of a canonical
//! serialization of a staged tree:
//!
//! 1. Paths are enumerated depth-first, children sorted by name before
//!    descending. Directories carry a trailing `/`, files do not.
//! 2. Each path contributes `«i»«path»«owner»«mode»`, where `i` is its
//!    0-based position in the traversal and `mode` is the `rwxrwxrwx`
//!    rendering of the low 9 permission bits.
//! 3. File contents are streamed into the digest right after their tag.
//!
//! Metadata comes from the registration map, never from the filesystem,
//! so the id only depends on what the uploader declared plus the bytes.

use crate::error::{Error, Result};
use sha2::{Digest, Sha512};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, error};
use walkdir::WalkDir;

/// Owner and permission bits registered for one staged path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub owner: String,
    pub mode: u32,
}

impl FileMeta {
    pub fn new(owner: impl Into<String>, mode: u32) -> Self {
        Self {
            owner: owner.into(),
            mode,
        }
    }

    /// The `«owner»«rwx…»` part of a path's digest tag
    pub fn hash_tag(&self) -> String {
        format!("«{}»«{}»", self.owner, mode_string(self.mode))
    }
}

fn mode_triplet(bits: u32, out: &mut String) {
    out.push(if bits & 4 == 4 { 'r' } else { '-' });
    out.push(if bits & 2 == 2 { 'w' } else { '-' });
    out.push(if bits & 1 == 1 { 'x' } else { '-' });
}

/// Render the low 9 bits of a mode as owner/group/other `rwx` triplets
pub fn mode_string(mode: u32) -> String {
    let mut out = String::with_capacity(9);
    mode_triplet(mode >> 6, &mut out);
    mode_triplet(mode >> 3, &mut out);
    mode_triplet(mode, &mut out);
    out
}

/// Relative paths under `root` in canonical traversal order
///
/// Directory entries end with `/`. The root itself is not listed.
pub fn paths_under_root(root: &Path) -> Result<Vec<String>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            error!(root = %root.display(), error = %e, "listing staged files");
            Error::Io(io::Error::other(e))
        })?;

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| Error::InvalidPath(entry.path().display().to_string()))?;
        let mut name = relative
            .components()
            .map(|c| {
                c.as_os_str()
                    .to_str()
                    .ok_or_else(|| Error::InvalidPath(relative.display().to_string()))
            })
            .collect::<Result<Vec<_>>>()?
            .join("/");

        if entry.file_type().is_dir() {
            name.push('/');
        }
        paths.push(name);
    }

    Ok(paths)
}

/// Compute the version-id of the tree staged at `root`
///
/// Every traversed path must have an entry in `meta`; an unregistered path
/// means the tree was modified behind the catalog's back and is reported as
/// [`Error::CorruptVersion`].
pub fn digest_tree(package: &str, root: &Path, meta: &HashMap<String, FileMeta>) -> Result<String> {
    let paths = paths_under_root(root)?;
    digest_paths(package, root, &paths, meta)
}

/// Digest an already-enumerated path list (see [`digest_tree`])
pub fn digest_paths(
    package: &str,
    root: &Path,
    paths: &[String],
    meta: &HashMap<String, FileMeta>,
) -> Result<String> {
    let mut hasher = Sha512::new();

    for (ix, name) in paths.iter().enumerate() {
        let info = meta.get(name).ok_or_else(|| {
            error!(package, path = %name, "missing file metadata for staged path");
            Error::CorruptVersion {
                package: package.to_string(),
                path: name.clone(),
            }
        })?;

        hasher.update(format!("«{}»«{}»{}", ix, name, info.hash_tag()).as_bytes());

        if !name.ends_with('/') {
            let mut file = File::open(root.join(name))?;
            io::copy(&mut file, &mut hasher)?;
        }
    }

    let version = hex::encode(hasher.finalize());
    debug!(package, paths = paths.len(), %version, "hashed staged tree");
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("dir1")).unwrap();
        fs::create_dir_all(root.join("dir2/dir21")).unwrap();
        fs::create_dir_all(root.join("dir3")).unwrap();
        fs::write(root.join("dir1/f1"), b"first\n").unwrap();
        fs::write(root.join("dir1/f2"), b"second\n").unwrap();
        fs::write(root.join("dir2/f1"), b"third\n").unwrap();
        dir
    }

    fn fixture_meta() -> HashMap<String, FileMeta> {
        let mut meta = HashMap::new();
        for dir in ["dir1/", "dir2/", "dir2/dir21/", "dir3/"] {
            meta.insert(dir.to_string(), FileMeta::new("root", 0o755));
        }
        for file in ["dir1/f1", "dir1/f2", "dir2/f1"] {
            meta.insert(file.to_string(), FileMeta::new("root", 0o644));
        }
        meta
    }

    #[test]
    fn test_mode_string() {
        assert_eq!(mode_string(0o752), "rwxr-x-w-");
        assert_eq!(mode_string(0o1), "--------x");
        assert_eq!(mode_string(0o777), "rwxrwxrwx");
        assert_eq!(mode_string(0o100644), "rw-r--r--");
    }

    #[test]
    fn test_hash_tag() {
        assert_eq!(FileMeta::new("owner", 0o777).hash_tag(), "«owner»«rwxrwxrwx»");
        assert_eq!(FileMeta::new("owner", 0o525).hash_tag(), "«owner»«r-x-w-r-x»");
    }

    #[test]
    fn test_paths_under_root_order() {
        let tree = fixture_tree();
        let paths = paths_under_root(tree.path()).unwrap();
        assert_eq!(
            paths,
            vec!["dir1/", "dir1/f1", "dir1/f2", "dir2/", "dir2/dir21/", "dir2/f1", "dir3/"]
        );
    }

    #[test]
    fn test_digest_matches_canonical_serialization() {
        let tree = fixture_tree();
        let meta = fixture_meta();

        let mut expected = Sha512::new();
        let order = ["dir1/", "dir1/f1", "dir1/f2", "dir2/", "dir2/dir21/", "dir2/f1", "dir3/"];
        for (ix, name) in order.iter().enumerate() {
            let tag = meta[*name].hash_tag();
            expected.update(format!("«{ix}»«{name}»{tag}").as_bytes());
            if !name.ends_with('/') {
                expected.update(fs::read(tree.path().join(name)).unwrap());
            }
        }
        let expected = format!("{:x}", expected.finalize());

        let got = digest_tree("testpackage", tree.path(), &meta).unwrap();
        assert_eq!(got, expected);
        assert_eq!(got.len(), 128);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let tree = fixture_tree();
        let meta = fixture_meta();
        let a = digest_tree("p", tree.path(), &meta).unwrap();
        let b = digest_tree("p", tree.path(), &meta).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_depends_on_metadata() {
        let tree = fixture_tree();
        let meta = fixture_meta();
        let before = digest_tree("p", tree.path(), &meta).unwrap();

        let mut changed = meta.clone();
        changed.insert("dir1/f1".to_string(), FileMeta::new("root", 0o600));
        let after = digest_tree("p", tree.path(), &changed).unwrap();
        assert_ne!(before, after);

        let mut owner = meta;
        owner.insert("dir1/f1".to_string(), FileMeta::new("nobody", 0o644));
        assert_ne!(before, digest_tree("p", tree.path(), &owner).unwrap());
    }

    #[test]
    fn test_unregistered_path_is_corrupt() {
        let tree = fixture_tree();
        let meta = fixture_meta();
        fs::write(tree.path().join("dir3/sneaky"), b"x").unwrap();

        let err = digest_tree("p", tree.path(), &meta).unwrap_err();
        match err {
            Error::CorruptVersion { path, .. } => assert_eq!(path, "dir3/sneaky"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
