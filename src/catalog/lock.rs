// src/catalog/lock.rs

//! Exclusive ownership of a store directory
//!
//! Only one catalog instance may own a given store/playground pair. The
//! server takes this lock at startup and holds it for its whole lifetime;
//! the lock is released when the [`StoreLock`] is dropped.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lock file name inside the store directory
pub const LOCK_FILE: &str = ".mspm.lock";

/// Exclusive `flock` on `<store>/.mspm.lock`
#[derive(Debug)]
pub struct StoreLock {
    // Kept open to hold the lock.
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Try to take the lock without blocking
    ///
    /// Returns `Ok(None)` when another process already owns the store.
    pub fn try_acquire(store: &Path) -> Result<Option<Self>> {
        fs::create_dir_all(store)?;
        let path = store.join(LOCK_FILE);
        let file = File::create(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                info!(path = %path.display(), "acquired store lock");
                Ok(Some(Self { file, path }))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                debug!(path = %path.display(), "store lock already held");
                Ok(None)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Take the lock or fail if the store is owned elsewhere
    pub fn acquire(store: &Path) -> Result<Self> {
        Self::try_acquire(store)?.ok_or_else(|| {
            Error::InvalidRequest(format!(
                "store {} is already owned by another catalog instance",
                store.display()
            ))
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
