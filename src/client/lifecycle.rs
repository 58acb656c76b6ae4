// src/client/lifecycle.rs

//! Running a package's `start` and `stop` entry points
//!
//! Both live at the top of the active version directory and are optional:
//! library packages simply have none. Output is captured for the caller.
//! The child runs to completion; there is no timeout.

use super::Client;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, error, info};

/// Entry point run by [`Client::start`]
pub const START_SCRIPT: &str = "start";
/// Entry point run by [`Client::stop`]
pub const STOP_SCRIPT: &str = "stop";

/// Captured result of an entry point
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub script: PathBuf,
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or `None` if the script was killed by a signal
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

fn run_entry_point(dir: &Path, name: &str) -> Result<Option<ScriptOutput>> {
    // the child resolves a relative program path against its new cwd
    let dir = std::path::absolute(dir)?;
    let script = dir.join(name);
    if !script.exists() {
        info!(path = %script.display(), "no entry point, nothing to run");
        return Ok(None);
    }

    debug!(path = %script.display(), "running entry point");
    let output = Command::new(&script)
        .current_dir(&dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            error!(path = %script.display(), error = %e, "failed to spawn entry point");
            e
        })?;

    info!(path = %script.display(), status = %output.status, "entry point finished");
    Ok(Some(ScriptOutput {
        script,
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    }))
}

impl Client {
    /// Active version directory, reached through the package's pointer
    fn active_dir(&self, package: &str) -> Result<PathBuf> {
        let link = self.pointer_path(package);
        match fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => Ok(link),
            _ => {
                error!(package, path = %link.display(), "package pointer is not a symlink");
                Err(Error::NotASymlink(link))
            }
        }
    }

    /// Run the active version's `start` entry point, if it has one
    pub fn start(&self, package: &str) -> Result<Option<ScriptOutput>> {
        debug!(package, "starting package");
        run_entry_point(&self.active_dir(package)?, START_SCRIPT)
    }

    /// Run the active version's `stop` entry point, if it has one
    pub fn stop(&self, package: &str) -> Result<Option<ScriptOutput>> {
        debug!(package, "stopping package");
        run_entry_point(&self.active_dir(package)?, STOP_SCRIPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FixedCatalog;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_script(path: &Path, body: &str) {
        fs::write(path, body).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn setup() -> (TempDir, Client) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("bob-deadbeef")).unwrap();
        fs::create_dir(dir.path().join("bob-f00dbeef")).unwrap();
        write_script(
            &dir.path().join("bob-deadbeef/start"),
            "#!/bin/sh\necho started\necho oops >&2\n",
        );
        write_script(&dir.path().join("bob-deadbeef/stop"), "#!/bin/sh\nexit 3\n");
        let client = Client::new(Arc::new(FixedCatalog::bob()), dir.path());
        (dir, client)
    }

    #[test]
    fn test_start_requires_pointer() {
        let (_dir, client) = setup();
        assert!(matches!(client.start("bob"), Err(Error::NotASymlink(_))));
        assert!(matches!(client.stop("bob"), Err(Error::NotASymlink(_))));
    }

    #[test]
    fn test_start_captures_output() {
        let (_dir, client) = setup();
        client.activate("bob", "latest").unwrap();

        let output = client.start("bob").unwrap().unwrap();
        assert!(output.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "started\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "oops\n");
    }

    #[test]
    fn test_stop_reports_exit_status() {
        let (_dir, client) = setup();
        client.activate("bob", "latest").unwrap();

        let output = client.stop("bob").unwrap().unwrap();
        assert!(!output.success());
        assert_eq!(output.code(), Some(3));
    }

    #[test]
    fn test_start_with_relative_root() {
        // cargo runs tests from the package root, so this path stays relative
        let dir = TempDir::new_in(".").unwrap();
        assert!(dir.path().is_relative());
        fs::create_dir(dir.path().join("bob-deadbeef")).unwrap();
        write_script(&dir.path().join("bob-deadbeef/start"), "#!/bin/sh\necho relative\n");

        let client = Client::new(Arc::new(FixedCatalog::bob()), dir.path());
        client.activate("bob", "latest").unwrap();

        let output = client.start("bob").unwrap().unwrap();
        assert!(output.success());
        assert!(output.script.is_absolute());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "relative\n");
    }

    #[test]
    fn test_missing_entry_point_is_not_an_error() {
        let (_dir, client) = setup();
        client.activate("bob", "kazooie").unwrap();
        assert!(client.start("bob").unwrap().is_none());
        assert!(client.stop("bob").unwrap().is_none());
    }
}
