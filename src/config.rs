// src/config.rs
//! Configuration file parsing for mspm
//!
//! Supports a TOML configuration file with the following sections:
//! - [server] - Listen address, debug logging, upload size limit
//! - [storage] - Playground and store roots for the catalog
//! - [client] - Catalog URL and install root for the client

use crate::error::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/mspm/mspm.toml";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub struct MspmConfig {
    /// Catalog server settings
    #[serde(default)]
    pub server: ServerSection,

    /// Catalog storage settings
    #[serde(default)]
    pub storage: StorageSection,

    /// Client settings
    #[serde(default)]
    pub client: ClientSection,
}

/// Server configuration section
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Address the catalog listens on
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,

    /// Largest accepted upload request body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            debug: false,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:10240".to_string()
}

fn default_max_upload_bytes() -> usize {
    256 * 1024 * 1024
}

/// Storage configuration section
#[derive(Debug, Deserialize)]
pub struct StorageSection {
    /// Staging area for in-flight uploads
    #[serde(default = "default_playground")]
    pub playground: PathBuf,

    /// Durable area for sealed archives
    #[serde(default = "default_store")]
    pub store: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            playground: default_playground(),
            store: default_store(),
        }
    }
}

fn default_playground() -> PathBuf {
    PathBuf::from("/var/mspm/tempstore")
}

fn default_store() -> PathBuf {
    PathBuf::from("/var/mspm/store")
}

/// Client configuration section
#[derive(Debug, Deserialize)]
pub struct ClientSection {
    /// Base URL of the catalog server
    #[serde(default = "default_catalog")]
    pub catalog: String,

    /// Install root holding version directories and package pointers
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            root: default_root(),
        }
    }
}

fn default_catalog() -> String {
    "http://127.0.0.1:10240".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from("/opt/mspm")
}

impl MspmConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let config: MspmConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        if self.server.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be non-zero".to_string()));
        }
        if self.storage.playground == self.storage.store {
            return Err(Error::Config(
                "playground and store must be different directories".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed listen address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address '{}': {}", self.server.listen, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MspmConfig::default();
        assert_eq!(config.server.listen, "0.0.0.0:10240");
        assert!(!config.server.debug);
        assert_eq!(config.server.max_upload_bytes, 256 * 1024 * 1024);
        assert_eq!(config.storage.playground, PathBuf::from("/var/mspm/tempstore"));
        assert_eq!(config.storage.store, PathBuf::from("/var/mspm/store"));
        assert_eq!(config.client.catalog, "http://127.0.0.1:10240");
        assert_eq!(config.client.root, PathBuf::from("/opt/mspm"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:9000"
debug = true

[client]
root = "/srv/apps"
"#;
        let config: MspmConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr().unwrap().port(), 9000);
        assert!(config.server.debug);
        assert_eq!(config.client.root, PathBuf::from("/srv/apps"));
        assert_eq!(config.client.catalog, "http://127.0.0.1:10240");
        assert_eq!(config.storage.store, PathBuf::from("/var/mspm/store"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = MspmConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:10240");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mspm.toml");
        std::fs::write(&path, "[server\nlisten = ").unwrap();
        assert!(matches!(MspmConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_listen_address() {
        let toml_str = r#"
[server]
listen = "not-an-address"
"#;
        let config: MspmConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }
}
