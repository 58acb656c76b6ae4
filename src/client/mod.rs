// src/client/mod.rs

//! Client side of mspm
//!
//! A [`Client`] pairs a catalog (usually a remote [`HttpCatalog`]) with a
//! local install root. The install root holds one directory per fetched
//! version, `<package>-<version>/`, and at most one pointer per package: a
//! symlink `<package>` to `./<package>-<version>` naming the active version.

mod activate;
mod fetch;
mod lifecycle;
mod purge;
mod remote;
mod upload;

pub use fetch::FetchOutcome;
pub use lifecycle::ScriptOutput;
pub use purge::PurgeReport;
pub use remote::HttpCatalog;

use crate::archive::version_dir_name;
use crate::error::{Error, Result};
use crate::protocol::{PackageInformation, PackageInformationRequest};
use crate::service::CatalogService;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

/// Local package manager bound to one catalog and one install root
#[derive(Clone)]
pub struct Client {
    catalog: Arc<dyn CatalogService>,
    root: PathBuf,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("root", &self.root).finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(catalog: Arc<dyn CatalogService>, root: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            root: root.into(),
        }
    }

    /// Client talking to the catalog server at `url`
    pub fn connect(url: &str, root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpCatalog::new(url)?), root))
    }

    /// Install root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &dyn CatalogService {
        self.catalog.as_ref()
    }

    /// Directory a version is unpacked into
    pub fn version_dir(&self, package: &str, version: &str) -> PathBuf {
        self.root.join(version_dir_name(package, version))
    }

    /// Path of the package's active pointer
    pub fn pointer_path(&self, package: &str) -> PathBuf {
        self.root.join(package)
    }

    /// All version records the catalog has for a package
    pub fn package_information(&self, package: &str) -> Result<Vec<PackageInformation>> {
        let request = PackageInformationRequest {
            package_name: package.to_string(),
        };
        let response = self.catalog.get_package_information(&request).map_err(|e| {
            error!(package, error = %e, "GetPackageInformation");
            e
        })?;
        Ok(response.package_data)
    }

    /// Map every label of a package to the version-id it names
    pub fn full_label_map(&self, package: &str) -> Result<HashMap<String, String>> {
        let mut labels = HashMap::new();
        for info in self.package_information(package)? {
            for label in info.labels {
                labels.insert(label, info.version.clone());
            }
        }
        Ok(labels)
    }

    /// Resolve a designator (version-id or label) to a version-id
    ///
    /// An exact version-id wins over a label of the same name.
    pub fn resolve(&self, package: &str, designator: &str) -> Result<String> {
        if designator.is_empty() {
            return Err(Error::InvalidRequest("no version or label specified".to_string()));
        }

        let versions = self.package_information(package)?;
        let found = versions
            .iter()
            .find(|info| info.version == designator)
            .or_else(|| versions.iter().find(|info| info.has_label(designator)));

        match found {
            Some(info) => {
                debug!(package, designator, version = %info.version, "resolved designator");
                Ok(info.version.clone())
            }
            None => {
                error!(package, designator, "label/version not found");
                Err(Error::NotFound {
                    package: package.to_string(),
                    designator: designator.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A canned catalog for client tests

    use crate::error::{Error, Result};
    use crate::protocol::{PackageInformation, PackageInformationRequest, PackageInformationResponse};
    use crate::service::CatalogService;
    use std::collections::HashMap;

    /// Catalog answering `GetPackageInformation` from a fixed table
    #[derive(Debug, Default)]
    pub struct FixedCatalog {
        packages: HashMap<String, Vec<PackageInformation>>,
    }

    impl FixedCatalog {
        pub fn with(mut self, package: &str, version: &str, labels: &[&str]) -> Self {
            self.packages
                .entry(package.to_string())
                .or_default()
                .push(PackageInformation {
                    package_name: package.to_string(),
                    version: version.to_string(),
                    labels: labels.iter().map(|l| l.to_string()).collect(),
                    uploaded_at: None,
                });
            self
        }

        /// bob: deadbeef {latest}, f00dbeef {banjo, kazooie}
        pub fn bob() -> Self {
            Self::default()
                .with("bob", "deadbeef", &["latest"])
                .with("bob", "f00dbeef", &["banjo", "kazooie"])
        }
    }

    impl CatalogService for FixedCatalog {
        fn get_package_information(
            &self,
            request: &PackageInformationRequest,
        ) -> Result<PackageInformationResponse> {
            if request.package_name.is_empty() {
                return Err(Error::InvalidRequest("no package name specified".to_string()));
            }
            Ok(PackageInformationResponse {
                package_data: self
                    .packages
                    .get(&request.package_name)
                    .cloned()
                    .unwrap_or_default(),
            })
        }
    }
}
