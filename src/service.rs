// src/service.rs

//! The catalog service boundary
//!
//! [`CatalogService`] is the request/response surface of the catalog. The
//! in-process implementation is [`CatalogServer`]; the client talks to a
//! remote catalog through [`crate::client::HttpCatalog`], and tests can
//! substitute any other implementation. Every method defaults to
//! [`Error::Unimplemented`], so a partial fake only overrides what it needs
//! ([`UnimplementedCatalog`] overrides nothing).

use crate::catalog::{DataStore, validate_package_name};
use crate::error::{Error, Result};
use crate::protocol::{
    GetPackageRequest, GetPackageResponse, LabelFailure, NewPackage, PackageInformation,
    PackageInformationRequest, PackageInformationResponse, SetLabelRequest, SetLabelsResponse,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Operations offered by a package catalog
pub trait CatalogService: Send + Sync {
    /// Stage, seal and register a new version
    fn upload_package(&self, _request: NewPackage) -> Result<PackageInformation> {
        Err(Error::Unimplemented("UploadPackage"))
    }

    /// All version records of a package; empty when the package is unknown
    fn get_package_information(
        &self,
        _request: &PackageInformationRequest,
    ) -> Result<PackageInformationResponse> {
        Err(Error::Unimplemented("GetPackageInformation"))
    }

    /// Apply labels to a version, reporting per-label failures
    fn set_labels(&self, _request: &SetLabelRequest) -> Result<SetLabelsResponse> {
        Err(Error::Unimplemented("SetLabels"))
    }

    /// The version record designated by a version-id or label
    fn get_package(&self, _request: &GetPackageRequest) -> Result<GetPackageResponse> {
        Err(Error::Unimplemented("GetPackage"))
    }

    /// Copy the sealed archive of a version into `out`, returning its size
    fn download_package(&self, _request: &GetPackageRequest, _out: &mut dyn Write) -> Result<u64> {
        Err(Error::Unimplemented("DownloadPackage"))
    }
}

/// A catalog that implements nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedCatalog;

impl CatalogService for UnimplementedCatalog {}

impl<T: CatalogService + ?Sized> CatalogService for Arc<T> {
    fn upload_package(&self, request: NewPackage) -> Result<PackageInformation> {
        (**self).upload_package(request)
    }

    fn get_package_information(
        &self,
        request: &PackageInformationRequest,
    ) -> Result<PackageInformationResponse> {
        (**self).get_package_information(request)
    }

    fn set_labels(&self, request: &SetLabelRequest) -> Result<SetLabelsResponse> {
        (**self).set_labels(request)
    }

    fn get_package(&self, request: &GetPackageRequest) -> Result<GetPackageResponse> {
        (**self).get_package(request)
    }

    fn download_package(&self, request: &GetPackageRequest, out: &mut dyn Write) -> Result<u64> {
        (**self).download_package(request, out)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidRequest(format!("no {} specified", field)));
    }
    Ok(())
}

/// The catalog service backed by an in-memory [`DataStore`]
#[derive(Debug, Clone)]
pub struct CatalogServer {
    store: Arc<DataStore>,
}

impl CatalogServer {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    /// Open a catalog over the given playground and store directories
    pub fn open(playground: impl Into<PathBuf>, store: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(Arc::new(DataStore::open(playground.into(), store.into())?)))
    }

    pub fn data_store(&self) -> &Arc<DataStore> {
        &self.store
    }
}

impl CatalogService for CatalogServer {
    fn upload_package(&self, request: NewPackage) -> Result<PackageInformation> {
        let name = request.package_name;
        validate_package_name(&name)?;
        debug!(package = %name, entries = request.files.len(), "UploadPackage");

        let mut staged = self.store.new_package_version(&name)?;
        for entry in &request.files {
            let added = if entry.is_dir() {
                staged.add_dir(&entry.name, &entry.owner, entry.mode)
            } else {
                staged.add_file(&entry.name, &entry.owner, entry.mode, &entry.contents)
            };
            if let Err(e) = added {
                error!(package = %name, path = %entry.name, error = %e, "UploadPackage - staging entry");
                return Err(e);
            }
        }

        let sealed = staged.finish(self.store.playground())?;
        let registered = self.store.add_package_version(sealed)?;
        info!(package = %name, version = %registered.version, "UploadPackage - registered");
        Ok(PackageInformation::from(&registered))
    }

    fn get_package_information(
        &self,
        request: &PackageInformationRequest,
    ) -> Result<PackageInformationResponse> {
        require("package name", &request.package_name)?;

        let mut versions = match self.store.get_package_versions(&request.package_name) {
            Some(versions) => versions,
            None => {
                warn!(package = %request.package_name, "GetPackageInformation - package not found");
                Vec::new()
            }
        };
        versions.sort_by(|a, b| {
            a.uploaded_at
                .cmp(&b.uploaded_at)
                .then_with(|| a.version.cmp(&b.version))
        });

        Ok(PackageInformationResponse {
            package_data: versions.iter().map(PackageInformation::from).collect(),
        })
    }

    fn set_labels(&self, request: &SetLabelRequest) -> Result<SetLabelsResponse> {
        require("package name", &request.package_name)?;
        require("version designator", &request.version)?;
        debug!(
            package = %request.package_name,
            version = %request.version,
            labels = ?request.labels,
            "SetLabels"
        );

        let mut failed = Vec::new();
        for label in &request.labels {
            let result = if label.is_empty() {
                Err(Error::InvalidRequest("empty label".to_string()))
            } else if label == "." || label == ".." {
                Err(Error::InvalidRequest(format!("'{}' cannot be used as a label", label)))
            } else {
                self.store
                    .set_label(&request.package_name, &request.version, label)
            };
            if let Err(e) = result {
                error!(
                    package = %request.package_name,
                    version = %request.version,
                    %label,
                    error = %e,
                    "SetLabels - setting label"
                );
                failed.push(LabelFailure {
                    label: label.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let pv = self
            .store
            .get_package_version(&request.package_name, &request.version)?;
        Ok(SetLabelsResponse {
            package: PackageInformation::from(&pv),
            failed,
        })
    }

    fn get_package(&self, request: &GetPackageRequest) -> Result<GetPackageResponse> {
        require("package name", &request.package_name)?;
        require("designator", &request.designator)?;

        let pv = self
            .store
            .get_package_version(&request.package_name, &request.designator)?;
        Ok(GetPackageResponse {
            package: PackageInformation::from(&pv),
        })
    }

    fn download_package(&self, request: &GetPackageRequest, out: &mut dyn Write) -> Result<u64> {
        require("package name", &request.package_name)?;
        require("designator", &request.designator)?;

        let pv = self
            .store
            .get_package_version(&request.package_name, &request.designator)?;
        let mut archive = File::open(&pv.data_path).map_err(|e| {
            error!(package = %pv.name, version = %pv.version, path = %pv.data_path.display(), error = %e, "opening archive");
            e
        })?;
        let written = io::copy(&mut archive, out)?;
        debug!(package = %pv.name, version = %pv.version, bytes = written, "archive sent");
        Ok(written)
    }
}
