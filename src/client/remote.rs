// src/client/remote.rs

//! HTTP client for a remote catalog server
//!
//! Speaks the JSON protocol of [`crate::server`]. Package names and
//! designators travel as single percent-encoded path segments, so labels
//! may contain `/` or collide with route words. Requests are not retried;
//! callers that want retries wrap the client.

use crate::error::{Error, Result};
use crate::protocol::{
    ErrorBody, GetPackageRequest, GetPackageResponse, NewPackage, PackageInformation,
    PackageInformationRequest, PackageInformationResponse, SetLabelRequest, SetLabelsResponse,
};
use crate::service::CatalogService;
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for HTTP requests (5 minutes, uploads can be large)
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

fn transport(e: reqwest::Error) -> Error {
    Error::Remote {
        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        message: e.to_string(),
    }
}

/// Turn a non-success response into an error
///
/// The server's `{ kind, package, detail }` body is mapped back to the
/// matching [`Error`] variant so callers can match on it the same way they
/// would against an in-process catalog.
fn check(response: Response, package: &str, designator: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let err = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(e) => Error::from_wire(status.as_u16(), &e.kind, e.message, e.package, e.detail),
        Err(_) => Error::Remote {
            status: status.as_u16(),
            message: body,
        },
    };

    match err {
        Error::Remote { .. } if status == StatusCode::NOT_FOUND => Err(Error::NotFound {
            package: package.to_string(),
            designator: designator.to_string(),
        }),
        err => Err(err),
    }
}

/// Catalog reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: Url,
}

impl HttpCatalog {
    /// Create a client for the catalog at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidRequest(format!("invalid catalog URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidRequest(format!("catalog URL '{}' cannot carry a path", base_url)));
        }

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(transport)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// URL of an endpoint, one path segment per element
    ///
    /// Each element is percent-encoded as a single segment. Empty elements
    /// and the dot segments `.` and `..` cannot be carried and are rejected.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::InvalidRequest("empty package name or designator".to_string()));
        }
        if let Some(bad) = segments.iter().find(|s| **s == "." || **s == "..") {
            return Err(Error::InvalidPath(format!("'{}' cannot be used in a catalog URL", bad)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidRequest(format!("catalog URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl CatalogService for HttpCatalog {
    fn upload_package(&self, request: NewPackage) -> Result<PackageInformation> {
        let url = self.endpoint(&["v1", "packages"])?;
        info!("Uploading {} ({} entries) to {}", request.package_name, request.files.len(), url);

        let response = self.client.post(url).json(&request).send().map_err(transport)?;
        let response = check(response, &request.package_name, "")?;
        response.json().map_err(transport)
    }

    fn get_package_information(
        &self,
        request: &PackageInformationRequest,
    ) -> Result<PackageInformationResponse> {
        if request.package_name.is_empty() {
            return Err(Error::InvalidRequest("no package name specified".to_string()));
        }
        let url = self.endpoint(&["v1", "packages", &request.package_name])?;
        debug!("Fetching package information from {}", url);

        let response = self.client.get(url).send().map_err(transport)?;
        let response = check(response, &request.package_name, "")?;
        response.json().map_err(transport)
    }

    fn set_labels(&self, request: &SetLabelRequest) -> Result<SetLabelsResponse> {
        let url = self.endpoint(&["v1", "labels", &request.package_name])?;
        debug!("Setting labels {:?} on {} via {}", request.labels, request.version, url);

        let response = self.client.post(url).json(request).send().map_err(transport)?;
        let response = check(response, &request.package_name, &request.version)?;
        response.json().map_err(transport)
    }

    fn get_package(&self, request: &GetPackageRequest) -> Result<GetPackageResponse> {
        let url = self.endpoint(&["v1", "packages", &request.package_name, &request.designator])?;
        debug!("Fetching package record from {}", url);

        let response = self.client.get(url).send().map_err(transport)?;
        let response = check(response, &request.package_name, &request.designator)?;
        response.json().map_err(transport)
    }

    fn download_package(&self, request: &GetPackageRequest, out: &mut dyn Write) -> Result<u64> {
        let url = self.endpoint(&[
            "v1",
            "packages",
            &request.package_name,
            &request.designator,
            "archive",
        ])?;
        info!("Downloading {}", url);

        let response = self.client.get(url.clone()).send().map_err(transport)?;
        let mut response = check(response, &request.package_name, &request.designator)?;
        let written = io::copy(&mut response, out)?;
        debug!("Downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}
