// src/server/handlers/packages.rs
//! Package endpoints: upload, information, labels, lookup and archive download

use super::{blocking, ApiError};
use crate::protocol::{
    GetPackageRequest, GetPackageResponse, NewPackage, PackageInformation,
    PackageInformationRequest, PackageInformationResponse, SetLabelRequest, SetLabelsResponse,
};
use crate::server::ServerState;
use crate::service::CatalogService;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// POST /v1/packages
pub async fn upload_package(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<NewPackage>,
) -> Result<Json<PackageInformation>, ApiError> {
    let catalog = state.catalog.clone();
    let info = blocking(move || catalog.upload_package(request)).await?;
    Ok(Json(info))
}

/// GET /v1/packages/:name
///
/// Unknown packages yield an empty list, not an error.
pub async fn get_package_information(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Json<PackageInformationResponse>, ApiError> {
    let catalog = state.catalog.clone();
    let request = PackageInformationRequest { package_name: name };
    let response = blocking(move || catalog.get_package_information(&request)).await?;
    Ok(Json(response))
}

/// POST /v1/labels/:name
pub async fn set_labels(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    Json(mut request): Json<SetLabelRequest>,
) -> Result<Json<SetLabelsResponse>, ApiError> {
    if request.package_name.is_empty() {
        request.package_name = name;
    } else if request.package_name != name {
        return Err(ApiError::bad_request(format!(
            "package name in body ({}) does not match path ({})",
            request.package_name, name
        )));
    }

    let catalog = state.catalog.clone();
    let response = blocking(move || catalog.set_labels(&request)).await?;
    if !response.failed.is_empty() {
        tracing::warn!(
            "SetLabels on {}: {} label(s) failed",
            response.package.package_name,
            response.failed.len()
        );
    }
    Ok(Json(response))
}

/// GET /v1/packages/:name/:designator
pub async fn get_package(
    State(state): State<Arc<ServerState>>,
    Path((name, designator)): Path<(String, String)>,
) -> Result<Json<GetPackageResponse>, ApiError> {
    let catalog = state.catalog.clone();
    let request = GetPackageRequest {
        package_name: name,
        designator,
    };
    let response = blocking(move || catalog.get_package(&request)).await?;
    Ok(Json(response))
}

/// GET /v1/packages/:name/:designator/archive
pub async fn download_package(
    State(state): State<Arc<ServerState>>,
    Path((name, designator)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let catalog = state.catalog.clone();
    let request = GetPackageRequest {
        package_name: name,
        designator,
    };
    let bytes = blocking(move || {
        let mut bytes = Vec::new();
        catalog.download_package(&request, &mut bytes)?;
        Ok(bytes)
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "application/gzip")], bytes).into_response())
}
