// src/server/routes.rs
//! Axum router configuration for the catalog server

use crate::server::handlers::packages;
use crate::server::ServerState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the catalog router
pub fn create_router(state: Arc<ServerState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/v1/packages", post(packages::upload_package))
        .route("/v1/packages/:name", get(packages::get_package_information))
        .route("/v1/labels/:name", post(packages::set_labels))
        .route("/v1/packages/:name/:designator", get(packages::get_package))
        .route(
            "/v1/packages/:name/:designator/archive",
            get(packages::download_package),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        ErrorBody, FileEntry, GetPackageResponse, NewPackage, PackageInformation,
        PackageInformationResponse, SetLabelRequest, SetLabelsResponse,
    };
    use crate::server::ServerConfig;
    use crate::service::CatalogServer;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde::de::DeserializeOwned;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig {
            playground: dir.path().join("playground"),
            store: dir.path().join("store"),
            ..ServerConfig::default()
        };
        let catalog = CatalogServer::open(config.playground.clone(), config.store.clone()).unwrap();
        let state = Arc::new(ServerState::new(config, catalog));
        (dir, create_router(state))
    }

    fn post_json<T: serde::Serialize>(uri: &str, body: &T) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn bob() -> NewPackage {
        NewPackage {
            package_name: "bob".into(),
            files: vec![
                FileEntry::dir("bin", "root", 0o755),
                FileEntry::file("bin/start", "root", 0o755, "#!/bin/sh\necho bob\n"),
            ],
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_dir, app) = app();
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_then_query() {
        let (_dir, app) = app();

        let response = app.clone().oneshot(post_json("/v1/packages", &bob())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let uploaded: PackageInformation = json(response).await;
        assert_eq!(uploaded.labels, vec!["latest".to_string()]);

        let response = app.clone().oneshot(get("/v1/packages/bob")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let info: PackageInformationResponse = json(response).await;
        assert_eq!(info.package_data.len(), 1);
        assert_eq!(info.package_data[0].version, uploaded.version);

        let response = app.clone().oneshot(get("/v1/packages/bob/latest")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let got: GetPackageResponse = json(response).await;
        assert_eq!(got.package.version, uploaded.version);

        let response = app.oneshot(get("/v1/packages/bob/latest/archive")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }

    #[tokio::test]
    async fn test_duplicate_upload_is_conflict() {
        let (_dir, app) = app();
        let response = app.clone().oneshot(post_json("/v1/packages", &bob())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(post_json("/v1/packages", &bob())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.kind, "duplicate_version");
    }

    #[tokio::test]
    async fn test_unknown_package_is_empty_list() {
        let (_dir, app) = app();
        let response = app.clone().oneshot(get("/v1/packages/nobody")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let info: PackageInformationResponse = json(response).await;
        assert!(info.package_data.is_empty());

        let response = app.oneshot(get("/v1/packages/nobody/latest")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.kind, "not_found");
    }

    #[tokio::test]
    async fn test_set_labels() {
        let (_dir, app) = app();
        let response = app.clone().oneshot(post_json("/v1/packages", &bob())).await.unwrap();
        let uploaded: PackageInformation = json(response).await;

        let request = SetLabelRequest {
            package_name: "bob".into(),
            version: "latest".into(),
            labels: vec!["banjo".into(), "kazooie".into()],
        };
        let response = app
            .clone()
            .oneshot(post_json("/v1/labels/bob", &request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let labelled: SetLabelsResponse = json(response).await;
        assert_eq!(labelled.package.version, uploaded.version);
        assert!(labelled.package.has_label("kazooie"));
        assert!(labelled.failed.is_empty());

        let response = app.oneshot(get("/v1/packages/bob/kazooie")).await.unwrap();
        let got: GetPackageResponse = json(response).await;
        assert_eq!(got.package.version, uploaded.version);
    }

    #[tokio::test]
    async fn test_designators_may_look_like_routes() {
        let (_dir, app) = app();
        let response = app.clone().oneshot(post_json("/v1/packages", &bob())).await.unwrap();
        let uploaded: PackageInformation = json(response).await;

        let request = SetLabelRequest {
            package_name: "bob".into(),
            version: uploaded.version.clone(),
            labels: vec!["labels".into(), "archive".into(), "rc/1".into()],
        };
        let response = app
            .clone()
            .oneshot(post_json("/v1/labels/bob", &request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        for uri in [
            "/v1/packages/bob/labels",
            "/v1/packages/bob/archive",
            "/v1/packages/bob/rc%2F1",
        ] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            let got: GetPackageResponse = json(response).await;
            assert_eq!(got.package.version, uploaded.version);
        }
    }

    #[tokio::test]
    async fn test_error_body_carries_fields() {
        let (_dir, app) = app();
        let response = app.clone().oneshot(post_json("/v1/packages", &bob())).await.unwrap();
        let uploaded: PackageInformation = json(response).await;

        let response = app.oneshot(post_json("/v1/packages", &bob())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.package.as_deref(), Some("bob"));
        assert_eq!(body.detail, Some(uploaded.version));
    }

    #[tokio::test]
    async fn test_invalid_upload_is_bad_request() {
        let (_dir, app) = app();
        let upload = NewPackage {
            package_name: "bob".into(),
            files: vec![FileEntry::file("../../etc/passwd", "root", 0o644, "x")],
        };
        let response = app.oneshot(post_json("/v1/packages", &upload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.kind, "invalid_path");
    }

    #[tokio::test]
    async fn test_corrupt_upload_is_unprocessable() {
        let (_dir, app) = app();
        let upload = NewPackage {
            package_name: "bob".into(),
            files: vec![FileEntry::file("lib/libbob.so", "root", 0o644, "elf")],
        };
        let response = app.oneshot(post_json("/v1/packages", &upload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
