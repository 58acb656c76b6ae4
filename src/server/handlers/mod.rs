// src/server/handlers/mod.rs
//! HTTP request handlers for the catalog server

pub mod packages;

use crate::error::Error;
use crate::protocol::ErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Error response: a status code plus a JSON [`ErrorBody`]
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: String,
    message: String,
    package: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal".to_string(),
            message: message.into(),
            package: None,
            detail: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        let reason = message.into();
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_request".to_string(),
            message: Error::InvalidRequest(reason.clone()).to_string(),
            package: None,
            detail: Some(reason),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Status code for a catalog error
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::PackageNotFound(_) | Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::DuplicateVersion { .. } => StatusCode::CONFLICT,
        Error::InvalidRequest(_) | Error::InvalidPath(_) => StatusCode::BAD_REQUEST,
        Error::CorruptVersion { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Unimplemented(_) => StatusCode::NOT_IMPLEMENTED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!("Catalog request failed: {}", err);
        }
        let (package, detail) = err.wire_fields();
        Self {
            status,
            kind: err.kind().to_string(),
            message: err.to_string(),
            package,
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            kind: self.kind,
            message: self.message,
            package: self.package,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Run a synchronous catalog call on the blocking pool
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            tracing::error!("Catalog task failed: {}", e);
            Err(ApiError::internal(format!("task failed: {}", e)))
        }
    }
}
