use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::errors::ServiceError;
use service::storage::StoreError;
use thiserror::Error;
use tracing::error;

/// Error returned by HTTP handlers. Every variant renders as
/// `{"error": <kind>, "message": <detail>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot decode request body: {0}")]
    RequestDecode(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RequestDecode(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(e) => match e {
                ServiceError::InvalidOwner(_) | ServiceError::InvalidItem(_) => StatusCode::BAD_REQUEST,
                ServiceError::WriteConflict { .. } => StatusCode::CONFLICT,
                ServiceError::RecordDecode(_) | ServiceError::StoreUnavailable(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::RequestDecode(_) => "request_decode",
            ApiError::Service(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.to_string();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %msg, "request failed");
        }
        (status, Json(ErrorBody::new(self.kind(), msg))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
