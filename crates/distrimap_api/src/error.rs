//! HTTP-facing error type.
//!
//! # Invariants
//! - Every failure leaves as a JSON envelope with `success: false`.
//! - Store and runtime details are logged, never echoed to the client.

use crate::envelope::Envelope;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use distrimap_core::{DistributeurId, DistributeurValidationError, RepoError};
use log::{error, warn};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("distributeur {0} not found")]
    NotFound(DistributeurId),

    #[error("distributeur {0} already exists")]
    Conflict(DistributeurId),

    #[error("route not found")]
    RouteNotFound,

    #[error("missing or invalid admin token")]
    Unauthorized,

    #[error("admin routes are disabled")]
    AdminDisabled,

    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AdminDisabled => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => err.into(),
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::AlreadyExists(id) => Self::Conflict(id),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<DistributeurValidationError> for ApiError {
    fn from(value: DistributeurValidationError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Internal(format!("store task failed: {value}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(detail) => {
                error!(
                    "event=request_failed module=api status=error http_status={} detail={}",
                    status.as_u16(),
                    detail
                );
            }
            other => {
                warn!(
                    "event=request_rejected module=api status=rejected http_status={} reason={}",
                    status.as_u16(),
                    other
                );
            }
        }

        (status, Envelope::failure(self.to_string())).into_response()
    }
}
