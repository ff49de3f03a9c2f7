//! Vault error taxonomy and its translation to HTTP.
//!
//! Every failure that crosses the API boundary is a [`VaultError`]. Its
//! [`ErrorKind`] maps 1:1 onto a status code, and the client maps the
//! status code back. `Internal` detail is logged here and never sent.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use common::prelude::ValidationError;
use common::transfer::TransferError;

use crate::blobs::BlobStoreError;

/// Message returned in place of any internal detail.
pub const INTERNAL_MESSAGE: &str = "internal error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Invalid,
    AlreadyExists,
    NotFound,
    OwnerNotFound,
    Unauthenticated,
    PermissionDenied,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AlreadyExists => StatusCode::CONFLICT,
            ErrorKind::OwnerNotFound => StatusCode::PRECONDITION_FAILED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Inverse of [`ErrorKind::status`]. Unknown codes are `Internal`.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST => ErrorKind::Invalid,
            StatusCode::UNAUTHORIZED => ErrorKind::Unauthenticated,
            StatusCode::FORBIDDEN => ErrorKind::PermissionDenied,
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::CONFLICT => ErrorKind::AlreadyExists,
            StatusCode::PRECONDITION_FAILED => ErrorKind::OwnerNotFound,
            _ => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("record not found")]
    NotFound,

    #[error("owner does not exist")]
    OwnerNotFound,

    #[error("authentication failed")]
    Unauthenticated,

    #[error("permission denied")]
    PermissionDenied,

    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Invalid(_) => ErrorKind::Invalid,
            VaultError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            VaultError::NotFound => ErrorKind::NotFound,
            VaultError::OwnerNotFound => ErrorKind::OwnerNotFound,
            VaultError::Unauthenticated => ErrorKind::Unauthenticated,
            VaultError::PermissionDenied => ErrorKind::PermissionDenied,
            VaultError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        VaultError::Invalid(msg.into())
    }

    pub fn internal(msg: impl std::fmt::Display) -> Self {
        VaultError::Internal(msg.to_string())
    }
}

impl From<ValidationError> for VaultError {
    fn from(err: ValidationError) -> Self {
        VaultError::Invalid(err.to_string())
    }
}

impl From<JsonRejection> for VaultError {
    fn from(err: JsonRejection) -> Self {
        VaultError::Invalid(err.body_text())
    }
}

impl From<PathRejection> for VaultError {
    fn from(err: PathRejection) -> Self {
        VaultError::Invalid(err.body_text())
    }
}

impl From<sqlx::Error> for VaultError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind as DbErrorKind;

        match &err {
            sqlx::Error::RowNotFound => VaultError::NotFound,
            sqlx::Error::Database(db) => match db.kind() {
                DbErrorKind::UniqueViolation => VaultError::AlreadyExists("record".to_string()),
                DbErrorKind::ForeignKeyViolation => VaultError::OwnerNotFound,
                _ => VaultError::Internal(err.to_string()),
            },
            _ => VaultError::Internal(err.to_string()),
        }
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Internal(err.to_string())
    }
}

impl From<BlobStoreError> for VaultError {
    fn from(err: BlobStoreError) -> Self {
        VaultError::Internal(err.to_string())
    }
}

impl From<TransferError> for VaultError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Codec(_)
            | TransferError::HeaderTooLarge(_)
            | TransferError::ChunkTooLarge(_) => VaultError::Invalid(err.to_string()),
            TransferError::Truncated
            | TransferError::Transport(_)
            | TransferError::Io(_)
            | TransferError::Cancelled(_) => VaultError::Internal(err.to_string()),
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

impl IntoResponse for VaultError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let error = match &self {
            VaultError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                INTERNAL_MESSAGE.to_string()
            }
            other => other.to_string(),
        };

        (kind.status(), Json(ErrorBody { error, kind })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_is_invertible() {
        for kind in [
            ErrorKind::Invalid,
            ErrorKind::AlreadyExists,
            ErrorKind::NotFound,
            ErrorKind::OwnerNotFound,
            ErrorKind::Unauthenticated,
            ErrorKind::PermissionDenied,
            ErrorKind::Internal,
        ] {
            assert_eq!(ErrorKind::from_status(kind.status()), kind);
        }
        assert_eq!(
            ErrorKind::from_status(StatusCode::BAD_GATEWAY),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let response = VaultError::internal("disk /var/lib/vault on fire").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_maps_to_invalid() {
        let err: VaultError = ValidationError::missing("login").into();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert_eq!(err.to_string(), "invalid request: login is required");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: VaultError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
