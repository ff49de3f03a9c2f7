use std::io;

use reqwest::StatusCode;

use common::prelude::{Cancelled, ValidationError};
use common::transfer::TransferError;

use crate::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("{kind:?} ({status}): {message}")]
    Status {
        status: StatusCode,
        kind: ErrorKind,
        message: String,
    },

    #[error("token is not a valid header value")]
    InvalidToken,

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("operation was cancelled")]
    Cancelled(#[from] Cancelled),
}

impl ApiError {
    /// The server-side category of the failure. Anything that never got a
    /// response from the server counts as internal.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Status { kind, .. } => *kind,
            ApiError::Validation(_) => ErrorKind::Invalid,
            _ => ErrorKind::Internal,
        }
    }
}
