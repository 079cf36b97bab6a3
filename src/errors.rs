//! Service error type and its HTTP rendering.
//!
//! Every failure kind carries a stable machine code and maps to exactly one
//! status; bodies follow `{ "error": <status text>, "code": <CODE>,
//! "message": <human text> }`.

use crate::services::{hasher::HashError, locator::LocatorError, object_store::StoreError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("only POST is allowed")]
    MethodNotAllowed,
    #[error("no file provided")]
    MissingFile,
    #[error("file exceeds maximum size of {limit} bytes")]
    FileTooLarge { limit: u64 },
    #[error("invalid MIME type `{got}`: only PDF files are allowed")]
    InvalidMime { got: String },
    #[error("failed to read upload stream: {0}")]
    ReadFailure(io::Error),
    #[error("upload of `{key}` failed: {source}")]
    UploadFailed { key: String, source: StoreError },
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Locator(#[from] LocatorError),
}

impl ApiError {
    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::MissingFile => "MISSING_FILE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::InvalidMime { .. } => "INVALID_MIME",
            Self::ReadFailure(_) => "READ_FAILURE",
            Self::UploadFailed { .. } => "UPLOAD_ERROR",
            Self::Hash(HashError::MissingInput) => "MISSING_INPUT",
            Self::Hash(HashError::EmptyContent) => "EMPTY_CONTENT",
            Self::Hash(HashError::ReadFailure(_)) => "READ_FAILURE",
            Self::Store(StoreError::EmptyKey) => "EMPTY_KEY",
            Self::Store(StoreError::MissingData) => "MISSING_DATA",
            Self::Store(StoreError::ObjectNotFound(_)) => "OBJECT_NOT_FOUND",
            Self::Store(StoreError::InvalidConfig(_)) => "INVALID_CONFIG",
            Self::Locator(LocatorError::MalformedLocator(_)) => "MALFORMED_LOCATOR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidMime { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::ReadFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UploadFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Hash(HashError::ReadFailure(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Hash(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::ObjectNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::InvalidConfig(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(_) => StatusCode::BAD_REQUEST,
            Self::Locator(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {}", self);
        }

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("error"),
            "code": self.code(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
