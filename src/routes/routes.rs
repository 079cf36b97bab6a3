//! Route table for the upload service.
//!
//! ## Structure
//! - **Service endpoints**
//!   - `GET    /healthz` — liveness
//!   - `GET    /readyz` — readiness (store round-trip probe)
//!   - `GET    /resolve?locator=` — decode a locator into object metadata
//!
//! - **File endpoints**
//!   - `POST   /files` — multipart upload (single `file` part)
//!   - `GET    /files?prefix=` — list stored objects
//!   - `GET    /files/{*key}` — download
//!   - `HEAD   /files/{*key}` — metadata headers only
//!   - `DELETE /files/{*key}` — remove
//!
//! The wildcard `{*key}` allows nested keys like `docs/2025/report.pdf`.
//! Verbs outside this table answer with the structured 405 body.

use crate::{
    handlers::{
        file_handlers::{
            delete_file, get_file, head_file, list_files, method_not_allowed, resolve_locator,
            upload_file,
        },
        health_handlers::{healthz, readyz},
    },
    services::upload_service::UploadService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Multipart framing overhead allowed on top of the configured payload ceiling.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Build and return the router for all endpoints.
///
/// The router carries shared state ([`UploadService`]) to all handlers.
/// `max_upload_bytes` also bounds the raw request body, with slack for
/// multipart framing; the pipeline enforces the exact payload ceiling.
pub fn routes(max_upload_bytes: u64) -> Router<UploadService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/resolve", get(resolve_locator))
        // File endpoints
        .route(
            "/files",
            post(upload_file)
                .get(list_files)
                .fallback(method_not_allowed),
        )
        .route(
            "/files/{*key}",
            get(get_file)
                .head(head_file)
                .delete(delete_file)
                .fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(
            max_upload_bytes as usize + BODY_LIMIT_SLACK,
        ))
}
