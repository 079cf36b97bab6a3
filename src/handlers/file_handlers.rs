//! HTTP handlers for upload, retrieval, and locator resolution.
//! Transport concerns only: multipart extraction, header building, and the
//! mapping of verbs to pipeline and store calls.

use crate::{
    errors::ApiError,
    models::{object::ObjectMeta, upload::UploadResult},
    services::{
        locator,
        object_store::StoreError,
        upload_service::{UploadRequest, UploadService},
    },
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use futures::TryStreamExt;
use serde::Deserialize;
use std::io;

/// Rough allowance for multipart boundaries and part headers when reading
/// the request Content-Length as a declared payload size.
const MULTIPART_FRAMING_ALLOWANCE: u64 = 1024;

/// Query params accepted by the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub prefix: Option<String>,
}

/// Query params accepted by the locator-resolution endpoint.
#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub locator: String,
}

/// `POST /files` — multipart upload of a single `file` part.
pub async fn upload_file(
    State(service): State<UploadService>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResult>), ApiError> {
    // Content-Length covers the whole multipart body; subtract the framing
    // allowance so a maximum-size payload is not rejected up front. The
    // pipeline re-validates against actual bytes either way.
    let declared_size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|n| n.saturating_sub(MULTIPART_FRAMING_ALLOWANCE));

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::ReadFailure(io::Error::new(io::ErrorKind::InvalidData, err)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let stream = field.map_err(|err| io::Error::new(io::ErrorKind::Other, err));

        let result = service
            .upload(UploadRequest {
                file_name,
                content_type,
                declared_size,
                stream,
            })
            .await?;
        return Ok((StatusCode::CREATED, Json(result)));
    }

    Err(ApiError::MissingFile)
}

/// `GET /files/{*key}` — send the stored object back.
pub async fn get_file(
    State(service): State<UploadService>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let (data, meta) = service.store().get(&key).await?;

    let mut response = Response::new(Body::from(data));
    set_object_headers(response.headers_mut(), &meta);
    Ok(response)
}

/// `HEAD /files/{*key}` — same headers as GET but no body.
pub async fn head_file(
    State(service): State<UploadService>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let meta = service.store().head(&key).await?;

    let mut response = Response::new(Body::empty());
    set_object_headers(response.headers_mut(), &meta);
    Ok(response)
}

/// `DELETE /files/{*key}`
pub async fn delete_file(
    State(service): State<UploadService>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.store().delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /files?prefix=` — list stored objects as JSON metadata.
pub async fn list_files(
    State(service): State<UploadService>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<ObjectMeta>>, ApiError> {
    let entries = service
        .store()
        .list(q.prefix.as_deref().unwrap_or(""))
        .await?;
    Ok(Json(entries))
}

/// `GET /resolve?locator=` — decode a locator and return the metadata of the
/// object it names.
pub async fn resolve_locator(
    State(service): State<UploadService>,
    Query(q): Query<ResolveQuery>,
) -> Result<Json<ObjectMeta>, ApiError> {
    let (bucket, key) = locator::decode(&q.locator)?;
    if bucket != service.bucket() {
        return Err(ApiError::Store(StoreError::ObjectNotFound(key)));
    }
    let meta = service.store().head(&key).await?;
    Ok(Json(meta))
}

/// Fallback for verbs the `/files` routes do not accept.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn set_object_headers(headers: &mut HeaderMap, meta: &ObjectMeta) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&meta.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&meta.size.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    let quoted = format!("\"{}\"", meta.etag);
    if let Ok(value) = HeaderValue::from_str(&quoted) {
        headers.insert(header::ETAG, value);
    }

    if let Ok(value) = HeaderValue::from_str(&meta.last_modified.to_rfc2822()) {
        headers.insert(header::LAST_MODIFIED, value);
    }
}
