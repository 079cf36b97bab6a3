//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that round-trips a probe object through the store

use crate::services::{hasher, upload_service::UploadService};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bytes::Bytes;
use futures::stream;
use serde::Serialize;
use std::{collections::HashMap, io};
use uuid::Uuid;

const PROBE_PAYLOAD: &[u8] = b"readyz";

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that writes a probe object under a unique key, reads it
/// back, verifies its digest, and deletes it. Returns JSON describing the
/// check. HTTP 200 when it passes, HTTP 503 when it fails.
pub async fn readyz(State(service): State<UploadService>) -> impl IntoResponse {
    let probe_key = format!(".readyz-{}", Uuid::new_v4());
    let store = service.store();

    let store_check = match hasher::digest_bytes(PROBE_PAYLOAD) {
        Err(e) => (false, Some(format!("could not hash probe payload: {}", e))),
        Ok(expected) => {
            match store
                .put(&probe_key, Bytes::from_static(PROBE_PAYLOAD), "text/plain")
                .await
            {
                Err(e) => (false, Some(format!("could not write probe object: {}", e))),
                Ok(_) => match store.get(&probe_key).await {
                    Err(e) => {
                        let _ = store.delete(&probe_key).await;
                        (false, Some(format!("could not read probe object: {}", e)))
                    }
                    Ok((bytes, _)) => {
                        let chunks = stream::iter(vec![io::Result::Ok(bytes)]);
                        let verdict = hasher::verify(chunks, &expected.hash).await;
                        match verdict {
                            Ok(true) => match store.delete(&probe_key).await {
                                Ok(_) => (true, None::<String>),
                                Err(e) => {
                                    (true, Some(format!("could not remove probe object: {}", e)))
                                }
                            },
                            Ok(false) => {
                                let _ = store.delete(&probe_key).await;
                                (false, Some("probe content mismatch".to_string()))
                            }
                            Err(e) => {
                                let _ = store.delete(&probe_key).await;
                                (false, Some(format!("could not verify probe object: {}", e)))
                            }
                        }
                    }
                },
            }
        }
    };

    let overall_ok = store_check.0;
    let mut checks = HashMap::new();
    checks.insert(
        "store",
        CheckStatus {
            ok: store_check.0,
            error: store_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
