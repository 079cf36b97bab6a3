//! Response shape for a completed upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returned to the client after a successful upload.
///
/// Immutable once constructed.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Decodable locator for the stored object, e.g. `s3://garage/{bucket}/{key}`.
    pub locator: String,

    /// Lowercase-hex SHA-256 digest of the stored bytes.
    pub digest: String,

    /// Original filename as submitted by the client.
    pub file_name: String,

    /// Stored payload size in bytes.
    pub size: i64,

    /// When the upload completed.
    pub uploaded_at: DateTime<Utc>,
}
