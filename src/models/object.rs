//! Metadata describing a stored object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a single object in the store.
///
/// Every operation that touches an object produces a fresh `ObjectMeta`;
/// instances are never mutated after construction.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Size in bytes.
    pub size: i64,

    /// Content type (MIME type) recorded at write time.
    pub content_type: String,

    /// Timestamp of the last write to this key.
    pub last_modified: DateTime<Utc>,

    /// MD5 checksum of the payload, hex encoded.
    pub etag: String,
}
