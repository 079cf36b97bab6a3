//! Backend-agnostic object storage.
//!
//! [`ObjectStore`] is the seam between the upload pipeline and whatever holds
//! the bytes. [`MemoryStore`] is the reference backend: a concurrent keyed
//! map with last-write-wins overwrite, metadata on every operation, and
//! prefix listing. A network-backed client satisfies the same trait and
//! drops in behind the same `Arc<dyn ObjectStore>`.

use crate::{config::StoreConfig, models::object::ObjectMeta};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key cannot be empty")]
    EmptyKey,
    #[error("data cannot be empty")]
    MissingData,
    #[error("object `{0}` not found")]
    ObjectNotFound(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Abstract storage backend over opaque keys.
///
/// A leading `/` is stripped off keys before use, so `/a/b` and `a/b`
/// address the same object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, overwriting any previous object (last write
    /// wins, no versioning). The payload is fully owned before the keyspace
    /// is touched, so readers never observe a partial write.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<ObjectMeta>;

    /// Fetch the payload and metadata stored under `key`.
    ///
    /// The returned bytes are exactly what the last `put` wrote.
    async fn get(&self, key: &str) -> StoreResult<(Bytes, ObjectMeta)>;

    /// Metadata-only variant of [`get`](Self::get); never transfers the payload.
    async fn head(&self, key: &str) -> StoreResult<ObjectMeta>;

    /// Remove the object under `key`. Afterwards `get`, `head`, and another
    /// `delete` all fail with [`StoreError::ObjectNotFound`].
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Metadata for every key starting with `prefix`, sorted by key. An
    /// empty prefix matches everything. The listing is materialized per
    /// call; there is no cursor to resume from.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectMeta>>;
}

/// One entry in the in-memory keyspace. Inserted whole, replaced whole.
#[derive(Debug)]
struct StoredObject {
    data: Bytes,
    meta: ObjectMeta,
}

/// In-memory reference backend.
///
/// `DashMap` gives per-key mutual exclusion; an entry is inserted as a unit,
/// so concurrent readers see the previous object or the new one, never a mix.
pub struct MemoryStore {
    objects: DashMap<String, StoredObject>,
}

impl MemoryStore {
    /// Build a store for the bucket described by `cfg`.
    ///
    /// Nothing is dialed here, but the same construction-time validation
    /// applies to every backend: a blank endpoint or bucket is
    /// [`StoreError::InvalidConfig`] now, not a surprise on the first request.
    pub fn new(cfg: &StoreConfig) -> StoreResult<Self> {
        if cfg.endpoint.trim().is_empty() {
            return Err(StoreError::InvalidConfig("endpoint is required".into()));
        }
        if cfg.bucket.trim().is_empty() {
            return Err(StoreError::InvalidConfig("bucket is required".into()));
        }
        Ok(Self {
            objects: DashMap::new(),
        })
    }

    fn etag(data: &[u8]) -> String {
        format!("{:x}", md5::compute(data))
    }
}

fn normalize(key: &str) -> StoreResult<&str> {
    let key = key.strip_prefix('/').unwrap_or(key);
    if key.trim().is_empty() {
        return Err(StoreError::EmptyKey);
    }
    Ok(key)
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<ObjectMeta> {
        let key = normalize(key)?;
        if data.is_empty() {
            return Err(StoreError::MissingData);
        }

        let meta = ObjectMeta {
            key: key.to_string(),
            size: data.len() as i64,
            content_type: content_type.to_string(),
            last_modified: Utc::now(),
            etag: Self::etag(&data),
        };
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                meta: meta.clone(),
            },
        );
        debug!(key, size = meta.size, "stored object");
        Ok(meta)
    }

    async fn get(&self, key: &str) -> StoreResult<(Bytes, ObjectMeta)> {
        let key = normalize(key)?;
        let entry = self
            .objects
            .get(key)
            .ok_or_else(|| StoreError::ObjectNotFound(key.to_string()))?;
        Ok((entry.data.clone(), entry.meta.clone()))
    }

    async fn head(&self, key: &str) -> StoreResult<ObjectMeta> {
        let key = normalize(key)?;
        let entry = self
            .objects
            .get(key)
            .ok_or_else(|| StoreError::ObjectNotFound(key.to_string()))?;
        Ok(entry.meta.clone())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let key = normalize(key)?;
        self.objects
            .remove(key)
            .ok_or_else(|| StoreError::ObjectNotFound(key.to_string()))?;
        debug!(key, "deleted object");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectMeta>> {
        let prefix = prefix.strip_prefix('/').unwrap_or(prefix);
        let mut entries: Vec<ObjectMeta> = self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.meta.clone())
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    fn test_config() -> StoreConfig {
        StoreConfig {
            endpoint: "http://localhost:3900".into(),
            region: "us-east-1".into(),
            access_key: "GK_test".into(),
            secret_key: "secret".into(),
            bucket: "uploads".into(),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(&test_config()).unwrap()
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let s = store();
        let meta = s
            .put("docs/report.pdf", Bytes::from_static(b"%PDF-payload"), "application/pdf")
            .await
            .unwrap();
        assert_eq!(meta.key, "docs/report.pdf");
        assert_eq!(meta.size, 12);
        assert_eq!(meta.content_type, "application/pdf");

        let (data, got_meta) = s.get("docs/report.pdf").await.unwrap();
        assert_eq!(data.as_ref(), b"%PDF-payload");
        assert_eq!(got_meta.etag, meta.etag);
    }

    #[tokio::test]
    async fn overwrite_is_last_write_wins() {
        let s = store();
        let first = s
            .put("k", Bytes::from_static(b"first"), "text/plain")
            .await
            .unwrap();
        let second = s
            .put("k", Bytes::from_static(b"second write"), "text/plain")
            .await
            .unwrap();
        assert_ne!(first.etag, second.etag);

        let (data, meta) = s.get("k").await.unwrap();
        assert_eq!(data.as_ref(), b"second write");
        assert_eq!(meta.size, 12);
    }

    #[tokio::test]
    async fn head_reports_metadata_only() {
        let s = store();
        s.put("docs/report.pdf", Bytes::from_static(b"%PDF-payload"), "application/pdf")
            .await
            .unwrap();
        let meta = s.head("docs/report.pdf").await.unwrap();
        assert_eq!(meta.size, 12);
        assert_eq!(meta.key, "docs/report.pdf");
    }

    #[tokio::test]
    async fn leading_slash_addresses_same_object() {
        let s = store();
        s.put("/a/b", Bytes::from_static(b"data"), "text/plain")
            .await
            .unwrap();
        let (data, meta) = s.get("a/b").await.unwrap();
        assert_eq!(data.as_ref(), b"data");
        assert_eq!(meta.key, "a/b");
        assert!(s.head("/a/b").await.is_ok());
    }

    #[tokio::test]
    async fn delete_then_everything_not_found() {
        let s = store();
        s.put("k", Bytes::from_static(b"data"), "text/plain")
            .await
            .unwrap();
        s.delete("k").await.unwrap();

        assert!(matches!(s.get("k").await, Err(StoreError::ObjectNotFound(_))));
        assert!(matches!(s.head("k").await, Err(StoreError::ObjectNotFound(_))));
        assert!(matches!(s.delete("k").await, Err(StoreError::ObjectNotFound(_))));
    }

    #[tokio::test]
    async fn delete_unknown_key_not_found() {
        let s = store();
        assert!(matches!(
            s.delete("nothing-here").await,
            Err(StoreError::ObjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn blank_keys_rejected() {
        let s = store();
        for key in ["", "   ", "/"] {
            assert!(matches!(
                s.put(key, Bytes::from_static(b"data"), "text/plain").await,
                Err(StoreError::EmptyKey)
            ));
        }
    }

    #[tokio::test]
    async fn empty_payload_rejected() {
        let s = store();
        assert!(matches!(
            s.put("k", Bytes::new(), "text/plain").await,
            Err(StoreError::MissingData)
        ));
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let s = store();
        s.put("prefix/a", Bytes::from_static(b"a"), "text/plain")
            .await
            .unwrap();
        s.put("prefix/b", Bytes::from_static(b"b"), "text/plain")
            .await
            .unwrap();
        s.put("other", Bytes::from_static(b"c"), "text/plain")
            .await
            .unwrap();

        let entries = s.list("prefix/").await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["prefix/a", "prefix/b"]);
    }

    #[tokio::test]
    async fn empty_prefix_lists_everything_sorted() {
        let s = store();
        s.put("b", Bytes::from_static(b"b"), "text/plain").await.unwrap();
        s.put("a", Bytes::from_static(b"a"), "text/plain").await.unwrap();
        s.put("c", Bytes::from_static(b"c"), "text/plain").await.unwrap();

        let entries = s.list("").await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn blank_endpoint_rejected() {
        let mut cfg = test_config();
        cfg.endpoint = "".into();
        assert!(matches!(
            MemoryStore::new(&cfg),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn blank_bucket_rejected() {
        let mut cfg = test_config();
        cfg.bucket = "  ".into();
        assert!(matches!(
            MemoryStore::new(&cfg),
            Err(StoreError::InvalidConfig(_))
        ));
    }
}
