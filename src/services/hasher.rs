//! Streaming SHA-256 digests.
//!
//! Hashing is single pass: chunks are folded into the hasher as they arrive,
//! so the input never has to fit in memory at once. Identical byte sequences
//! always produce identical hex digests.

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use sha2::{Digest, Sha256};
use std::io;
use thiserror::Error;

/// Algorithm tag carried on every digest result.
pub const ALGORITHM: &str = "sha256";

#[derive(Debug, Error)]
pub enum HashError {
    #[error("no input stream provided")]
    MissingInput,
    #[error("content cannot be empty")]
    EmptyContent,
    #[error("failed to read content: {0}")]
    ReadFailure(io::Error),
}

/// Outcome of hashing a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestResult {
    /// Lowercase hex encoding of the digest (64 characters for SHA-256).
    pub hash: String,

    /// Number of bytes hashed.
    pub size: i64,

    /// Always [`ALGORITHM`].
    pub algorithm: &'static str,
}

/// Hash a chunk stream.
///
/// `None` fails with [`HashError::MissingInput`]; a stream that yields an
/// error fails with [`HashError::ReadFailure`]; a stream that finishes
/// without producing a single byte fails with [`HashError::EmptyContent`].
pub async fn digest_stream<S>(stream: Option<S>) -> Result<DigestResult, HashError>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    let stream = stream.ok_or(HashError::MissingInput)?;
    let mut hasher = Sha256::new();
    let mut size: i64 = 0;

    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(HashError::ReadFailure)?;
        size += chunk.len() as i64;
        hasher.update(&chunk);
    }

    if size == 0 {
        return Err(HashError::EmptyContent);
    }

    Ok(DigestResult {
        hash: hex::encode(hasher.finalize()),
        size,
        algorithm: ALGORITHM,
    })
}

/// Byte-buffer specialization of [`digest_stream`]; shares the empty-content rule.
pub fn digest_bytes(data: &[u8]) -> Result<DigestResult, HashError> {
    if data.is_empty() {
        return Err(HashError::EmptyContent);
    }
    Ok(DigestResult {
        hash: hex::encode(Sha256::digest(data)),
        size: data.len() as i64,
        algorithm: ALGORITHM,
    })
}

/// Re-hash `stream` and compare against `expected`.
///
/// The comparison is case sensitive; digests produced here are always
/// lowercase hex.
pub async fn verify<S>(stream: S, expected: &str) -> Result<bool, HashError>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    let result = digest_stream(Some(stream)).await?;
    Ok(result.hash == expected)
}
