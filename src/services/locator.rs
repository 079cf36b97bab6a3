//! Locator encoding.
//!
//! A locator is an opaque but decodable URI naming an object by bucket and
//! key, e.g. `s3://garage/uploads/docs/report.pdf`. Encoding and decoding
//! are pure string transformations; nothing here touches the store.

use thiserror::Error;

/// Fixed scheme prefix shared by every locator.
pub const SCHEME: &str = "s3://garage/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("malformed locator: {0}")]
    MalformedLocator(String),
}

/// Build the locator for `key` inside `bucket`.
///
/// [`decode`] inverts this exactly as long as `bucket` does not itself
/// contain `/`; keys may contain any number of them.
pub fn encode(bucket: &str, key: &str) -> String {
    format!("{SCHEME}{bucket}/{key}")
}

/// Split a locator back into `(bucket, key)`.
///
/// Fails with [`LocatorError::MalformedLocator`] when the scheme prefix is
/// missing, or when no key segment follows the bucket.
pub fn decode(locator: &str) -> Result<(String, String), LocatorError> {
    let Some(path) = locator.strip_prefix(SCHEME) else {
        return Err(LocatorError::MalformedLocator(format!(
            "expected `{SCHEME}` prefix in `{locator}`"
        )));
    };
    match path.split_once('/') {
        Some((bucket, key)) => Ok((bucket.to_string(), key.to_string())),
        None => Err(LocatorError::MalformedLocator(format!(
            "no key segment in `{locator}`"
        ))),
    }
}
