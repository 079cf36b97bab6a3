//! Core data models for the upload service.
//!
//! These entities describe stored-object metadata and the response shapes
//! handed back to clients. They serialize naturally as JSON via `serde`.

pub mod object;
pub mod upload;
