//! Service layer: hashing, locator encoding, storage, and the upload pipeline.

pub mod hasher;
pub mod locator;
pub mod object_store;
pub mod upload_service;
