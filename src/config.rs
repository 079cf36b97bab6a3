use crate::services::object_store::{StoreError, StoreResult};
use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Region used when `S3_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: u64,
    pub allowed_types: Vec<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "PDF upload service backed by an object store")]
pub struct Args {
    /// Host to bind to (overrides FILEDROP_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILEDROP_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Upload size ceiling in bytes (overrides FILEDROP_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into an AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("FILEDROP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("FILEDROP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing FILEDROP_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading FILEDROP_PORT"),
        };
        let env_max = match env::var("FILEDROP_MAX_UPLOAD_BYTES") {
            Ok(value) => value
                .parse::<u64>()
                .with_context(|| format!("parsing FILEDROP_MAX_UPLOAD_BYTES value `{}`", value))?,
            Err(env::VarError::NotPresent) => DEFAULT_MAX_UPLOAD_BYTES,
            Err(err) => return Err(err).context("reading FILEDROP_MAX_UPLOAD_BYTES"),
        };

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max),
            allowed_types: vec!["application/pdf".into()],
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection settings for the object-store backend.
///
/// Built once at process start; invalid combinations are rejected here,
/// never discovered on a request path.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

impl StoreConfig {
    /// Read the `S3_*` environment variables into a validated config.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_values(
            env::var("S3_ENDPOINT").unwrap_or_default(),
            env::var("S3_REGION").unwrap_or_default(),
            env::var("S3_ACCESS_KEY").unwrap_or_default(),
            env::var("S3_SECRET_KEY").unwrap_or_default(),
            env::var("S3_BUCKET").unwrap_or_default(),
        )
    }

    /// Validate explicit values into a config. Region falls back to
    /// [`DEFAULT_REGION`] when blank; everything else is required.
    pub fn from_values(
        endpoint: String,
        region: String,
        access_key: String,
        secret_key: String,
        bucket: String,
    ) -> StoreResult<Self> {
        if endpoint.trim().is_empty() {
            return Err(StoreError::InvalidConfig("S3_ENDPOINT is required".into()));
        }
        if access_key.trim().is_empty() || secret_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "S3_ACCESS_KEY and S3_SECRET_KEY are required".into(),
            ));
        }
        if bucket.trim().is_empty() {
            return Err(StoreError::InvalidConfig("S3_BUCKET is required".into()));
        }
        let region = if region.trim().is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            region
        };

        Ok(Self {
            endpoint,
            region,
            access_key,
            secret_key,
            bucket,
        })
    }
}
