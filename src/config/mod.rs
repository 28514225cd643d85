//! Configuration management for Itinera Core

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Absolute base URL clients reach this service at
    pub app_url: String,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Image storage configuration
    pub storage: StorageConfig,
    /// Page size for itinerary listings
    pub itineraries_per_page: u32,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory image blobs are written under
    pub root: PathBuf,
    /// URL prefix the blobs are served from (e.g. `/storage`)
    pub public_path: String,
    /// Upper bound for an uploaded image, in bytes
    pub max_image_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("unknown log format '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub log_format: LogFormat,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid {}", key)),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: var_or("HTTP_PORT", 8080)?,
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: var_or("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: var_or("DATABASE_MIN_CONNECTIONS", 2)?,
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "itinera".to_string()),
                access_token_ttl_secs: var_or("JWT_ACCESS_TOKEN_TTL_SECS", 2_592_000)?,
            },
            storage: StorageConfig {
                root: env::var("STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("storage/app/public")),
                public_path: env::var("STORAGE_PUBLIC_PATH")
                    .unwrap_or_else(|_| "/storage".to_string()),
                max_image_bytes: var_or("IMAGE_MAX_BYTES", 2048 * 1024)?,
            },
            itineraries_per_page: var_or("ITINERARIES_PER_PAGE", 15)?,
            telemetry: TelemetryConfig {
                log_format: var_or("LOG_FORMAT", LogFormat::Pretty)?,
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Absolute URL prefix for stored images, without a trailing slash
    pub fn image_base_url(&self) -> String {
        let path = self.storage.public_path.trim_matches('/');
        let base = self.app_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Route prefix the storage directory is mounted on
    pub fn storage_mount_path(&self) -> String {
        format!("/{}", self.storage.public_path.trim_matches('/'))
    }
}
