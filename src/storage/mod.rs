//! Image blob storage

mod image;
mod local;

pub use image::{ImageFormat, ImageUpload};
pub use local::LocalImageStore;

use crate::error::Result;
use async_trait::async_trait;

/// Blob store addressed by relative path
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Write `bytes` at `path`, replacing anything already there.
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()>;
    /// Remove the blob at `path`; a missing blob is not an error.
    async fn delete(&self, path: &str) -> Result<()>;
    /// Absolute URL clients can fetch the blob from
    fn url(&self, path: &str) -> String;
}
