//! Image compression applied to profile pictures before upload.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::FilePart;

/// Target limits for a compressed profile picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    pub max_bytes: usize,
    pub max_dimension: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            max_dimension: 1024,
        }
    }
}

/// Shrinks an image to fit `CompressionOptions`.
///
/// An `Err` is not fatal to an update: the store sends the original file.
#[async_trait]
pub trait ImageCompressor: Send + Sync {
    async fn compress(&self, file: &FilePart, options: &CompressionOptions) -> Result<FilePart, ApiError>;
}

/// Returns the input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl ImageCompressor for Passthrough {
    async fn compress(&self, file: &FilePart, _options: &CompressionOptions) -> Result<FilePart, ApiError> {
        Ok(file.clone())
    }
}
