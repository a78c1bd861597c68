//! JPEG re-encoding for profile pictures.
//!
//! Decodes any supported format, shrinks so the longest side fits
//! `max_dimension`, then re-encodes at decreasing quality until the result
//! fits `max_bytes`.

use std::path::Path;

use async_trait::async_trait;
use employee_core::{ApiError, CompressionOptions, FilePart, ImageCompressor};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::debug;

const QUALITY_STEPS: [u8; 5] = [85, 75, 65, 50, 35];

#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCompressor;

#[async_trait]
impl ImageCompressor for JpegCompressor {
    async fn compress(&self, file: &FilePart, options: &CompressionOptions) -> Result<FilePart, ApiError> {
        let file = file.clone();
        let options = *options;
        tokio::task::spawn_blocking(move || compress_blocking(&file, &options))
            .await
            .map_err(|e| ApiError::Compression(e.to_string()))?
    }
}

fn compress_blocking(file: &FilePart, options: &CompressionOptions) -> Result<FilePart, ApiError> {
    let img = image::load_from_memory(&file.bytes).map_err(|e| ApiError::Compression(format!("invalid image: {e}")))?;

    let img = if img.width().max(img.height()) > options.max_dimension {
        img.resize(options.max_dimension, options.max_dimension, FilterType::Lanczos3)
    } else {
        img
    };
    let rgb = img.to_rgb8();

    for quality in QUALITY_STEPS {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| ApiError::Compression(format!("failed to encode JPEG: {e}")))?;

        if buffer.len() <= options.max_bytes {
            debug!(quality, bytes = buffer.len(), width = rgb.width(), height = rgb.height(), "encoded profile picture");
            let name = Path::new(&file.file_name).with_extension("jpg");
            return Ok(FilePart::new(name.to_string_lossy(), "image/jpeg", buffer));
        }
    }

    Err(ApiError::Compression(format!(
        "could not fit {} under {} bytes",
        file.file_name, options.max_bytes
    )))
}
