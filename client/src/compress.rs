//! Photo compression.
//!
//! Photos are decoded, turned upright per their EXIF orientation, scaled down
//! so they are no wider than the configured maximum (never scaled up), and
//! re-encoded as JPEG. The result is carried as
//! a base64 `data:` URI, see [`common::data_uri`] for how its size is derived.

use std::{io::Cursor, path::Path};

use chrono::{SecondsFormat, Utc};
use common::{data::PhotoPayload, data_uri};
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, metadata::Orientation, DynamicImage,
    ImageDecoder, ImageError, ImageReader,
};
use tokio::task::spawn_blocking;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressorConfig {
    pub max_width: u32,
    /// JPEG quality factor in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            quality: 0.6,
        }
    }
}

impl CompressorConfig {
    fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// A compressed photo waiting to be submitted. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedPhoto {
    name: String,
    data: String,
    size: u64,
    timestamp: String,
}

impl CompressedPhoto {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `data:image/jpeg;base64,...`
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Approximate size of the encoded image in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn to_payload(&self) -> PhotoPayload {
        PhotoPayload {
            data: self.data.clone(),
            name: self.name.clone(),
            timestamp: self.timestamp.clone(),
        }
    }
}

/// Dimensions after bounding `width` to `max_width`, keeping the aspect ratio.
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let (w, h, max) = (width as u64, height as u64, max_width as u64);
    let scaled = (h * max + w / 2) / w;
    (max_width, scaled.max(1) as u32)
}

/// Decodes `bytes` and applies the orientation the camera recorded, so the
/// width is the displayed width.
fn decode_upright(name: &str, bytes: &[u8]) -> Result<DynamicImage> {
    let decode_err = |source: ImageError| Error::Decode {
        name: name.to_string(),
        source,
    };
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(ImageError::IoError(e)))?
        .into_decoder()
        .map_err(decode_err)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    img.apply_orientation(orientation);
    Ok(img)
}

#[derive(Clone, Debug, Default)]
pub struct ImageCompressor {
    config: CompressorConfig,
}

impl ImageCompressor {
    pub fn new(config: CompressorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    /// Reads and compresses the image at `path`. Decoding runs on the blocking
    /// pool so the caller's event loop keeps turning.
    pub async fn compress_file(&self, path: &Path) -> Result<CompressedPhoto> {
        let bytes = tokio::fs::read(path).await.map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let compressor = self.clone();
        spawn_blocking(move || compressor.compress_bytes(&name, &bytes)).await?
    }

    pub fn compress_bytes(&self, name: &str, bytes: &[u8]) -> Result<CompressedPhoto> {
        let img = decode_upright(name, bytes)?;
        let (width, height) = scaled_dimensions(img.width(), img.height(), self.config.max_width);
        let img = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, FilterType::Triangle)
        };

        let mut jpeg = Vec::new();
        img.to_rgb8()
            .write_with_encoder(JpegEncoder::new_with_quality(
                &mut jpeg,
                self.config.jpeg_quality(),
            ))
            .map_err(|source| Error::Encode {
                name: name.to_string(),
                source,
            })?;

        let data = data_uri::encode(data_uri::JPEG_MIME, &jpeg);
        log::debug!(
            "compressed {name}: {} bytes -> {}x{} jpeg, {} bytes",
            bytes.len(),
            width,
            height,
            jpeg.len()
        );
        Ok(CompressedPhoto {
            name: name.to_string(),
            size: data_uri::approximate_size(&data),
            data,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}
