//! Photo resize stage with JPEG output and timeout support.

use async_trait::async_trait;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use crate::config::CaptureConfig;
use crate::error::TransformError;
use crate::types::RawPhoto;

/// Result of the resize stage.
#[derive(Debug, Clone)]
pub struct ResizedPhoto {
    /// Path to the resized JPEG
    pub path: PathBuf,
    /// Width in pixels after resizing
    pub width: u32,
    /// Height in pixels after resizing
    pub height: u32,
}

/// The resize/transform seam the pipeline depends on.
///
/// Production uses [`JpegResizer`]; tests inject failing or recording
/// implementations.
#[async_trait]
pub trait PhotoTransform: Send + Sync {
    /// Resize a raw capture to the pipeline's target width.
    async fn resize(&self, photo: &RawPhoto) -> Result<ResizedPhoto, TransformError>;
}

/// Resizes captures to a target width with proportional height and re-encodes
/// them as JPEG.
///
/// Images narrower than the target keep their native size; the photo is still
/// re-encoded so the output is always a JPEG at the configured quality.
pub struct JpegResizer {
    target_width: u32,
    quality: u8,
    timeout_ms: u64,
}

impl JpegResizer {
    /// Create a resizer from the capture configuration.
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            target_width: config.target_width,
            quality: config.jpeg_quality,
            timeout_ms: config.resize_timeout_ms,
        }
    }

    /// Synchronous resize (runs in spawn_blocking).
    fn resize_sync(
        source: &Path,
        target_width: u32,
        quality: u8,
    ) -> Result<ResizedPhoto, TransformError> {
        let img = image::open(source).map_err(|e| TransformError::Decode {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = (img.width(), img.height());
        let img = if width > target_width {
            // Proportional height, never cropped
            let scaled_height =
                ((height as u64 * target_width as u64) / width as u64).max(1) as u32;
            img.resize_exact(target_width, scaled_height, FilterType::Triangle)
        } else {
            img
        };

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("capture");
        let out_path = source.with_file_name(format!("{stem}_resized.jpg"));

        let file = std::fs::File::create(&out_path).map_err(|e| TransformError::Write {
            path: out_path.clone(),
            message: e.to_string(),
        })?;
        let mut writer = std::io::BufWriter::new(file);
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality);
        // JPEG has no alpha channel
        img.to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| TransformError::Encode {
                path: out_path.clone(),
                message: e.to_string(),
            })?;

        Ok(ResizedPhoto {
            path: out_path,
            width: img.width(),
            height: img.height(),
        })
    }
}

#[async_trait]
impl PhotoTransform for JpegResizer {
    async fn resize(&self, photo: &RawPhoto) -> Result<ResizedPhoto, TransformError> {
        let source = photo.path.clone();
        let target_width = self.target_width;
        let quality = self.quality;
        let deadline = Duration::from_millis(self.timeout_ms);

        let result = timeout(
            deadline,
            tokio::task::spawn_blocking(move || {
                Self::resize_sync(&source, target_width, quality)
            }),
        )
        .await;

        match result {
            Ok(Ok(resized)) => resized,
            Ok(Err(e)) => Err(TransformError::Decode {
                path: photo.path.clone(),
                message: format!("Task join error: {e}"),
            }),
            Err(_) => Err(TransformError::Timeout {
                path: photo.path.clone(),
                timeout_ms: self.timeout_ms,
            }),
        }
    }
}
