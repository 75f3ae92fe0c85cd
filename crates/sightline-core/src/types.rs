//! Core data types for the capture-and-cache pipeline.
//!
//! These types flow between the camera device, the capture pipeline, and the
//! image cache store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::device::FlashMode;

/// One capture attempt as requested by the user.
///
/// Ephemeral: created when the capture button is pressed, dropped when the
/// operation resolves or is cancelled. Owned by the controller for the
/// duration of exactly one capture.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// Use the front-facing camera
    pub use_front_facing: bool,

    /// Flash behavior for this capture
    pub flash_mode: FlashMode,

    /// Cooperative cancellation signal, checked at every pipeline checkpoint
    pub token: CancelToken,
}

/// The device's unprocessed capture result.
///
/// Consumed and discarded by the pipeline once processing completes.
#[derive(Debug, Clone)]
pub struct RawPhoto {
    /// Path to the capture on the device's temp storage
    pub path: PathBuf,

    /// Capture width in pixels
    pub width: u32,

    /// Capture height in pixels
    pub height: u32,

    /// Opaque platform metadata map (GPS fields live here)
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A capture after the processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedPhoto {
    /// Path to the resized JPEG on durable storage
    pub path: PathBuf,

    /// Width in pixels after processing
    pub width: u32,

    /// Height in pixels after processing
    pub height: u32,

    /// Capture location, if both coordinates parsed from the raw metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// A geographic position extracted from capture metadata.
///
/// Present only when both latitude and longitude parsed successfully; a
/// half-parsed coordinate pair is treated as absent, never as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,

    /// Longitude in decimal degrees
    pub longitude: f64,

    /// Altitude in meters, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    /// Horizontal accuracy in meters, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// A persisted full-image + thumbnail pair for one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The record identifier this entry is keyed by
    pub record_id: u64,

    /// Path to the full-size cached image
    pub full_image_path: PathBuf,

    /// Path to the cached thumbnail
    pub thumbnail_path: PathBuf,

    /// Size of the decoded payload written as the full image
    pub original_size_bytes: u64,

    /// Size of the re-encoded thumbnail
    pub compressed_size_bytes: u64,

    /// Creation time in milliseconds since the Unix epoch
    pub created_at_ms: u64,
}

/// Result of a cache path lookup.
///
/// Both fields absent means nothing is cached for the key; that is a normal
/// outcome, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedPaths {
    /// Path to the full-size cached image, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_image_path: Option<PathBuf>,

    /// Path to the cached thumbnail, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<PathBuf>,
}

impl CachedPaths {
    /// True when neither file is cached.
    pub fn is_empty(&self) -> bool {
        self.full_image_path.is_none() && self.thumbnail_path.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_photo_serde_skips_absent_location() {
        let photo = ProcessedPhoto {
            path: PathBuf::from("/tmp/img.jpg"),
            width: 1080,
            height: 810,
            location: None,
        };
        let json = serde_json::to_string(&photo).unwrap();
        assert!(!json.contains("location"));
    }

    #[test]
    fn test_location_serde_with_optionals() {
        let location = Location {
            latitude: 19.4326,
            longitude: -99.1332,
            altitude: Some(2240.0),
            accuracy: None,
        };
        let json = serde_json::to_string(&location).unwrap();
        assert!(json.contains("\"altitude\":2240.0"));
        assert!(!json.contains("accuracy"));

        let parsed: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, location);
    }

    #[test]
    fn test_cached_paths_is_empty() {
        assert!(CachedPaths::default().is_empty());

        let paths = CachedPaths {
            full_image_path: Some(PathBuf::from("/cache/img_7_1.jpg")),
            thumbnail_path: None,
        };
        assert!(!paths.is_empty());
    }
}
