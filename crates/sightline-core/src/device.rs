//! Camera device abstraction and the file-backed development device.
//!
//! The pipeline only ever talks to [`CameraDevice`]; the mobile shells plug in
//! their platform camera here, and tests plug in mocks. [`FileCamera`] treats
//! an existing image file as a "capture" so the pipeline can be exercised
//! without hardware.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{CaptureError, CaptureResult};
use crate::types::RawPhoto;

/// Flash behavior for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    Off,
    On,
    Auto,
}

impl std::fmt::Display for FlashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlashMode::Off => write!(f, "off"),
            FlashMode::On => write!(f, "on"),
            FlashMode::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for FlashMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(FlashMode::Off),
            "on" => Ok(FlashMode::On),
            "auto" => Ok(FlashMode::Auto),
            other => Err(format!("unknown flash mode: {other}")),
        }
    }
}

/// Which camera on the device to drive.
///
/// Indices match the platform convention: back is 0, front is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    Back = 0,
    Front = 1,
}

/// Cycle the flash mode: off, on, auto, and back to off.
pub fn toggle_flash(current: FlashMode) -> FlashMode {
    match current {
        FlashMode::Off => FlashMode::On,
        FlashMode::On => FlashMode::Auto,
        FlashMode::Auto => FlashMode::Off,
    }
}

/// Toggle between the front and back camera.
pub fn flip_position(current: CameraPosition) -> CameraPosition {
    match current {
        CameraPosition::Back => CameraPosition::Front,
        CameraPosition::Front => CameraPosition::Back,
    }
}

/// Outcome of a camera permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Options passed to the device capture primitive.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Flash setting; `None` leaves the device default in place
    pub flash: Option<FlashMode>,

    /// Drive the front-facing camera
    pub use_front_facing: bool,

    /// Request location-enriched metadata if the device supports it
    pub with_location: bool,
}

/// A camera device the pipeline can drive.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Ask the platform for camera permission.
    async fn request_permission(&self) -> Permission;

    /// Whether the device is initialized and able to capture.
    fn is_ready(&self) -> bool;

    /// Take a photo. The result lands on the device's own temp storage.
    async fn capture(&self, options: &CaptureOptions) -> CaptureResult<RawPhoto>;
}

/// Metadata keys the platforms use for embedded GPS fields.
pub mod gps_keys {
    pub const LATITUDE: &str = "GPSLatitude";
    pub const LONGITUDE: &str = "GPSLongitude";
    pub const ALTITUDE: &str = "GPSAltitude";
    pub const H_POSITIONING_ERROR: &str = "GPSHPositioningError";
}

/// A device backed by an image file on disk.
///
/// "Capturing" reads the file's dimensions and lifts any EXIF GPS fields into
/// the raw metadata map, shaped the way a platform camera would report them.
pub struct FileCamera {
    source: PathBuf,
}

impl FileCamera {
    /// Create a file camera over an existing image file.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Lift EXIF GPS fields into the opaque metadata map.
    ///
    /// Lenient by design: a file without EXIF, or with partial GPS data,
    /// yields whatever fields were readable.
    fn extract_gps(path: &Path) -> Map<String, Value> {
        let mut metadata = Map::new();
        let Ok(file) = std::fs::File::open(path) else {
            return metadata;
        };
        let mut reader = std::io::BufReader::new(file);
        let Ok(exif) = exif::Reader::new().read_from_container(&mut reader) else {
            return metadata;
        };

        if let Some(lat) =
            Self::coord(&exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef)
        {
            metadata.insert(gps_keys::LATITUDE.to_string(), Value::from(lat));
        }
        if let Some(lon) =
            Self::coord(&exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef)
        {
            metadata.insert(gps_keys::LONGITUDE.to_string(), Value::from(lon));
        }
        if let Some(alt) = Self::rational(&exif, exif::Tag::GPSAltitude) {
            metadata.insert(gps_keys::ALTITUDE.to_string(), Value::from(alt));
        }
        if let Some(err) = Self::rational(&exif, exif::Tag::GPSHPositioningError) {
            metadata.insert(gps_keys::H_POSITIONING_ERROR.to_string(), Value::from(err));
        }
        metadata
    }

    /// Get a GPS coordinate, converting degrees/minutes/seconds to decimal.
    fn coord(exif: &exif::Exif, coord_tag: exif::Tag, ref_tag: exif::Tag) -> Option<f64> {
        let coord = exif.get_field(coord_tag, exif::In::PRIMARY)?;
        let reference = exif.get_field(ref_tag, exif::In::PRIMARY)?;

        let degrees = match &coord.value {
            exif::Value::Rational(rationals) if rationals.len() >= 3 => {
                rationals[0].to_f64() + rationals[1].to_f64() / 60.0
                    + rationals[2].to_f64() / 3600.0
            }
            _ => return None,
        };

        // S latitude and W longitude are negative
        let ref_str = reference.display_value().to_string();
        let sign = if ref_str.contains('S') || ref_str.contains('W') {
            -1.0
        } else {
            1.0
        };
        Some(sign * degrees)
    }

    /// Get a single rational field as f64.
    fn rational(exif: &exif::Exif, tag: exif::Tag) -> Option<f64> {
        exif.get_field(tag, exif::In::PRIMARY)
            .and_then(|f| match &f.value {
                exif::Value::Rational(v) => v.first().map(|r| r.to_f64()),
                _ => None,
            })
    }
}

#[async_trait]
impl CameraDevice for FileCamera {
    async fn request_permission(&self) -> Permission {
        // File access stands in for the platform permission prompt
        if self.source.exists() {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    fn is_ready(&self) -> bool {
        self.source.exists()
    }

    async fn capture(&self, options: &CaptureOptions) -> CaptureResult<RawPhoto> {
        tracing::debug!(
            "File capture from {:?} (front: {}, flash: {:?})",
            self.source,
            options.use_front_facing,
            options.flash
        );

        let source = self.source.clone();
        let with_location = options.with_location;
        let result = tokio::task::spawn_blocking(move || {
            let (width, height) =
                image::image_dimensions(&source).map_err(|e| CaptureError::Device {
                    message: format!("cannot read {:?}: {e}", source),
                })?;
            let metadata = if with_location {
                FileCamera::extract_gps(&source)
            } else {
                Map::new()
            };
            Ok(RawPhoto {
                path: source,
                width,
                height,
                metadata,
            })
        })
        .await
        .map_err(|e| CaptureError::Device {
            message: format!("capture task failed: {e}"),
        })?;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_cycles_off_on_auto_off() {
        assert_eq!(toggle_flash(FlashMode::Off), FlashMode::On);
        assert_eq!(toggle_flash(FlashMode::On), FlashMode::Auto);
        assert_eq!(toggle_flash(FlashMode::Auto), FlashMode::Off);
    }

    #[test]
    fn test_flip_toggles_position() {
        assert_eq!(flip_position(CameraPosition::Back), CameraPosition::Front);
        assert_eq!(flip_position(CameraPosition::Front), CameraPosition::Back);
    }

    #[test]
    fn test_flash_mode_from_str() {
        assert_eq!("auto".parse::<FlashMode>().unwrap(), FlashMode::Auto);
        assert_eq!("OFF".parse::<FlashMode>().unwrap(), FlashMode::Off);
        assert!("strobe".parse::<FlashMode>().is_err());
    }

    #[tokio::test]
    async fn test_file_camera_missing_file() {
        let camera = FileCamera::new("/nonexistent/shot.jpg");
        assert!(!camera.is_ready());
        assert_eq!(camera.request_permission().await, Permission::Denied);

        let options = CaptureOptions {
            flash: None,
            use_front_facing: false,
            with_location: true,
        };
        assert!(camera.capture(&options).await.is_err());
    }

    #[tokio::test]
    async fn test_file_camera_reads_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        image::DynamicImage::new_rgb8(64, 48).save(&path).unwrap();

        let camera = FileCamera::new(&path);
        assert!(camera.is_ready());

        let options = CaptureOptions {
            flash: Some(FlashMode::Auto),
            use_front_facing: true,
            with_location: true,
        };
        let raw = camera.capture(&options).await.unwrap();
        assert_eq!((raw.width, raw.height), (64, 48));
        // A synthetic PNG carries no GPS metadata
        assert!(raw.metadata.is_empty());
    }
}
