//! The capture pipeline: device capture, resize, location extraction.
//!
//! Turns a [`CaptureRequest`] into a [`ProcessedPhoto`], checking the
//! cancellation token at every suspension point. A processing failure after a
//! successful device capture degrades the result instead of losing the photo.

pub mod geotag;
pub mod resize;

pub use resize::{JpegResizer, PhotoTransform, ResizedPhoto};

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::CaptureConfig;
use crate::device::{CameraDevice, CaptureOptions};
use crate::error::{CaptureError, CaptureResult};
use crate::types::{CaptureRequest, ProcessedPhoto};

/// Progress callback. Invoked with `100` exactly once when a capture
/// completes; after that the pipeline touches no file or device state for
/// the request.
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Drives the camera device and processing stages for one capture at a time.
pub struct CapturePipeline {
    device: Arc<dyn CameraDevice>,
    transform: Arc<dyn PhotoTransform>,
    capture_timeout_ms: u64,
}

impl CapturePipeline {
    /// Create a pipeline over a device and transform seam.
    pub fn new(
        device: Arc<dyn CameraDevice>,
        transform: Arc<dyn PhotoTransform>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            device,
            transform,
            capture_timeout_ms: config.capture_timeout_ms,
        }
    }

    /// Create a pipeline with the production JPEG resizer.
    pub fn with_resizer(device: Arc<dyn CameraDevice>, config: &CaptureConfig) -> Self {
        Self::new(device, Arc::new(JpegResizer::new(config)), config)
    }

    /// Run one capture to completion.
    pub async fn capture(&self, request: &CaptureRequest) -> CaptureResult<ProcessedPhoto> {
        self.capture_with_progress(request, None).await
    }

    /// Run one capture, reporting completion through `on_progress`.
    pub async fn capture_with_progress(
        &self,
        request: &CaptureRequest,
        on_progress: Option<&ProgressFn>,
    ) -> CaptureResult<ProcessedPhoto> {
        if !self.device.is_ready() {
            return Err(CaptureError::DeviceUnavailable);
        }

        // A request cancelled before we start never touches the device
        request.token.checkpoint()?;

        let options = CaptureOptions {
            // Flash is only forced when the front camera is requested; the
            // back camera keeps the device default
            flash: request.use_front_facing.then_some(request.flash_mode),
            use_front_facing: request.use_front_facing,
            with_location: true,
        };

        tracing::debug!(
            "Capturing (front: {}, flash: {})",
            request.use_front_facing,
            request.flash_mode
        );

        // Race the device against a fixed deadline; a device invocation that
        // never resolves is indistinguishable from a cancel for control flow
        let deadline = Duration::from_millis(self.capture_timeout_ms);
        let raw = match timeout(deadline, self.device.capture(&options)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    "Device capture timed out after {}ms",
                    self.capture_timeout_ms
                );
                return Err(CaptureError::Cancelled);
            }
        };

        // A cancel requested while the device was working still aborts
        // before any processing begins
        request.token.checkpoint()?;

        let photo = match self.transform.resize(&raw).await {
            Ok(resized) => {
                request.token.checkpoint()?;
                let location = geotag::parse(&raw.metadata);
                request.token.checkpoint()?;
                ProcessedPhoto {
                    path: resized.path,
                    width: resized.width,
                    height: resized.height,
                    location,
                }
            }
            Err(e) => {
                // Best-effort fallback: a broken processing step must not
                // lose a photo the device already took
                tracing::warn!("Processing degraded, keeping raw capture: {e}");
                request.token.checkpoint()?;
                ProcessedPhoto {
                    path: raw.path,
                    width: raw.width,
                    height: raw.height,
                    location: None,
                }
            }
        };

        if let Some(progress) = on_progress {
            progress(100);
        }

        tracing::debug!(
            "Capture complete: {:?} ({}x{}, location: {})",
            photo.path,
            photo.width,
            photo.height,
            photo.location.is_some()
        );
        Ok(photo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::device::{FlashMode, Permission};
    use crate::error::TransformError;
    use crate::types::RawPhoto;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted device for exercising the pipeline without hardware.
    struct MockDevice {
        ready: bool,
        metadata: Map<String, Value>,
        captures: AtomicUsize,
        /// Signalled during `capture`, simulating a user cancel while the
        /// shutter is busy
        cancel_during_capture: Option<CancelToken>,
        hang: bool,
    }

    impl MockDevice {
        fn ready() -> Self {
            Self {
                ready: true,
                metadata: Map::new(),
                captures: AtomicUsize::new(0),
                cancel_during_capture: None,
                hang: false,
            }
        }
    }

    #[async_trait]
    impl CameraDevice for MockDevice {
        async fn request_permission(&self) -> Permission {
            Permission::Granted
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn capture(&self, _options: &CaptureOptions) -> CaptureResult<RawPhoto> {
            self.captures.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            if let Some(token) = &self.cancel_during_capture {
                token.cancel();
            }
            Ok(RawPhoto {
                path: PathBuf::from("/dev-temp/raw.jpg"),
                width: 4000,
                height: 3000,
                metadata: self.metadata.clone(),
            })
        }
    }

    /// Transform that records invocations and either succeeds or fails.
    struct MockTransform {
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockTransform {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PhotoTransform for MockTransform {
        async fn resize(&self, photo: &RawPhoto) -> Result<ResizedPhoto, TransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TransformError::Decode {
                    path: photo.path.clone(),
                    message: "corrupt".into(),
                });
            }
            Ok(ResizedPhoto {
                path: PathBuf::from("/dev-temp/raw_resized.jpg"),
                width: 1080,
                height: 810,
            })
        }
    }

    fn request() -> CaptureRequest {
        CaptureRequest {
            use_front_facing: false,
            flash_mode: FlashMode::Off,
            token: CancelToken::new(),
        }
    }

    fn pipeline(
        device: Arc<MockDevice>,
        transform: Arc<MockTransform>,
    ) -> CapturePipeline {
        CapturePipeline::new(device, transform, &CaptureConfig::default())
    }

    #[tokio::test]
    async fn test_successful_capture_extracts_location() {
        let mut device = MockDevice::ready();
        device.metadata.insert("GPSLatitude".into(), json!("19.4326"));
        device.metadata.insert("GPSLongitude".into(), json!(-99.1332));

        let result = pipeline(Arc::new(device), Arc::new(MockTransform::ok()))
            .capture(&request())
            .await
            .unwrap();

        assert_eq!(result.width, 1080);
        let location = result.location.unwrap();
        assert_eq!(location.latitude, 19.4326);
        assert_eq!(location.longitude, -99.1332);
    }

    #[tokio::test]
    async fn test_device_not_ready() {
        let mut device = MockDevice::ready();
        device.ready = false;

        let result = pipeline(Arc::new(device), Arc::new(MockTransform::ok()))
            .capture(&request())
            .await;
        assert!(matches!(result, Err(CaptureError::DeviceUnavailable)));
    }

    #[tokio::test]
    async fn test_cancel_before_capture_skips_device() {
        let device = Arc::new(MockDevice::ready());
        let transform = Arc::new(MockTransform::ok());
        let req = request();
        req.token.cancel();

        let result = pipeline(device.clone(), transform.clone())
            .capture(&req)
            .await;
        assert!(matches!(result, Err(CaptureError::Cancelled)));
        assert_eq!(device.captures.load(Ordering::SeqCst), 0);
        assert_eq!(transform.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_capture_skips_processing() {
        let req = request();
        let mut device = MockDevice::ready();
        device.cancel_during_capture = Some(req.token.clone());
        let device = Arc::new(device);
        let transform = Arc::new(MockTransform::ok());

        let result = pipeline(device.clone(), transform.clone())
            .capture(&req)
            .await;
        assert!(matches!(result, Err(CaptureError::Cancelled)));
        assert_eq!(device.captures.load(Ordering::SeqCst), 1);
        // The device already fired, but processing never starts
        assert_eq!(transform.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_transform_keeps_raw_photo() {
        let result = pipeline(
            Arc::new(MockDevice::ready()),
            Arc::new(MockTransform::failing()),
        )
        .capture(&request())
        .await
        .unwrap();

        assert_eq!(result.path, PathBuf::from("/dev-temp/raw.jpg"));
        assert_eq!((result.width, result.height), (4000, 3000));
        assert!(result.location.is_none());
    }

    #[tokio::test]
    async fn test_hung_device_times_out_as_cancelled() {
        let mut device = MockDevice::ready();
        device.hang = true;

        let config = CaptureConfig {
            capture_timeout_ms: 50,
            ..CaptureConfig::default()
        };
        let pipeline =
            CapturePipeline::new(Arc::new(device), Arc::new(MockTransform::ok()), &config);
        let result = pipeline.capture(&request()).await;
        assert!(matches!(result, Err(CaptureError::Cancelled)));
    }

    #[tokio::test]
    async fn test_progress_reported_once_with_100() {
        let reports = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = reports.clone();
        let on_progress = move |value: u8| sink.lock().unwrap().push(value);

        pipeline(Arc::new(MockDevice::ready()), Arc::new(MockTransform::ok()))
            .capture_with_progress(&request(), Some(&on_progress))
            .await
            .unwrap();

        assert_eq!(*reports.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn test_no_progress_on_cancellation() {
        let reports = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = reports.clone();
        let on_progress = move |value: u8| sink.lock().unwrap().push(value);

        let req = request();
        req.token.cancel();
        let result = pipeline(Arc::new(MockDevice::ready()), Arc::new(MockTransform::ok()))
            .capture_with_progress(&req, Some(&on_progress))
            .await;

        assert!(result.is_err());
        assert!(reports.lock().unwrap().is_empty());
    }
}
