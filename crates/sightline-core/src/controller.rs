//! Capture controller: bridges user intent to the pipeline and cache.
//!
//! Exposes the request/cancel/state contract the presentation layer consumes.
//! Only one capture may be in flight; a second request is rejected, not
//! queued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::cancel::CancelToken;
use crate::config::CaptureConfig;
use crate::device::{
    flip_position, toggle_flash, CameraDevice, CameraPosition, FlashMode, Permission,
};
use crate::error::{CaptureError, CaptureResult};
use crate::pipeline::{CapturePipeline, PhotoTransform};
use crate::types::{CaptureRequest, ProcessedPhoto};

/// Controller state as consumed by the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct ControllerState {
    /// A capture is currently in flight
    pub capturing: bool,

    /// Flash setting the next capture will use
    pub flash_mode: FlashMode,

    /// Camera the next capture will drive
    pub camera_position: CameraPosition,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            capturing: false,
            flash_mode: FlashMode::Off,
            camera_position: CameraPosition::Back,
        }
    }
}

/// The capture currently holding the in-flight slot.
///
/// The id stamps which request owns the slot: a cancelled capture that
/// resolves late must not clear state that a newer capture now owns.
struct InFlightCapture {
    id: u64,
    token: CancelToken,
}

/// Orchestrates capture requests against the pipeline and tracks UI state.
pub struct CaptureController {
    device: Arc<dyn CameraDevice>,
    pipeline: CapturePipeline,
    state: Mutex<ControllerState>,
    current: Mutex<Option<InFlightCapture>>,
    capture_seq: AtomicU64,
}

/// Releases the in-flight slot when a capture resolves, is cancelled, or its
/// future is dropped. Only the capture that still owns the slot may release
/// it.
struct InFlightGuard<'a> {
    controller: &'a CaptureController,
    capture_id: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.controller.finish_capture(self.capture_id);
    }
}

impl CaptureController {
    /// Create a controller over a device, using the production resizer.
    pub fn new(device: Arc<dyn CameraDevice>, config: &CaptureConfig) -> Self {
        let pipeline = CapturePipeline::with_resizer(device.clone(), config);
        Self::with_pipeline(device, pipeline)
    }

    /// Create a controller over a device and an explicit transform seam.
    pub fn with_transform(
        device: Arc<dyn CameraDevice>,
        transform: Arc<dyn PhotoTransform>,
        config: &CaptureConfig,
    ) -> Self {
        let pipeline = CapturePipeline::new(device.clone(), transform, config);
        Self::with_pipeline(device, pipeline)
    }

    fn with_pipeline(device: Arc<dyn CameraDevice>, pipeline: CapturePipeline) -> Self {
        Self {
            device,
            pipeline,
            state: Mutex::new(ControllerState::default()),
            current: Mutex::new(None),
            capture_seq: AtomicU64::new(0),
        }
    }

    /// Current `{capturing, flash_mode, camera_position}` snapshot.
    pub fn state(&self) -> ControllerState {
        *self.state.lock().expect("controller state poisoned")
    }

    /// Start a capture and return the processed photo's display URI.
    pub async fn request_capture(&self) -> CaptureResult<String> {
        let photo = self.request_capture_photo().await?;
        Ok(format!("file://{}", photo.path.display()))
    }

    /// Start a capture and return the full processed photo.
    pub async fn request_capture_photo(&self) -> CaptureResult<ProcessedPhoto> {
        let (request, capture_id) = {
            let mut state = self.state.lock().expect("controller state poisoned");
            if state.capturing {
                return Err(CaptureError::DeviceBusy);
            }
            state.capturing = true;

            let capture_id = self.capture_seq.fetch_add(1, Ordering::Relaxed);
            let token = CancelToken::new();
            *self.current.lock().expect("controller token poisoned") = Some(InFlightCapture {
                id: capture_id,
                token: token.clone(),
            });

            let request = CaptureRequest {
                use_front_facing: state.camera_position == CameraPosition::Front,
                flash_mode: state.flash_mode,
                token,
            };
            (request, capture_id)
        };

        let _guard = InFlightGuard {
            controller: self,
            capture_id,
        };

        // A denied permission is a device the user cannot drive
        if self.device.request_permission().await == Permission::Denied {
            tracing::warn!("Camera permission denied");
            return Err(CaptureError::DeviceUnavailable);
        }

        self.pipeline.capture(&request).await
    }

    /// Cancel the in-flight capture, if any.
    ///
    /// State returns to idle immediately even if the pipeline stage has not
    /// yet observed the signal.
    pub fn cancel(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(in_flight) = current.take() {
                tracing::debug!("Capture cancelled by caller");
                in_flight.token.cancel();
            }
        }
        if let Ok(mut state) = self.state.lock() {
            state.capturing = false;
        }
    }

    /// Cycle the flash mode, returning the new value.
    pub fn toggle_flash(&self) -> FlashMode {
        let mut state = self.state.lock().expect("controller state poisoned");
        state.flash_mode = toggle_flash(state.flash_mode);
        state.flash_mode
    }

    /// Flip between front and back camera, returning the new position.
    pub fn flip(&self) -> CameraPosition {
        let mut state = self.state.lock().expect("controller state poisoned");
        state.camera_position = flip_position(state.camera_position);
        state.camera_position
    }

    /// Release the in-flight slot, but only if `capture_id` still owns it.
    /// A stale completion (cancelled earlier, resolved later) is a no-op.
    fn finish_capture(&self, capture_id: u64) {
        let released = match self.current.lock() {
            Ok(mut current) => {
                if current.as_ref().map_or(false, |c| c.id == capture_id) {
                    *current = None;
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        };
        if released {
            if let Ok(mut state) = self.state.lock() {
                state.capturing = false;
            }
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        // No dangling pipeline completion may mutate state after the
        // controller is gone
        if let Ok(mut current) = self.current.lock() {
            if let Some(in_flight) = current.take() {
                in_flight.token.cancel();
            }
        }
        if let Ok(mut state) = self.state.lock() {
            state.capturing = false;
        }
    }
}
