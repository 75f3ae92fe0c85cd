//! Sightline Core - capture-and-cache pipeline for field photo submissions.
//!
//! Sightline drives a camera device to produce a photo, processes it (resize,
//! geolocation extraction) under cooperative cancellation, and persists the
//! result to a bounded local image cache with single-flight deduplication.
//!
//! # Architecture
//!
//! ```text
//! CaptureController → CapturePipeline → (CameraDevice, PhotoTransform)
//!                   ↘ ImageCacheStore → durable storage
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sightline_core::{CaptureController, Config, FileCamera, ImageCacheStore};
//!
//! #[tokio::main]
//! async fn main() -> sightline_core::Result<()> {
//!     let config = Config::load()?;
//!     let cache = ImageCacheStore::new(config.cache_root(), config.cache.clone());
//!     let controller = CaptureController::new(
//!         Arc::new(FileCamera::new("./shot.jpg")),
//!         &config.capture,
//!     );
//!
//!     let uri = controller.request_capture().await?;
//!     println!("Captured: {uri}");
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod cache;
pub mod cancel;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use cache::ImageCacheStore;
pub use cancel::CancelToken;
pub use config::Config;
pub use controller::{CaptureController, ControllerState};
pub use device::{
    flip_position, toggle_flash, CameraDevice, CameraPosition, CaptureOptions, FileCamera,
    FlashMode, Permission,
};
pub use error::{
    CacheError, CacheResult, CaptureError, CaptureResult, ConfigError, Result, SightlineError,
    TransformError,
};
pub use pipeline::{CapturePipeline, JpegResizer, PhotoTransform};
pub use types::{CacheEntry, CachedPaths, CaptureRequest, Location, ProcessedPhoto, RawPhoto};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
