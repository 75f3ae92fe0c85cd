//! Error types for the Sightline capture-and-cache pipeline.
//!
//! Errors are organized by subsystem. Capture errors carry the control-flow
//! distinctions the controller cares about (busy, cancelled, device gone);
//! cache errors carry the path context a caller needs to report a failed save.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Sightline operations.
#[derive(Error, Debug)]
pub enum SightlineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Capture pipeline errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Image cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Capture pipeline errors.
///
/// `Cancelled` is control flow, not a user-facing failure: the presentation
/// layer treats it as "the user changed their mind" and shows nothing.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The camera device is not initialized or permission was denied
    #[error("Camera device unavailable")]
    DeviceUnavailable,

    /// A capture is already in progress; the new request is rejected, not queued
    #[error("Capture already in progress")]
    DeviceBusy,

    /// The capture was cancelled (user intent or device timeout)
    #[error("Capture cancelled")]
    Cancelled,

    /// The device itself failed to produce a photo
    #[error("Device capture failed: {message}")]
    Device { message: String },
}

/// Errors from the resize/transform stage.
///
/// These never escape `capture()`: the pipeline absorbs them and falls back
/// to the unprocessed photo.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image re-encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Writing the resized output failed
    #[error("Write error for {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// Resize did not finish within the configured deadline
    #[error("Resize timed out for {path} after {timeout_ms}ms")]
    Timeout { path: PathBuf, timeout_ms: u64 },
}

/// Image cache errors.
///
/// Only `save` failures surface to callers; eviction and clear absorb their
/// per-file failures internally. Cloneable so a single in-flight save can
/// hand its outcome to every deduplicated caller.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// A cache file could not be written
    #[error("Cache write failed for {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },

    /// The provided payload is not a decodable image
    #[error("Invalid image payload: {message}")]
    InvalidImage { message: String },

    /// I/O error while scanning or preparing cache directories
    #[error("Cache IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        CacheError::Io(e.to_string())
    }
}

/// Convenience type alias for Sightline results.
pub type Result<T> = std::result::Result<T, SightlineError>;

/// Convenience type alias for capture-specific results.
pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Convenience type alias for cache-specific results.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
