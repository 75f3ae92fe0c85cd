//! Sub-configuration structs with pipeline defaults.

use serde::{Deserialize, Serialize};

/// Capture pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Target width for the processed photo in pixels.
    /// Height scales proportionally; images are never cropped.
    pub target_width: u32,

    /// JPEG quality for the processed photo (1-100)
    pub jpeg_quality: u8,

    /// Deadline for a single device capture invocation.
    /// Guards against a device call that never resolves; a timeout is
    /// treated as a cancellation, not a distinct error.
    pub capture_timeout_ms: u64,

    /// Deadline for the resize stage
    pub resize_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_width: 1080,
            jpeg_quality: 80,
            capture_timeout_ms: 30_000,
            resize_timeout_ms: 10_000,
        }
    }
}

/// Image cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory. `None` means the platform cache directory.
    pub root: Option<String>,

    /// Maximum total size of cached files across both directories
    pub max_total_bytes: u64,

    /// Eviction starts once total size exceeds this fraction of the maximum
    pub eviction_trigger_ratio: f64,

    /// Eviction deletes oldest files until total size falls below this
    /// fraction of the maximum
    pub eviction_target_ratio: f64,

    /// Thumbnail size in pixels (longest edge)
    pub thumbnail_size: u32,

    /// JPEG quality for thumbnails (1-100)
    pub thumbnail_quality: u8,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_total_bytes: 100 * 1024 * 1024,
            eviction_trigger_ratio: 0.8,
            eviction_target_ratio: 0.6,
            thumbnail_size: 320,
            thumbnail_quality: 80,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
