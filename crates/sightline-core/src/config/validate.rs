//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.target_width == 0 {
            return Err(ConfigError::ValidationError(
                "capture.target_width must be > 0".into(),
            ));
        }
        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err(ConfigError::ValidationError(
                "capture.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.capture.capture_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "capture.capture_timeout_ms must be > 0".into(),
            ));
        }
        if self.capture.resize_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "capture.resize_timeout_ms must be > 0".into(),
            ));
        }
        if self.cache.max_total_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "cache.max_total_bytes must be > 0".into(),
            ));
        }
        if self.cache.eviction_trigger_ratio <= 0.0 || self.cache.eviction_trigger_ratio > 1.0 {
            return Err(ConfigError::ValidationError(
                "cache.eviction_trigger_ratio must be in (0.0, 1.0]".into(),
            ));
        }
        if self.cache.eviction_target_ratio <= 0.0
            || self.cache.eviction_target_ratio >= self.cache.eviction_trigger_ratio
        {
            return Err(ConfigError::ValidationError(
                "cache.eviction_target_ratio must be > 0.0 and below the trigger ratio".into(),
            ));
        }
        if self.cache.thumbnail_size == 0 {
            return Err(ConfigError::ValidationError(
                "cache.thumbnail_size must be > 0".into(),
            ));
        }
        if self.cache.thumbnail_quality == 0 || self.cache.thumbnail_quality > 100 {
            return Err(ConfigError::ValidationError(
                "cache.thumbnail_quality must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_target_width() {
        let mut config = Config::default();
        config.capture.target_width = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target_width"));
    }

    #[test]
    fn test_validate_rejects_bad_jpeg_quality() {
        let mut config = Config::default();
        config.capture.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.capture.jpeg_quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jpeg_quality"));
    }

    #[test]
    fn test_validate_rejects_inverted_eviction_ratios() {
        let mut config = Config::default();
        config.cache.eviction_target_ratio = 0.9; // above the 0.8 trigger
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("eviction_target_ratio"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.capture.capture_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("capture_timeout_ms"));
    }
}
