//! Engine configuration.
//!
//! Everything here is fixed at start-up: the grid size, the slot arena
//! capacity and the rate limits. Configs are usually built in code, but can be
//! loaded from TOML:
//!
//! ```toml
//! width = 32
//! height = 16
//! slot_capacity = 8
//! default_fps = 60
//! background = { r = 0, g = 0, b = 8 }
//! ```

use crate::color::Rgb;
use serde::Deserialize;

/// Largest slot arena the engine accepts.
pub const MAX_SLOTS: usize = 254;

/// Start-up configuration for an [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    pub slot_capacity: usize,
    /// Rate used until an activated slot asks for its own.
    pub default_fps: u16,
    pub max_fps: u16,
    /// Color painted by a hard cut.
    pub background: Rgb,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 32,
            slot_capacity: 30,
            default_fps: 30,
            max_fps: 1000,
            background: Rgb::BLACK,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("grid must be at least 1x1, got {width}x{height}")]
    ZeroDimension { width: usize, height: usize },
    #[error("grid of {width}x{height} pixels is too large")]
    TooManyPixels { width: usize, height: usize },
    #[error("slot capacity must be between 1 and 254, got {0}")]
    ZeroCapacity(usize),
    #[error("frame rates must be non-zero")]
    ZeroRate,
}

impl EngineConfig {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_slot_capacity(mut self, slots: usize) -> Self {
        self.slot_capacity = slots;
        self
    }

    pub fn with_default_fps(mut self, fps: u16) -> Self {
        self.default_fps = fps;
        self
    }

    pub fn with_background(mut self, color: Rgb) -> Self {
        self.background = color;
        self
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn pixel_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroDimension { width, height });
        }
        // Pixel indices are stored as u32 links with one value reserved.
        let fits = width
            .checked_mul(height)
            .and_then(|n| n.checked_add(MAX_SLOTS))
            .is_some_and(|n| n < u32::MAX as usize);
        if !fits {
            return Err(ConfigError::TooManyPixels { width, height });
        }
        if self.slot_capacity == 0 || self.slot_capacity > MAX_SLOTS {
            return Err(ConfigError::ZeroCapacity(self.slot_capacity));
        }
        if self.default_fps == 0 || self.max_fps == 0 {
            return Err(ConfigError::ZeroRate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_panel() {
        let c = EngineConfig::default();
        assert_eq!((c.width, c.height), (64, 32));
        assert_eq!(c.slot_capacity, 30);
        assert_eq!(c.pixel_count(), 2048);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn toml_fills_missing_keys() {
        let c = EngineConfig::from_toml_str(
            "width = 8\nheight = 4\ndefault_fps = 60\nbackground = { r = 1, g = 2, b = 3 }\n",
        )
        .unwrap();
        assert_eq!(c.pixel_count(), 32);
        assert_eq!(c.default_fps, 60);
        assert_eq!(c.slot_capacity, 30);
        assert_eq!(c.background, Rgb::new(1, 2, 3));
    }

    #[test]
    fn bad_configs_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("width = 0"),
            Err(ConfigError::ZeroDimension { width: 0, .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("slot_capacity = 255"),
            Err(ConfigError::ZeroCapacity(255))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("max_fps = 0"),
            Err(ConfigError::ZeroRate)
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("widht = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::new(usize::MAX, 2).validate(),
            Err(ConfigError::TooManyPixels { .. })
        ));
    }
}
