//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the moon-config.toml file.
//! It provides a centralized way to configure the lunar cycle constants, the drawing
//! canvas and animation timing.

use crate::animation::{PlaybackOptions, Viewport};
use crate::geometry::Point2;
use crate::lunar::{LunarCycle, PhaseError, LUNAR_PERIOD_DAYS};
use crate::renderer::MAX_CANVAS_SIDE;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "moon-config.toml";

/// Errors surfaced by [`Config::try_load_from_path`] and [`Config::validate`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Application configuration loaded from moon-config.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Cycle constants shared by geometry and classification
    pub lunar: LunarConfig,
    /// Canvas used for terminal rendering
    pub display: DisplayConfig,
    /// Tick timing and skip size
    pub animation: AnimationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LunarConfig {
    /// Days per full phase cycle
    pub period_days: f64,
    /// A date known to be a new moon
    pub reference_epoch: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Moon radius in canvas pixels
    pub radius: f64,
    /// Canvas width in pixels (each pixel prints as two characters)
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Delay between ticks
    pub frame_interval_ms: u64,
    /// Fastest allowed speed
    pub min_interval_ms: u64,
    /// Slowest allowed speed
    pub max_interval_ms: u64,
    /// Days moved by a bare skip command
    pub skip_days: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            lunar: LunarConfig::default(),
            display: DisplayConfig::default(),
            animation: AnimationConfig::default(),
        }
    }
}

impl Default for LunarConfig {
    fn default() -> Self {
        let cycle = LunarCycle::default();
        LunarConfig {
            period_days: LUNAR_PERIOD_DAYS,
            reference_epoch: cycle.epoch(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            radius: 12.0,
            width: 26,
            height: 26,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig {
            frame_interval_ms: 100,
            min_interval_ms: 20,
            max_interval_ms: 500,
            skip_days: 1.0,
        }
    }
}

impl Config {
    /// Load configuration from moon-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_path(path) {
            Ok(config) => {
                tracing::info!(
                    "Loaded configuration from {} (period {} days, epoch {})",
                    path.display(),
                    config.lunar.period_days,
                    config.lunar.reference_epoch
                );
                config
            }
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("{}; using default configuration", e);
                Self::default()
            }
        }
    }

    /// Load and validate, reporting every failure instead of falling back.
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        tracing::info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cycle()
            .map_err(|e: PhaseError| ConfigError::Invalid(e.to_string()))?;

        let display = &self.display;
        if !(display.radius.is_finite() && display.radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "display.radius must be positive, got {}",
                display.radius
            )));
        }
        if display.width == 0 || display.height == 0 {
            return Err(ConfigError::Invalid("display size must be non-zero".into()));
        }
        if display.width > MAX_CANVAS_SIDE || display.height > MAX_CANVAS_SIDE {
            return Err(ConfigError::Invalid(format!(
                "display size must be at most {MAX_CANVAS_SIDE}x{MAX_CANVAS_SIDE}, got {}x{}",
                display.width, display.height
            )));
        }

        let anim = &self.animation;
        if !(anim.min_interval_ms <= anim.frame_interval_ms
            && anim.frame_interval_ms <= anim.max_interval_ms)
        {
            return Err(ConfigError::Invalid(format!(
                "animation intervals must satisfy min <= frame <= max, got {} <= {} <= {}",
                anim.min_interval_ms, anim.frame_interval_ms, anim.max_interval_ms
            )));
        }
        if !anim.skip_days.is_finite() {
            return Err(ConfigError::Invalid("animation.skip_days must be finite".into()));
        }
        Ok(())
    }

    pub fn cycle(&self) -> Result<LunarCycle, PhaseError> {
        LunarCycle::new(self.lunar.period_days, self.lunar.reference_epoch)
    }

    /// Moon centered on the canvas.
    pub fn viewport(&self) -> Viewport {
        Viewport {
            radius: self.display.radius,
            center: Point2::new(
                self.display.width as f64 / 2.0,
                self.display.height as f64 / 2.0,
            ),
        }
    }

    pub fn playback(&self) -> PlaybackOptions {
        PlaybackOptions {
            frame_interval: Duration::from_millis(self.animation.frame_interval_ms),
            min_interval: Duration::from_millis(self.animation.min_interval_ms),
            max_interval: Duration::from_millis(self.animation.max_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.lunar.period_days, 29.5);
        assert_eq!(config.lunar.reference_epoch.to_string(), "2025-10-21");
        assert_eq!(config.animation.frame_interval_ms, 100);
        assert_eq!(config.animation.min_interval_ms, 20);
        assert_eq!(config.animation.max_interval_ms, 500);
        assert_eq!((config.display.width, config.display.height), (26, 26));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
[lunar]
period_days = 29.53

[animation]
frame_interval_ms = 40
"#,
        )
        .unwrap();
        assert_eq!(parsed.lunar.period_days, 29.53);
        assert_eq!(parsed.lunar.reference_epoch.to_string(), "2025-10-21");
        assert_eq!(parsed.animation.frame_interval_ms, 40);
        assert_eq!(parsed.animation.max_interval_ms, 500);
        assert_eq!(parsed.display, DisplayConfig::default());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.lunar.period_days = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.animation.frame_interval_ms = 5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.radius = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.width = 70_000;
        config.display.height = 70_000;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_viewport_is_centered() {
        let config = Config::default();
        let viewport = config.viewport();
        assert_eq!(viewport.center, Point2::new(13.0, 13.0));
        assert_eq!(viewport.radius, 12.0);
    }
}
