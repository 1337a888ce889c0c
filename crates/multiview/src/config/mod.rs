//! # Configuration System
//!
//! Provides the [`Config`] trait for loading and saving serde configuration
//! types as TOML or RON, and [`ContextConfig`], the settings that drive the
//! window context's worker thread.
//!
//! ## Design Goals
//!
//! - **Serializable**: Support for multiple config file formats (TOML, RON)
//! - **Type Safe**: Strong typing with validation and defaults
//! - **Builder Friendly**: `with_*` setters for programmatic configuration

use std::time::Duration;

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Window Context Configuration
///
/// Settings for the worker thread that owns the windowing toolkit.
///
/// ## Defaults
/// - Frame interval: 30 ms between per-window timer ticks
/// - Idle sleep: 100 µs at the end of every loop iteration
/// - Initial window size: 640x480
/// - The worker quits once the last window is gone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Interval of the periodic per-window timer, in milliseconds
    pub frame_interval_ms: u64,
    /// Sleep at the end of each worker iteration, in microseconds
    pub idle_sleep_us: u64,
    /// Width of newly created windows in pixels
    pub default_width: u32,
    /// Height of newly created windows in pixels
    pub default_height: u32,
    /// Stop the worker once the last window is gone
    pub quit_when_last_window_closed: bool,
    /// Name given to the worker thread
    pub thread_name: String,
    /// Default log filter used by [`crate::foundation::logging::init_with_level`]
    pub log_level: String,
}

impl ContextConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            frame_interval_ms: 30,
            idle_sleep_us: 100,
            default_width: 640,
            default_height: 480,
            quit_when_last_window_closed: true,
            thread_name: "multiview-context".to_string(),
            log_level: "info".to_string(),
        }
    }

    /// Set the periodic timer interval
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the per-iteration idle sleep
    pub fn with_idle_sleep(mut self, sleep: Duration) -> Self {
        self.idle_sleep_us = u64::try_from(sleep.as_micros()).unwrap_or(u64::MAX);
        self
    }

    /// Set the initial window size
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.default_width = width;
        self.default_height = height;
        self
    }

    /// Choose whether closing the last window stops the worker
    pub fn with_quit_when_last_window_closed(mut self, enabled: bool) -> Self {
        self.quit_when_last_window_closed = enabled;
        self
    }

    /// Set the worker thread name
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Periodic timer interval as a [`Duration`]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Idle sleep as a [`Duration`]
    pub fn idle_sleep(&self) -> Duration {
        Duration::from_micros(self.idle_sleep_us)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("Frame interval must be at least 1 ms".to_string()));
        }

        if self.default_width == 0 || self.default_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Window size must be non-zero, got {}x{}",
                self.default_width, self.default_height
            )));
        }

        if self.thread_name.is_empty() {
            return Err(ConfigError::Invalid("Thread name cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for ContextConfig {}
