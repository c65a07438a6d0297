#![forbid(unsafe_code)]

//! Bridge configuration.
//!
//! Loadable from TOML or JSON. Every field has a default, so an empty
//! document yields the stock overlay:
//!
//! ```toml
//! resource = "sd-policeradar"
//! banner_ms = 3000
//! default_threshold = 80
//! http_queue_capacity = 64
//!
//! [viewport]
//! width = 1920
//! height = 1080
//! ```

use std::path::Path;
use std::time::Duration;

use radar_core::lock::SpeedLockThreshold;
use radar_core::{StoreOptions, Viewport};
use serde::{Deserialize, Serialize};

/// Top-level bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host resource name; outbound calls go to `https://{resource}/{endpoint}`.
    pub resource: String,
    /// How long a native banner stays up, in milliseconds.
    pub banner_ms: u64,
    /// Speed-lock threshold applied at start and on reset.
    pub default_threshold: u32,
    pub viewport: ViewportConfig,
    /// Pending-call capacity of the HTTP worker queue.
    pub http_queue_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            resource: "sd-policeradar".into(),
            banner_ms: 3000,
            default_threshold: SpeedLockThreshold::DEFAULT,
            viewport: ViewportConfig::default(),
            http_queue_capacity: 64,
        }
    }
}

/// Initial overlay viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: i32,
    pub height: i32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let viewport = Viewport::default();
        Self {
            width: viewport.width,
            height: viewport.height,
        }
    }
}

impl BridgeConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load by extension: `.json` is JSON, anything else is TOML. The result
    /// is validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_file(path)?
        } else {
            Self::from_toml_file(path)?
        };
        config.validated()
    }

    /// All validation problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.resource.trim().is_empty() {
            errors.push("resource must not be empty".into());
        } else if self.resource.contains(['/', ' ']) {
            errors.push(format!(
                "resource must be a bare name, got {:?}",
                self.resource
            ));
        }
        if self.banner_ms == 0 {
            errors.push("banner_ms must be > 0".into());
        }
        if SpeedLockThreshold::validate(i64::from(self.default_threshold)).is_err() {
            errors.push(format!(
                "default_threshold must be in [{}, {}], got {}",
                SpeedLockThreshold::MIN,
                SpeedLockThreshold::MAX,
                self.default_threshold
            ));
        }
        if self.viewport.width <= 0 || self.viewport.height <= 0 {
            errors.push(format!(
                "viewport must be positive, got {}x{}",
                self.viewport.width, self.viewport.height
            ));
        }
        if self.http_queue_capacity == 0 {
            errors.push("http_queue_capacity must be > 0".into());
        }

        errors
    }

    /// `self` if valid, otherwise [`ConfigError::Validation`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    #[must_use]
    pub const fn banner_duration(&self) -> Duration {
        Duration::from_millis(self.banner_ms)
    }

    #[must_use]
    pub const fn store_options(&self) -> StoreOptions {
        StoreOptions {
            viewport: Viewport::new(self.viewport.width, self.viewport.height),
            default_threshold: self.default_threshold,
        }
    }
}

/// Errors that can occur when loading a bridge configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
