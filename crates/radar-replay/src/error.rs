use std::path::PathBuf;

use radar_bridge::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReplayError>;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("script not found: {path}")]
    MissingScript { path: PathBuf },

    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },
}

impl ReplayError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 3,
            Self::Script { .. } => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn script(line: usize, message: impl Into<String>) -> Self {
        Self::Script {
            line,
            message: message.into(),
        }
    }
}
