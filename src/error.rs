//! Error types for configuration loading and the serial transport.
//!
//! The animation core itself has no error paths: malformed input degrades
//! to empty output instead.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("no serial port configured or detected")]
    NoPort,

    #[error("failed connecting to {port}: {reason}")]
    Open { port: String, reason: String },

    #[error("not connected")]
    NotConnected,

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}
