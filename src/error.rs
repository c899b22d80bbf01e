//! Error types for the launcher
//!
//! One error enum for the whole crate, carrying enough context to tell the
//! user which probe, file, or engine command went wrong.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Main error type for launcher operations
#[derive(Error, Debug)]
pub enum LauncherError {
    /// I/O error with path context
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Hardware probe failed (detection degrades, this is only fatal when
    /// the caller explicitly requires the probe result)
    #[error("Hardware detection failed: {0}")]
    Detection(String),

    /// Neither podman nor docker is installed
    #[error("No container engine found (looked for podman, then docker)")]
    EngineNotFound,

    /// An engine command exited non-zero
    #[error("'{command}' failed ({status}): {stderr}")]
    EngineFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The resolved compose file does not exist on disk
    #[error("No compose file for this platform, expected: {0}")]
    ComposeFileMissing(PathBuf),

    /// Service key not present in the catalog
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// Configuration error (bad file, bad CLI combination)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output from an external command could not be parsed
    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },
}

impl LauncherError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a detection error
    pub fn detection(message: impl Into<String>) -> Self {
        Self::Detection(message.into())
    }

    /// Create a parse error
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create an engine failure from a finished command
    pub fn engine_failed(command: impl Into<String>, status: ExitStatus, stderr: &[u8]) -> Self {
        Self::EngineFailed {
            command: command.into(),
            status,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    /// Errors that mean the host is missing a prerequisite rather than the
    /// launcher misbehaving
    pub fn is_environment_error(&self) -> bool {
        matches!(
            self,
            Self::EngineNotFound | Self::ComposeFileMissing(_) | Self::Detection(_)
        )
    }
}

/// Result type alias for launcher operations
pub type Result<T> = std::result::Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(err: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for LauncherError {
    fn from(err: serde_json::Error) -> Self {
        LauncherError::Parse {
            what: "engine JSON output".to_string(),
            message: err.to_string(),
        }
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| LauncherError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = LauncherError::io("/etc/nv_tegra_release", io_err);
        assert!(err.to_string().contains("/etc/nv_tegra_release"));
    }

    #[test]
    fn test_environment_errors() {
        assert!(LauncherError::EngineNotFound.is_environment_error());
        assert!(LauncherError::ComposeFileMissing(PathBuf::from(
            "compose/platforms/x86/ollama-compose.yaml"
        ))
        .is_environment_error());
        assert!(!LauncherError::config("bad").is_environment_error());
    }

    #[test]
    fn test_unknown_service_message() {
        let err = LauncherError::UnknownService("olama".to_string());
        assert_eq!(err.to_string(), "Unknown service: olama");
    }
}
