//! Container engine detection
//!
//! Podman is preferred over Docker when both are installed.

use crate::error::{LauncherError, Result};
use serde::Serialize;
use std::process::Command;
use tracing::debug;

/// Supported container engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerEngine {
    /// Podman with the compose plugin
    Podman,
    /// Docker with the compose plugin
    Docker,
}

impl ContainerEngine {
    /// Executable name
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Podman => "podman",
            Self::Docker => "docker",
        }
    }

    /// Detect an installed engine, podman first
    pub fn detect() -> Result<Self> {
        for engine in [Self::Podman, Self::Docker] {
            if engine.probe().is_some() {
                debug!(engine = engine.command_name(), "container engine detected");
                return Ok(engine);
            }
        }
        Err(LauncherError::EngineNotFound)
    }

    /// Use this specific engine, failing when it is not installed
    pub fn require(self) -> Result<Self> {
        match self.probe() {
            Some(_) => Ok(self),
            None => Err(LauncherError::EngineNotFound),
        }
    }

    /// Version string when this engine is installed and responding
    fn probe(&self) -> Option<String> {
        let output = Command::new(self.command_name())
            .arg("--version")
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Base command for this engine, ready for subcommand arguments
    pub fn command(&self) -> Command {
        Command::new(self.command_name())
    }
}

impl std::fmt::Display for ContainerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command_name())
    }
}

/// Engine with its reported version
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    /// Which engine
    pub engine: ContainerEngine,
    /// Output of `<engine> --version`
    pub version: String,
}

impl EngineInfo {
    /// Detect the installed engine and capture its version
    pub fn detect() -> Result<Self> {
        let engine = ContainerEngine::detect()?;
        let version = engine
            .probe()
            .ok_or_else(|| LauncherError::detection("engine stopped responding to --version"))?;
        Ok(EngineInfo { engine, version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(ContainerEngine::Podman.command_name(), "podman");
        assert_eq!(ContainerEngine::Docker.command_name(), "docker");
        assert_eq!(ContainerEngine::Podman.to_string(), "podman");
    }
}
