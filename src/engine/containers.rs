//! Container listing and lifecycle operations
//!
//! Both engines report `ps` as JSON, but not the same JSON: podman emits one
//! array with `Names` as a list, docker emits one object per line with
//! `Names` as a string. Parsing is kept in pure functions so both shapes are
//! covered by tests.

use crate::engine::runtime::ContainerEngine;
use crate::error::{IoResultExt, LauncherError, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// One container as reported by the engine
#[derive(Debug, Clone, Serialize)]
pub struct ContainerInfo {
    /// Full container ID
    pub id: String,
    /// Primary name
    pub name: String,
    /// Engine-reported state (running, exited, ...)
    pub state: String,
    /// Image reference
    pub image: String,
    /// Which engine reported it
    pub engine: ContainerEngine,
}

impl ContainerInfo {
    /// True when the engine reports the container as running
    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }

    /// Shortened ID for display
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(12)]
    }
}

/// List all containers (including stopped ones)
pub fn list_containers(engine: ContainerEngine) -> Result<Vec<ContainerInfo>> {
    let format = match engine {
        ContainerEngine::Podman => "json",
        ContainerEngine::Docker => "{{json .}}",
    };
    let output = engine
        .command()
        .args(["ps", "-a", "--format", format])
        .output()
        .with_path(PathBuf::from(engine.command_name()))?;
    if !output.status.success() {
        return Err(LauncherError::engine_failed(
            format!("{} ps -a", engine.command_name()),
            output.status,
            &output.stderr,
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    match engine {
        ContainerEngine::Podman => parse_podman_ps(&stdout),
        ContainerEngine::Docker => parse_docker_ps(&stdout),
    }
}

/// Parse `podman ps -a --format json`: a single JSON array, `Names` a list
pub fn parse_podman_ps(stdout: &str) -> Result<Vec<ContainerInfo>> {
    let values: Vec<Value> = serde_json::from_str(stdout.trim())?;
    Ok(values
        .iter()
        .map(|v| ContainerInfo {
            id: str_field(v, "Id"),
            name: v
                .get("Names")
                .and_then(|n| n.get(0))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            state: str_field(v, "State"),
            image: str_field(v, "Image"),
            engine: ContainerEngine::Podman,
        })
        .collect())
}

/// Parse `docker ps -a --format '{{json .}}'`: one JSON object per line,
/// `Names` a plain string, `ID` uppercase
pub fn parse_docker_ps(stdout: &str) -> Result<Vec<ContainerInfo>> {
    let mut containers = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Skip unparseable lines rather than failing the whole listing
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        containers.push(ContainerInfo {
            id: str_field(&value, "ID"),
            name: str_field(&value, "Names"),
            state: str_field(&value, "State"),
            image: str_field(&value, "Image"),
            engine: ContainerEngine::Docker,
        });
    }
    Ok(containers)
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Lifecycle operations on individual containers
pub struct ContainerOps {
    engine: ContainerEngine,
}

impl ContainerOps {
    /// Create ops bound to one engine
    pub fn new(engine: ContainerEngine) -> Self {
        Self { engine }
    }

    /// Start a stopped container
    pub fn start(&self, id: &str) -> Result<()> {
        self.simple_command("start", id)
    }

    /// Stop a running container
    pub fn stop(&self, id: &str) -> Result<()> {
        self.simple_command("stop", id)
    }

    /// Restart a container
    pub fn restart(&self, id: &str) -> Result<()> {
        self.simple_command("restart", id)
    }

    /// Fetch the last `tail` log lines of a container
    pub fn logs(&self, id: &str, tail: usize) -> Result<String> {
        let output = self
            .engine
            .command()
            .args(["logs", "--tail", &tail.to_string(), id])
            .output()
            .with_path(PathBuf::from(self.engine.command_name()))?;
        if !output.status.success() {
            return Err(LauncherError::engine_failed(
                format!("{} logs {id}", self.engine.command_name()),
                output.status,
                &output.stderr,
            ));
        }
        // Engines split container output across both streams
        let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
        logs.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(logs)
    }

    fn simple_command(&self, verb: &str, id: &str) -> Result<()> {
        let output = self
            .engine
            .command()
            .args([verb, id])
            .output()
            .with_path(PathBuf::from(self.engine.command_name()))?;
        if !output.status.success() {
            return Err(LauncherError::engine_failed(
                format!("{} {verb} {id}", self.engine.command_name()),
                output.status,
                &output.stderr,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_podman_ps() {
        let json = r#"[
            {"Id": "abc123def456789", "Names": ["ollama"], "State": "running", "Image": "docker.io/ollama/ollama:latest"},
            {"Id": "0123456789abcdef", "Names": ["comfyui"], "State": "exited", "Image": "comfyui:local"}
        ]"#;
        let containers = parse_podman_ps(json).unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].name, "ollama");
        assert_eq!(containers[0].short_id(), "abc123def456");
        assert!(containers[0].is_running());
        assert!(!containers[1].is_running());
        assert_eq!(containers[1].engine, ContainerEngine::Podman);
    }

    #[test]
    fn test_parse_podman_empty_list() {
        assert!(parse_podman_ps("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_docker_ps() {
        let out = concat!(
            r#"{"ID": "abc123", "Names": "ollama", "State": "running", "Image": "ollama/ollama"}"#,
            "\n",
            r#"{"ID": "def456", "Names": "n8n", "State": "exited", "Image": "n8nio/n8n"}"#,
            "\n"
        );
        let containers = parse_docker_ps(out).unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].name, "ollama");
        assert_eq!(containers[1].state, "exited");
        assert_eq!(containers[0].engine, ContainerEngine::Docker);
    }

    #[test]
    fn test_parse_docker_ps_skips_garbage_lines() {
        let out = "not json\n{\"ID\": \"abc\", \"Names\": \"x\", \"State\": \"running\", \"Image\": \"i\"}\n";
        let containers = parse_docker_ps(out).unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].id, "abc");
    }

    #[test]
    fn test_short_id_handles_short_ids() {
        let c = ContainerInfo {
            id: "abc".to_string(),
            name: String::new(),
            state: String::new(),
            image: String::new(),
            engine: ContainerEngine::Docker,
        };
        assert_eq!(c.short_id(), "abc");
    }
}
