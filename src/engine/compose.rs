//! Compose invocation
//!
//! Builds `<engine> compose -p <project> -f <file> up -d | down`, merges the
//! preset environment over the process environment, captures all output, and
//! writes a per-service launch log so failed builds can be diagnosed after
//! the fact.

use crate::engine::runtime::ContainerEngine;
use crate::error::{IoResultExt, LauncherError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Compose direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComposeAction {
    Up,
    Down,
}

/// One compose invocation
pub struct ComposeRequest<'a> {
    /// Absolute path to the compose file
    pub compose_file: &'a Path,
    /// Compose project name (service key)
    pub project: &'a str,
    /// Environment passed to the engine in addition to the inherited one
    pub env: &'a [(String, String)],
    /// Launch log destination, created (with parents) when set
    pub log_file: Option<&'a Path>,
}

/// Captured output of a finished compose command
#[derive(Debug)]
pub struct ComposeOutput {
    /// The rendered command line, for display and logs
    pub command: String,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Runs compose commands against one engine
pub struct ComposeRunner {
    engine: ContainerEngine,
}

impl ComposeRunner {
    /// Create a runner for the given engine
    pub fn new(engine: ContainerEngine) -> Self {
        Self { engine }
    }

    /// `compose up -d` for a service
    pub fn up(&self, request: &ComposeRequest<'_>) -> Result<ComposeOutput> {
        self.run(request, ComposeAction::Up)
    }

    /// `compose down` for a service
    pub fn down(&self, request: &ComposeRequest<'_>) -> Result<ComposeOutput> {
        self.run(request, ComposeAction::Down)
    }

    fn run(&self, request: &ComposeRequest<'_>, action: ComposeAction) -> Result<ComposeOutput> {
        let mut cmd = self.engine.command();
        cmd.arg("compose")
            .arg("-p")
            .arg(request.project)
            .arg("-f")
            .arg(request.compose_file);
        match action {
            ComposeAction::Up => {
                cmd.arg("up").arg("-d");
            }
            ComposeAction::Down => {
                cmd.arg("down");
            }
        }
        for (key, value) in request.env {
            cmd.env(key, value);
        }

        let rendered = render_command(&cmd);
        info!(command = %rendered, "running compose");

        let output = cmd
            .output()
            .with_path(PathBuf::from(self.engine.command_name()))?;

        let result = ComposeOutput {
            command: rendered.clone(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if let Some(log_file) = request.log_file {
            write_launch_log(log_file, &result, request.env, output.status.code())?;
            debug!(log = %log_file.display(), "launch log written");
        }

        if !output.status.success() {
            return Err(LauncherError::engine_failed(
                rendered,
                output.status,
                &output.stderr,
            ));
        }
        Ok(result)
    }
}

/// Render a Command as a display string
fn render_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

fn write_launch_log(
    path: &Path,
    output: &ComposeOutput,
    env: &[(String, String)],
    exit_code: Option<i32>,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }

    let mut log = String::new();
    log.push_str(&format!(
        "Timestamp: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    log.push_str(&format!("Command: {}\n", output.command));
    log.push_str("Environment:\n");
    for (key, value) in env {
        log.push_str(&format!("  {key}={value}\n"));
    }
    match exit_code {
        Some(code) => log.push_str(&format!("Return code: {code}\n\n")),
        None => log.push_str("Return code: terminated by signal\n\n"),
    }
    log.push_str(&format!("STDOUT:\n{}\n\nSTDERR:\n{}\n", output.stdout, output.stderr));

    fs::write(path, log).with_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_command() {
        let mut cmd = Command::new("docker");
        cmd.arg("compose")
            .arg("-p")
            .arg("ollama")
            .arg("-f")
            .arg("/tmp/ollama-compose.yaml")
            .arg("up")
            .arg("-d");
        assert_eq!(
            render_command(&cmd),
            "docker compose -p ollama -f /tmp/ollama-compose.yaml up -d"
        );
    }

    #[test]
    fn test_launch_log_contents() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs").join("ollama_build.log");
        let output = ComposeOutput {
            command: "podman compose -p ollama -f x.yaml up -d".to_string(),
            stdout: "created\n".to_string(),
            stderr: String::new(),
        };
        let env = vec![("SERVICE_NAME".to_string(), "ollama".to_string())];

        write_launch_log(&log_path, &output, &env, Some(0)).unwrap();

        let contents = fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("Command: podman compose -p ollama"));
        assert!(contents.contains("SERVICE_NAME=ollama"));
        assert!(contents.contains("Return code: 0"));
        assert!(contents.contains("STDOUT:\ncreated"));
    }
}
