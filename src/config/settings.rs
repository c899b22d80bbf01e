//! Configuration settings
//!
//! Defines CLI arguments, the optional config file format, and the merged
//! runtime configuration. Precedence is CLI over config file over built-in
//! defaults.

use crate::error::{IoResultExt, LauncherError, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default directory name for service data under the home directory
pub const DEFAULT_DATA_DIR_NAME: &str = "Singularity";

/// Config file name searched in the compose directory
pub const CONFIG_FILE_NAME: &str = "launcher.toml";

/// Singularity Launcher - hardware-aware AI container deployment
#[derive(Parser, Debug, Clone)]
#[command(name = "singularity")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Detect host hardware and launch AI service containers")]
#[command(long_about = r#"
Singularity Launcher detects the host platform (NVIDIA DGX, Jetson, Apple
Silicon, discrete NVIDIA/AMD GPUs, or plain CPU), picks the matching compose
file for a service, and drives podman or docker compose with a tuned
environment.

Examples:
  singularity analyze                 # Show detected hardware
  singularity up ollama               # Launch the Ollama service
  singularity status                  # List known containers
  singularity monitor --interval 5    # Live resource usage
"#)]
pub struct CliArgs {
    /// Directory holding the platforms/ compose tree
    #[arg(long, value_name = "DIR")]
    pub compose_dir: Option<PathBuf>,

    /// Directory for service data and launch logs
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file path (default: <compose-dir>/launcher.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Container engine to use
    #[arg(long, value_enum, default_value = "auto")]
    pub engine: EngineChoice,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Detect and show host hardware and platform
    #[command(name = "analyze")]
    Analyze {
        /// Include container engine and per-variant tuning details
        #[arg(short, long)]
        detailed: bool,

        /// Emit the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the services this launcher knows about
    #[command(name = "services")]
    Services,

    /// Launch a service with compose
    #[command(name = "up")]
    Up {
        /// Service name (e.g. ollama, comfyui)
        service: String,
    },

    /// Stop a service with compose
    #[command(name = "down")]
    Down {
        /// Service name
        service: String,
    },

    /// Show all containers known to the engine
    #[command(name = "status")]
    Status,

    /// Start a stopped container
    #[command(name = "start")]
    Start {
        /// Container name or ID
        container: String,
    },

    /// Stop a running container
    #[command(name = "stop")]
    Stop {
        /// Container name or ID
        container: String,
    },

    /// Restart a container
    #[command(name = "restart")]
    Restart {
        /// Container name or ID
        container: String,
    },

    /// Show recent container logs
    #[command(name = "logs")]
    Logs {
        /// Container name or ID
        container: String,

        /// Number of trailing lines
        #[arg(long, default_value = "100", value_name = "NUM")]
        tail: usize,
    },

    /// Live CPU/memory/GPU usage
    #[command(name = "monitor")]
    Monitor {
        /// Seconds between samples
        #[arg(short, long, value_name = "SECS")]
        interval: Option<u64>,

        /// Number of samples before exiting (default: run until Ctrl+C)
        #[arg(short = 'n', long, value_name = "NUM")]
        count: Option<u64>,
    },
}

/// Engine selection on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineChoice {
    /// Probe podman first, then docker
    #[default]
    Auto,
    /// Require podman
    Podman,
    /// Require docker
    Docker,
}

/// On-disk config file shape; every field optional so a partial file merges
/// over the defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    compose_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    engine: Option<String>,
    monitor_interval_secs: Option<u64>,
    #[serde(default)]
    service_urls: HashMap<String, String>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_path(path)?;
        toml::from_str(&raw)
            .map_err(|e| LauncherError::parse(CONFIG_FILE_NAME, e.to_string()))
    }
}

/// Merged runtime configuration
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Directory holding the platforms/ compose tree
    pub compose_dir: PathBuf,
    /// Directory for service data, exported as SINGULARITY_DRIVE
    pub data_dir: PathBuf,
    /// Engine selection
    pub engine: EngineChoice,
    /// Default monitor sampling interval
    pub monitor_interval_secs: u64,
    /// Per-service URL overrides shown after launch
    pub service_urls: HashMap<String, String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            compose_dir: PathBuf::from("."),
            data_dir: default_data_dir(),
            engine: EngineChoice::Auto,
            monitor_interval_secs: 2,
            service_urls: HashMap::new(),
        }
    }
}

impl LauncherConfig {
    /// Build the runtime config: defaults, then the config file when one
    /// exists, then CLI overrides
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mut config = Self::default();

        let file = match &args.config {
            // An explicitly named file must exist
            Some(path) => Some(FileConfig::load(path)?),
            None => {
                let compose_dir = args
                    .compose_dir
                    .clone()
                    .unwrap_or_else(|| config.compose_dir.clone());
                let candidate = compose_dir.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Some(FileConfig::load(&candidate)?)
                } else {
                    None
                }
            }
        };

        if let Some(file) = file {
            if let Some(dir) = file.compose_dir {
                config.compose_dir = dir;
            }
            if let Some(dir) = file.data_dir {
                config.data_dir = dir;
            }
            if let Some(engine) = file.engine {
                config.engine = parse_engine_choice(&engine)?;
            }
            if let Some(secs) = file.monitor_interval_secs {
                config.monitor_interval_secs = secs;
            }
            config.service_urls.extend(file.service_urls);
        }

        if let Some(dir) = &args.compose_dir {
            config.compose_dir = dir.clone();
        }
        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }
        if args.engine != EngineChoice::Auto {
            config.engine = args.engine;
        }

        Ok(config)
    }

    /// Launch log path for one service
    pub fn launch_log_path(&self, service_key: &str) -> PathBuf {
        self.data_dir
            .join("logs")
            .join(format!("{service_key}_build.log"))
    }
}

fn parse_engine_choice(value: &str) -> Result<EngineChoice> {
    match value.to_lowercase().as_str() {
        "auto" => Ok(EngineChoice::Auto),
        "podman" => Ok(EngineChoice::Podman),
        "docker" => Ok(EngineChoice::Docker),
        other => Err(LauncherError::config(format!(
            "unknown engine '{other}' (expected auto, podman, or docker)"
        ))),
    }
}

/// `~/Singularity`, falling back to a relative directory when the home
/// directory cannot be determined
pub fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse_args(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse_args(&["singularity", "analyze"]);
        assert_eq!(args.engine, EngineChoice::Auto);
        assert_eq!(args.verbose, 0);
        assert!(matches!(
            args.command,
            Commands::Analyze {
                detailed: false,
                json: false
            }
        ));
    }

    #[test]
    fn test_logs_tail_default() {
        let args = parse_args(&["singularity", "logs", "ollama"]);
        match args.command {
            Commands::Logs { container, tail } => {
                assert_eq!(container, "ollama");
                assert_eq!(tail, 100);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_config_defaults() {
        let args = parse_args(&["singularity", "services"]);
        let config = LauncherConfig::from_cli(&args).unwrap();
        assert_eq!(config.compose_dir, PathBuf::from("."));
        assert_eq!(config.monitor_interval_secs, 2);
        assert!(config.data_dir.ends_with(DEFAULT_DATA_DIR_NAME));
    }

    #[test]
    fn test_config_file_merge_and_cli_override() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            r#"
data_dir = "/srv/singularity"
engine = "docker"
monitor_interval_secs = 5

[service_urls]
ollama = "http://box:3000"
"#,
        )
        .unwrap();

        let config_str = config_path.to_string_lossy().into_owned();
        let args = parse_args(&[
            "singularity",
            "--config",
            &config_str,
            "--data-dir",
            "/tmp/override",
            "services",
        ]);
        let config = LauncherConfig::from_cli(&args).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/override"));
        assert_eq!(config.engine, EngineChoice::Docker);
        assert_eq!(config.monitor_interval_secs, 5);
        assert_eq!(
            config.service_urls.get("ollama").map(String::as_str),
            Some("http://box:3000")
        );
    }

    #[test]
    fn test_config_file_rejects_unknown_engine() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "engine = \"lxc\"\n").unwrap();

        let config_str = config_path.to_string_lossy().into_owned();
        let args = parse_args(&["singularity", "--config", &config_str, "services"]);
        assert!(LauncherConfig::from_cli(&args).is_err());
    }

    #[test]
    fn test_launch_log_path() {
        let config = LauncherConfig {
            data_dir: PathBuf::from("/data"),
            ..Default::default()
        };
        assert_eq!(
            config.launch_log_path("ollama"),
            PathBuf::from("/data/logs/ollama_build.log")
        );
    }
}
