//! # Singularity Launcher - Hardware-Aware AI Container Deployment
//!
//! Singularity Launcher detects the host platform and drives podman or
//! docker compose to run AI services with hardware-matched settings.
//!
//! ## Features
//!
//! - **Platform Detection**: DGX, Jetson (model-aware), Apple Silicon,
//!   discrete NVIDIA/AMD GPUs, or plain CPU
//! - **Apple Silicon Tuning**: Per-variant (M1 through M4, Base/Pro/Max/Ultra)
//!   memory and CPU limits exported into the compose environment
//! - **Engine Abstraction**: Podman preferred, Docker as fallback
//! - **Service Catalog**: Known AI services mapped to per-platform compose
//!   files
//! - **Launch Logs**: Every compose invocation recorded for diagnosis
//! - **Resource Monitoring**: Background CPU/memory/disk/GPU sampling
//!
//! ## Quick Start
//!
//! ```no_run
//! use singularity_launcher::system::SystemInfo;
//!
//! let info = SystemInfo::collect();
//! info.print_summary();
//! println!("platform: {}", info.platform.as_str());
//! ```
//!
//! ## Launching a Service
//!
//! ```no_run
//! use singularity_launcher::catalog::{find_service, resolve_compose_file};
//! use singularity_launcher::engine::{ComposeRequest, ComposeRunner, ContainerEngine};
//! use singularity_launcher::system::SystemInfo;
//! use std::path::Path;
//!
//! let info = SystemInfo::collect();
//! let service = find_service("ollama").unwrap();
//! let compose_file = resolve_compose_file(
//!     Path::new("."),
//!     info.platform,
//!     info.jetson,
//!     service.key,
//! ).unwrap();
//!
//! let engine = ContainerEngine::detect().unwrap();
//! let runner = ComposeRunner::new(engine);
//! let request = ComposeRequest {
//!     compose_file: &compose_file,
//!     project: service.key,
//!     env: &[],
//!     log_file: None,
//! };
//! runner.up(&request).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod system;

// Re-export commonly used types
pub use config::{CliArgs, Commands, LauncherConfig};
pub use error::{LauncherError, Result};
pub use system::{Platform, SystemInfo};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use singularity_launcher::prelude::*;
    //! ```

    pub use crate::catalog::{find_service, resolve_compose_file, Service, SERVICES};
    pub use crate::config::{CliArgs, Commands, EngineChoice, LauncherConfig};
    pub use crate::engine::{
        list_containers, ComposeRequest, ComposeRunner, ContainerEngine, ContainerOps, EngineInfo,
    };
    pub use crate::error::{LauncherError, Result};
    pub use crate::monitor::{Metrics, PerformanceMonitor};
    pub use crate::system::{AppleSilicon, JetsonModel, Platform, SystemInfo, VariantProfile};
}
