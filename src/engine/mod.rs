//! Container engine integration
//!
//! Everything that shells out to podman/docker lives here: engine
//! detection, compose up/down, and per-container operations.

pub mod compose;
pub mod containers;
pub mod runtime;

pub use compose::{ComposeOutput, ComposeRequest, ComposeRunner};
pub use containers::{list_containers, ContainerInfo, ContainerOps};
pub use runtime::{ContainerEngine, EngineInfo};
