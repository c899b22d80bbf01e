//! Configuration module
//!
//! CLI arguments, the optional `launcher.toml` config file, and the merged
//! runtime settings.

mod settings;

pub use settings::*;
