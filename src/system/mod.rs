//! Hardware and platform detection
//!
//! Answers one question for the rest of the crate: what is this machine,
//! and which compose variant / resource preset should it get?

pub mod apple;
pub mod platform;
pub mod profiles;
pub mod resources;

pub use apple::{AppleSilicon, AppleVariant};
pub use platform::{CpuVendor, GpuVendor, JetsonModel, Platform};
pub use profiles::{PerformanceProfile, VariantProfile};
pub use resources::{CpuInfo, GpuInfo, MemoryInfo, OsKind, SystemInfo};
