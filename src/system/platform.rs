//! Platform classification
//!
//! Maps a handful of host probes (marker files, `/proc` contents, vendor
//! tools on PATH) onto the closed set of platforms the compose catalog is
//! organized by. Probes are ordered: the more specific platform always wins
//! (DGX before generic NVIDIA, Jetson before generic ARM).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// CPU vendor classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuVendor {
    /// AMD x86 CPU
    Amd,
    /// Generic ARM (non-Apple)
    Arm,
    /// Intel x86 CPU
    Intel,
    /// Apple Silicon
    Apple,
    /// Could not classify
    Unknown,
}

impl CpuVendor {
    /// Short lowercase label, matches the compose catalog naming
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd => "amd",
            Self::Arm => "arm",
            Self::Intel => "intel",
            Self::Apple => "apple",
            Self::Unknown => "unknown",
        }
    }

    /// Detect the CPU vendor of the current host
    pub fn detect() -> Self {
        if is_apple_silicon_host() {
            return Self::Apple;
        }
        if is_arm_arch() {
            return Self::Arm;
        }

        // Vendor string from sysinfo first, /proc/cpuinfo as fallback
        let sys = sysinfo::System::new_with_specifics(
            sysinfo::RefreshKind::new().with_cpu(sysinfo::CpuRefreshKind::everything()),
        );
        if let Some(cpu) = sys.cpus().first() {
            if let Some(vendor) = Self::from_vendor_string(cpu.vendor_id()) {
                return vendor;
            }
            if let Some(vendor) = Self::from_vendor_string(cpu.brand()) {
                return vendor;
            }
        }

        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            if let Some(vendor) = Self::from_vendor_string(&cpuinfo) {
                return vendor;
            }
        }

        if std::env::consts::ARCH == "x86_64" {
            // Unlabeled x86_64 is overwhelmingly Intel-compatible
            return Self::Intel;
        }

        Self::Unknown
    }

    /// Classify a vendor/brand string. Returns None when neither vendor
    /// appears, so callers can fall through to the next probe.
    pub fn from_vendor_string(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        if lower.contains("amd") {
            Some(Self::Amd)
        } else if lower.contains("intel") {
            Some(Self::Intel)
        } else {
            None
        }
    }
}

/// GPU vendor classification. `Cpu` means no usable accelerator was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuVendor {
    /// NVIDIA (CUDA) GPU
    Nvidia,
    /// AMD (ROCm) GPU
    Amd,
    /// Apple Silicon integrated GPU
    Apple,
    /// No dedicated GPU, CPU-only containers
    Cpu,
}

impl GpuVendor {
    /// Short lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nvidia => "nvidia",
            Self::Amd => "amd",
            Self::Apple => "apple",
            Self::Cpu => "cpu",
        }
    }

    /// Detect the GPU vendor of the current host
    pub fn detect() -> Self {
        if is_apple_silicon_host() {
            return Self::Apple;
        }

        if command_succeeds("nvidia-smi", &[]) {
            return Self::Nvidia;
        }

        if cfg!(target_os = "linux") {
            if Path::new("/opt/rocm").exists() || command_succeeds("rocminfo", &[]) {
                return Self::Amd;
            }
            if let Some(stdout) = command_stdout("lspci", &[]) {
                let lower = stdout.to_lowercase();
                if lower.contains("amd") && lower.contains("vga") {
                    return Self::Amd;
                }
            }
        }

        Self::Cpu
    }
}

/// Hardware platform the compose catalog is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// NVIDIA DGX workstation/server
    Dgx,
    /// NVIDIA Jetson embedded board
    Jetson,
    /// Apple Silicon Mac
    Apple,
    /// Desktop NVIDIA (RTX-class) GPU
    Nvidia,
    /// AMD GPU with ROCm
    Amd,
    /// Intel CPU, no dedicated GPU
    Intel,
    /// Generic ARM, no dedicated GPU
    Arm,
    /// Could not classify
    Unknown,
}

impl Platform {
    /// Short lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dgx => "dgx",
            Self::Jetson => "jetson",
            Self::Apple => "apple",
            Self::Nvidia => "nvidia",
            Self::Amd => "amd",
            Self::Intel => "intel",
            Self::Arm => "arm",
            Self::Unknown => "unknown",
        }
    }

    /// Detect the platform of the current host.
    ///
    /// Priority order: DGX marker, Jetson marker, Apple Silicon, NVIDIA GPU,
    /// AMD GPU, CPU vendor, architecture fallback.
    pub fn detect() -> Self {
        if Path::new("/etc/dgx-release").exists() || proc_cpuinfo_mentions_dgx() {
            return Self::Dgx;
        }
        if Path::new("/etc/nv_tegra_release").exists() {
            return Self::Jetson;
        }
        if is_apple_silicon_host() {
            return Self::Apple;
        }

        match GpuVendor::detect() {
            GpuVendor::Nvidia => return Self::Nvidia,
            GpuVendor::Amd => return Self::Amd,
            _ => {}
        }

        match CpuVendor::detect() {
            CpuVendor::Amd => return Self::Amd,
            CpuVendor::Intel => return Self::Intel,
            CpuVendor::Arm => return Self::Arm,
            _ => {}
        }

        match std::env::consts::ARCH {
            "x86_64" => Self::Intel,
            "aarch64" | "arm" => Self::Arm,
            _ => Self::Unknown,
        }
    }
}

/// Jetson board model, disambiguated by device-tree name plus memory size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JetsonModel {
    /// Orin Nano with 4 GB
    OrinNano4Gb,
    /// Orin Nano with 8 GB
    OrinNano8Gb,
    /// Orin NX with 8 GB
    OrinNx8Gb,
    /// Orin NX with 16 GB
    OrinNx16Gb,
    /// AGX Orin with 32 GB
    Agx32Gb,
    /// AGX Orin with 64 GB
    Agx64Gb,
    /// Jetson marker present but the model was not recognized
    UnknownJetson,
}

impl JetsonModel {
    /// Directory name used by the compose catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrinNano4Gb => "orin_nano_4gb",
            Self::OrinNano8Gb => "orin_nano_8gb",
            Self::OrinNx8Gb => "orin_nx_8gb",
            Self::OrinNx16Gb => "orin_nx_16gb",
            Self::Agx32Gb => "agx_32gb",
            Self::Agx64Gb => "agx_64gb",
            Self::UnknownJetson => "unknown_jetson",
        }
    }

    /// Detect the Jetson model of the current host, or None when the host
    /// is not a Jetson at all
    pub fn detect(memory_gb: usize) -> Option<Self> {
        if !Path::new("/etc/nv_tegra_release").exists() {
            return None;
        }
        let model = std::fs::read_to_string("/proc/device-tree/model").ok()?;
        Some(Self::from_device_tree(&model, memory_gb))
    }

    /// Classify a device-tree model string. Memory size separates the RAM
    /// variants Jetson does not encode in the model name.
    pub fn from_device_tree(model: &str, memory_gb: usize) -> Self {
        let model = model.to_lowercase();
        if !model.contains("orin") {
            return Self::UnknownJetson;
        }
        if model.contains("nano") {
            if memory_gb <= 4 {
                Self::OrinNano4Gb
            } else {
                Self::OrinNano8Gb
            }
        } else if model.contains("nx") {
            if memory_gb <= 8 {
                Self::OrinNx8Gb
            } else {
                Self::OrinNx16Gb
            }
        } else if model.contains("agx") {
            if memory_gb <= 32 {
                Self::Agx32Gb
            } else {
                Self::Agx64Gb
            }
        } else {
            Self::UnknownJetson
        }
    }
}

/// True when running on an Apple Silicon Mac
pub fn is_apple_silicon_host() -> bool {
    std::env::consts::OS == "macos" && std::env::consts::ARCH == "aarch64"
}

fn is_arm_arch() -> bool {
    matches!(std::env::consts::ARCH, "aarch64" | "arm")
}

fn proc_cpuinfo_mentions_dgx() -> bool {
    std::fs::read_to_string("/proc/cpuinfo")
        .map(|s| s.contains("NVIDIA DGX"))
        .unwrap_or(false)
}

/// Run a probe command, swallowing spawn failures (tool not installed)
pub(crate) fn command_succeeds(program: &str, args: &[&str]) -> bool {
    match Command::new(program).args(args).output() {
        Ok(output) => output.status.success(),
        Err(e) => {
            debug!(program, error = %e, "probe command unavailable");
            false
        }
    }
}

/// Run a probe command and return its stdout on success
pub(crate) fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_vendor_from_string() {
        assert_eq!(
            CpuVendor::from_vendor_string("AuthenticAMD"),
            Some(CpuVendor::Amd)
        );
        assert_eq!(
            CpuVendor::from_vendor_string("GenuineIntel"),
            Some(CpuVendor::Intel)
        );
        assert_eq!(
            CpuVendor::from_vendor_string("Intel(R) Core(TM) i9-13900K"),
            Some(CpuVendor::Intel)
        );
        assert_eq!(CpuVendor::from_vendor_string("Apple M2 Pro"), None);
    }

    #[test]
    fn test_jetson_from_device_tree() {
        assert_eq!(
            JetsonModel::from_device_tree("NVIDIA Orin Nano Developer Kit", 4),
            JetsonModel::OrinNano4Gb
        );
        assert_eq!(
            JetsonModel::from_device_tree("NVIDIA Orin Nano Developer Kit", 8),
            JetsonModel::OrinNano8Gb
        );
        assert_eq!(
            JetsonModel::from_device_tree("NVIDIA Orin NX", 16),
            JetsonModel::OrinNx16Gb
        );
        assert_eq!(
            JetsonModel::from_device_tree("Jetson AGX Orin", 64),
            JetsonModel::Agx64Gb
        );
        assert_eq!(
            JetsonModel::from_device_tree("Jetson Xavier NX", 8),
            JetsonModel::UnknownJetson
        );
    }

    #[test]
    fn test_platform_labels_match_catalog() {
        assert_eq!(Platform::Dgx.as_str(), "dgx");
        assert_eq!(Platform::Jetson.as_str(), "jetson");
        assert_eq!(JetsonModel::OrinNx8Gb.as_str(), "orin_nx_8gb");
    }
}
