//! System information snapshot
//!
//! Collects OS, CPU, GPU, and memory details into one serializable struct
//! used by `analyze` and by compose selection.

use crate::system::apple::AppleSilicon;
use crate::system::platform::{command_stdout, CpuVendor, GpuVendor, JetsonModel, Platform};
use serde::Serialize;
use sysinfo::System;

/// Complete system information snapshot
#[derive(Debug, Serialize)]
pub struct SystemInfo {
    /// Operating system classification
    pub os: OsKind,
    /// CPU information
    pub cpu: CpuInfo,
    /// GPU information
    pub gpu: GpuInfo,
    /// Memory information
    pub memory: MemoryInfo,
    /// Platform the compose catalog is keyed by
    pub platform: Platform,
    /// Jetson model when the platform is Jetson
    pub jetson: Option<JetsonModel>,
    /// Apple Silicon details when the platform is Apple
    pub apple: Option<AppleSilicon>,
}

/// Operating system classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OsKind {
    /// Arch Linux
    Arch,
    /// Pop!_OS
    PopOs,
    /// Debian
    Debian,
    /// Ubuntu
    Ubuntu,
    /// Fedora
    Fedora,
    /// Other Linux distribution
    Linux,
    /// macOS
    Mac,
    /// Windows
    Windows,
    /// Anything else
    Other,
}

impl OsKind {
    /// Detect the OS of the current host
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "linux" => std::fs::read_to_string("/etc/os-release")
                .map(|s| Self::from_os_release(&s))
                .unwrap_or(Self::Linux),
            "macos" => Self::Mac,
            "windows" => Self::Windows,
            _ => Self::Other,
        }
    }

    /// Classify an /etc/os-release blob. Pop!_OS must be checked before
    /// Ubuntu and Ubuntu before Debian, since derivatives mention their
    /// parents in ID_LIKE.
    pub fn from_os_release(contents: &str) -> Self {
        if contents.contains("Arch Linux") {
            Self::Arch
        } else if contents.contains("Pop!_OS") {
            Self::PopOs
        } else if contents.contains("Ubuntu") {
            Self::Ubuntu
        } else if contents.contains("Debian") {
            Self::Debian
        } else if contents.contains("Fedora") {
            Self::Fedora
        } else {
            Self::Linux
        }
    }

    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arch => "Arch",
            Self::PopOs => "Pop!_OS",
            Self::Debian => "Debian",
            Self::Ubuntu => "Ubuntu",
            Self::Fedora => "Fedora",
            Self::Linux => "Linux",
            Self::Mac => "macOS",
            Self::Windows => "Windows",
            Self::Other => "Other",
        }
    }
}

/// CPU information
#[derive(Debug, Clone, Serialize)]
pub struct CpuInfo {
    /// CPU brand string
    pub brand: String,
    /// Logical core count
    pub logical_cores: usize,
    /// Physical core count
    pub physical_cores: usize,
    /// Architecture (x86_64, aarch64, ...)
    pub arch: String,
    /// Vendor classification
    pub vendor: CpuVendor,
}

impl CpuInfo {
    /// Collect CPU information
    pub fn collect(sys: &System) -> Self {
        let brand = sys
            .cpus()
            .first()
            .map(|c| c.brand().to_string())
            .unwrap_or_else(|| "Unknown CPU".to_string());

        CpuInfo {
            brand,
            logical_cores: num_cpus::get(),
            physical_cores: num_cpus::get_physical(),
            arch: std::env::consts::ARCH.to_string(),
            vendor: CpuVendor::detect(),
        }
    }
}

/// GPU information
#[derive(Debug, Clone, Serialize)]
pub struct GpuInfo {
    /// Device name
    pub name: String,
    /// Dedicated memory in GB (0 when shared or unknown)
    pub memory_gb: usize,
    /// Vendor classification
    pub vendor: GpuVendor,
}

impl GpuInfo {
    /// Collect GPU information for the detected vendor
    pub fn collect() -> Self {
        let vendor = GpuVendor::detect();
        match vendor {
            GpuVendor::Nvidia => Self::collect_nvidia(),
            GpuVendor::Amd => Self::collect_amd(),
            GpuVendor::Apple => GpuInfo {
                // Unified memory, no dedicated VRAM figure
                name: "Apple Silicon GPU".to_string(),
                memory_gb: 0,
                vendor,
            },
            GpuVendor::Cpu => GpuInfo {
                name: "CPU (No dedicated GPU)".to_string(),
                memory_gb: 0,
                vendor,
            },
        }
    }

    fn collect_nvidia() -> Self {
        if let Some(stdout) = command_stdout(
            "nvidia-smi",
            &["--query-gpu=name,memory.total", "--format=csv,noheader,nounits"],
        ) {
            if let Some((name, memory_gb)) = Self::parse_nvidia_query(&stdout) {
                return GpuInfo {
                    name,
                    memory_gb,
                    vendor: GpuVendor::Nvidia,
                };
            }
        }
        GpuInfo {
            name: "NVIDIA GPU".to_string(),
            memory_gb: 0,
            vendor: GpuVendor::Nvidia,
        }
    }

    /// Parse `nvidia-smi --query-gpu=name,memory.total` CSV output
    /// (memory is reported in MiB)
    pub fn parse_nvidia_query(stdout: &str) -> Option<(String, usize)> {
        let line = stdout.lines().next()?;
        let (name, memory) = line.split_once(',')?;
        let memory_mib: f64 = memory.trim().parse().ok()?;
        Some((name.trim().to_string(), (memory_mib / 1024.0).round() as usize))
    }

    fn collect_amd() -> Self {
        let name = command_stdout("lspci", &["-v"])
            .and_then(|stdout| Self::parse_lspci_amd(&stdout))
            .unwrap_or_else(|| "AMD GPU".to_string());
        GpuInfo {
            name,
            memory_gb: 0,
            vendor: GpuVendor::Amd,
        }
    }

    /// Pull the AMD VGA adapter name out of `lspci -v` output
    pub fn parse_lspci_amd(stdout: &str) -> Option<String> {
        stdout
            .lines()
            .find(|line| line.contains("VGA") && (line.contains("AMD") || line.contains("ATI")))
            .and_then(|line| line.rsplit_once(':'))
            .map(|(_, name)| name.trim().to_string())
    }
}

/// Memory information
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemoryInfo {
    /// Total physical memory in bytes
    pub total_bytes: u64,
    /// Available memory in bytes
    pub available_bytes: u64,
    /// Total memory rounded to GB
    pub total_gb: usize,
}

impl MemoryInfo {
    /// Collect memory information
    pub fn collect(sys: &System) -> Self {
        let total_bytes = sys.total_memory();
        MemoryInfo {
            total_bytes,
            available_bytes: sys.available_memory(),
            total_gb: Self::round_gb(total_bytes),
        }
    }

    /// Round a byte count to whole GiB (8 GiB machines report slightly
    /// under 8 GiB, the catalog thresholds expect the rounded figure)
    pub fn round_gb(bytes: u64) -> usize {
        ((bytes as f64) / (1024.0 * 1024.0 * 1024.0)).round() as usize
    }
}

impl SystemInfo {
    /// Collect complete system information
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let memory = MemoryInfo::collect(&sys);
        let platform = Platform::detect();
        let jetson = if platform == Platform::Jetson {
            JetsonModel::detect(memory.total_gb)
        } else {
            None
        };
        let apple = if platform == Platform::Apple {
            AppleSilicon::detect()
        } else {
            None
        };

        SystemInfo {
            os: OsKind::detect(),
            cpu: CpuInfo::collect(&sys),
            gpu: GpuInfo::collect(),
            memory,
            platform,
            jetson,
            apple,
        }
    }

    /// Print a human-readable summary to stdout
    pub fn print_summary(&self) {
        println!("=== System Information ===\n");

        println!("OS:        {}", self.os.as_str());
        println!("Platform:  {}", self.platform.as_str());
        if let Some(jetson) = self.jetson {
            println!("Jetson:    {}", jetson.as_str());
        }

        println!("\nCPU:");
        println!("  Model:          {}", self.cpu.brand);
        println!("  Logical cores:  {}", self.cpu.logical_cores);
        println!("  Physical cores: {}", self.cpu.physical_cores);
        println!("  Architecture:   {}", self.cpu.arch);
        println!("  Vendor:         {}", self.cpu.vendor.as_str());

        println!("\nGPU:");
        println!("  Name:   {}", self.gpu.name);
        println!("  Vendor: {}", self.gpu.vendor.as_str());
        if self.gpu.memory_gb > 0 {
            println!("  Memory: {} GB", self.gpu.memory_gb);
        }

        println!("\nMemory:");
        println!(
            "  Total:     {}",
            humansize::format_size(self.memory.total_bytes, humansize::BINARY)
        );
        println!(
            "  Available: {}",
            humansize::format_size(self.memory.available_bytes, humansize::BINARY)
        );

        if let Some(apple) = &self.apple {
            println!("\nApple Silicon:");
            println!("  Variant:           {}", apple.variant);
            println!("  Performance cores: {}", apple.performance_cores);
            println!("  Efficiency cores:  {}", apple.efficiency_cores);
            println!("  Memory limit:      {}", apple.profile.memory_limit);
            println!("  CPU limit:         {}", apple.profile.cpu_limit);
            println!(
                "  Profile:           {}",
                apple.profile.performance_profile.as_str()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_release_classification() {
        assert_eq!(OsKind::from_os_release("NAME=\"Arch Linux\""), OsKind::Arch);
        assert_eq!(
            OsKind::from_os_release("NAME=\"Pop!_OS\"\nID_LIKE=\"ubuntu debian\""),
            OsKind::PopOs
        );
        assert_eq!(
            OsKind::from_os_release("NAME=\"Ubuntu\"\nID_LIKE=debian"),
            OsKind::Ubuntu
        );
        assert_eq!(
            OsKind::from_os_release("NAME=\"Debian GNU/Linux\""),
            OsKind::Debian
        );
        assert_eq!(
            OsKind::from_os_release("NAME=\"Fedora Linux\""),
            OsKind::Fedora
        );
        assert_eq!(OsKind::from_os_release("NAME=\"NixOS\""), OsKind::Linux);
    }

    #[test]
    fn test_nvidia_query_parsing() {
        let (name, mem) =
            GpuInfo::parse_nvidia_query("NVIDIA GeForce RTX 4090, 24564\n").unwrap();
        assert_eq!(name, "NVIDIA GeForce RTX 4090");
        assert_eq!(mem, 24);

        assert!(GpuInfo::parse_nvidia_query("").is_none());
        assert!(GpuInfo::parse_nvidia_query("garbage").is_none());
    }

    #[test]
    fn test_lspci_amd_parsing() {
        let out = "03:00.0 VGA compatible controller: Advanced Micro Devices, Inc. [AMD/ATI] Navi 31\n";
        let name = GpuInfo::parse_lspci_amd(out).unwrap();
        assert!(name.contains("Navi 31"));

        assert!(GpuInfo::parse_lspci_amd("02:00.0 Ethernet controller: Intel").is_none());
    }

    #[test]
    fn test_round_gb() {
        // 7.8 GiB machine should report as 8
        assert_eq!(MemoryInfo::round_gb(8_374_182_000), 8);
        assert_eq!(MemoryInfo::round_gb(16 * 1024 * 1024 * 1024), 16);
        assert_eq!(MemoryInfo::round_gb(0), 0);
    }

    #[test]
    fn test_system_info_collection() {
        let info = SystemInfo::collect();
        assert!(info.cpu.logical_cores > 0);
        assert!(info.memory.total_bytes > 0);
    }
}
