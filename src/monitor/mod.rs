//! Performance monitoring
//!
//! Periodic snapshots of CPU, memory, disk, and GPU utilization. A
//! background thread refreshes a shared snapshot; `Metrics::sample` is also
//! usable one-shot. GPU metrics come from `nvidia-smi` on NVIDIA and from
//! sysfs on AMD; Apple exposes no per-process GPU counters worth shelling
//! out for.

use crate::system::platform::command_stdout;
use crate::system::GpuVendor;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::warn;

/// GPU utilization snapshot
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GpuMetrics {
    /// GPU busy percentage
    pub usage_percent: f32,
    /// Temperature in degrees Celsius
    pub temperature_c: f32,
    /// VRAM used percentage
    pub memory_percent: f32,
    /// Total VRAM in GB
    pub memory_total_gb: usize,
}

/// One performance snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metrics {
    /// CPU busy percentage across all cores
    pub cpu_percent: f32,
    /// Memory used percentage
    pub memory_percent: f32,
    /// Total memory in GB
    pub memory_total_gb: usize,
    /// Root filesystem used percentage
    pub disk_percent: f32,
    /// Root filesystem size in GB
    pub disk_total_gb: usize,
    /// Root filesystem used in GB
    pub disk_used_gb: usize,
    /// GPU metrics when a supported GPU is present
    pub gpu: Option<GpuMetrics>,
}

impl Metrics {
    /// Take one sample. The caller owns the `System` so successive samples
    /// get real CPU deltas instead of the first-refresh zero reading.
    pub fn sample(sys: &mut System, gpu_vendor: GpuVendor) -> Self {
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let total = sys.total_memory();
        let used = sys.used_memory();
        let memory_percent = if total > 0 {
            (used as f32 / total as f32) * 100.0
        } else {
            0.0
        };

        let (disk_percent, disk_total_gb, disk_used_gb) = root_disk_usage();

        Metrics {
            cpu_percent: sys.global_cpu_usage(),
            memory_percent,
            memory_total_gb: crate::system::MemoryInfo::round_gb(total),
            disk_percent,
            disk_total_gb,
            disk_used_gb,
            gpu: gpu_metrics(gpu_vendor),
        }
    }

    /// One-shot sample on a fresh `System`. Primes the CPU counters and
    /// waits the minimum update interval first, so the CPU reading is a
    /// real delta rather than the first-refresh zero.
    pub fn sample_now(gpu_vendor: GpuVendor) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        Self::sample(&mut sys, gpu_vendor)
    }

    /// One-line rendering for the `monitor` subcommand
    pub fn render_line(&self) -> String {
        let mut line = format!(
            "CPU {:5.1}%  MEM {:5.1}% of {} GB  DISK {:5.1}% ({}/{} GB)",
            self.cpu_percent,
            self.memory_percent,
            self.memory_total_gb,
            self.disk_percent,
            self.disk_used_gb,
            self.disk_total_gb,
        );
        if let Some(gpu) = &self.gpu {
            line.push_str(&format!(
                "  GPU {:5.1}% {:4.1}C",
                gpu.usage_percent, gpu.temperature_c
            ));
        }
        line
    }
}

fn root_disk_usage() -> (f32, usize, usize) {
    let disks = Disks::new_with_refreshed_list();
    let root = disks
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"))
        .or_else(|| disks.iter().next());
    match root {
        Some(disk) => {
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            let percent = if total > 0 {
                (used as f32 / total as f32) * 100.0
            } else {
                0.0
            };
            (
                percent,
                crate::system::MemoryInfo::round_gb(total),
                crate::system::MemoryInfo::round_gb(used),
            )
        }
        None => (0.0, 0, 0),
    }
}

fn gpu_metrics(vendor: GpuVendor) -> Option<GpuMetrics> {
    match vendor {
        GpuVendor::Nvidia => nvidia_metrics(),
        GpuVendor::Amd => amd_metrics(),
        _ => None,
    }
}

fn nvidia_metrics() -> Option<GpuMetrics> {
    let stdout = command_stdout(
        "nvidia-smi",
        &[
            "--query-gpu=utilization.gpu,temperature.gpu,memory.used,memory.total",
            "--format=csv,noheader,nounits",
        ],
    )?;
    parse_nvidia_metrics(&stdout)
}

/// Parse one `nvidia-smi --query-gpu` CSV line:
/// `utilization %, temperature C, memory used MiB, memory total MiB`
pub fn parse_nvidia_metrics(stdout: &str) -> Option<GpuMetrics> {
    let line = stdout.lines().next()?;
    let fields: Vec<f32> = line
        .split(',')
        .map(|f| f.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    if fields.len() < 4 || fields[3] <= 0.0 {
        return None;
    }
    Some(GpuMetrics {
        usage_percent: fields[0],
        temperature_c: fields[1],
        memory_percent: (fields[2] / fields[3]) * 100.0,
        memory_total_gb: (fields[3] / 1024.0).round() as usize,
    })
}

fn amd_metrics() -> Option<GpuMetrics> {
    if !cfg!(target_os = "linux") {
        return None;
    }
    let usage: f32 = std::fs::read_to_string("/sys/class/drm/card0/device/gpu_busy_percent")
        .ok()?
        .trim()
        .parse()
        .ok()?;
    // Millidegrees; missing hwmon node just zeroes the temperature
    let temperature_c = std::fs::read_to_string(
        "/sys/class/drm/card0/device/hwmon/hwmon0/temp1_input",
    )
    .ok()
    .and_then(|s| s.trim().parse::<f32>().ok())
    .map(|milli| milli / 1000.0)
    .unwrap_or(0.0);

    Some(GpuMetrics {
        usage_percent: usage,
        temperature_c,
        memory_percent: 0.0,
        memory_total_gb: 0,
    })
}

/// Background performance monitor with a shared latest-snapshot
pub struct PerformanceMonitor {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    metrics: Mutex<Metrics>,
    running: AtomicBool,
}

impl Shared {
    /// Sleep in short slices so `stop()` never waits out a long interval
    fn sleep_unless_stopped(&self, interval: Duration) {
        let slice = Duration::from_millis(50);
        let mut remaining = interval;
        while self.running.load(Ordering::Relaxed) && remaining > Duration::ZERO {
            let step = remaining.min(slice);
            std::thread::sleep(step);
            remaining = remaining.saturating_sub(step);
        }
    }
}

impl PerformanceMonitor {
    /// Start sampling every `interval`
    pub fn start(interval: Duration, gpu_vendor: GpuVendor) -> Self {
        let shared = Arc::new(Shared {
            metrics: Mutex::new(Metrics::default()),
            running: AtomicBool::new(true),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            let mut sys = System::new();
            // Prime the CPU counters so the first published sample carries
            // a real usage delta instead of zero
            sys.refresh_cpu_usage();
            std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
            while worker_shared.running.load(Ordering::Relaxed) {
                let sample = Metrics::sample(&mut sys, gpu_vendor);
                match worker_shared.metrics.lock() {
                    Ok(mut current) => *current = sample,
                    Err(e) => {
                        warn!(error = %e, "metrics lock poisoned, stopping monitor");
                        break;
                    }
                }
                worker_shared.sleep_unless_stopped(interval);
            }
        });

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> Metrics {
        self.shared
            .metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Stop the sampling thread and wait for it
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nvidia_metrics() {
        let m = parse_nvidia_metrics("87, 64, 12288, 24576\n").unwrap();
        assert_eq!(m.usage_percent, 87.0);
        assert_eq!(m.temperature_c, 64.0);
        assert!((m.memory_percent - 50.0).abs() < 0.01);
        assert_eq!(m.memory_total_gb, 24);
    }

    #[test]
    fn test_parse_nvidia_metrics_rejects_garbage() {
        assert!(parse_nvidia_metrics("").is_none());
        assert!(parse_nvidia_metrics("N/A, N/A, N/A, N/A").is_none());
        assert!(parse_nvidia_metrics("10, 50").is_none());
    }

    #[test]
    fn test_one_shot_sample() {
        let mut sys = System::new();
        let metrics = Metrics::sample(&mut sys, GpuVendor::Cpu);
        assert!(metrics.memory_total_gb > 0);
        assert!(metrics.gpu.is_none());
    }

    #[test]
    fn test_sample_now_waits_for_cpu_delta() {
        let start = std::time::Instant::now();
        let metrics = Metrics::sample_now(GpuVendor::Cpu);
        assert!(start.elapsed() >= MINIMUM_CPU_UPDATE_INTERVAL);
        assert!(metrics.memory_total_gb > 0);
    }

    #[test]
    fn test_monitor_start_stop() {
        let mut monitor =
            PerformanceMonitor::start(Duration::from_millis(10), GpuVendor::Cpu);
        // Worker primes the CPU counters before its first sample
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL + Duration::from_millis(100));
        let snapshot = monitor.snapshot();
        assert!(snapshot.memory_total_gb > 0);
        monitor.stop();
    }

    #[test]
    fn test_first_sample_published_before_full_interval() {
        // A long interval must not delay the first sample past the warm-up
        let mut monitor =
            PerformanceMonitor::start(Duration::from_secs(60), GpuVendor::Cpu);
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL + Duration::from_millis(200));
        let snapshot = monitor.snapshot();
        assert!(snapshot.memory_total_gb > 0);
        monitor.stop();
    }

    #[test]
    fn test_render_line_without_gpu() {
        let metrics = Metrics {
            cpu_percent: 12.5,
            memory_percent: 40.0,
            memory_total_gb: 32,
            ..Default::default()
        };
        let line = metrics.render_line();
        assert!(line.contains("CPU"));
        assert!(line.contains("32 GB"));
        assert!(!line.contains("GPU"));
    }
}
