//! Singularity Launcher CLI - Hardware-Aware AI Container Deployment
//!
//! Detects the host platform and drives podman/docker compose for AI services.

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use singularity_launcher::catalog::{find_service, resolve_compose_file, Service, SERVICES};
use singularity_launcher::config::{CliArgs, Commands, EngineChoice, LauncherConfig};
use singularity_launcher::engine::{
    list_containers, ComposeRequest, ComposeRunner, ContainerEngine, ContainerOps, EngineInfo,
};
use singularity_launcher::error::Result;
use singularity_launcher::monitor::{Metrics, PerformanceMonitor};
use singularity_launcher::system::{GpuVendor, SystemInfo};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    // Initialize logging; -v flags raise the default level, RUST_LOG wins
    let default_directive = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_target(false)
        .init();

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = LauncherConfig::from_cli(&args)?;

    match &args.command {
        Commands::Analyze { detailed, json } => cmd_analyze(*detailed, *json),
        Commands::Services => cmd_services(&config),
        Commands::Up { service } => cmd_up(&config, &args, service),
        Commands::Down { service } => cmd_down(&config, &args, service),
        Commands::Status => cmd_status(&config),
        Commands::Start { container } => {
            cmd_container(&config, LifecycleAction::Start, container)
        }
        Commands::Stop { container } => cmd_container(&config, LifecycleAction::Stop, container),
        Commands::Restart { container } => {
            cmd_container(&config, LifecycleAction::Restart, container)
        }
        Commands::Logs { container, tail } => cmd_logs(&config, container, *tail),
        Commands::Monitor { interval, count } => cmd_monitor(&config, *interval, *count),
    }
}

/// Pick the engine per configuration, probing when on auto
fn select_engine(config: &LauncherConfig) -> Result<ContainerEngine> {
    match config.engine {
        EngineChoice::Auto => ContainerEngine::detect(),
        EngineChoice::Podman => ContainerEngine::Podman.require(),
        EngineChoice::Docker => ContainerEngine::Docker.require(),
    }
}

fn cmd_analyze(detailed: bool, json: bool) -> Result<()> {
    let info = SystemInfo::collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    info.print_summary();

    if detailed {
        println!("\n=== Container Engine ===");
        match EngineInfo::detect() {
            Ok(engine) => println!("{}", engine.version),
            Err(e) => println!("none found ({e})"),
        }

        println!("\n=== Current Utilization ===");
        let metrics = Metrics::sample_now(info.gpu.vendor);
        println!("{}", metrics.render_line());

        if let Some(apple) = &info.apple {
            println!("\n=== Compose Environment ===");
            for (key, value) in apple.profile.compose_env() {
                println!("{key}={value}");
            }
        }
    }

    Ok(())
}

fn cmd_services(config: &LauncherConfig) -> Result<()> {
    println!("=== Available Services ===\n");
    for service in SERVICES {
        let url = service_url(config, service);
        println!(
            "{:<14} {:<42} {}",
            style(service.name).bold(),
            service.description,
            style(url).dim()
        );
    }
    Ok(())
}

/// Configured URL override for a service, or its default
fn service_url<'a>(config: &'a LauncherConfig, service: &'a Service) -> &'a str {
    config
        .service_urls
        .get(service.key)
        .map(String::as_str)
        .unwrap_or(service.default_url)
}

/// Environment every compose invocation receives: the data directory and
/// service name, plus the Apple Silicon preset when applicable
fn compose_env(config: &LauncherConfig, info: &SystemInfo, service: &Service) -> Vec<(String, String)> {
    let mut env = vec![
        (
            "SINGULARITY_DRIVE".to_string(),
            config.data_dir.to_string_lossy().into_owned(),
        ),
        ("SERVICE_NAME".to_string(), service.key.to_string()),
    ];
    if let Some(apple) = &info.apple {
        env.extend(apple.profile.compose_env());
    }
    env
}

fn spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn cmd_up(config: &LauncherConfig, args: &CliArgs, name: &str) -> Result<()> {
    let info = SystemInfo::collect();
    let service = find_service(name)?;
    let compose_file =
        resolve_compose_file(&config.compose_dir, info.platform, info.jetson, service.key)?;
    let engine = select_engine(config)?;

    let env = compose_env(config, &info, service);
    let log_file = config.launch_log_path(service.key);
    let runner = ComposeRunner::new(engine);
    let request = ComposeRequest {
        compose_file: &compose_file,
        project: service.key,
        env: &env,
        log_file: Some(&log_file),
    };

    let pb = spinner(args.quiet, format!("Launching {}...", service.name));
    let result = runner.up(&request);
    pb.finish_and_clear();
    result?;

    if !args.quiet {
        println!(
            "{} {} is up ({} platform, {} engine)",
            style("✓").green().bold(),
            style(service.name).bold(),
            info.platform.as_str(),
            engine
        );
        println!("  URL: {}", service_url(config, service));
        println!("  Log: {}", log_file.display());
    }
    Ok(())
}

fn cmd_down(config: &LauncherConfig, args: &CliArgs, name: &str) -> Result<()> {
    let info = SystemInfo::collect();
    let service = find_service(name)?;
    let compose_file =
        resolve_compose_file(&config.compose_dir, info.platform, info.jetson, service.key)?;
    let engine = select_engine(config)?;

    let env = compose_env(config, &info, service);
    let runner = ComposeRunner::new(engine);
    let request = ComposeRequest {
        compose_file: &compose_file,
        project: service.key,
        env: &env,
        log_file: None,
    };

    let pb = spinner(args.quiet, format!("Stopping {}...", service.name));
    let result = runner.down(&request);
    pb.finish_and_clear();
    result?;

    if !args.quiet {
        println!(
            "{} {} is down",
            style("✓").green().bold(),
            style(service.name).bold()
        );
    }
    Ok(())
}

fn cmd_status(config: &LauncherConfig) -> Result<()> {
    let engine = select_engine(config)?;
    let containers = list_containers(engine)?;

    if containers.is_empty() {
        println!("No containers found ({engine}).");
        return Ok(());
    }

    println!(
        "{:<14} {:<24} {:<10} {}",
        "CONTAINER ID", "NAME", "STATE", "IMAGE"
    );
    for container in &containers {
        let state = if container.is_running() {
            style(container.state.as_str()).green()
        } else {
            style(container.state.as_str()).red()
        };
        println!(
            "{:<14} {:<24} {:<10} {}",
            container.short_id(),
            container.name,
            state,
            container.image
        );
    }
    Ok(())
}

/// Container lifecycle verbs, matched exhaustively so a new verb cannot
/// silently fall through to the wrong operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleAction {
    Start,
    Stop,
    Restart,
}

impl LifecycleAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

fn cmd_container(
    config: &LauncherConfig,
    action: LifecycleAction,
    container: &str,
) -> Result<()> {
    let engine = select_engine(config)?;
    let ops = ContainerOps::new(engine);
    match action {
        LifecycleAction::Start => ops.start(container)?,
        LifecycleAction::Stop => ops.stop(container)?,
        LifecycleAction::Restart => ops.restart(container)?,
    }
    println!(
        "{} {} {}",
        style("✓").green().bold(),
        action.as_str(),
        style(container).bold()
    );
    Ok(())
}

fn cmd_logs(config: &LauncherConfig, container: &str, tail: usize) -> Result<()> {
    let engine = select_engine(config)?;
    let ops = ContainerOps::new(engine);
    print!("{}", ops.logs(container, tail)?);
    Ok(())
}

fn cmd_monitor(
    config: &LauncherConfig,
    interval: Option<u64>,
    count: Option<u64>,
) -> Result<()> {
    let interval = Duration::from_secs(interval.unwrap_or(config.monitor_interval_secs).max(1));
    let gpu_vendor = GpuVendor::detect();

    let mut monitor = PerformanceMonitor::start(interval, gpu_vendor);
    println!("Sampling every {}s (Ctrl+C to stop)\n", interval.as_secs());

    // The worker primes its CPU counters before publishing the first
    // sample; wait it out so the first line is not the default snapshot
    std::thread::sleep(Duration::from_millis(500));

    let mut remaining = count;
    loop {
        let snapshot: Metrics = monitor.snapshot();
        println!("{}", snapshot.render_line());

        if let Some(n) = remaining.as_mut() {
            *n = n.saturating_sub(1);
            if *n == 0 {
                break;
            }
        }
        std::thread::sleep(interval);
    }

    monitor.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_action_labels() {
        assert_eq!(LifecycleAction::Start.as_str(), "start");
        assert_eq!(LifecycleAction::Stop.as_str(), "stop");
        assert_eq!(LifecycleAction::Restart.as_str(), "restart");
    }
}
