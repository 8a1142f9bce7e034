//! Stash sentinel entry point.
//!
//! Loads configuration, installs logging, and runs the admin log monitor
//! until SIGINT or SIGTERM. Operator commands are read from stdin.

mod cli;
mod config;
mod console;
mod logging;
mod signals;
mod sinks;

use anyhow::Context;
use cli::CliArgs;
use config::AppConfig;
use sinks::{FanoutSink, JsonLinesSink, TracingSink};
use stash_monitor::{threshold_channel, StashMonitor, ThresholdWriter};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

/// How long blocked stdin reads may hold up process exit.
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

pub struct Application {
    config: AppConfig,
    monitor: StashMonitor<FanoutSink>,
    threshold: ThresholdWriter,
    console_enabled: bool,
}

impl Application {
    /// Builds the monitor from configuration and CLI overrides.
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        // Configuration is loaded before the subscriber exists, so a freshly
        // written default file is not announced.
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(log_file) = args.log_file {
            config.watch.log_file = log_file.to_string_lossy().to_string();
        }
        if let Some(max_distance) = args.max_distance {
            config.watch.max_distance = max_distance;
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

        logging::setup_logging(&config.logging)?;
        display_banner();
        info!("📂 Config: {}", args.config_path.display());

        let (threshold, reader) = threshold_channel(config.watch.max_distance)?;

        let mut sink = FanoutSink::new().with(TracingSink);
        if let Some(path) = &config.output.json_lines_path {
            let json_sink = JsonLinesSink::create(Path::new(path))
                .await
                .with_context(|| format!("Failed to open dispatch output {}", path))?;
            sink = sink.with(json_sink);
            info!("📝 Writing dispatches to {}", path);
        }

        info!("📬 Delivering dispatches to {} sink(s)", sink.len());

        let monitor = StashMonitor::open(config.to_monitor_config(), reader, sink).await?;

        Ok(Self {
            config,
            monitor,
            threshold,
            console_enabled: !args.no_console,
        })
    }

    /// Runs until a shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        info!("📋 Configuration Summary:");
        info!("  📄 Log file: {}", self.config.watch.log_file);
        info!("  ⏱️ Poll interval: {}ms", self.config.watch.poll_interval_ms);
        info!("  📐 Max distance: {}m", self.config.watch.max_distance);
        info!("  📦 Storage types: {}", self.config.watch.storage_types.join(", "));

        let console_handle = if self.console_enabled {
            info!("⌨️ Type 'set-distance <meters>' to change the maximum distance");
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            Some(tokio::spawn(console::run_console(input, self.threshold)))
        } else {
            None
        };

        info!("🛑 Press Ctrl+C to gracefully shutdown");
        let stats = self.monitor.run(signals::shutdown_signal()).await?;

        if let Some(handle) = console_handle {
            handle.abort();
        }

        info!("📊 Final Statistics:");
        info!("  - Lines read: {}", stats.lines_read);
        info!("  - Removals parsed: {}", stats.removals_parsed);
        info!("  - Distance alerts: {}", stats.distance_alerts);
        info!("  - Loot summaries: {}", stats.summaries_flushed);
        info!("  - Failed deliveries: {}", stats.failed_deliveries);
        info!("👋 Stash sentinel stopped");

        Ok(())
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ Failed to start runtime: {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(async {
        match Application::new(args).await {
            Ok(app) => match app.run().await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("❌ Application error: {:?}", e);
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("❌ Failed to start application: {:?}", e);
                ExitCode::FAILURE
            }
        }
    });

    // A pending stdin read lives on a blocking thread that cannot be cancelled.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
    code
}

/// Display startup banner using proper logging
fn display_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("╔══════════════════════════════════════════╗");
    info!("║           🛡️  STASH SENTINEL             ║");
    info!("║                 v{}                   ║", version);
    info!("║                                          ║");
    info!("║  Long-distance looting alerts            ║");
    info!("║  Per-player loot summaries               ║");
    info!("╚══════════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args_for(dir: &TempDir, log_file: PathBuf) -> CliArgs {
        CliArgs {
            config_path: dir.path().join("stash_sentinel.toml"),
            log_file: Some(log_file),
            max_distance: Some(-5.0),
            log_level: None,
            json_logs: false,
            no_console: true,
        }
    }

    #[tokio::test]
    async fn test_cli_overrides_are_validated() {
        let dir = TempDir::new().unwrap();
        let log_file = dir.path().join("server.ADM");
        tokio::fs::write(&log_file, "").await.unwrap();

        let result = Application::new(args_for(&dir, log_file)).await;
        let message = format!("{:#}", result.err().unwrap());
        assert!(message.contains("Maximum distance"), "{}", message);
        assert!(dir.path().join("stash_sentinel.toml").exists());
    }
}
