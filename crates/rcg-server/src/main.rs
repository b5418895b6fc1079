//! # Router Command Gateway Server
//!
//! ## Startup Sequence
//!
//! 1. Parse the command line
//! 2. Initialize logging and metrics
//! 3. Load configuration (TOML file, then `RCG_*` environment overrides)
//! 4. Validate configuration (a session secret is mandatory)
//! 5. Serve until Ctrl+C or SIGTERM

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rcg_02_api_gateway::{GatewayConfig, GatewayService};
use rcg_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rcg-server")]
#[command(about = "Safe per-request access to MikroTik routers for the operator dashboard")]
struct Args {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, env = "RCG_CONFIG")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

fn load_config(path: Option<&Path>) -> Result<GatewayConfig> {
    let mut config = match path {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            GatewayConfig::from_toml_str(&source)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => GatewayConfig::default(),
    };

    config
        .apply_env(|key| std::env::var(key).ok())
        .context("applying environment overrides")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Received shutdown signal");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("initializing telemetry")?;

    let config = load_config(args.config.as_deref())?;
    if args.check {
        info!(addr = %config.http_addr(), "configuration is valid");
        return Ok(());
    }

    let service = GatewayService::new(config)
        .await
        .context("building gateway service")?;
    service
        .serve(shutdown_signal())
        .await
        .context("serving HTTP")?;

    Ok(())
}
