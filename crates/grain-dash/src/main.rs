//! Grain-dash: commodity market price dashboard.
//!
//! Usage:
//!   grain-dash [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>      Config file path (default: config/dashboard.toml)
//!   --service-url <URL>      Data service base URL (overrides config)
//!   -p, --port <PORT>        HTTP listen port (overrides config)

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use grain_common::RestStore;
use grain_dash::config::DashConfig;
use grain_dash::controller::DashboardController;
use grain_dash::server::{spawn_server, ServerConfig};
use grain_dash::store::GrainStore;

/// CLI arguments for grain-dash.
#[derive(Parser, Debug)]
#[command(name = "grain-dash")]
#[command(about = "Commodity market price dashboard")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/dashboard.toml")]
    config: PathBuf,

    /// Data service base URL (overrides config file)
    #[arg(long)]
    service_url: Option<String>,

    /// HTTP listen port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let args = Args::parse();

    let mut config = if args.config.exists() {
        DashConfig::from_file(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?
    } else {
        DashConfig::default()
    };

    // Environment overrides carry the service credentials; CLI wins last.
    config.apply_env_overrides();
    config.apply_cli_overrides(args.service_url, args.port);

    // Initialize logging
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global tracing subscriber")?;

    info!("Starting grain price dashboard");
    info!("Service URL: {}", config.store.url);

    // The missing-credentials case is this application's primary operating
    // fault; catch it here instead of surfacing a broken page.
    config.validate().context("Configuration validation failed")?;

    let rest = RestStore::new(config.store.clone()).context("Failed to create data service client")?;

    info!("Testing data service connection...");
    match rest.ping().await {
        Ok(()) => info!("Data service connection successful"),
        Err(e) => warn!(
            "Data service not reachable: {}. Lists will load empty until it is.",
            e
        ),
    }

    let store = Arc::new(GrainStore::new(rest));
    let controller = Arc::new(DashboardController::new(store, config.recent_limit));

    // Initial data load before the page is served
    controller.load().await;

    let server_config = ServerConfig {
        port: config.listen_port,
        enable_cors: true,
    };
    let server_handle = spawn_server(server_config, controller.clone());

    wait_for_shutdown().await?;

    info!("Shutting down dashboard...");
    controller.close();
    server_handle.abort();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::try_parse_from(["grain-dash"]).unwrap();
        assert_eq!(args.config.to_str().unwrap(), "config/dashboard.toml");
        assert!(args.service_url.is_none());
        assert!(args.port.is_none());
    }

    #[test]
    fn test_cli_service_url_override() {
        let args =
            Args::try_parse_from(["grain-dash", "--service-url", "http://db:54321"]).unwrap();
        assert_eq!(args.service_url, Some("http://db:54321".to_string()));
    }

    #[test]
    fn test_cli_port_override() {
        let args = Args::try_parse_from(["grain-dash", "-p", "9090"]).unwrap();
        assert_eq!(args.port, Some(9090));
    }

    #[test]
    fn test_cli_config_path() {
        let args = Args::try_parse_from(["grain-dash", "-c", "/custom/dashboard.toml"]).unwrap();
        assert_eq!(args.config.to_str().unwrap(), "/custom/dashboard.toml");
    }

    #[test]
    fn test_cli_combined_options() {
        let args = Args::try_parse_from([
            "grain-dash",
            "-c",
            "/etc/dashboard.toml",
            "--service-url",
            "https://prod.example.co",
            "--port",
            "8000",
        ])
        .unwrap();

        assert_eq!(args.config.to_str().unwrap(), "/etc/dashboard.toml");
        assert_eq!(args.service_url, Some("https://prod.example.co".to_string()));
        assert_eq!(args.port, Some(8000));
    }
}
