//! SD-WAN traffic controller
//!
//! Accepts impairment parameters from the demo console and applies them to
//! the upload and download interfaces with `tc`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sdwan_common::{LogLevel, Logger};
use sdwan_controller::api::{self, ControllerState};
use sdwan_controller::config::ControllerConfigInput;
use sdwan_controller::receiver::InterfaceImpairmentReceiver;
use sdwan_controller::runner::{CommandRunner, DryRunRunner, SystemRunner};

#[derive(Parser, Debug)]
#[command(name = "sdwan-controller", about = "SD-WAN tc impairment controller")]
struct Cli {
    /// TOML config file.
    #[arg(long, env = "SDWAN_CONTROLLER_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen address.
    #[arg(long, env = "LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Interface rate-limited by the `upload` value.
    #[arg(long, env = "UPLOAD_INTERFACE")]
    upload_interface: Option<String>,

    /// Interface rate-limited by the `download` value.
    #[arg(long, env = "DOWNLOAD_INTERFACE")]
    download_interface: Option<String>,

    /// Demo logging level: error, debug or info.
    #[arg(long, env = "LOGGING_LEVEL")]
    logging_level: Option<LogLevel>,

    /// Run `tc` directly instead of through sudo.
    #[arg(long)]
    no_sudo: bool,

    /// Log commands without executing them.
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sdwan=debug")),
        )
        .init();

    // ── Config ──────────────────────────────────────────────────
    let cli = Cli::parse();
    let mut input = match &cli.config {
        Some(path) => ControllerConfigInput::from_file(path)?,
        None => ControllerConfigInput::default(),
    };
    input.listen_addr = cli.listen_addr.or(input.listen_addr);
    input.upload_interface = cli.upload_interface.or(input.upload_interface);
    input.download_interface = cli.download_interface.or(input.download_interface);
    input.logging_level = cli.logging_level.or(input.logging_level);
    if cli.no_sudo {
        input.use_sudo = Some(false);
    }
    if cli.dry_run {
        input.dry_run = Some(true);
    }
    let config = input.resolve()?;

    // ── Receiver ────────────────────────────────────────────────
    let runner: Arc<dyn CommandRunner> = if config.dry_run {
        Arc::new(DryRunRunner)
    } else {
        Arc::new(SystemRunner::new(config.use_sudo))
    };
    let logger = Logger::new(config.logging_level);
    let receiver = Arc::new(InterfaceImpairmentReceiver::new(
        config.interfaces.clone(),
        runner,
        logger,
    ));

    // ── Router ──────────────────────────────────────────────────
    let app = api::router(ControllerState { receiver })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // ── Listen ──────────────────────────────────────────────────
    tracing::info!(
        addr = %config.listen_addr,
        upload = %config.interfaces.upload(),
        download = %config.interfaces.download(),
        sudo = config.use_sudo,
        dry_run = config.dry_run,
        "sdwan-controller listening"
    );
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received SIGINT, shutting down");
        })
        .await?;

    Ok(())
}
