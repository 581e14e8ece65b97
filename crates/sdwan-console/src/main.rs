//! SD-WAN demo console
//!
//! Single binary that runs:
//! - The demo page and its REST API
//! - The stepped demo session driving two traffic controllers
//! - A server-sent event stream of display updates

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sdwan_common::{ImpairmentProfile, LogLevel, Logger};
use sdwan_console::api::{self, ConsoleState};
use sdwan_console::client::{HttpTransport, ImpairmentClient, Transport};
use sdwan_console::config::ConsoleConfigInput;
use sdwan_console::display::LogObserver;
use sdwan_console::sequencer::DemoSequencer;
use sdwan_console::session::DemoSession;

#[derive(Parser, Debug)]
#[command(name = "sdwan-console", about = "SD-WAN impairment demo console")]
struct Cli {
    /// TOML config file.
    #[arg(long, env = "SDWAN_CONSOLE_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen address.
    #[arg(long, env = "LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Primary traffic controller URL.
    #[arg(long, env = "PRIMARY_ENDPOINT")]
    primary_endpoint: Option<String>,

    /// Secondary traffic controller URL.
    #[arg(long, env = "SECONDARY_ENDPOINT")]
    secondary_endpoint: Option<String>,

    /// Demo logging level: error, debug or info.
    #[arg(long, env = "LOGGING_LEVEL")]
    logging_level: Option<LogLevel>,

    /// Milliseconds between run-phase ticks.
    #[arg(long)]
    tick_interval_ms: Option<u64>,
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
        Some(path) => ConsoleConfigInput::from_file(path)?,
        None => ConsoleConfigInput::default(),
    };
    input.listen_addr = cli.listen_addr.or(input.listen_addr);
    input.primary_endpoint = cli.primary_endpoint.or(input.primary_endpoint);
    input.secondary_endpoint = cli.secondary_endpoint.or(input.secondary_endpoint);
    input.logging_level = cli.logging_level.or(input.logging_level);
    input.demo.tick_interval_ms = cli.tick_interval_ms.or(input.demo.tick_interval_ms);
    let config = input.resolve()?;

    // ── Session ─────────────────────────────────────────────────
    let logger = Logger::new(config.logging_level);
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(config.request_timeout, logger.clone())?);

    let mut primary = ImpairmentClient::new("primary", transport.clone(), logger.clone());
    primary.configure(ImpairmentProfile::with_endpoint(&config.primary_endpoint));
    let mut secondary = ImpairmentClient::new("secondary", transport, logger.clone());
    secondary.configure(ImpairmentProfile::with_endpoint(&config.secondary_endpoint));

    let session = DemoSession::new(
        DemoSequencer::new(config.sequencer.clone()),
        primary,
        secondary,
        logger.clone(),
    );
    session
        .add_observer(Arc::new(LogObserver::new(logger.clone())))
        .await;

    // ── Router ──────────────────────────────────────────────────
    let app = api::router(ConsoleState {
        session,
        logger: logger.clone(),
    })
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive());

    // ── Listen ──────────────────────────────────────────────────
    tracing::info!(
        addr = %config.listen_addr,
        primary = %config.primary_endpoint,
        secondary = %config.secondary_endpoint,
        logging_level = %config.logging_level,
        "sdwan-console listening"
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
