//! Smart hedging dispatcher.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                  SMART DISPATCHER                     │
//!                        │                                                       │
//!   GET /api/smart       │  ┌──────────┐   ┌───────────┐   ┌─────────────────┐   │
//!  ──────────────────────┼─▶│   http   │──▶│ admission │──▶│ hedge dispatcher│   │
//!                        │  │  server  │   │   gate    │   └───────┬─────────┘   │
//!                        │  └──────────┘   └───────────┘           │             │
//!                        │                          ┌──────────────┼──────────┐  │
//!                        │                          ▼              ▼          ▼  │
//!                        │                     worker 0 ...   worker N-1   guards │     Upstream
//!                        │                          │              │          │  │◀───▶ /api/work
//!                        │                          └──── outcome channel ────┘  │
//!   Response             │  ┌──────────┐                           │             │
//!  ◀─────────────────────┼──│ response │◀──────── first outcome ───┘             │
//!                        │  │  writer  │                                         │
//!                        │  └──────────┘                                         │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use smart_hedge::config::{load_config, validate_config, ConfigError, DispatcherConfig};
use smart_hedge::lifecycle::{shutdown_signal, Shutdown};
use smart_hedge::observability::{logging, metrics};
use smart_hedge::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "smart-hedge")]
#[command(about = "Races staggered calls to one upstream and returns the first success", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening host.
    #[arg(long)]
    host: Option<String>,

    /// Listening port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Remote service URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Attempts per inbound request.
    #[arg(long)]
    fan_out: Option<usize>,

    /// Milliseconds between attempt starts.
    #[arg(long)]
    stagger_ms: Option<u64>,

    /// Deadline in milliseconds when the caller gives none.
    #[arg(long)]
    default_timeout_ms: Option<u64>,

    /// In-flight request bound before answering 429.
    #[arg(long)]
    max_requests: Option<usize>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Layer command-line flags over the file/default configuration.
    fn apply(self, config: &mut DispatcherConfig) {
        if let Some(host) = self.host {
            config.listener.host = host;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(url) = self.url {
            config.upstream.url = url;
        }
        if let Some(fan_out) = self.fan_out {
            config.hedging.fan_out = fan_out;
        }
        if let Some(stagger_ms) = self.stagger_ms {
            config.hedging.stagger_ms = stagger_ms;
        }
        if let Some(timeout_ms) = self.default_timeout_ms {
            config.hedging.default_timeout_ms = timeout_ms;
        }
        if let Some(max) = self.max_requests {
            config.admission.max_in_flight = max;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = Cli::parse();

    let mut config = match cli.config.take() {
        Some(path) => load_config(&path)?,
        None => DispatcherConfig::default(),
    };
    cli.apply(&mut config);

    logging::init_logging(&config.observability.log_level);
    tracing::info!("smart-hedge v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err(ConfigError::Validation(errors).into());
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(config.clone())?;

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
