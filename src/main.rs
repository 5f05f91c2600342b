//! qblog-api: in-memory mock of the blog API.
//!
//! ```text
//! qblog.toml → config → logging/metrics → TcpListener → MockApiServer
//!                                            ↑
//!                      Ctrl+C / SIGTERM → Shutdown
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use qblog::config::{load_or_default, validate_config};
use qblog::lifecycle::Shutdown;
use qblog::observability::{logging, metrics};
use qblog::MockApiServer;

#[derive(Parser)]
#[command(name = "qblog-api")]
#[command(about = "In-memory mock of the qblog API", long_about = None)]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
        validate_config(&config).map_err(qblog::config::ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "qblog-api starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        allowed_origin = %config.server.allowed_origin,
        request_timeout_secs = config.server.request_timeout_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = MockApiServer::new(&config.server)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
