use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::net::TcpListener;

use kdex_gateway::config::{load_config, ProxyConfig};
use kdex_gateway::lifecycle::{signals, Shutdown};
use kdex_gateway::observability::{logging, metrics};
use kdex_gateway::HttpServer;

const DEFAULT_CONFIG: &str = "kdex.toml";

#[derive(Parser, Debug)]
#[command(name = "kdex-gateway", version, about = "Micro-frontend composing reverse proxy")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A missing default file means "run with defaults"; an explicit path must exist.
    let config = if cli.config.as_path() == Path::new(DEFAULT_CONFIG) && !cli.config.exists() {
        ProxyConfig::default()
    } else {
        load_config(&cli.config)?
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), config = %cli.config.display(), "kdex-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.proxy.upstream_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    HttpServer::new(config)?.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
