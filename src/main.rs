//! Slipway demo server.
//!
//! Binds the configured endpoints, answers every connection with a canned
//! response, and runs until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use futures_util::future::BoxFuture;
use tokio::io::AsyncWriteExt;

use slipway::config::loader;
use slipway::observability::{logging, metrics};
use slipway::{
    AcceptedConnection, AddressFeed, ConnectionHandler, ConnectionStream, Server, ServerConfig,
};

#[derive(Parser)]
#[command(name = "slipway")]
#[command(about = "Startup and listener-binding demo server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address fed through the out-of-band channel (repeatable).
    #[arg(short, long = "address")]
    addresses: Vec<String>,

    /// Override the configured worker count.
    #[arg(short, long)]
    workers: Option<usize>,
}

/// Answers every connection with a fixed response and closes it.
struct CannedHandler;

impl ConnectionHandler for CannedHandler {
    fn handle(&self, connection: AcceptedConnection) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            const BODY: &str = "slipway\n";
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                BODY.len(),
                BODY
            );
            match connection.into_stream() {
                ConnectionStream::Tcp(mut stream) => {
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
                #[cfg(unix)]
                ConnectionStream::Unix(mut stream) => {
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
            }
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => loader::load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    logging::init(&config.observability);

    tracing::info!(
        workers = config.workers,
        endpoints = config.listen.len(),
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    let feed = if cli.addresses.is_empty() {
        AddressFeed::with_default()
    } else {
        AddressFeed::from_addresses(cli.addresses.clone())
    };

    let mut server = Server::new(config, feed.clone());
    server.start(Arc::new(CannedHandler))?;

    for address in feed.addresses() {
        tracing::info!(address = %address, "listening");
    }

    wait_for_interrupt()?;

    server.shutdown();
    tracing::info!("shutdown complete");
    Ok(())
}

/// Block the startup thread until Ctrl-C.
fn wait_for_interrupt() -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;
    runtime.block_on(async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to wait for the interrupt signal");
        }
    });
    Ok(())
}
