//! Ferryman - Slack-Matrix message normalization bridge
//!
//! Reads one JSON request per line on stdin and answers each with one JSON
//! line on stdout. Logs go to stderr.

use std::sync::Arc;

use anyhow::Result;
use futures::{future, stream, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{debug, error, info, warn};

use ferryman::common::messages::{BridgeRequest, BridgeResponse};
use ferryman::config::{env::get_config_path, load_and_validate};
use ferryman::{AppError, Bridge, StaticDirectory};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Ferryman v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Team: {}", config.bridge.team_name);
    info!("  Homeserver: {}", config.bridge.homeserver);
    info!("  Puppet: {}", config.puppet.id);
    info!("  Notify mode: {:?}", config.notify_mode());

    let bridge = Arc::new(Bridge::new(&config));
    let directory = Arc::new(StaticDirectory::from_config(&config));
    let concurrency = config.concurrency();

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => true,
        result = serve(bridge, directory, concurrency) => {
            result?;
            false
        }
    };

    if shutdown {
        info!("Shutdown signal received");
    } else {
        info!("Input closed");
    }
    info!("Exiting...");
    Ok(())
}

/// Answer requests from stdin until it closes.
///
/// Up to `concurrency` requests are normalized at once; answers are written
/// in request order.
async fn serve(
    bridge: Arc<Bridge>,
    directory: Arc<StaticDirectory>,
    concurrency: usize,
) -> Result<()> {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    let requests = stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                None
            }
        }
    })
    .filter(|line| future::ready(!line.trim().is_empty()));

    let responses = requests
        .map(|line| {
            let bridge = Arc::clone(&bridge);
            let directory = Arc::clone(&directory);
            async move { answer(&bridge, directory.as_ref(), &line).await }
        })
        .buffered(concurrency);
    tokio::pin!(responses);

    let mut stdout = tokio::io::stdout();
    while let Some(response) = responses.next().await {
        let mut line = serde_json::to_string(&response)?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

async fn answer(bridge: &Bridge, directory: &StaticDirectory, line: &str) -> BridgeResponse {
    match parse_request(line) {
        Ok(request) => {
            debug!(request = ?request, "Handling request");
            bridge.handle_request(request, directory).await
        }
        Err(e) => {
            warn!("Rejecting request: {}", e);
            BridgeResponse::Error {
                message: e.to_string(),
            }
        }
    }
}

fn parse_request(line: &str) -> Result<BridgeRequest, AppError> {
    Ok(serde_json::from_str(line)?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
