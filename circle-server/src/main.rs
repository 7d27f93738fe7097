use std::env;
use std::net::TcpListener;

use anyhow::Context;
use circle_server::{serve, Config, State};
use tokio::signal::ctrl_c;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("circle_server=info,tower_http=info")),
        )
        .init();

    let mut config = Config::load()?;
    if let Some(port) = env::args().nth(1) {
        config.port = port.parse().with_context(|| format!("Invalid port argument: {port}"))?;
    }

    info!("Initializing state...");
    let state = State::new(config.clone()).await?;

    let address = config.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).with_context(|| format!("Error binding {address}"))?;

    serve(listener, state, shutdown_signal()).await?;
    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
