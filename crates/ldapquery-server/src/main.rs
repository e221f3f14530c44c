use anyhow::{Context, Result};
use clap::Parser;
use ldapquery_directory::DirectoryClient;
use ldapquery_server::cli::Cli;
use ldapquery_server::{create_router, logging, AppState, PrometheusMetrics};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;
    config.check()?;

    logging::init(config.server.debug)?;

    let client = DirectoryClient::new(Arc::new(config.directory))?;
    debug!(
        hosts = ?client.config().hosts,
        port = client.config().port,
        scheme = client.config().scheme(),
        "directory configured"
    );

    // The service is useless without the directory, so refuse to start if it cannot be reached.
    match client.connect().await {
        Ok(connection) => {
            debug!(host = connection.host(), "startup directory check passed");
            connection.close().await;
        }
        Err(err) => {
            error!(error = %err, "unable to bind to directory");
            return Err(err).context("startup directory check failed");
        }
    }

    let metrics = Arc::new(PrometheusMetrics::new()?);
    let state = AppState::new(client, config.server.allowed_sources.clone(), metrics);
    let app = create_router(state);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("unable to listen on {address}"))?;

    info!(
        address = %address,
        version = env!("CARGO_PKG_VERSION"),
        "API server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
