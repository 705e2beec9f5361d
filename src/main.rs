use std::net::{Ipv4Addr, SocketAddr};

use opentelemetry::global;
use ticketdesk::{app, initialize_state, spawn_refresh, telemetry};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl+c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // the final subscriber depends on the configuration, so reading it logs to a plain one.
    let config = tracing::subscriber::with_default(tracing_subscriber::fmt().finish(), || {
        ticketdesk::config::Configuration::default().read()
    })?;

    // initialize logging, with OTLP export when configured.
    let otlp = match config.telemetry {
        Some(ref telemetry) => {
            let tracer = telemetry::setup_tracer(&telemetry.endpoint)?;
            global::set_tracer_provider(tracer);
            Some(telemetry::setup_logging(&telemetry.endpoint)?)
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(otlp)
        .init();

    let metrics = match telemetry::setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "cannot install prometheus recorder");
            None
        },
    };

    let state = initialize_state(config, metrics).await?;
    let refresh = spawn_refresh(&state);

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, state.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh.abort();
    Ok(())
}
