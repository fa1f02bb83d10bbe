//! Duet server binary.
//!
//! Startup flow:
//!
//! 1. Initialize tracing from `RUST_LOG` (or a sensible default)
//! 2. Load configuration from environment (`PORT`, default 3000)
//! 3. Spawn the lobby actor
//! 4. Bind the listener and serve `/ws`, `/health`, `/ready`
//! 5. On Ctrl+C / SIGTERM: mark not-ready, cancel the lobby, drain

#![warn(clippy::pedantic)]

use std::sync::Arc;

use duet_server::actors::LobbyActor;
use duet_server::config::Config;
use duet_server::observability::{health_router, HealthState};
use duet_server::ws::ws_router;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duet_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Duet server");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        listen_address = %config.listen_address(),
        "Configuration loaded successfully"
    );

    let health_state = Arc::new(HealthState::new());

    // The shutdown token doubles as the lobby's cancellation token:
    // cancelling it stops the actor and the HTTP server together.
    let shutdown_token = CancellationToken::new();
    let (lobby, lobby_task) = LobbyActor::spawn(shutdown_token.clone());
    info!("Lobby actor started");

    let app = ws_router(lobby)
        .merge(health_router(Arc::clone(&health_state)))
        .layer(TraceLayer::new_for_http());

    // Bind before serving to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(config.listen_address())
        .await
        .map_err(|e| {
            error!(error = %e, addr = %config.listen_address(), "Failed to bind listener");
            e
        })?;
    health_state.set_ready();
    info!(addr = %config.listen_address(), "Listening");

    let serve_token = shutdown_token.child_token();
    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            serve_token.cancelled().await;
            info!("Server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "Server failed");
        }
    });

    info!("Duet server running - press Ctrl+C to shutdown");
    shutdown_signal().await;
    info!("Shutdown signal received, initiating graceful shutdown...");

    // Stop routing new peers, then stop the lobby. In-flight sessions are
    // not migrated; clients re-issue findPartner on reconnect.
    health_state.set_not_ready();
    shutdown_token.cancel();
    let _ = server_task.await;
    let _ = lobby_task.await;

    info!("Duet server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable
/// because without signal handlers the process cannot shut down cleanly.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
