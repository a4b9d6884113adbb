//! Application builder: wires router + middleware + state into an Axum app.

use std::future::Future;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use coursechat_core::config::AppConfig;
use coursechat_core::error::AppError;
use coursechat_core::result::AppResult;
use coursechat_realtime::RealtimeEngine;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

/// Serves the application on `listener` until `shutdown` resolves, then
/// disconnects every remaining WebSocket connection.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let realtime = state.realtime.clone();
    let grace = Duration::from_secs(state.config.server.shutdown_grace_seconds);
    let app = build_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    match tokio::time::timeout(grace, realtime.shutdown()).await {
        Ok(result) => result?,
        Err(_) => tracing::warn!(grace_seconds = grace.as_secs(), "Realtime shutdown timed out"),
    }

    Ok(())
}

/// Runs the CourseChat server with the given configuration.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting CourseChat server...");

    config.server.validate()?;

    let realtime = RealtimeEngine::in_memory(config.realtime.clone());
    let addr = config.server.bind_address();
    let socket_path = config.server.socket_path.clone();
    let state = AppState::new(config, realtime);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, socket_path = %socket_path, "CourseChat server listening");

    serve(listener, state, shutdown_signal()).await?;

    tracing::info!("CourseChat server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
