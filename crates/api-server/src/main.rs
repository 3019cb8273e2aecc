//! Task manager API server
//!
//! Serves the tasks REST API backed by a JSON file. Every request runs under
//! a cancellable, time-bounded context rooted in the server's shutdown
//! signal.

mod config;
mod delay;
mod middleware;
mod routes;
mod state;

use std::process::ExitCode;

use tm_core::RequestContext;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_server=debug,tm_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Using tasks file: {:?}", config.tasks_file);

    // Cancelled on shutdown; parent of every request context
    let shutdown = RequestContext::background();

    let app_state = match AppState::new(config.clone(), shutdown.clone()).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Service init error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Listen error on {}: {}", config.addr, e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Server running on {}", config.addr);

    let app = routes::app(app_state);
    let stop = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop.done().await })
            .await
    });

    tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
        result = &mut server => {
            return match result {
                Ok(Ok(())) => ExitCode::SUCCESS,
                Ok(Err(e)) => {
                    tracing::error!("Server error: {}", e);
                    ExitCode::FAILURE
                }
                Err(e) => {
                    tracing::error!("Server task failed: {}", e);
                    ExitCode::FAILURE
                }
            };
        }
    }

    // Stop accepting and cancel everything still in flight
    shutdown.cancel();

    match tokio::time::timeout(config.shutdown_grace, &mut server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!("Shutdown error: {}", e),
        Ok(Err(e)) => tracing::error!("Server task failed: {}", e),
        Err(_) => {
            tracing::warn!(
                "Connections still open after {:?}, closing",
                config.shutdown_grace
            );
            server.abort();
        }
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
