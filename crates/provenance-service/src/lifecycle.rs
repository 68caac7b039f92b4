//! Serving and graceful shutdown
//!
//! Shutdown runs in three stages:
//! 1. Stop accepting connections and let in-flight requests finish within
//!    the drain window.
//! 2. Requests still running are answered with 503 and their connections
//!    close, within the force window.
//! 3. Whatever is still open after that is destroyed with the server task.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::api::error::ErrorResponse;

/// Grace windows for shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownConfig {
    pub drain_grace: Duration,
    pub force_grace: Duration,
}

/// Stage that ended the shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every request finished within the drain window
    Drained,
    /// Remaining requests were cut off and their connections closed
    ForceClosed,
    /// Connections outlived both windows and were dropped with the server
    Destroyed,
}

/// Serve `router` until `signal` resolves, then shut down in stages
pub async fn serve_until<F>(
    listener: TcpListener,
    router: Router,
    signal: F,
    config: ShutdownConfig,
) -> io::Result<ShutdownOutcome>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (force_tx, force_rx) = watch::channel(false);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let app = router.layer(middleware::from_fn_with_state(force_rx, force_close));
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // Server stopped on its own
            return join_result(result).map(|()| ShutdownOutcome::Drained);
        }
        _ = signal => {}
    }

    info!(
        grace_secs = config.drain_grace.as_secs_f64(),
        "Shutting down: draining in-flight requests"
    );
    let _ = stop_tx.send(());

    if let Ok(result) = tokio::time::timeout(config.drain_grace, &mut server).await {
        join_result(result)?;
        info!("All connections drained");
        return Ok(ShutdownOutcome::Drained);
    }

    warn!(
        grace_secs = config.force_grace.as_secs_f64(),
        "Drain window elapsed: closing remaining connections"
    );
    let _ = force_tx.send(true);

    if let Ok(result) = tokio::time::timeout(config.force_grace, &mut server).await {
        join_result(result)?;
        warn!("Remaining connections force-closed");
        return Ok(ShutdownOutcome::ForceClosed);
    }

    error!("Connections still open after the force window: destroying server");
    server.abort();
    Ok(ShutdownOutcome::Destroyed)
}

fn join_result(result: Result<io::Result<()>, JoinError>) -> io::Result<()> {
    match result {
        Ok(served) => served,
        Err(e) => Err(io::Error::other(e)),
    }
}

async fn force_close(
    State(mut force): State<watch::Receiver<bool>>,
    request: Request,
    next: Next,
) -> Response {
    tokio::select! {
        response = next.run(request) => response,
        _ = forced(&mut force) => {
            let body = ErrorResponse {
                error: "Service is shutting down".into(),
                code: "SHUTTING_DOWN".into(),
                details: None,
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// Resolves once the force flag is raised; never if the sender is gone
async fn forced(force: &mut watch::Receiver<bool>) {
    loop {
        if *force.borrow_and_update() {
            return;
        }
        if force.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
