//! Task Man - A task service with expiry alerts
//!
//! Keeps an in-memory index of tasks ordered by expiry and fires a one-time
//! alert for each task shortly before it expires.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_man::api::create_router;
use task_man::scheduling::{seed_index, LogNotifier};
use task_man::store::TaskStore;
use task_man::{AppState, Config, ExpiryIndex, ExpiryScheduler, SchedulerHandle};

/// Main entry point for the task service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Load the task store and seed the expiry index from it
/// 4. Start the expiry scheduler thread
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM, stop the server and then the scheduler
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_man=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Task Man");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, alert_threshold={}s, poll_interval={}ms, data_file={:?}",
        config.server_port, config.alert_threshold_secs, config.poll_interval_ms, config.data_file
    );

    let store = match &config.data_file {
        Some(path) => TaskStore::load(path)
            .await
            .with_context(|| format!("failed to load tasks from {}", path.display()))?,
        None => TaskStore::new(),
    };

    // The index must be seeded before the scheduler starts polling it
    let index = Arc::new(ExpiryIndex::new());
    seed_index(&index, &store, Utc::now());

    let scheduler = ExpiryScheduler::from_config(Arc::clone(&index), Arc::new(LogNotifier), &config);
    let state = AppState::new(store, index)
        .with_stats(scheduler.stats())
        .with_data_file(config.data_file.clone());

    let scheduler = scheduler
        .start()
        .context("failed to start expiry scheduler")?;
    info!("Expiry scheduler started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    stop_scheduler(scheduler).await;
    served.context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Stops the scheduler and waits for its thread to finish the current poll.
async fn stop_scheduler(scheduler: SchedulerHandle) {
    scheduler.stop();

    match tokio::task::spawn_blocking(move || scheduler.join()).await {
        Ok(Ok(())) => info!("Expiry scheduler joined"),
        Ok(Err(_)) => error!("Expiry scheduler thread panicked"),
        Err(err) => warn!("Failed to join expiry scheduler: {}", err),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
