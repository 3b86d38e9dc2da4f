//! Web server — axum REST API over the live position engine.
//!
//! Shared state is the core engine behind `Arc`: the store itself plus the
//! ingestor and query engine that wrap it, and a broadcast channel feeding
//! the WebSocket live feed. The reaper runs as a separate tokio task and
//! only ever touches per-vehicle status fields, so it never blocks a request.

use std::sync::Arc;
use std::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use tokio::sync::{broadcast, watch};
use tower_http::cors::{Any, CorsLayer};

use daladala_core::{
    ExpiryReaper, SnapshotQueryEngine, TrackingConfig, UpdateIngestor, VehicleStateStore,
};

pub mod ingest;
pub mod live;
pub mod routes;

/// Current UNIX epoch time in seconds.
pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub store: Arc<VehicleStateStore>,
    pub ingestor: UpdateIngestor,
    pub query: SnapshotQueryEngine,
    pub updates: broadcast::Sender<live::LiveUpdate>,
}

impl AppState {
    pub fn new(store: Arc<VehicleStateStore>) -> Self {
        let (updates, _) = broadcast::channel(256);
        AppState {
            ingestor: UpdateIngestor::new(Arc::clone(&store)),
            query: SnapshotQueryEngine::new(Arc::clone(&store)),
            store,
            updates,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/vehicles", axum::routing::get(routes::api_vehicles))
        .route(
            "/api/vehicles/:id",
            axum::routing::get(routes::api_vehicle_detail)
                .delete(routes::api_vehicle_remove),
        )
        .route("/api/stats", axum::routing::get(routes::api_stats))
        .route(
            "/api/v1/positions",
            axum::routing::post(ingest::api_ingest_positions),
        )
        .route("/ws", axum::routing::get(live::ws_feed))
        .with_state(state)
        .layer(cors)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Start the web server and the reaper, run until ctrl-c, then drain:
/// in-flight requests finish via graceful shutdown and the reaper completes
/// its current sweep before the task is joined.
pub async fn serve(config: TrackingConfig, host: String, port: u16) -> std::io::Result<()> {
    let store = Arc::new(VehicleStateStore::new(config));
    let state = Arc::new(AppState::new(Arc::clone(&store)));
    let app = build_router(state);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper_task = tokio::spawn(run_reaper(
        ExpiryReaper::new(store),
        config.reaper_interval,
        shutdown_rx,
    ));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "daladala server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, draining reaper");
    let _ = shutdown_tx.send(true);
    let _ = reaper_task.await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Periodic sweep driver. A tick in progress always runs to completion;
/// shutdown is only observed between sweeps.
async fn run_reaper(
    reaper: ExpiryReaper,
    interval_secs: f64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stats = reaper.sweep(now());
                tracing::debug!(
                    checked = stats.checked,
                    stale = stats.marked_stale,
                    offline = stats.marked_offline,
                    skipped = stats.skipped,
                    "reaper sweep complete"
                );
            }
            _ = shutdown.changed() => break,
        }
    }
}
