//! HTTP server setup and routing
//!
//! Sets up the Axum router for grid, melody and transport endpoints plus SSE.

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::playback::PlaybackEngine;
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use cmc_common::events::CmcEvent;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub engine: Arc<PlaybackEngine>,
    pub config: Arc<PlayerConfig>,
}

/// Forward engine callbacks onto the event broadcaster
pub fn wire_engine_events(engine: &PlaybackEngine, state: &Arc<SharedState>) {
    let column_state = Arc::clone(state);
    engine.on_column_change(move |column, pitch| {
        column_state.broadcast_event(CmcEvent::ColumnChanged {
            column,
            pitch,
            timestamp: Utc::now(),
        });
    });

    let stop_state = Arc::clone(state);
    engine.on_stop(move || {
        stop_state.broadcast_event(CmcEvent::PlaybackStopped {
            timestamp: Utc::now(),
        });
    });
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        // Canvas
        .route("/grid", get(super::handlers::get_grid))
        .route("/grid/cells", post(super::handlers::place_cell))
        .route("/grid/clear", post(super::handlers::clear_grid))
        .route("/colors", get(super::handlers::list_colors))
        .route("/melody", get(super::handlers::get_melody))
        // Transport
        .route("/playback/play", post(super::handlers::play))
        .route("/playback/stop", post(super::handlers::stop))
        .route("/playback/state", get(super::handlers::get_playback_state))
        .route("/playback/tempo", post(super::handlers::set_tempo))
        .route("/playback/volume", post(super::handlers::set_volume))
        .route("/audio/devices", get(super::handlers::list_audio_devices))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run<F>(ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.config.port));
    let app = create_router(ctx);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
