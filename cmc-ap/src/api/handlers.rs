//! HTTP request handlers
//!
//! Grid editing, melody inspection and transport control.

use crate::api::server::AppContext;
use crate::error::Error;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use cmc_common::colors::{color_at, COLORS};
use cmc_common::events::{CmcEvent, PlaybackState};
use cmc_common::grid::PlacedCell;
use cmc_common::melody::format_estimate;
use cmc_common::scale::row_to_pitch;
use cmc_common::stats::{grid_stats, GridStats};
use cmc_common::{compile, estimate_duration, MelodyEvent, Pitch};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

type ApiError = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct GridResponse {
    version: u64,
    rows: usize,
    columns: usize,
    cells: Vec<PlacedCell>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceCellRequest {
    row: usize,
    column: usize,
    color_index: usize,
}

#[derive(Debug, Serialize)]
pub struct PlaceCellResponse {
    version: u64,
    pitch: Pitch,
    /// Whether the note was sounded as a preview
    previewed: bool,
}

#[derive(Debug, Serialize)]
pub struct ColorInfo {
    index: usize,
    name: &'static str,
    hex: &'static str,
    duration: &'static str,
    notation: &'static str,
    velocity: f32,
    loudness: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MelodyResponse {
    grid_version: u64,
    events: Vec<MelodyEvent>,
    note_count: usize,
    compressed_rest_count: usize,
    bpm: f64,
    estimated_secs: f64,
    estimate_display: String,
    stats: GridStats,
    phase: &'static str,
    phase_description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    started: bool,
}

#[derive(Debug, Serialize)]
pub struct PlaybackStateResponse {
    state: PlaybackState,
    playing: bool,
    current_column: Option<usize>,
    tempo_bpm: f64,
    volume_db: f64,
    audio_ready: bool,
    backend: &'static str,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TempoRequest {
    pub bpm: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VolumeRequest {
    pub db: f64,
}

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    backend: &'static str,
    devices: Vec<String>,
}

// ============================================================================
// Error mapping
// ============================================================================

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Common(cmc_common::Error::CellOccupied { .. }) => StatusCode::CONFLICT,
        Error::Common(cmc_common::Error::OutOfBounds { .. })
        | Error::Common(cmc_common::Error::UnknownColor(_))
        | Error::Common(cmc_common::Error::InvalidInput(_))
        | Error::BadRequest(_)
        | Error::Playback(_) => StatusCode::BAD_REQUEST,
        Error::AudioNotReady | Error::AudioOutput(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(error: impl Into<Error>) -> ApiError {
    let error = error.into();
    let status = status_for(&error);
    if status.is_server_error() {
        error!("Request failed: {}", error);
    } else {
        warn!("Request rejected: {}", error);
    }
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", error),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "cmc-ap".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Grid Endpoints
// ============================================================================

/// GET /grid - current snapshot
pub async fn get_grid(State(ctx): State<AppContext>) -> Json<GridResponse> {
    let snapshot = ctx.state.grid().await;
    Json(GridResponse {
        version: snapshot.version,
        rows: snapshot.grid.rows(),
        columns: snapshot.grid.columns(),
        cells: snapshot.grid.placed_cells(),
    })
}

/// POST /grid/cells - place a note, previewing it when audio is up
pub async fn place_cell(
    State(ctx): State<AppContext>,
    Json(req): Json<PlaceCellRequest>,
) -> ApiResult<PlaceCellResponse> {
    let snapshot = ctx
        .state
        .place_cell(req.row, req.column, req.color_index)
        .await
        .map_err(api_error)?;

    // Placement validated both indices
    let color = color_at(req.color_index).map_err(api_error)?;
    let pitch = row_to_pitch(req.row, snapshot.grid.rows());

    let previewed = ctx.engine.audio().is_ready()
        && ctx
            .engine
            .preview(pitch, color.duration(), color.velocity())
            .is_ok();

    info!(
        "Placed {} at ({}, {}) -> {} [v{}]",
        color.name, req.row, req.column, pitch, snapshot.version
    );

    Ok(Json(PlaceCellResponse {
        version: snapshot.version,
        pitch,
        previewed,
    }))
}

/// POST /grid/clear - stop, clear, reseed
pub async fn clear_grid(State(ctx): State<AppContext>) -> Json<GridResponse> {
    ctx.engine.stop();

    let mut rng = StdRng::from_entropy();
    let snapshot = ctx.state.reset_grid(ctx.config.demo_notes, &mut rng).await;
    info!(
        "Grid cleared and reseeded with {} notes",
        snapshot.grid.occupied_count()
    );

    Json(GridResponse {
        version: snapshot.version,
        rows: snapshot.grid.rows(),
        columns: snapshot.grid.columns(),
        cells: snapshot.grid.placed_cells(),
    })
}

/// GET /colors - catalog with audio labels
pub async fn list_colors() -> Json<Vec<ColorInfo>> {
    let colors = COLORS
        .iter()
        .enumerate()
        .map(|(index, color)| ColorInfo {
            index,
            name: color.name,
            hex: color.hex,
            duration: color.duration().label(),
            notation: color.duration().notation(),
            velocity: color.velocity(),
            loudness: color.brightness.label(),
        })
        .collect();
    Json(colors)
}

/// GET /melody - compiled melody with estimate and statistics
pub async fn get_melody(State(ctx): State<AppContext>) -> Json<MelodyResponse> {
    let snapshot = ctx.state.grid().await;
    let melody = compile(&snapshot.grid);
    let bpm = ctx.engine.tempo_bpm();
    let estimated_secs = estimate_duration(&melody.events, bpm);
    let stats = grid_stats(&snapshot.grid);
    let phase = stats.phase();

    Json(MelodyResponse {
        grid_version: snapshot.version,
        note_count: melody.note_count(),
        compressed_rest_count: melody.compressed_rest_count,
        events: melody.events,
        bpm,
        estimated_secs,
        estimate_display: format_estimate(estimated_secs),
        stats,
        phase: phase.name(),
        phase_description: phase.description(),
    })
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// POST /playback/play
///
/// Completes the audio handshake if needed, then plays the current grid.
pub async fn play(State(ctx): State<AppContext>) -> ApiResult<PlayResponse> {
    ctx.engine.audio().resume().await.map_err(api_error)?;

    let snapshot = ctx.state.grid().await;
    let bpm = ctx.engine.tempo_bpm();
    let started = ctx.engine.start(&snapshot.grid, bpm).map_err(api_error)?;

    if started {
        let melody = compile(&snapshot.grid);
        ctx.state.broadcast_event(CmcEvent::PlaybackStarted {
            bpm,
            note_count: melody.note_count(),
            estimated_secs: estimate_duration(&melody.events, bpm),
            timestamp: Utc::now(),
        });
    } else {
        info!("Play requested on an empty canvas");
    }

    Ok(Json(PlayResponse { started }))
}

/// POST /playback/stop
pub async fn stop(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.engine.stop();
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// GET /playback/state
pub async fn get_playback_state(State(ctx): State<AppContext>) -> Json<PlaybackStateResponse> {
    let engine = &ctx.engine;
    Json(PlaybackStateResponse {
        state: engine.state(),
        playing: engine.is_playing(),
        current_column: engine.current_column(),
        tempo_bpm: engine.tempo_bpm(),
        volume_db: engine.volume_db(),
        audio_ready: engine.audio().is_ready(),
        backend: engine.audio().backend_name(),
    })
}

/// POST /playback/tempo - clamped to the configured range
pub async fn set_tempo(
    State(ctx): State<AppContext>,
    Json(req): Json<TempoRequest>,
) -> ApiResult<TempoRequest> {
    let bpm = ctx.config.clamp_tempo(req.bpm).map_err(api_error)?;
    ctx.engine.set_tempo(bpm).map_err(api_error)?;

    ctx.state.broadcast_event(CmcEvent::TempoChanged {
        bpm,
        timestamp: Utc::now(),
    });
    Ok(Json(TempoRequest { bpm }))
}

/// POST /playback/volume - decibels, clamped to the configured range
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> ApiResult<VolumeRequest> {
    let db = ctx.config.clamp_volume(req.db).map_err(api_error)?;
    ctx.engine.set_volume(db);

    ctx.state.broadcast_event(CmcEvent::VolumeChanged {
        db,
        timestamp: Utc::now(),
    });
    Ok(Json(VolumeRequest { db }))
}

// ============================================================================
// Audio Device Endpoints
// ============================================================================

/// GET /audio/devices - output devices visible to the cpal backend
pub async fn list_audio_devices(State(ctx): State<AppContext>) -> ApiResult<DeviceListResponse> {
    let backend = ctx.engine.audio().backend_name();

    #[cfg(feature = "cpal")]
    let devices = crate::audio::CpalBackend::list_devices().map_err(api_error)?;
    #[cfg(not(feature = "cpal"))]
    let devices = Vec::new();

    Ok(Json(DeviceListResponse { backend, devices }))
}
