//! Integration tests for the CMC audio player API
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`, using the
//! log backend so no audio device is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::StatusCode;
use axum::Router;
use cmc_ap::api::{create_router, wire_engine_events, AppContext};
use cmc_ap::audio::{AudioContext, LogBackend};
use cmc_ap::config::PlayerConfig;
use cmc_ap::playback::PlaybackEngine;
use cmc_ap::SharedState;
use cmc_common::events::CmcEvent;
use cmc_common::GridDimensions;
use http::{Method, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup_test_server(demo_notes: usize) -> (Router, AppContext) {
    let state = Arc::new(SharedState::new(GridDimensions::default()));
    let audio = Arc::new(AudioContext::new(Arc::new(LogBackend::new()), -10.0));
    let engine = Arc::new(PlaybackEngine::new(audio, 90.0));
    wire_engine_events(&engine, &state);

    let ctx = AppContext {
        state,
        engine,
        config: Arc::new(PlayerConfig {
            demo_notes,
            ..Default::default()
        }),
    };
    (create_router(ctx.clone()), ctx)
}

async fn make_request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => builder
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup_test_server(0);
    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "cmc-ap");
}

#[tokio::test]
async fn test_grid_starts_empty() {
    let (app, _) = setup_test_server(0);
    let (status, body) = make_request(&app, Method::GET, "/grid", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 0);
    assert_eq!(body["rows"], 50);
    assert_eq!(body["columns"], 50);
    assert_eq!(body["cells"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_place_cell_and_conflicts() {
    let (app, ctx) = setup_test_server(0);
    let mut events = ctx.state.subscribe_events();

    let cell = json!({"row": 0, "column": 3, "color_index": 4});
    let (status, body) = make_request(&app, Method::POST, "/grid/cells", Some(cell.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);
    assert_eq!(body["pitch"], "C5");
    // Audio handshake has not happened yet
    assert_eq!(body["previewed"], false);

    match events.recv().await.unwrap() {
        CmcEvent::GridChanged { version, total, .. } => {
            assert_eq!(version, 1);
            assert_eq!(total, 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // Same cell again
    let (status, _) = make_request(&app, Method::POST, "/grid/cells", Some(cell)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/grid/cells",
        Some(json!({"row": 60, "column": 0, "color_index": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/grid/cells",
        Some(json!({"row": 1, "column": 0, "color_index": 12})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, grid) = make_request(&app, Method::GET, "/grid", None).await;
    assert_eq!(grid["version"], 1);
    assert_eq!(grid["cells"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_colors_catalog() {
    let (app, _) = setup_test_server(0);
    let (status, body) = make_request(&app, Method::GET, "/colors", None).await;

    assert_eq!(status, StatusCode::OK);
    let colors = body.as_array().unwrap();
    assert_eq!(colors.len(), 12);
    assert_eq!(colors[0]["name"], "Crimson");
    assert_eq!(colors[0]["duration"], "short");
    assert_eq!(colors[0]["loudness"], "loud");
    assert_eq!(colors[7]["name"], "Navy");
    assert_eq!(colors[7]["duration"], "long");
    assert_eq!(colors[7]["loudness"], "soft");
}

#[tokio::test]
async fn test_melody_of_empty_grid() {
    let (app, _) = setup_test_server(0);
    let (status, body) = make_request(&app, Method::GET, "/melody", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note_count"], 0);
    assert_eq!(body["events"].as_array().unwrap().len(), 0);
    assert_eq!(body["compressed_rest_count"], 0);
    assert_eq!(body["estimated_secs"], 0.0);
    assert_eq!(body["estimate_display"], "—");
    assert_eq!(body["phase"], "Sparse · Airy");
}

#[tokio::test]
async fn test_melody_reports_notes_and_estimate() {
    let (app, _) = setup_test_server(0);
    for column in 0..49 {
        make_request(
            &app,
            Method::POST,
            "/grid/cells",
            Some(json!({"row": 10, "column": column, "color_index": 7})),
        )
        .await;
    }

    let (_, body) = make_request(&app, Method::GET, "/melody", None).await;
    assert_eq!(body["note_count"], 49);
    assert_eq!(body["bpm"], 90.0);
    // 49 long notes (98 beats) + one rest unit (0.5 beat) at 90 bpm = 65.67s
    let secs = body["estimated_secs"].as_f64().unwrap();
    assert!((secs - 65.666).abs() < 0.01);
    assert_eq!(body["estimate_display"], "~1:05");
    assert_eq!(body["events"][0]["type"], "note");
    assert_eq!(body["events"][0]["duration"], "long");
}

#[tokio::test]
async fn test_play_empty_grid_does_not_start() {
    let (app, _) = setup_test_server(0);
    let (status, body) = make_request(&app, Method::POST, "/playback/play", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], false);

    let (_, state) = make_request(&app, Method::GET, "/playback/state", None).await;
    assert_eq!(state["playing"], false);
    assert_eq!(state["state"], "idle");
    assert_eq!(state["audio_ready"], true);
    assert_eq!(state["backend"], "log");
}

#[tokio::test]
async fn test_play_and_stop() {
    let (app, ctx) = setup_test_server(0);
    make_request(
        &app,
        Method::POST,
        "/grid/cells",
        Some(json!({"row": 25, "column": 0, "color_index": 7})),
    )
    .await;

    let mut events = ctx.state.subscribe_events();

    let (status, body) = make_request(&app, Method::POST, "/playback/play", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], true);

    let (_, state) = make_request(&app, Method::GET, "/playback/state", None).await;
    assert_eq!(state["playing"], true);

    let (status, _) = make_request(&app, Method::POST, "/playback/stop", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, state) = make_request(&app, Method::GET, "/playback/state", None).await;
    assert_eq!(state["playing"], false);
    assert_eq!(state["current_column"], Value::Null);

    // PlaybackStarted is broadcast after start; the note and stop events follow
    let mut saw_started = false;
    let mut saw_stopped = false;
    while let Ok(event) = events.try_recv() {
        match event {
            CmcEvent::PlaybackStarted { note_count, .. } => {
                assert_eq!(note_count, 1);
                saw_started = true;
            }
            CmcEvent::PlaybackStopped { .. } => saw_stopped = true,
            _ => {}
        }
    }
    assert!(saw_started);
    assert!(saw_stopped);
}

#[tokio::test]
async fn test_tempo_and_volume_are_clamped() {
    let (app, ctx) = setup_test_server(0);

    let (status, body) =
        make_request(&app, Method::POST, "/playback/tempo", Some(json!({"bpm": 500.0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bpm"], 200.0);
    assert_eq!(ctx.engine.tempo_bpm(), 200.0);

    let (status, body) =
        make_request(&app, Method::POST, "/playback/volume", Some(json!({"db": -100.0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["db"], -60.0);

    let (_, state) = make_request(&app, Method::GET, "/playback/state", None).await;
    assert_eq!(state["tempo_bpm"], 200.0);
    assert_eq!(state["volume_db"], -60.0);
}

#[tokio::test]
async fn test_clear_reseeds_demo_notes() {
    let (app, _) = setup_test_server(10);
    make_request(
        &app,
        Method::POST,
        "/grid/cells",
        Some(json!({"row": 0, "column": 0, "color_index": 0})),
    )
    .await;

    let (status, body) = make_request(&app, Method::POST, "/grid/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    let cells = body["cells"].as_array().unwrap().len();
    assert!(cells > 0 && cells <= 10);
    assert!(body["version"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn test_audio_devices_lists_backend() {
    let (app, _) = setup_test_server(0);
    let (status, body) = make_request(&app, Method::GET, "/audio/devices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "log");
}
