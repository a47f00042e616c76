//! Collective Melody Canvas audio player (cmc-ap) - Main entry point
//!
//! Serves the canvas API, compiles the grid into a melody and plays it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cmc_ap::api::{self, AppContext};
use cmc_ap::audio::{backend_for, AudioContext};
use cmc_ap::config::{AudioBackendKind, PlayerConfig};
use cmc_ap::playback::PlaybackEngine;
use cmc_ap::SharedState;
use cmc_common::config::{load_config, CONFIG_ENV_VAR};
use cmc_common::GridDimensions;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cmc-ap
///
/// Anything given here overrides the config file.
#[derive(Parser, Debug)]
#[command(name = "cmc-ap")]
#[command(about = "Collective Melody Canvas audio player")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CMC_AP_PORT")]
    port: Option<u16>,

    /// Config file (falls back to $CMC_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sound backend: log or cpal
    #[arg(short, long, env = "CMC_AUDIO_BACKEND")]
    backend: Option<AudioBackendKind>,

    /// Starting tempo in BPM
    #[arg(short, long, env = "CMC_TEMPO_BPM")]
    tempo: Option<f64>,

    /// Demo notes scattered on startup and after each clear
    #[arg(long, env = "CMC_DEMO_NOTES")]
    demo_notes: Option<usize>,

    /// RNG seed for reproducible demo notes
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut PlayerConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(backend) = self.backend {
            config.audio_backend = backend;
        }
        if let Some(tempo) = self.tempo {
            config.tempo_bpm = tempo;
        }
        if let Some(demo_notes) = self.demo_notes {
            config.demo_notes = demo_notes;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cmc_ap=debug,cmc_common=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config: PlayerConfig = load_config(args.config.as_deref(), CONFIG_ENV_VAR)
        .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        "Starting CMC audio player on port {} ({} backend, {} bpm, {} dB)",
        config.port, config.audio_backend, config.tempo_bpm, config.volume_db
    );

    let backend = backend_for(config.audio_backend).context("Failed to create audio backend")?;
    let audio = Arc::new(AudioContext::new(backend, config.volume_db));
    let engine = Arc::new(PlaybackEngine::new(audio, config.tempo_bpm));
    info!("Playback engine initialized");

    let state = Arc::new(SharedState::new(GridDimensions::default()));
    api::wire_engine_events(&engine, &state);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let snapshot = state.reset_grid(config.demo_notes, &mut rng).await;
    info!(
        "Canvas {}x{} seeded with {} notes",
        snapshot.grid.columns(),
        snapshot.grid.rows(),
        snapshot.grid.occupied_count()
    );

    let ctx = AppContext {
        state,
        engine: Arc::clone(&engine),
        config: Arc::new(config),
    };

    api::run(ctx, shutdown_signal()).await.context("Server error")?;

    engine.stop();
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
