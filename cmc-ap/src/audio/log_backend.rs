//! Log backend: traces notes instead of sounding them
//!
//! Used on machines without an audio device and as the default when the
//! `cpal` feature is disabled.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use super::types::{NoteTrigger, SoundBackend};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct LogBackend {
    notes_played: AtomicU64,
}

impl LogBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes triggered since startup
    pub fn notes_played(&self) -> u64 {
        self.notes_played.load(Ordering::Relaxed)
    }
}

impl SoundBackend for LogBackend {
    fn name(&self) -> &'static str {
        "log"
    }

    fn initialize(&self) -> Result<()> {
        info!("Log audio backend: notes will be logged, not played");
        Ok(())
    }

    fn trigger_attack_release(&self, note: NoteTrigger) {
        self.notes_played.fetch_add(1, Ordering::Relaxed);
        info!(
            pitch = %note.pitch,
            duration_ms = note.duration.as_millis() as u64,
            velocity = note.velocity,
            "♩"
        );
    }

    fn set_volume_db(&self, db: f64) {
        info!("Log backend master volume: {:.1} dB", db);
    }
}
