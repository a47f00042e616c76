//! Two-phase audio context
//!
//! Sound output needs a one-time, possibly slow or refused, initialization
//! step before anything can play. The context makes that explicit:
//!
//! ```text
//! Uninitialized --resume()--> Ready
//! ```
//!
//! Every sound-producing call made while `Uninitialized` is rejected with
//! [`Error::AudioNotReady`]. Callers await [`AudioContext::resume`] before
//! relying on playback.

use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::types::{NoteTrigger, SoundBackend};
use crate::error::{Error, Result};

/// Initialization state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    Ready,
}

/// Gatekeeper between the engine and a [`SoundBackend`]
pub struct AudioContext {
    backend: Arc<dyn SoundBackend>,
    state: Mutex<ContextState>,
    /// Serializes concurrent resume() calls so the handshake runs once
    handshake: AsyncMutex<()>,
    volume_db: Mutex<f64>,
}

impl AudioContext {
    pub fn new(backend: Arc<dyn SoundBackend>, volume_db: f64) -> Self {
        backend.set_volume_db(volume_db);
        Self {
            backend,
            state: Mutex::new(ContextState::Uninitialized),
            handshake: AsyncMutex::new(()),
            volume_db: Mutex::new(volume_db),
        }
    }

    pub fn state(&self) -> ContextState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ContextState::Ready
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Run the initialization handshake if it has not completed yet
    ///
    /// Idempotent: once `Ready`, further calls return immediately. A failed
    /// handshake leaves the context `Uninitialized` so it can be retried.
    pub async fn resume(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        let _guard = self.handshake.lock().await;
        if self.is_ready() {
            return Ok(());
        }

        debug!("Starting audio handshake ({})", self.backend.name());
        let backend = Arc::clone(&self.backend);
        let result = tokio::task::spawn_blocking(move || backend.initialize())
            .await
            .map_err(|e| Error::Internal(format!("Audio handshake task failed: {}", e)))?;

        match result {
            Ok(()) => {
                *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ContextState::Ready;
                info!("Audio context ready ({})", self.backend.name());
                Ok(())
            }
            Err(e) => {
                warn!("Audio handshake failed: {}", e);
                Err(e)
            }
        }
    }

    /// Sound a note now
    pub fn trigger(&self, note: NoteTrigger) -> Result<()> {
        if !self.is_ready() {
            return Err(Error::AudioNotReady);
        }
        self.backend.trigger_attack_release(note);
        Ok(())
    }

    /// Set master volume in decibels
    ///
    /// Allowed before the handshake; the backend applies it once it starts.
    pub fn set_volume_db(&self, db: f64) {
        *self.volume_db.lock().unwrap_or_else(|e| e.into_inner()) = db;
        self.backend.set_volume_db(db);
    }

    pub fn volume_db(&self) -> f64 {
        *self.volume_db.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmc_common::Pitch;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingBackend {
        init_calls: AtomicUsize,
        triggers: AtomicUsize,
        fail_init: bool,
    }

    impl SoundBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn initialize(&self) -> Result<()> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                Err(Error::AudioOutput("no device".to_string()))
            } else {
                Ok(())
            }
        }

        fn trigger_attack_release(&self, _note: NoteTrigger) {
            self.triggers.fetch_add(1, Ordering::SeqCst);
        }

        fn set_volume_db(&self, _db: f64) {}
    }

    fn note() -> NoteTrigger {
        NoteTrigger {
            pitch: Pitch::from_midi(60),
            duration: Duration::from_millis(500),
            velocity: 0.62,
        }
    }

    #[tokio::test]
    async fn test_trigger_rejected_until_ready() {
        let backend = Arc::new(CountingBackend::default());
        let ctx = AudioContext::new(backend.clone(), -10.0);

        assert_eq!(ctx.state(), ContextState::Uninitialized);
        assert!(matches!(ctx.trigger(note()), Err(Error::AudioNotReady)));
        assert_eq!(backend.triggers.load(Ordering::SeqCst), 0);

        ctx.resume().await.unwrap();
        assert_eq!(ctx.state(), ContextState::Ready);
        ctx.trigger(note()).unwrap();
        assert_eq!(backend.triggers.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resume_runs_handshake_once() {
        let backend = Arc::new(CountingBackend::default());
        let ctx = AudioContext::new(backend.clone(), -10.0);

        ctx.resume().await.unwrap();
        ctx.resume().await.unwrap();
        assert_eq!(backend.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_handshake_stays_uninitialized() {
        let backend = Arc::new(CountingBackend {
            fail_init: true,
            ..Default::default()
        });
        let ctx = AudioContext::new(backend.clone(), -10.0);

        assert!(matches!(ctx.resume().await, Err(Error::AudioOutput(_))));
        assert!(!ctx.is_ready());

        // Retry is allowed
        assert!(ctx.resume().await.is_err());
        assert_eq!(backend.init_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_volume_before_ready() {
        let ctx = AudioContext::new(Arc::new(CountingBackend::default()), -10.0);
        assert_eq!(ctx.volume_db(), -10.0);
        ctx.set_volume_db(-24.0);
        assert_eq!(ctx.volume_db(), -24.0);
    }
}
