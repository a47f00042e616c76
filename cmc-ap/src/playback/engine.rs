//! Playback engine
//!
//! Realizes a compiled melody in time. One tokio task per run walks the
//! [`Schedule`], sleeping on the [`TransportClock`] until each note is due,
//! and finishes with a terminal stop shortly after the last event.
//!
//! **Cancellation:** every run carries a generation number. `stop()` and a
//! restarting `start()` bump the generation under the state lock, and the
//! run task re-checks it under that lock before each dispatch. A shared
//! dispatch gate serializes note firing with stopping, so once `stop()`
//! returns no note of the cancelled run will sound and the stop callback
//! has fired exactly once.
//!
//! Callbacks run on the dispatch gate and must not call back into
//! `start()` or `stop()`.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use cmc_common::colors::DurationClass;
use cmc_common::events::PlaybackState;
use cmc_common::timing::beats_to_seconds;
use cmc_common::{compile, Grid, Pitch};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::schedule::{Schedule, ScheduledNote};
use super::transport::TransportClock;
use crate::audio::{AudioContext, NoteTrigger};
use crate::error::{Error, Result};

type ColumnCallback = Box<dyn Fn(usize, Pitch) + Send + Sync>;
type StopCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Debug)]
struct Inner {
    state: PlaybackState,
    generation: u64,
    current_column: Option<usize>,
    tempo_bpm: f64,
    task: Option<JoinHandle<()>>,
}

struct EngineShared {
    inner: Mutex<Inner>,
    /// Held while a note or the stop callback is dispatched
    dispatch: Mutex<()>,
    on_column: RwLock<Option<ColumnCallback>>,
    on_stop: RwLock<Option<StopCallback>>,
    audio: Arc<AudioContext>,
    tempo_tx: watch::Sender<f64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn validate_bpm(bpm: f64) -> Result<()> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(Error::Playback(format!("Invalid tempo: {} bpm", bpm)))
    }
}

impl EngineShared {
    /// Fire one note if its run is still current
    ///
    /// Returns false when the run has been cancelled.
    fn fire_note(&self, generation: u64, note: &ScheduledNote) -> bool {
        let _gate = lock(&self.dispatch);

        let bpm = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation {
                return false;
            }
            inner.current_column = Some(note.column);
            inner.tempo_bpm
        };

        let trigger = NoteTrigger {
            pitch: note.pitch,
            duration: Duration::from_secs_f64(beats_to_seconds(note.duration.beats(), bpm)),
            velocity: note.velocity,
        };
        if let Err(e) = self.audio.trigger(trigger) {
            warn!("Note at column {} not sounded: {}", note.column, e);
        }

        if let Some(callback) = self.on_column.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            callback(note.column, note.pitch);
        }
        true
    }

    /// Transition to Idle and notify, if `generation` (or any run, for None) is current
    fn finish(&self, generation: Option<u64>) -> bool {
        let _gate = lock(&self.dispatch);

        let task = {
            let mut inner = lock(&self.inner);
            if inner.state == PlaybackState::Idle {
                return false;
            }
            if generation.is_some_and(|g| g != inner.generation) {
                return false;
            }
            inner.generation += 1;
            inner.state = PlaybackState::Idle;
            inner.current_column = None;
            inner.task.take()
        };

        // From inside the run task this only detaches our own handle
        if generation.is_none() {
            if let Some(task) = task {
                task.abort();
            }
        }

        if let Some(callback) = self.on_stop.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            callback();
        }
        true
    }
}

async fn run_schedule(
    shared: Arc<EngineShared>,
    generation: u64,
    schedule: Schedule,
    mut tempo_rx: watch::Receiver<f64>,
) {
    let mut clock = TransportClock::start(Instant::now());
    let mut next = 0;

    loop {
        let target = schedule
            .notes
            .get(next)
            .map(|n| n.at_secs)
            .unwrap_or_else(|| schedule.stop_at_secs());
        let deadline = clock.instant_for(target);

        tokio::select! {
            _ = sleep_until(deadline) => {
                match schedule.notes.get(next) {
                    Some(note) => {
                        if !shared.fire_note(generation, note) {
                            debug!("Run {} cancelled", generation);
                            return;
                        }
                        next += 1;
                    }
                    None => {
                        if shared.finish(Some(generation)) {
                            info!("Playback finished");
                        }
                        return;
                    }
                }
            }
            changed = tempo_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                let bpm = *tempo_rx.borrow_and_update();
                clock.set_rate(bpm / schedule.bpm, Instant::now());
                debug!("Transport rate now {:.3} ({} bpm)", clock.rate(), bpm);
            }
        }
    }
}

/// Playback scheduler with an Idle/Playing state machine
///
/// Cheap to clone; clones share the same transport.
#[derive(Clone)]
pub struct PlaybackEngine {
    shared: Arc<EngineShared>,
}

impl PlaybackEngine {
    pub fn new(audio: Arc<AudioContext>, tempo_bpm: f64) -> Self {
        let (tempo_tx, _) = watch::channel(tempo_bpm);
        Self {
            shared: Arc::new(EngineShared {
                inner: Mutex::new(Inner {
                    state: PlaybackState::Idle,
                    generation: 0,
                    current_column: None,
                    tempo_bpm,
                    task: None,
                }),
                dispatch: Mutex::new(()),
                on_column: RwLock::new(None),
                on_stop: RwLock::new(None),
                audio,
                tempo_tx,
            }),
        }
    }

    /// Compile `grid` and start playing it at `bpm`
    ///
    /// Returns `Ok(false)` without scheduling anything when the grid compiles
    /// to zero notes. A run already in progress is cancelled first, without
    /// a stop notification.
    ///
    /// # Errors
    /// - `Playback` for a non-positive or non-finite tempo
    /// - `AudioNotReady` if the audio context has not finished its handshake
    pub fn start(&self, grid: &Grid, bpm: f64) -> Result<bool> {
        validate_bpm(bpm)?;

        let melody = compile(grid);
        if !melody.has_notes() {
            debug!("Nothing to play");
            return Ok(false);
        }
        if !self.shared.audio.is_ready() {
            return Err(Error::AudioNotReady);
        }

        let schedule = Schedule::from_melody(&melody, bpm);
        let note_count = schedule.notes.len();
        let end_secs = schedule.end_secs;

        let _gate = lock(&self.shared.dispatch);
        let mut inner = lock(&self.shared.inner);

        if let Some(previous) = inner.task.take() {
            previous.abort();
            debug!("Cancelled run {} for restart", inner.generation);
        }
        inner.generation += 1;
        inner.state = PlaybackState::Playing;
        inner.current_column = None;
        inner.tempo_bpm = bpm;

        self.shared.tempo_tx.send_replace(bpm);
        let tempo_rx = self.shared.tempo_tx.subscribe();

        let generation = inner.generation;
        inner.task = Some(tokio::spawn(run_schedule(
            Arc::clone(&self.shared),
            generation,
            schedule,
            tempo_rx,
        )));

        info!(
            "Playback started: {} notes, {:.1}s at {} bpm",
            note_count, end_secs, bpm
        );
        Ok(true)
    }

    /// Stop playback; no-op when already idle
    pub fn stop(&self) {
        if self.shared.finish(None) {
            info!("Playback stopped");
        }
    }

    /// Change the tempo, rescaling a running transport
    ///
    /// Applies to the next run as well.
    pub fn set_tempo(&self, bpm: f64) -> Result<()> {
        validate_bpm(bpm)?;
        let mut inner = lock(&self.shared.inner);
        inner.tempo_bpm = bpm;
        self.shared.tempo_tx.send_replace(bpm);
        debug!("Tempo set to {} bpm", bpm);
        Ok(())
    }

    pub fn tempo_bpm(&self) -> f64 {
        lock(&self.shared.inner).tempo_bpm
    }

    /// Master volume in decibels
    pub fn set_volume(&self, db: f64) {
        self.shared.audio.set_volume_db(db);
    }

    pub fn volume_db(&self) -> f64 {
        self.shared.audio.volume_db()
    }

    pub fn state(&self) -> PlaybackState {
        lock(&self.shared.inner).state
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Column of the most recently fired note; `None` when idle or before the first note
    pub fn current_column(&self) -> Option<usize> {
        lock(&self.shared.inner).current_column
    }

    /// Subscribe to note firings (replaces any previous subscriber)
    pub fn on_column_change<F>(&self, callback: F)
    where
        F: Fn(usize, Pitch) + Send + Sync + 'static,
    {
        *self.shared.on_column.write().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(callback));
    }

    /// Subscribe to transitions to Idle (replaces any previous subscriber)
    pub fn on_stop<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.shared.on_stop.write().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(callback));
    }

    /// Sound a single note now, at the current tempo
    pub fn preview(&self, pitch: Pitch, duration: DurationClass, velocity: f32) -> Result<()> {
        let seconds = beats_to_seconds(duration.beats(), self.tempo_bpm());
        self.shared.audio.trigger(NoteTrigger {
            pitch,
            duration: Duration::from_secs_f64(seconds),
            velocity,
        })
    }

    pub fn audio(&self) -> &Arc<AudioContext> {
        &self.shared.audio
    }
}
