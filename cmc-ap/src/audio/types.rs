//! Sound backend interface
//!
//! A backend turns note triggers into sound. The playback engine never talks
//! to a backend directly; it goes through [`super::AudioContext`], which gates
//! every call on the one-time initialization handshake.

use std::time::Duration;

use cmc_common::Pitch;

use crate::error::Result;

/// One note to sound immediately
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteTrigger {
    pub pitch: Pitch,
    /// Gate length (attack to release start)
    pub duration: Duration,
    /// Normalized loudness in [0, 1]
    pub velocity: f32,
}

/// Sound-producing backend
///
/// Implementations must be cheap to call from the scheduler task:
/// `trigger_attack_release` should hand the note off and return, not block
/// for the length of the note.
pub trait SoundBackend: Send + Sync {
    /// Short identifier for logs and the playback state endpoint
    fn name(&self) -> &'static str;

    /// One-time handshake (open the device, start the stream)
    ///
    /// May block; the audio context runs it on a blocking thread.
    fn initialize(&self) -> Result<()>;

    /// Start a note now and release it after `note.duration`
    fn trigger_attack_release(&self, note: NoteTrigger);

    /// Master volume in decibels (0 dB = unity)
    fn set_volume_db(&self, db: f64);
}

/// Convert decibels to a linear gain factor
pub fn db_to_gain(db: f64) -> f32 {
    10f64.powf(db / 20.0) as f32
}
