//! Beat-based timing
//!
//! Melodies are laid out in beats (beat = quarter note). Wall-clock time is
//! derived only at the edges, from a tempo in BPM:
//!
//! ```text
//! seconds_per_beat = 60 / bpm
//! event_time       = cumulative_beats × seconds_per_beat
//! ```
//!
//! Duration estimation and the playback scheduler both walk events through
//! [`beat_offsets`], so the displayed estimate and the real schedule cannot
//! drift apart.
//!
//! # Examples
//!
//! ```rust
//! use cmc_common::timing::*;
//!
//! assert_eq!(seconds_per_beat(60.0), 1.0);
//! assert_eq!(beats_to_seconds(3.0, 120.0), 1.5);
//! ```

use crate::melody::MelodyEvent;

/// Beats contributed by one rest unit
pub const REST_UNIT_BEATS: f64 = 0.5;

/// Delay after the last computed end time before the transport auto-stops
pub const END_OF_SEQUENCE_PADDING_SECS: f64 = 0.1;

/// Tempo used when none is configured
pub const DEFAULT_BPM: f64 = 90.0;

/// Seconds per beat at `bpm`
pub fn seconds_per_beat(bpm: f64) -> f64 {
    60.0 / bpm
}

/// Convert a beat position or length to seconds at `bpm`
pub fn beats_to_seconds(beats: f64, bpm: f64) -> f64 {
    beats * seconds_per_beat(bpm)
}

/// Convert seconds to beats at `bpm`
pub fn seconds_to_beats(seconds: f64, bpm: f64) -> f64 {
    seconds / seconds_per_beat(bpm)
}

/// Starting beat of every event, plus the total length in beats
///
/// Offsets are strictly increasing because every event costs > 0 beats.
pub fn beat_offsets(events: &[MelodyEvent]) -> (Vec<f64>, f64) {
    let mut offsets = Vec::with_capacity(events.len());
    let mut cursor = 0.0;
    for event in events {
        offsets.push(cursor);
        cursor += event.beats();
    }
    (offsets, cursor)
}
