//! Event types for the CMC event stream
//!
//! Broadcast by the audio player and streamed to clients over SSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scale::Pitch;

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
}

/// CMC event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CmcEvent {
    /// A playback run was scheduled
    PlaybackStarted {
        bpm: f64,
        note_count: usize,
        estimated_secs: f64,
        timestamp: DateTime<Utc>,
    },

    /// A note fired; `column` is the playhead position
    ColumnChanged {
        column: usize,
        pitch: Pitch,
        timestamp: DateTime<Utc>,
    },

    /// Transport returned to idle (explicit stop or end of sequence)
    PlaybackStopped { timestamp: DateTime<Utc> },

    /// The grid was mutated and a new snapshot published
    GridChanged {
        version: u64,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// Transport tempo changed
    TempoChanged { bpm: f64, timestamp: DateTime<Utc> },

    /// Master volume changed (decibels)
    VolumeChanged { db: f64, timestamp: DateTime<Utc> },
}

impl CmcEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            CmcEvent::PlaybackStarted { .. } => "PlaybackStarted",
            CmcEvent::ColumnChanged { .. } => "ColumnChanged",
            CmcEvent::PlaybackStopped { .. } => "PlaybackStopped",
            CmcEvent::GridChanged { .. } => "GridChanged",
            CmcEvent::TempoChanged { .. } => "TempoChanged",
            CmcEvent::VolumeChanged { .. } => "VolumeChanged",
        }
    }
}
