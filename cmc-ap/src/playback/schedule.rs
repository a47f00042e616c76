//! Absolute note times for one playback run

use cmc_common::colors::DurationClass;
use cmc_common::timing::{beat_offsets, beats_to_seconds, END_OF_SEQUENCE_PADDING_SECS};
use cmc_common::{Melody, Pitch};

/// A note bound to its start time
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledNote {
    /// Seconds from run start at the run's tempo
    pub at_secs: f64,
    pub column: usize,
    pub pitch: Pitch,
    pub duration: DurationClass,
    pub velocity: f32,
}

/// Notes of a run in firing order, plus where the sequence ends
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub notes: Vec<ScheduledNote>,
    /// Computed end of the last event (rests included)
    pub end_secs: f64,
    /// Tempo the absolute times were computed at
    pub bpm: f64,
}

impl Schedule {
    /// Lay out a melody at `bpm`
    ///
    /// Offsets accumulate through [`beat_offsets`], the same walk the duration
    /// estimate uses. Rests only advance the cursor.
    pub fn from_melody(melody: &Melody, bpm: f64) -> Self {
        let (offsets, total_beats) = beat_offsets(&melody.events);

        let notes = melody
            .events
            .iter()
            .zip(offsets)
            .filter_map(|(event, beat)| {
                event.as_note().map(|note| ScheduledNote {
                    at_secs: beats_to_seconds(beat, bpm),
                    column: note.column,
                    pitch: note.pitch,
                    duration: note.duration,
                    velocity: note.velocity,
                })
            })
            .collect();

        Self {
            notes,
            end_secs: beats_to_seconds(total_beats, bpm),
            bpm,
        }
    }

    /// When the terminal stop fires
    pub fn stop_at_secs(&self) -> f64 {
        self.end_secs + END_OF_SEQUENCE_PADDING_SECS
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
