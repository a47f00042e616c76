//! Melody compiler
//!
//! Scans the grid left to right; each column is one time step.
//!
//! - A column with notes becomes one [`NoteEvent`] built from its median row.
//! - Runs of empty columns become a single [`RestEvent`], compressed:
//!
//! | Empty run | Rest units | Compressed |
//! |-----------|------------|------------|
//! | 1–2       | run length | no         |
//! | 3–5       | 2          | yes        |
//! | 6+        | 3          | yes        |
//!
//! The median cell's color decides duration and velocity; its row decides
//! pitch. Compilation is total and deterministic: the same grid always yields
//! the same [`Melody`].

use serde::Serialize;
use tracing::trace;

use crate::colors::{DurationClass, COLORS};
use crate::grid::Grid;
use crate::scale::{row_to_pitch, Pitch};
use crate::timing::{beat_offsets, beats_to_seconds, REST_UNIT_BEATS};

/// One sounding column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub column: usize,
    pub pitch: Pitch,
    pub duration: DurationClass,
    /// Normalized loudness in [0, 1]
    pub velocity: f32,
    pub color_hex: &'static str,
    /// Occupied cells in the column (display only, not audible)
    pub note_count: usize,
}

/// A compressed run of empty columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestEvent {
    /// First empty column of the run
    pub column: usize,
    pub units: u32,
}

/// One time slot of the melody
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MelodyEvent {
    Note(NoteEvent),
    Rest(RestEvent),
}

impl MelodyEvent {
    /// Beats this slot occupies
    ///
    /// The single source of per-event cost for estimation and scheduling.
    pub fn beats(&self) -> f64 {
        match self {
            MelodyEvent::Note(note) => note.duration.beats(),
            MelodyEvent::Rest(rest) => rest.units as f64 * REST_UNIT_BEATS,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            MelodyEvent::Note(note) => note.column,
            MelodyEvent::Rest(rest) => rest.column,
        }
    }

    pub fn as_note(&self) -> Option<&NoteEvent> {
        match self {
            MelodyEvent::Note(note) => Some(note),
            MelodyEvent::Rest(_) => None,
        }
    }
}

/// Compiled melody
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Melody {
    pub events: Vec<MelodyEvent>,
    /// Empty runs of 3+ columns that were shortened
    pub compressed_rest_count: usize,
}

impl Melody {
    pub fn note_count(&self) -> usize {
        self.events.iter().filter(|e| e.as_note().is_some()).count()
    }

    pub fn has_notes(&self) -> bool {
        self.events.iter().any(|e| e.as_note().is_some())
    }

    pub fn notes(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter().filter_map(MelodyEvent::as_note)
    }
}

/// Rest units for an empty run, and whether the run was compressed
pub fn compress_empty_run(run: usize) -> (u32, bool) {
    match run {
        0..=2 => (run as u32, false),
        3..=5 => (2, true),
        _ => (3, true),
    }
}

/// Index of the median element among `count` sorted rows (upper-middle when even)
pub const fn median_index(count: usize) -> usize {
    count / 2
}

struct EmptyRun {
    start: usize,
    len: usize,
}

fn flush_empty_run(run: &mut EmptyRun, melody: &mut Melody) {
    if run.len == 0 {
        return;
    }
    let (units, compressed) = compress_empty_run(run.len);
    if compressed {
        melody.compressed_rest_count += 1;
    }
    melody.events.push(MelodyEvent::Rest(RestEvent {
        column: run.start,
        units,
    }));
    run.len = 0;
}

/// Compile a grid into its melody
pub fn compile(grid: &Grid) -> Melody {
    let mut melody = Melody::default();
    let mut run = EmptyRun { start: 0, len: 0 };

    for column in 0..grid.columns() {
        // Ascending by row
        let filled = grid.column_notes(column);

        if filled.is_empty() {
            if run.len == 0 {
                run.start = column;
            }
            run.len += 1;
            continue;
        }

        flush_empty_run(&mut run, &mut melody);

        let (row, cell) = filled[median_index(filled.len())];
        // Cells are validated on placement, so the index is always in the catalog
        let color = &COLORS[cell.color_index];
        let pitch = row_to_pitch(row, grid.rows());
        trace!(column, row, %pitch, "note");

        melody.events.push(MelodyEvent::Note(NoteEvent {
            column,
            pitch,
            duration: color.duration(),
            velocity: color.velocity(),
            color_hex: color.hex,
            note_count: filled.len(),
        }));
    }

    // A canvas without notes has nothing to rest between
    if !melody.events.is_empty() {
        flush_empty_run(&mut run, &mut melody);
    }
    melody
}

/// Estimated playback length in seconds at `bpm`
pub fn estimate_duration(events: &[MelodyEvent], bpm: f64) -> f64 {
    let (_, total_beats) = beat_offsets(events);
    beats_to_seconds(total_beats, bpm)
}

/// Display string for an estimate: `~m:ss`, or `—` when under a second
pub fn format_estimate(seconds: f64) -> String {
    if seconds.is_nan() || seconds < 1.0 {
        return "—".to_string();
    }
    let whole = seconds as u64;
    format!("~{}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
#[path = "melody_tests.rs"]
mod tests;
