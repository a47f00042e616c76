//! # CMC Common Library
//!
//! Shared code for the Collective Melody Canvas including:
//! - Grid model and versioned snapshots
//! - Color catalog and pitch scale
//! - Melody compiler and duration estimation
//! - Beat timing
//! - Grid statistics
//! - Event types (CmcEvent enum)
//! - Configuration loading

pub mod colors;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod melody;
pub mod scale;
pub mod stats;
pub mod timing;

pub use error::{Error, Result};
pub use grid::{Grid, GridDimensions, GridSnapshot, GridStore};
pub use melody::{compile, estimate_duration, Melody, MelodyEvent, NoteEvent, RestEvent};
pub use scale::Pitch;
