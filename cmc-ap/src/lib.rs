//! # CMC Audio Player Library (cmc-ap)
//!
//! Plays the melody compiled from the shared canvas.
//!
//! **Purpose:** own the grid, compile it on demand, schedule notes against a
//! tempo-scaled transport clock and drive a sound backend, with an HTTP/SSE
//! control interface.
//!
//! **Architecture:** axum API → [`playback::PlaybackEngine`] (one tokio task
//! per run) → [`audio::AudioContext`] → [`audio::SoundBackend`] (log or cpal)

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
