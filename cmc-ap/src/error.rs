//! Error types for cmc-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for cmc-ap module
#[derive(Error, Debug)]
pub enum Error {
    /// Errors bubbled up from the shared library (grid, config)
    #[error(transparent)]
    Common(#[from] cmc_common::Error),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sound was requested before the audio context finished its handshake
    #[error("Audio context is not ready; call resume() first")]
    AudioNotReady,

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Playback scheduler errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// I/O errors (listener bind, config read)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using cmc-ap Error
pub type Result<T> = std::result::Result<T, Error>;
