//! cmc-ap configuration
//!
//! Loaded from TOML via [`cmc_common::config::load_config`]; every field has a
//! compiled default, and command-line arguments override file values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Sound backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackendKind {
    /// Trace notes instead of playing them
    #[default]
    Log,
    /// System audio device (requires the `cpal` feature)
    Cpal,
}

impl fmt::Display for AudioBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioBackendKind::Log => write!(f, "log"),
            AudioBackendKind::Cpal => write!(f, "cpal"),
        }
    }
}

impl FromStr for AudioBackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "log" => Ok(AudioBackendKind::Log),
            "cpal" => Ok(AudioBackendKind::Cpal),
            other => Err(Error::Config(format!("Unknown audio backend: {}", other))),
        }
    }
}

/// Audio player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub port: u16,
    pub tempo_bpm: f64,
    pub min_tempo_bpm: f64,
    pub max_tempo_bpm: f64,
    pub volume_db: f64,
    pub min_volume_db: f64,
    pub max_volume_db: f64,
    /// Random notes scattered on startup and after each clear
    pub demo_notes: usize,
    pub audio_backend: AudioBackendKind,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tempo_bpm: cmc_common::timing::DEFAULT_BPM,
            min_tempo_bpm: 40.0,
            max_tempo_bpm: 200.0,
            volume_db: -10.0,
            min_volume_db: -60.0,
            max_volume_db: 0.0,
            demo_notes: 218,
            audio_backend: AudioBackendKind::Log,
        }
    }
}

impl PlayerConfig {
    /// Check ranges are ordered and defaults fall inside them
    pub fn validate(&self) -> Result<()> {
        if self.min_tempo_bpm <= 0.0 || self.min_tempo_bpm > self.max_tempo_bpm {
            return Err(Error::Config(format!(
                "Invalid tempo range {}..={}",
                self.min_tempo_bpm, self.max_tempo_bpm
            )));
        }
        if self.min_volume_db > self.max_volume_db {
            return Err(Error::Config(format!(
                "Invalid volume range {}..={}",
                self.min_volume_db, self.max_volume_db
            )));
        }
        if !(self.min_tempo_bpm..=self.max_tempo_bpm).contains(&self.tempo_bpm) {
            return Err(Error::Config(format!(
                "tempo_bpm {} outside {}..={}",
                self.tempo_bpm, self.min_tempo_bpm, self.max_tempo_bpm
            )));
        }
        if !(self.min_volume_db..=self.max_volume_db).contains(&self.volume_db) {
            return Err(Error::Config(format!(
                "volume_db {} outside {}..={}",
                self.volume_db, self.min_volume_db, self.max_volume_db
            )));
        }
        Ok(())
    }

    /// Clamp a requested tempo into the configured range
    pub fn clamp_tempo(&self, bpm: f64) -> Result<f64> {
        if !bpm.is_finite() {
            return Err(Error::BadRequest(format!("Invalid tempo: {}", bpm)));
        }
        Ok(bpm.clamp(self.min_tempo_bpm, self.max_tempo_bpm))
    }

    /// Clamp a requested volume into the configured range
    pub fn clamp_volume(&self, db: f64) -> Result<f64> {
        if !db.is_finite() {
            return Err(Error::BadRequest(format!("Invalid volume: {}", db)));
        }
        Ok(db.clamp(self.min_volume_db, self.max_volume_db))
    }
}
