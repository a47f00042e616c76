//! Audio output using cpal
//!
//! Opens the default output device and drives a [`Synth`] from the device
//! callback. The cpal stream is not `Send` on every platform, so it lives on
//! a dedicated thread for the lifetime of the backend; the engine only
//! touches the shared synth and volume.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

use super::synth::Synth;
use super::types::{db_to_gain, NoteTrigger, SoundBackend};
use crate::error::{Error, Result};

/// Sample rate used until the device reports its own
const FALLBACK_SAMPLE_RATE: u32 = 44_100;

/// cpal-backed synthesizer output
pub struct CpalBackend {
    synth: Arc<Mutex<Synth>>,
    /// Linear master gain, shared with the audio callback
    volume: Arc<Mutex<f32>>,
    shutdown: Arc<AtomicBool>,
    started: AtomicBool,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            synth: Arc::new(Mutex::new(Synth::new(FALLBACK_SAMPLE_RATE))),
            volume: Arc::new(Mutex::new(1.0)),
            shutdown: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
        }
    }

    /// List available audio output devices
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    fn open_stream(
        synth: Arc<Mutex<Synth>>,
        volume: Arc<Mutex<f32>>,
    ) -> Result<Stream> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using default audio device: {}", name);

        let supported = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let channels = config.channels as usize;

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        // Re-create the synth at the device rate (drops any voices queued before start)
        *synth.lock().unwrap_or_else(|e| e.into_inner()) = Synth::new(config.sample_rate.0);

        let err_fn = |err| error!("Audio stream error: {}", err);

        let stream = match sample_format {
            SampleFormat::F32 => device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let gain = *volume.lock().unwrap_or_else(|e| e.into_inner());
                    let mut synth = synth.lock().unwrap_or_else(|e| e.into_inner());
                    synth.set_gain(gain);
                    synth.render(data, channels);
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => {
                let mut scratch: Vec<f32> = Vec::new();
                device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        scratch.resize(data.len(), 0.0);
                        let gain = *volume.lock().unwrap_or_else(|e| e.into_inner());
                        let mut synth = synth.lock().unwrap_or_else(|e| e.into_inner());
                        synth.set_gain(gain);
                        synth.render(&mut scratch, channels);
                        for (out, sample) in data.iter_mut().zip(&scratch) {
                            *out = (sample * i16::MAX as f32) as i16;
                        }
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;
        Ok(stream)
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn initialize(&self) -> Result<()> {
        if self.started.load(Ordering::SeqCst) {
            return Ok(());
        }

        let synth = Arc::clone(&self.synth);
        let volume = Arc::clone(&self.volume);
        let shutdown = Arc::clone(&self.shutdown);
        let (ready_tx, ready_rx) = mpsc::channel();

        thread::Builder::new()
            .name("cmc-audio-output".to_string())
            .spawn(move || match Self::open_stream(synth, volume) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    while !shutdown.load(Ordering::SeqCst) {
                        thread::park_timeout(Duration::from_millis(250));
                    }
                    drop(stream);
                    info!("Audio stream closed");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| Error::AudioOutput(format!("Failed to spawn audio thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| Error::AudioOutput("Audio thread exited during startup".to_string()))??;

        self.started.store(true, Ordering::SeqCst);
        info!("Audio stream started successfully");
        Ok(())
    }

    fn trigger_attack_release(&self, note: NoteTrigger) {
        self.synth
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .note_on(note);
    }

    fn set_volume_db(&self, db: f64) {
        *self.volume.lock().unwrap_or_else(|e| e.into_inner()) = db_to_gain(db);
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}
