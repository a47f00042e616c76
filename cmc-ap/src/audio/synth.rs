//! Polyphonic triangle-wave synthesizer
//!
//! Renders interleaved f32 frames for an output stream. Each note gets its
//! own voice with an ADSR envelope; voices are dropped once their release
//! tail has finished.

use super::types::NoteTrigger;

/// ADSR envelope (times in seconds, sustain as a level)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.04,
            decay: 0.2,
            sustain: 0.5,
            release: 1.2,
        }
    }
}

impl Envelope {
    /// Level while the gate is held, `t` seconds after note-on
    fn held_level(&self, t: f32) -> f32 {
        if t < self.attack {
            t / self.attack
        } else if t < self.attack + self.decay {
            1.0 - (1.0 - self.sustain) * (t - self.attack) / self.decay
        } else {
            self.sustain
        }
    }

    /// Level `t` seconds after note-on for a gate of `gate` seconds
    ///
    /// `None` once the release tail has completed.
    pub fn level(&self, t: f32, gate: f32) -> Option<f32> {
        if t < gate {
            return Some(self.held_level(t));
        }
        let since_release = t - gate;
        if since_release >= self.release {
            return None;
        }
        Some(self.held_level(gate) * (1.0 - since_release / self.release))
    }
}

/// Triangle wave in [-1, 1] for a phase in [0, 1)
pub fn triangle(phase: f32) -> f32 {
    1.0 - 4.0 * (phase - 0.5).abs()
}

#[derive(Debug, Clone)]
struct Voice {
    frequency: f32,
    velocity: f32,
    gate_secs: f32,
    phase: f32,
    elapsed_frames: u64,
}

/// Per-voice gain so a handful of overlapping notes don't clip
const VOICE_GAIN: f32 = 0.3;

/// Upper bound on simultaneous voices; the oldest is stolen beyond this
const MAX_VOICES: usize = 32;

/// Synth state shared between the engine (note-on) and the audio callback (render)
#[derive(Debug)]
pub struct Synth {
    sample_rate: u32,
    envelope: Envelope,
    voices: Vec<Voice>,
    gain: f32,
}

impl Synth {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            envelope: Envelope::default(),
            voices: Vec::new(),
            gain: 1.0,
        }
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Start a note; it releases after `note.duration`
    pub fn note_on(&mut self, note: NoteTrigger) {
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(Voice {
            frequency: note.pitch.frequency(),
            velocity: note.velocity.clamp(0.0, 1.0),
            gate_secs: note.duration.as_secs_f32(),
            phase: 0.0,
            elapsed_frames: 0,
        });
    }

    /// Fill `out` (interleaved, `channels` per frame), replacing its contents
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let rate = self.sample_rate as f32;

        for frame in out.chunks_mut(channels) {
            let mut mix = 0.0;
            for voice in &mut self.voices {
                let t = voice.elapsed_frames as f32 / rate;
                if let Some(level) = self.envelope.level(t, voice.gate_secs) {
                    mix += triangle(voice.phase) * level * voice.velocity * VOICE_GAIN;
                }
                voice.phase = (voice.phase + voice.frequency / rate).fract();
                voice.elapsed_frames += 1;
            }
            let sample = (mix * self.gain).clamp(-1.0, 1.0);
            frame.iter_mut().for_each(|s| *s = sample);
        }

        let envelope = self.envelope;
        self.voices.retain(|v| {
            let t = v.elapsed_frames as f32 / rate;
            envelope.level(t, v.gate_secs).is_some()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmc_common::Pitch;
    use std::time::Duration;

    fn note(ms: u64) -> NoteTrigger {
        NoteTrigger {
            pitch: Pitch::from_midi(69),
            duration: Duration::from_millis(ms),
            velocity: 0.92,
        }
    }

    #[test]
    fn test_envelope_shape() {
        let env = Envelope::default();

        assert_eq!(env.level(0.0, 1.0), Some(0.0));
        assert!((env.level(0.02, 1.0).unwrap() - 0.5).abs() < 1e-5);
        assert!((env.level(0.04, 1.0).unwrap() - 1.0).abs() < 1e-5);
        assert!((env.level(0.14, 1.0).unwrap() - 0.75).abs() < 1e-5);
        assert_eq!(env.level(0.5, 1.0), Some(0.5));

        // Release from sustain
        assert!((env.level(1.6, 1.0).unwrap() - 0.25).abs() < 1e-5);
        assert_eq!(env.level(2.5, 1.0), None);
    }

    #[test]
    fn test_release_starts_from_current_level() {
        // Gate ends mid-attack
        let env = Envelope::default();
        let at_gate = env.level(0.02, 0.02).unwrap();
        assert!((at_gate - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_triangle() {
        assert_eq!(triangle(0.0), -1.0);
        assert_eq!(triangle(0.25), 0.0);
        assert_eq!(triangle(0.5), 1.0);
        assert_eq!(triangle(0.75), 0.0);
    }

    #[test]
    fn test_silent_without_voices() {
        let mut synth = Synth::new(48_000);
        let mut buf = vec![1.0f32; 256];
        synth.render(&mut buf, 2);
        assert!(buf.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_voice_renders_and_expires() {
        let mut synth = Synth::new(1_000);
        synth.note_on(note(100));
        assert_eq!(synth.active_voices(), 1);

        let mut buf = vec![0.0f32; 200];
        synth.render(&mut buf, 1);
        assert!(buf.iter().any(|s| s.abs() > 0.01));

        // 0.1s gate + 1.2s release at 1kHz = 1300 frames total
        let mut tail = vec![0.0f32; 1_200];
        synth.render(&mut tail, 1);
        assert_eq!(synth.active_voices(), 0);
    }

    #[test]
    fn test_channels_carry_same_sample() {
        let mut synth = Synth::new(8_000);
        synth.note_on(note(500));
        let mut buf = vec![0.0f32; 400];
        synth.render(&mut buf, 2);
        for frame in buf.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn test_gain_zero_is_silent() {
        let mut synth = Synth::new(8_000);
        synth.set_gain(0.0);
        synth.note_on(note(500));
        let mut buf = vec![0.0f32; 400];
        synth.render(&mut buf, 1);
        assert!(buf.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_voice_stealing_caps_polyphony() {
        let mut synth = Synth::new(8_000);
        for _ in 0..(MAX_VOICES + 5) {
            synth.note_on(note(500));
        }
        assert_eq!(synth.active_voices(), MAX_VOICES);
    }
}
