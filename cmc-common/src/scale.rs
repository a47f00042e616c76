//! Pitch mapping: vertical row position → scale pitch
//!
//! Row 0 (top) is the highest pitch, the last row the lowest. Fifteen fixed
//! scale pitches span three octaves from C5 down to C3; rows are spread over
//! them with `index = floor(row / rows × 15)`, clamped to the table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A scale pitch, stored as a MIDI note number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pitch(u8);

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Pitch {
    pub const fn from_midi(midi: u8) -> Self {
        Pitch(midi)
    }

    pub const fn midi(self) -> u8 {
        self.0
    }

    /// Octave number in scientific pitch notation (C4 = MIDI 60)
    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Equal-tempered frequency with A4 = 440 Hz
    pub fn frequency(self) -> f32 {
        440.0 * 2f32.powf((self.0 as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NOTE_NAMES[(self.0 % 12) as usize], self.octave())
    }
}

impl Serialize for Pitch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Pitch {
    type Err = Error;

    /// Parse scientific pitch notation such as "C4" or "F#3"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidInput(format!("invalid pitch name: {:?}", s));

        let split = s
            .find(|c: char| c == '-' || c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (name, octave) = s.split_at(split);
        let class = NOTE_NAMES
            .iter()
            .position(|n| *n == name)
            .ok_or_else(invalid)? as i32;
        let octave: i32 = octave.parse().map_err(|_| invalid())?;

        let midi = (octave + 1) * 12 + class;
        u8::try_from(midi)
            .ok()
            .filter(|m| *m <= 127)
            .map(Pitch)
            .ok_or_else(invalid)
    }
}

impl<'de> Deserialize<'de> for Pitch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Scale table, highest first: C5 B4 A4 G4 F4 E4 D4 C4 B3 A3 G3 F3 E3 D3 C3
pub const SCALE: [Pitch; 15] = [
    Pitch(72),
    Pitch(71),
    Pitch(69),
    Pitch(67),
    Pitch(65),
    Pitch(64),
    Pitch(62),
    Pitch(60),
    Pitch(59),
    Pitch(57),
    Pitch(55),
    Pitch(53),
    Pitch(52),
    Pitch(50),
    Pitch(48),
];

/// Map a grid row (0 = top) to its pitch for a grid with `rows` rows
///
/// Monotonic: a larger row index never yields a higher pitch.
pub fn row_to_pitch(row: usize, rows: usize) -> Pitch {
    let rows = rows.max(1);
    let index = row * SCALE.len() / rows;
    SCALE[index.min(SCALE.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_names() {
        assert_eq!(Pitch::from_midi(60).to_string(), "C4");
        assert_eq!(Pitch::from_midi(72).to_string(), "C5");
        assert_eq!(Pitch::from_midi(57).to_string(), "A3");
        assert_eq!(Pitch::from_midi(61).to_string(), "C#4");
    }

    #[test]
    fn test_frequency() {
        assert!((Pitch::from_midi(69).frequency() - 440.0).abs() < 1e-3);
        assert!((Pitch::from_midi(57).frequency() - 220.0).abs() < 1e-3);
        assert!((Pitch::from_midi(60).frequency() - 261.6256).abs() < 1e-2);
    }

    #[test]
    fn test_row_to_pitch_on_default_grid() {
        // 50 rows over 15 pitches: rows 0..=3 share C5
        assert_eq!(row_to_pitch(0, 50).to_string(), "C5");
        assert_eq!(row_to_pitch(3, 50).to_string(), "C5");
        assert_eq!(row_to_pitch(4, 50).to_string(), "B4");
        assert_eq!(row_to_pitch(25, 50).to_string(), "C4");
        assert_eq!(row_to_pitch(49, 50).to_string(), "C3");
    }

    #[test]
    fn test_row_to_pitch_clamps() {
        assert_eq!(row_to_pitch(50, 50), SCALE[14]);
        assert_eq!(row_to_pitch(1000, 50), SCALE[14]);
    }

    #[test]
    fn test_row_to_pitch_is_monotonic() {
        for rows in [10, 15, 50, 64] {
            let mut previous = row_to_pitch(0, rows);
            for row in 1..rows {
                let pitch = row_to_pitch(row, rows);
                assert!(pitch <= previous, "row {} of {} went up", row, rows);
                previous = pitch;
            }
        }
    }

    #[test]
    fn test_pitch_serializes_as_name() {
        let json = serde_json::to_string(&Pitch::from_midi(67)).unwrap();
        assert_eq!(json, "\"G4\"");

        let back: Pitch = serde_json::from_str(&json).unwrap();
        assert_eq!(back.midi(), 67);
    }

    #[test]
    fn test_parse_pitch_names() {
        assert_eq!("C4".parse::<Pitch>().unwrap().midi(), 60);
        assert_eq!("F#3".parse::<Pitch>().unwrap().midi(), 54);
        assert_eq!("C-1".parse::<Pitch>().unwrap().midi(), 0);
        assert!("H4".parse::<Pitch>().is_err());
        assert!("C".parse::<Pitch>().is_err());
        assert_eq!("G9".parse::<Pitch>().unwrap().midi(), 127);
        assert!("G#9".parse::<Pitch>().is_err());
    }

    #[test]
    fn test_scale_names_round_trip() {
        for pitch in SCALE {
            assert_eq!(pitch.to_string().parse::<Pitch>().unwrap(), pitch);
        }
    }
}
