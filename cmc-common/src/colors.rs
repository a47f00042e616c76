//! Color catalog and color → audio attribute mapping
//!
//! Twelve curated colors, each carrying musical expression metadata:
//!
//! | Attribute | Drives | Mapping |
//! |-----------|--------|---------|
//! | Temperature | Note duration | cool → long, neutral → medium, warm → short |
//! | Brightness | Velocity | dark → 0.28, medium → 0.62, bright → 0.92 |
//!
//! Pitch is never derived from color; see [`crate::scale`].

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Color temperature class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    Cool,
    Neutral,
    Warm,
}

/// Color brightness class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brightness {
    Dark,
    Medium,
    Bright,
}

/// Note length class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationClass {
    /// Eighth note (0.5 beats)
    Short,
    /// Quarter note (1 beat)
    Medium,
    /// Half note (2 beats)
    Long,
}

impl DurationClass {
    /// Length of this note in beats (beat = quarter note)
    pub const fn beats(self) -> f64 {
        match self {
            DurationClass::Short => 0.5,
            DurationClass::Medium => 1.0,
            DurationClass::Long => 2.0,
        }
    }

    /// Transport notation ("8n", "4n", "2n")
    pub const fn notation(self) -> &'static str {
        match self {
            DurationClass::Short => "8n",
            DurationClass::Medium => "4n",
            DurationClass::Long => "2n",
        }
    }

    /// Short label used by the palette
    pub const fn label(self) -> &'static str {
        match self {
            DurationClass::Short => "short",
            DurationClass::Medium => "med",
            DurationClass::Long => "long",
        }
    }
}

impl Temperature {
    pub const fn duration(self) -> DurationClass {
        match self {
            Temperature::Cool => DurationClass::Long,
            Temperature::Neutral => DurationClass::Medium,
            Temperature::Warm => DurationClass::Short,
        }
    }
}

impl Brightness {
    /// Normalized loudness in [0, 1]
    pub const fn velocity(self) -> f32 {
        match self {
            Brightness::Dark => 0.28,
            Brightness::Medium => 0.62,
            Brightness::Bright => 0.92,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Brightness::Dark => "soft",
            Brightness::Medium => "med",
            Brightness::Bright => "loud",
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub name: &'static str,
    pub hex: &'static str,
    pub temperature: Temperature,
    pub brightness: Brightness,
}

impl Color {
    pub const fn duration(&self) -> DurationClass {
        self.temperature.duration()
    }

    pub const fn velocity(&self) -> f32 {
        self.brightness.velocity()
    }
}

const fn color(
    name: &'static str,
    hex: &'static str,
    temperature: Temperature,
    brightness: Brightness,
) -> Color {
    Color {
        name,
        hex,
        temperature,
        brightness,
    }
}

/// The fixed palette, referenced by index from grid cells
pub static COLORS: [Color; 12] = [
    color("Crimson", "#E63946", Temperature::Warm, Brightness::Bright),
    color("Ember", "#F4722B", Temperature::Warm, Brightness::Bright),
    color("Amber", "#F7B731", Temperature::Warm, Brightness::Bright),
    color("Chartreuse", "#9BC53D", Temperature::Neutral, Brightness::Medium),
    color("Forest", "#2D9E5C", Temperature::Neutral, Brightness::Medium),
    color("Jade", "#40BCD8", Temperature::Neutral, Brightness::Bright),
    color("Cerulean", "#3A7BD5", Temperature::Cool, Brightness::Bright),
    color("Navy", "#1A3A6C", Temperature::Cool, Brightness::Dark),
    color("Indigo", "#6C63FF", Temperature::Cool, Brightness::Bright),
    color("Violet", "#B44FE8", Temperature::Cool, Brightness::Bright),
    color("Rose", "#F472B6", Temperature::Warm, Brightness::Bright),
    color("Pearl", "#D4C9B0", Temperature::Neutral, Brightness::Bright),
];

/// Number of colors in the catalog
pub const COLOR_COUNT: usize = COLORS.len();

/// Look up a catalog entry by index
pub fn color_at(index: usize) -> Result<&'static Color> {
    COLORS.get(index).ok_or(Error::UnknownColor(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_to_duration() {
        assert_eq!(Temperature::Cool.duration(), DurationClass::Long);
        assert_eq!(Temperature::Neutral.duration(), DurationClass::Medium);
        assert_eq!(Temperature::Warm.duration(), DurationClass::Short);
    }

    #[test]
    fn test_brightness_to_velocity() {
        assert_eq!(Brightness::Dark.velocity(), 0.28);
        assert_eq!(Brightness::Medium.velocity(), 0.62);
        assert_eq!(Brightness::Bright.velocity(), 0.92);
    }

    #[test]
    fn test_duration_beats() {
        assert_eq!(DurationClass::Short.beats(), 0.5);
        assert_eq!(DurationClass::Medium.beats(), 1.0);
        assert_eq!(DurationClass::Long.beats(), 2.0);
        assert_eq!(DurationClass::Long.notation(), "2n");
    }

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(COLOR_COUNT, 12);

        let navy = color_at(7).unwrap();
        assert_eq!(navy.name, "Navy");
        assert_eq!(navy.duration(), DurationClass::Long);
        assert_eq!(navy.velocity(), 0.28);

        assert!(matches!(color_at(12), Err(Error::UnknownColor(12))));
    }

    #[test]
    fn test_catalog_hex_codes_are_unique() {
        for (i, a) in COLORS.iter().enumerate() {
            assert!(a.hex.starts_with('#') && a.hex.len() == 7, "bad hex for {}", a.name);
            for b in COLORS.iter().skip(i + 1) {
                assert_ne!(a.hex, b.hex);
            }
        }
    }
}
