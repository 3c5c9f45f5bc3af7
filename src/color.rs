//! RGBA color values used by rendering styles.

use serde::{Deserialize, Serialize};

/// A color with normalized channels; every channel is clamped to [0.0, 1.0]
/// on construction and on deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ColorChannels")]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self::with_alpha(red, green, blue, 1.0)
    }

    pub fn with_alpha(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red: red.clamp(0.0, 1.0),
            green: green.clamp(0.0, 1.0),
            blue: blue.clamp(0.0, 1.0),
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

// Styles written before alpha support carry three channels only.
#[derive(Clone, Copy, Deserialize)]
struct ColorChannels {
    red: f64,
    green: f64,
    blue: f64,
    #[serde(default = "opaque")]
    alpha: f64,
}

fn opaque() -> f64 {
    1.0
}

impl From<ColorChannels> for Color {
    fn from(raw: ColorChannels) -> Self {
        Self::with_alpha(raw.red, raw.green, raw.blue, raw.alpha)
    }
}
