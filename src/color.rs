//! Color value types and conversions.
//!
//! HSV components are all normalized to `[0, 1]`; hue is kept strictly below
//! 1.0. Channel predicates (skin tone, near-white, colorful) operate on
//! channels normalized to `[0, 1]`.

use crate::types::ScoringError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mid-gray returned when no pixel survives extraction masks
pub const MID_GRAY: Rgb = Rgb::new(128, 128, 128);

/// 8-bit RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Result<Self, ScoringError> {
        let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ScoringError::InvalidHex(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ScoringError::InvalidHex(hex.to_string()))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Lowercase `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels scaled to `[0, 1]`
    pub fn normalized(&self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }

    pub fn to_hsv(&self) -> Hsv {
        let (r, g, b) = self.normalized();
        Hsv::from_normalized_rgb(r, g, b)
    }

    pub fn to_float(&self) -> FloatRgb {
        FloatRgb::new(self.r as f64, self.g as f64, self.b as f64)
    }

    /// Euclidean distance with every channel normalized to `[0, 1]`
    pub fn distance(&self, other: &Rgb) -> f64 {
        self.to_float().distance(&other.to_float())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(pixel: image::Rgb<u8>) -> Self {
        Self::new(pixel.0[0], pixel.0[1], pixel.0[2])
    }
}

/// Hue/saturation/value, each in `[0, 1]` (hue < 1)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Hsv {
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    /// Hexcone conversion from channels in `[0, 1]`
    pub fn from_normalized_rgb(r: f64, g: f64, b: f64) -> Self {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let v = max;
        if max == min {
            return Self::new(0.0, 0.0, v);
        }

        let range = max - min;
        let s = range / max;
        let rc = (max - r) / range;
        let gc = (max - g) / range;
        let bc = (max - b) / range;

        let h = if r == max {
            bc - gc
        } else if g == max {
            2.0 + rc - bc
        } else {
            4.0 + gc - rc
        };

        let mut h = (h / 6.0).rem_euclid(1.0);
        if h >= 1.0 {
            h = 0.0;
        }

        Self::new(h, s, v)
    }

    /// Channels in `[0, 1]`
    pub fn to_normalized_rgb(&self) -> (f64, f64, f64) {
        let (h, s, v) = (self.h, self.s.clamp(0.0, 1.0), self.v.clamp(0.0, 1.0));
        if s == 0.0 {
            return (v, v, v);
        }

        let sector = (h * 6.0).floor();
        let f = h * 6.0 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        match (sector as i64).rem_euclid(6) {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        }
    }

    /// Convert back to 8-bit channels, truncating `channel × 255`
    pub fn to_rgb(&self) -> Rgb {
        let (r, g, b) = self.to_normalized_rgb();
        let quantize = |c: f64| (c * 255.0).clamp(0.0, 255.0) as u8;
        Rgb::new(quantize(r), quantize(g), quantize(b))
    }

    pub fn hue_degrees(&self) -> f64 {
        self.h * 360.0
    }
}

/// Floating-point RGB in the 0-255 range, used for smoothing
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FloatRgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl FloatRgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// `weight × self + (1 − weight) × other`
    pub fn mix(&self, other: &FloatRgb, weight: f64) -> FloatRgb {
        let inv = 1.0 - weight;
        FloatRgb::new(
            weight * self.r + inv * other.r,
            weight * self.g + inv * other.g,
            weight * self.b + inv * other.b,
        )
    }

    /// Euclidean distance with every channel normalized to `[0, 1]`
    pub fn distance(&self, other: &FloatRgb) -> f64 {
        let dr = (self.r - other.r) / 255.0;
        let dg = (self.g - other.g) / 255.0;
        let db = (self.b - other.b) / 255.0;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Truncate to 8-bit channels
    pub fn to_rgb(&self) -> Rgb {
        let quantize = |c: f64| c.clamp(0.0, 255.0) as u8;
        Rgb::new(quantize(self.r), quantize(self.g), quantize(self.b))
    }
}

impl From<Rgb> for FloatRgb {
    fn from(rgb: Rgb) -> Self {
        rgb.to_float()
    }
}

/// Likely a skin tone (normalized channels)
pub fn is_skin_tone(r: f64, g: f64, b: f64) -> bool {
    r > 0.6 && g > 0.4 && b > 0.2 && r > g && g > b && (r - b) > 0.2
}

/// Mean and population variance of the three channels
fn channel_stats(r: f64, g: f64, b: f64) -> (f64, f64) {
    let avg = (r + g + b) / 3.0;
    let variance = ((r - avg).powi(2) + (g - avg).powi(2) + (b - avg).powi(2)) / 3.0;
    (avg, variance)
}

/// Too close to white/warm-white light to be worth sending (normalized channels)
pub fn is_near_white(r: f64, g: f64, b: f64) -> bool {
    let (avg, variance) = channel_stats(r, g, b);

    if variance < 0.015 && avg > 0.5 {
        return true;
    }

    if avg > 0.8 {
        return true;
    }

    r > 0.75 && g > 0.75 && b > 0.75
}

/// Whether a color is vivid enough to be an ambient candidate
///
/// Rejects grays, blacks, whites, creams, skin tones, and pastel colors.
pub fn is_colorful(rgb: Rgb) -> bool {
    let (r, g, b) = rgb.normalized();
    let hsv = Hsv::from_normalized_rgb(r, g, b);

    if hsv.s < 0.5 {
        return false;
    }

    if hsv.v < 0.2 || hsv.v > 0.85 {
        return false;
    }

    // Low variance + bright = cream/off-white that slipped past saturation
    let (avg, variance) = channel_stats(r, g, b);
    if variance < 0.02 && avg > 0.6 {
        return false;
    }

    if is_skin_tone(r, g, b) {
        return false;
    }

    !(hsv.s < 0.6 && hsv.v > 0.7)
}

/// Coarse hue names used in decision summaries and history statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HueBucket {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    PurpleMagenta,
}

impl HueBucket {
    pub fn from_degrees(degrees: f64) -> Self {
        let d = degrees.rem_euclid(360.0);
        if d < 30.0 || d >= 330.0 {
            HueBucket::Red
        } else if d < 60.0 {
            HueBucket::Orange
        } else if d < 90.0 {
            HueBucket::Yellow
        } else if d < 150.0 {
            HueBucket::Green
        } else if d < 210.0 {
            HueBucket::Cyan
        } else if d < 280.0 {
            HueBucket::Blue
        } else {
            HueBucket::PurpleMagenta
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HueBucket::Red => "Red",
            HueBucket::Orange => "Orange",
            HueBucket::Yellow => "Yellow",
            HueBucket::Green => "Green",
            HueBucket::Cyan => "Cyan",
            HueBucket::Blue => "Blue",
            HueBucket::PurpleMagenta => "Purple/Magenta",
        }
    }
}

impl fmt::Display for HueBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
