//! Ambient suitability scoring.
//!
//! Scores a single `(hex, screen percentage)` candidate. Pure and
//! deterministic; used by both engines and by the `ambient-score` tool.

use crate::color::{is_near_white, is_skin_tone, Hsv, Rgb};
use crate::types::ScoringError;
use serde::{Deserialize, Serialize};

/// Minimum saturation a candidate needs to be scored at all
pub const MIN_SATURATION: f64 = 0.5;

/// Prevalence needed before screen coverage earns points, in percent
pub const PREVALENCE_THRESHOLD: f64 = 3.0;

const BRIGHTNESS_IDEAL: f64 = 30.0;
const BRIGHTNESS_PENALTY: f64 = -50.0;
const BRIGHTNESS_MIDPOINT: f64 = 0.525;

/// Hue preference table, first match wins
const HUE_PREFERENCES: &[(f64, f64, &str, f64, &str)] = &[
    (200.0, 280.0, "Blue/Purple", 20.0, "ideal for relaxation and focus"),
    (280.0, 340.0, "Magenta/Pink", 18.0, "creative and energetic"),
    (0.0, 60.0, "Red/Orange", 15.0, "warm and attention-grabbing"),
    (300.0, 360.0, "Red", 15.0, "warm and attention-grabbing"),
    (120.0, 180.0, "Green/Cyan", 10.0, "calming but less impactful"),
    (60.0, 120.0, "Yellow/Green", 8.0, "visible but less ambient"),
];

const DEFAULT_HUE_SCORE: f64 = 8.0;

/// Scoring in the narrow bands between "ideal" and "penalized" brightness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrightnessFalloff {
    /// Edge bands score 0
    #[default]
    Hard,
    /// Edge bands score `max(0, 30 - |v - 0.525| * 80)`
    Smooth,
}

/// Per-component scores and the reasoning behind each
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub saturation_score: f64,
    pub brightness_score: f64,
    pub prevalence_score: f64,
    pub hue_preference_score: f64,
    /// Sum of penalties and bonuses
    pub penalties: f64,

    pub saturation_reason: String,
    pub brightness_reason: String,
    pub prevalence_reason: String,
    pub hue_reason: String,
    pub penalty_reasons: Vec<String>,

    /// Set when the candidate failed the saturation floor
    pub saturation_rejected: bool,
}

impl ScoreBreakdown {
    /// Sum of all components, floored at zero
    pub fn total_score(&self) -> f64 {
        let sum = self.saturation_score
            + self.brightness_score
            + self.prevalence_score
            + self.hue_preference_score
            + self.penalties;
        sum.max(0.0)
    }

    /// Compact one-line form, e.g. `Sat:80 | Bri:-50 | Prev:25 | Hue:15 = 70`
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("Sat:{}", fmt_score(self.saturation_score)),
            format!("Bri:{}", fmt_score(self.brightness_score)),
            format!("Prev:{}", fmt_score(self.prevalence_score)),
            format!("Hue:{}", fmt_score(self.hue_preference_score)),
        ];
        if self.penalties != 0.0 {
            parts.push(format!("Pen:{}", fmt_score(self.penalties)));
        }
        format!("{} = {}", parts.join(" | "), fmt_score(self.total_score()))
    }
}

/// Whole numbers without a fraction, everything else with one decimal
fn fmt_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Scores candidates for use as ambient light
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientScorer {
    falloff: BrightnessFalloff,
}

impl AmbientScorer {
    pub fn new(falloff: BrightnessFalloff) -> Self {
        Self { falloff }
    }

    pub fn falloff(&self) -> BrightnessFalloff {
        self.falloff
    }

    /// Score a `#rrggbb` color covering `percentage` percent of the screen
    pub fn score_hex(&self, hex: &str, percentage: f64) -> Result<ScoreBreakdown, ScoringError> {
        let rgb = Rgb::from_hex(hex)?;
        Ok(self.score_rgb(rgb, percentage))
    }

    pub fn score_rgb(&self, rgb: Rgb, percentage: f64) -> ScoreBreakdown {
        let (r, g, b) = rgb.normalized();
        let hsv = Hsv::from_normalized_rgb(r, g, b);
        let (s, v) = (hsv.s, hsv.v);
        let mut breakdown = ScoreBreakdown::default();

        if s < MIN_SATURATION {
            breakdown.saturation_rejected = true;
            breakdown.saturation_reason =
                format!("REJECTED: Low saturation ({:.0}%) - too washed out", s * 100.0);
            return breakdown;
        }

        breakdown.saturation_score = s * 60.0;
        if s >= 0.7 {
            breakdown.saturation_score += 20.0;
            breakdown.saturation_reason = format!("Excellent saturation ({:.0}%) - vivid color", s * 100.0);
        } else {
            breakdown.saturation_reason =
                format!("Good saturation ({:.0}%) - acceptable vibrancy", s * 100.0);
        }

        let (brightness_score, brightness_reason) = self.brightness(v);
        breakdown.brightness_score = brightness_score;
        breakdown.brightness_reason = brightness_reason;

        if percentage > PREVALENCE_THRESHOLD {
            breakdown.prevalence_score = (percentage * 2.5).min(25.0);
            breakdown.prevalence_reason =
                format!("Covers {:.1}% of screen - significant presence", percentage);
        } else {
            breakdown.prevalence_reason = format!("Only {:.1}% of screen - minor presence", percentage);
        }

        let hue_deg = hsv.hue_degrees();
        breakdown.hue_preference_score = DEFAULT_HUE_SCORE;
        breakdown.hue_reason = format!("Neutral hue ({:.0}°)", hue_deg);
        for (min, max, name, score, remark) in HUE_PREFERENCES {
            if *min <= hue_deg && hue_deg < *max {
                breakdown.hue_preference_score = *score;
                breakdown.hue_reason = format!("{} hue ({:.0}°) - {}", name, hue_deg, remark);
                break;
            }
        }

        if is_skin_tone(r, g, b) {
            breakdown.penalties -= 40.0;
            breakdown.penalty_reasons.push("Skin tone detected (-40)".to_string());
        }
        if is_near_white(r, g, b) {
            breakdown.penalties -= 30.0;
            breakdown.penalty_reasons.push("Too close to white light (-30)".to_string());
        }
        if s < 0.6 {
            breakdown.penalties -= 15.0;
            breakdown.penalty_reasons.push("Borderline saturation (-15)".to_string());
        }
        if s > 0.8 && v > 0.3 && v < 0.7 {
            breakdown.penalties += 15.0;
            breakdown.penalty_reasons.push("Vivid color bonus (+15)".to_string());
        }

        breakdown
    }

    fn brightness(&self, v: f64) -> (f64, String) {
        let pct = v * 100.0;
        if v > 0.25 && v < 0.8 {
            return (BRIGHTNESS_IDEAL, format!("Ideal brightness ({:.0}%) - comfortable for ambient", pct));
        }
        if v < 0.15 {
            return (BRIGHTNESS_PENALTY, format!("Too dark ({:.0}%) - would be nearly invisible", pct));
        }
        if v > 0.85 {
            return (BRIGHTNESS_PENALTY, format!("Too bright ({:.0}%) - approaches white light", pct));
        }

        let score = match self.falloff {
            BrightnessFalloff::Hard => 0.0,
            BrightnessFalloff::Smooth => {
                (BRIGHTNESS_IDEAL - (v - BRIGHTNESS_MIDPOINT).abs() * 80.0).max(0.0)
            }
        };
        let reason = if v <= 0.25 {
            format!("Marginally dark ({:.0}%)", pct)
        } else {
            format!("Marginally bright ({:.0}%)", pct)
        };
        (score, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn score(hex: &str, pct: f64) -> ScoreBreakdown {
        AmbientScorer::default().score_hex(hex, pct).unwrap()
    }

    #[test]
    fn test_pure_red() {
        let b = score("#ff0000", 10.0);
        assert_eq!(b.saturation_score, 80.0);
        assert_eq!(b.brightness_score, -50.0);
        assert_eq!(b.prevalence_score, 25.0);
        assert_eq!(b.hue_preference_score, 15.0);
        assert_eq!(b.penalties, 0.0);
        assert_eq!(b.total_score(), 70.0);
        assert!(b.hue_reason.starts_with("Red/Orange hue (0°)"));
        assert_eq!(b.summary(), "Sat:80 | Bri:-50 | Prev:25 | Hue:15 = 70");
    }

    #[test]
    fn test_gray_rejected() {
        let b = score("#808080", 40.0);
        assert!(b.saturation_rejected);
        assert_eq!(b.total_score(), 0.0);
        assert_eq!(b.saturation_reason, "REJECTED: Low saturation (0%) - too washed out");
        assert_eq!(b.prevalence_score, 0.0);
    }

    #[test]
    fn test_azure() {
        let b = score("#0080ff", 5.0);
        assert_eq!(b.saturation_score, 80.0);
        assert_eq!(b.brightness_score, -50.0);
        assert_eq!(b.prevalence_score, 12.5);
        assert_eq!(b.hue_preference_score, 20.0);
        assert_eq!(b.penalties, 0.0);
        assert_eq!(b.total_score(), 62.5);
        assert_eq!(b.summary(), "Sat:80 | Bri:-50 | Prev:12.5 | Hue:20 = 62.5");
    }

    #[test]
    fn test_vivid_bonus_and_ideal_brightness() {
        // #3050b0: s = 0.727, v = 0.69, hue 225
        let b = score("#3050b0", 20.0);
        assert_eq!(b.brightness_score, 30.0);
        assert_eq!(b.hue_preference_score, 20.0);
        assert_eq!(b.penalties, 0.0);

        // #b01030: s = 0.909, v = 0.69, hue 345
        let b = score("#b01030", 2.0);
        assert_eq!(b.penalties, 15.0);
        assert_eq!(b.penalty_reasons, vec!["Vivid color bonus (+15)".to_string()]);
        assert_eq!(b.hue_preference_score, 15.0);
        assert!(b.hue_reason.starts_with("Red hue"));
        assert_eq!(b.prevalence_score, 0.0);
    }

    #[test]
    fn test_borderline_and_skin_penalties() {
        // #d08050: s = 0.615, v = 0.816, skin tone
        let b = score("#d08050", 10.0);
        assert!(b.penalty_reasons.contains(&"Skin tone detected (-40)".to_string()));
        assert_eq!(b.brightness_score, 0.0);
        assert!(b.brightness_reason.starts_with("Marginally bright"));

        // #a05a46: s = 0.5625, borderline
        let b = score("#a05a46", 10.0);
        assert!(!b.saturation_rejected);
        assert!(b.penalty_reasons.contains(&"Borderline saturation (-15)".to_string()));
    }

    #[test]
    fn test_neutral_hue_band() {
        // hue 190 falls outside every preference range
        let b = score("#00aacc", 10.0);
        assert_eq!(b.hue_preference_score, DEFAULT_HUE_SCORE);
        assert!(b.hue_reason.starts_with("Neutral hue"));
    }

    #[test]
    fn test_brightness_falloff_variants() {
        // v = 0.2 sits in the dark edge band
        let hard = AmbientScorer::new(BrightnessFalloff::Hard).score_hex("#330000", 10.0).unwrap();
        let smooth = AmbientScorer::new(BrightnessFalloff::Smooth).score_hex("#330000", 10.0).unwrap();
        assert_eq!(hard.brightness_score, 0.0);
        assert!((smooth.brightness_score - 4.0).abs() < 1e-9);
        assert!(smooth.brightness_reason.starts_with("Marginally dark"));
    }

    #[test]
    fn test_invalid_hex() {
        let err = AmbientScorer::default().score_hex("#zz0000", 10.0).unwrap_err();
        assert_eq!(err, ScoringError::InvalidHex("#zz0000".to_string()));
    }

    proptest! {
        #[test]
        fn prop_total_never_negative(r: u8, g: u8, b: u8, pct in 0.0f64..100.0) {
            let scorer = AmbientScorer::default();
            let breakdown = scorer.score_rgb(Rgb::new(r, g, b), pct);
            prop_assert!(breakdown.total_score() >= 0.0);
        }

        #[test]
        fn prop_low_saturation_scores_zero(r: u8, g: u8, b: u8, pct in 0.0f64..100.0) {
            let rgb = Rgb::new(r, g, b);
            let breakdown = AmbientScorer::new(BrightnessFalloff::Smooth).score_rgb(rgb, pct);
            if rgb.to_hsv().s < MIN_SATURATION {
                prop_assert_eq!(breakdown.total_score(), 0.0);
                prop_assert!(breakdown.saturation_rejected);
            }
        }

        #[test]
        fn prop_smooth_brightness_bounded(v in 0.0f64..=1.0) {
            let rgb = Hsv::new(0.6, 1.0, v).to_rgb();
            let breakdown = AmbientScorer::new(BrightnessFalloff::Smooth).score_rgb(rgb, 10.0);
            if !breakdown.saturation_rejected {
                prop_assert!(breakdown.brightness_score <= 30.0);
            }
        }
    }
}
