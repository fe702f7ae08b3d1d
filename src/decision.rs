//! Winner selection and decision reports.

use crate::color::{HueBucket, Hsv, Rgb};
use crate::scoring::{AmbientScorer, ScoreBreakdown};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Summary used when every candidate scored zero
pub const NO_WINNER_SUMMARY: &str =
    "No suitable colors found on screen - all candidates were rejected due to low saturation or extreme brightness.";

const ZERO_SCORE_REASON: &str = "Total score is zero";

/// A scored color considered during one decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCandidate {
    pub hex: String,
    pub rgb: Rgb,
    pub hsv: Hsv,
    pub screen_percentage: f64,
    pub score_breakdown: ScoreBreakdown,
    pub is_winner: bool,
    pub rejection_reason: Option<String>,
}

impl ColorCandidate {
    pub fn total_score(&self) -> f64 {
        self.score_breakdown.total_score()
    }

    pub fn hue_degrees(&self) -> f64 {
        self.hsv.hue_degrees()
    }

    pub fn saturation_percent(&self) -> f64 {
        self.hsv.s * 100.0
    }

    pub fn brightness_percent(&self) -> f64 {
        self.hsv.v * 100.0
    }
}

/// Full record of one selection: every candidate and the outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub timestamp: DateTime<Utc>,
    pub winner: Option<ColorCandidate>,
    pub candidates: Vec<ColorCandidate>,
    pub summary: String,
}

impl DecisionReport {
    /// Build a report and generate its summary
    pub fn new(winner: Option<ColorCandidate>, candidates: Vec<ColorCandidate>) -> Self {
        let summary = match &winner {
            Some(w) => describe_winner(w),
            None => NO_WINNER_SUMMARY.to_string(),
        };
        Self {
            timestamp: Utc::now(),
            winner,
            candidates,
            summary,
        }
    }

    /// Top `count` non-winning candidates by score
    pub fn runner_ups(&self, count: usize) -> Vec<&ColorCandidate> {
        let mut others: Vec<&ColorCandidate> = self.candidates.iter().filter(|c| !c.is_winner).collect();
        // Stable sort keeps input order among equal scores
        others.sort_by(|a, b| b.total_score().total_cmp(&a.total_score()));
        others.truncate(count);
        others
    }

    /// Candidates that carry a rejection reason
    pub fn rejected(&self) -> Vec<&ColorCandidate> {
        self.candidates.iter().filter(|c| c.rejection_reason.is_some()).collect()
    }

    pub fn winner_hex(&self) -> Option<&str> {
        self.winner.as_ref().map(|w| w.hex.as_str())
    }
}

fn describe_winner(winner: &ColorCandidate) -> String {
    let breakdown = &winner.score_breakdown;
    let hue = winner.hue_degrees();
    let mut parts = Vec::new();

    let remark = breakdown
        .hue_reason
        .rsplit_once(" - ")
        .map(|(_, remark)| remark)
        .unwrap_or("selected");
    parts.push(format!("{} hue ({:.0}°) - {}", HueBucket::from_degrees(hue), hue, remark));

    let saturation = winner.saturation_percent();
    if saturation >= 70.0 {
        parts.push(format!("High saturation ({:.0}%) ensures vivid appearance", saturation));
    } else {
        parts.push(format!("Saturation of {:.0}% provides good vibrancy", saturation));
    }

    if winner.screen_percentage > 3.0 {
        parts.push(format!(
            "Covers {:.1}% of visible screen content",
            winner.screen_percentage
        ));
    }

    if breakdown.penalties < 0.0 {
        let note = if breakdown.penalty_reasons.is_empty() {
            "penalties applied".to_string()
        } else {
            breakdown.penalty_reasons.join(", ")
        };
        parts.push(format!("Note: {}", note));
    }

    format!("{}.", parts.join(". "))
}

fn rejection_reason(breakdown: &ScoreBreakdown) -> Option<String> {
    if breakdown.total_score() > 0.0 {
        return None;
    }
    if breakdown.saturation_rejected {
        Some(breakdown.saturation_reason.clone())
    } else if breakdown.brightness_score <= -50.0 {
        Some(breakdown.brightness_reason.clone())
    } else {
        Some(ZERO_SCORE_REASON.to_string())
    }
}

/// Scores a candidate list and picks the winner
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionSelector {
    scorer: AmbientScorer,
}

impl DecisionSelector {
    pub fn new(scorer: AmbientScorer) -> Self {
        Self { scorer }
    }

    /// Score each `(hex, percentage)` pair and select a winner
    ///
    /// Malformed entries are logged and skipped. The highest total wins,
    /// earlier entries winning ties; a best score of zero means no winner.
    pub fn decide<'a, I>(&self, colors: I) -> DecisionReport
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut candidates = Vec::new();
        let mut best: Option<(usize, f64)> = None;

        for (hex, percentage) in colors {
            let rgb = match Rgb::from_hex(hex) {
                Ok(rgb) => rgb,
                Err(e) => {
                    warn!("Skipping candidate: {}", e);
                    continue;
                }
            };
            let breakdown = self.scorer.score_rgb(rgb, percentage);
            let total = breakdown.total_score();

            if best.map_or(true, |(_, score)| total > score) {
                best = Some((candidates.len(), total));
            }

            candidates.push(ColorCandidate {
                hex: rgb.to_hex(),
                rgb,
                hsv: rgb.to_hsv(),
                screen_percentage: percentage,
                rejection_reason: rejection_reason(&breakdown),
                score_breakdown: breakdown,
                is_winner: false,
            });
        }

        let winner = match best {
            Some((index, score)) if score > 0.0 => {
                candidates[index].is_winner = true;
                Some(candidates[index].clone())
            }
            _ => None,
        };

        match &winner {
            Some(w) => debug!("Selected {} ({:.1}) from {} candidates", w.hex, w.total_score(), candidates.len()),
            None => debug!("No winner among {} candidates", candidates.len()),
        }

        DecisionReport::new(winner, candidates)
    }
}
