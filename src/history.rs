//! Bounded history of decision reports.
//!
//! Keeps the most recent reports in memory, aggregates statistics over them,
//! and exports them as JSON or CSV for offline analysis.

use crate::color::HueBucket;
use crate::decision::DecisionReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Default number of reports kept
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Most-common-colors list length in statistics
const TOP_COLORS: usize = 10;

/// Summary column width in CSV exports
const CSV_SUMMARY_CHARS: usize = 100;

const CSV_HEADER: &[&str] = &[
    "timestamp",
    "winner_hex",
    "winner_rgb",
    "winner_hue",
    "winner_saturation",
    "winner_brightness",
    "screen_percentage",
    "total_score",
    "saturation_score",
    "brightness_score",
    "prevalence_score",
    "hue_score",
    "penalties",
    "candidates_count",
    "rejected_count",
    "summary",
];

/// Errors raised while exporting history
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mean winner component scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageScores {
    pub saturation: f64,
    pub brightness: f64,
    pub prevalence: f64,
    pub hue_preference: f64,
}

/// Aggregates over the retained reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStatistics {
    pub total_decisions: usize,
    pub no_winner_count: usize,
    /// Winners per hue bucket
    pub hue_distribution: BTreeMap<String, usize>,
    pub average_scores: Option<AverageScores>,
    /// Most frequent winning colors, most frequent first
    pub most_common_colors: Vec<(String, usize)>,
}

#[derive(Serialize)]
struct JsonExport<'a> {
    export_time: DateTime<Utc>,
    total_decisions: usize,
    statistics: HistoryStatistics,
    decisions: Vec<&'a DecisionReport>,
}

/// Ring buffer of decision reports
#[derive(Debug, Clone)]
pub struct DecisionHistory {
    max_entries: usize,
    entries: VecDeque<DecisionReport>,
}

impl DecisionHistory {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            max_entries,
            entries: VecDeque::with_capacity(max_entries.min(DEFAULT_MAX_ENTRIES)),
        }
    }

    /// Append a report, evicting the oldest when full
    pub fn add(&mut self, report: DecisionReport) {
        if self.entries.len() == self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(report);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// The most recent `count` reports, oldest first
    pub fn recent(&self, count: usize) -> Vec<&DecisionReport> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecisionReport> {
        self.entries.iter()
    }

    pub fn statistics(&self) -> HistoryStatistics {
        let mut no_winner_count = 0;
        let mut hue_distribution = BTreeMap::new();
        let mut color_counts: HashMap<&str, usize> = HashMap::new();
        let mut totals = [0.0f64; 4];
        let mut winners = 0usize;

        for report in &self.entries {
            let Some(winner) = &report.winner else {
                no_winner_count += 1;
                continue;
            };

            let bucket = HueBucket::from_degrees(winner.hue_degrees());
            *hue_distribution.entry(bucket.name().to_string()).or_insert(0) += 1;
            *color_counts.entry(winner.hex.as_str()).or_insert(0) += 1;

            let b = &winner.score_breakdown;
            totals[0] += b.saturation_score;
            totals[1] += b.brightness_score;
            totals[2] += b.prevalence_score;
            totals[3] += b.hue_preference_score;
            winners += 1;
        }

        let average_scores = (winners > 0).then(|| {
            let n = winners as f64;
            AverageScores {
                saturation: totals[0] / n,
                brightness: totals[1] / n,
                prevalence: totals[2] / n,
                hue_preference: totals[3] / n,
            }
        });

        let mut most_common_colors: Vec<(String, usize)> = color_counts
            .into_iter()
            .map(|(hex, n)| (hex.to_string(), n))
            .collect();
        most_common_colors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        most_common_colors.truncate(TOP_COLORS);

        HistoryStatistics {
            total_decisions: self.entries.len(),
            no_winner_count,
            hue_distribution,
            average_scores,
            most_common_colors,
        }
    }

    /// Export as CSV when `path` ends in `.csv`, JSON otherwise
    pub fn export(&self, path: &Path) -> Result<(), HistoryError> {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            self.export_csv(path)
        } else {
            self.export_json(path)
        }
    }

    /// Write every report plus statistics as pretty JSON
    pub fn export_json(&self, path: &Path) -> Result<(), HistoryError> {
        create_parent(path)?;
        let export = JsonExport {
            export_time: Utc::now(),
            total_decisions: self.entries.len(),
            statistics: self.statistics(),
            decisions: self.entries.iter().collect(),
        };

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &export)?;
        info!("Exported {} decisions to {:?}", self.entries.len(), path);
        Ok(())
    }

    /// Write one CSV row per report
    pub fn export_csv(&self, path: &Path) -> Result<(), HistoryError> {
        create_parent(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", CSV_HEADER.join(","))?;

        for report in &self.entries {
            let row = csv_row(report);
            let line: Vec<String> = row.iter().map(|field| csv_escape(field)).collect();
            writeln!(writer, "{}", line.join(","))?;
        }

        writer.flush()?;
        info!("Exported {} decisions to {:?}", self.entries.len(), path);
        Ok(())
    }
}

impl Default for DecisionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

fn create_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn csv_row(report: &DecisionReport) -> Vec<String> {
    let timestamp = report.timestamp.to_rfc3339();
    let candidates = report.candidates.len().to_string();
    let rejected = report.rejected().len().to_string();

    match &report.winner {
        Some(w) => {
            let b = &w.score_breakdown;
            vec![
                timestamp,
                w.hex.clone(),
                format!("{},{},{}", w.rgb.r, w.rgb.g, w.rgb.b),
                format!("{:.1}", w.hue_degrees()),
                format!("{:.1}", w.saturation_percent()),
                format!("{:.1}", w.brightness_percent()),
                format!("{:.2}", w.screen_percentage),
                format!("{:.1}", w.total_score()),
                format!("{:.1}", b.saturation_score),
                format!("{:.1}", b.brightness_score),
                format!("{:.1}", b.prevalence_score),
                format!("{:.1}", b.hue_preference_score),
                format!("{:.1}", b.penalties),
                candidates,
                rejected,
                report.summary.chars().take(CSV_SUMMARY_CHARS).collect(),
            ]
        }
        None => {
            debug!("CSV row for report without winner");
            let mut row = vec![timestamp, "none".to_string()];
            row.extend(std::iter::repeat(String::new()).take(5));
            row.push("0".to_string());
            row.extend(std::iter::repeat(String::new()).take(5));
            row.push(candidates);
            row.push(rejected);
            row.push("No suitable color found".to_string());
            row
        }
    }
}

/// Quote a field when it contains a delimiter, quote, or line break
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
