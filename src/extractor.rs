//! Dominant color extraction from the analysis grid.
//!
//! Two products come out of every grid:
//!
//! - **Dominant colors**: pixels quantized into 32-wide buckets per channel,
//!   ranked by frequency, optionally limited to colorful buckets. This list
//!   feeds the scorer.
//! - **Representative color**: the single color a screen-sync light should
//!   follow, computed with either the [`ExtractionMode::Average`] or the
//!   [`ExtractionMode::Accent`] strategy.

use crate::color::{is_colorful, Hsv, Rgb, MID_GRAY};
use crate::types::ExtractionMode;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Quantization bucket width per channel
const BUCKET_WIDTH: u8 = 32;

/// Offset from a bucket's lower bound to its center
const BUCKET_CENTER: u8 = 16;

/// Number of hue bins in the accent histogram
pub const HUE_BINS: usize = 18;

/// Share of qualifying pixels the top hue bin needs to take the boosted branch
pub const ACCENT_DOMINANCE_THRESHOLD: f64 = 0.3;

/// Brightness floor applied in the boosted accent branch
pub const ACCENT_BOOSTED_VALUE_FLOOR: f64 = 0.78;

/// Saturation ceiling applied in the balanced accent branch
pub const ACCENT_BALANCED_SATURATION_CAP: f64 = 0.86;

/// Saturation multiplier applied in the balanced accent branch
const ACCENT_BALANCED_SATURATION_GAIN: f64 = 1.5;

/// Pixel mask thresholds (value, saturation), both exclusive
const AVERAGE_MASK: (f64, f64) = (30.0 / 255.0, 20.0 / 255.0);
const ACCENT_MASK: (f64, f64) = (40.0 / 255.0, 50.0 / 255.0);

/// One quantized color bucket and its share of the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantColor {
    pub hex: String,
    pub rgb: Rgb,
    /// Percentage of grid pixels in this bucket, rounded to one decimal
    pub percentage: f64,
}

/// Which accent branch produced the representative color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccentBranch {
    /// Top hue bin exceeded the dominance threshold: full saturation, value floor
    Boosted,
    /// Saturation scaled from the bin average, value kept
    Balanced,
}

/// Accent-mode result with the values behind it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccentAnalysis {
    pub color: Rgb,
    pub branch: AccentBranch,
    pub dominant_bin: usize,
    pub dominance: f64,
}

/// Extracts colors from an analysis grid using a configured strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorExtractor {
    mode: ExtractionMode,
}

impl ColorExtractor {
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ExtractionMode) {
        self.mode = mode;
    }

    /// Representative color of the grid under the configured mode
    pub fn representative(&self, grid: &RgbImage) -> Rgb {
        let pixels = sample_pixels(grid);
        match self.mode {
            ExtractionMode::Average => average_color(&pixels),
            ExtractionMode::Accent => accent_color(&pixels).map(|a| a.color).unwrap_or(MID_GRAY),
        }
    }

    /// Up to `count` most frequent buckets, optionally colorful ones only
    pub fn dominant_colors(&self, grid: &RgbImage, count: usize, colorful_only: bool) -> Vec<DominantColor> {
        dominant_colors(grid, count, colorful_only)
    }
}

/// A grid pixel with its HSV computed once
#[derive(Debug, Clone, Copy)]
struct Sample {
    rgb: Rgb,
    hsv: Hsv,
}

fn sample_pixels(grid: &RgbImage) -> Vec<Sample> {
    grid.pixels()
        .map(|p| {
            let rgb = Rgb::from(*p);
            Sample { rgb, hsv: rgb.to_hsv() }
        })
        .collect()
}

fn passes(sample: &Sample, (min_value, min_saturation): (f64, f64)) -> bool {
    sample.hsv.v > min_value && sample.hsv.s > min_saturation
}

fn mean_rgb<'a>(samples: impl Iterator<Item = &'a Sample>) -> Option<Rgb> {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for s in samples {
        sum[0] += s.rgb.r as u64;
        sum[1] += s.rgb.g as u64;
        sum[2] += s.rgb.b as u64;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(Rgb::new(
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
    ))
}

/// Mean RGB of pixels that are neither too dark nor too gray
fn average_color(pixels: &[Sample]) -> Rgb {
    mean_rgb(pixels.iter().filter(|s| passes(s, AVERAGE_MASK))).unwrap_or(MID_GRAY)
}

fn hue_bin(hue: f64) -> usize {
    ((hue * HUE_BINS as f64) as usize).min(HUE_BINS - 1)
}

/// Histogram-peak accent color; `None` when no pixel passes either mask
fn accent_color(pixels: &[Sample]) -> Option<AccentAnalysis> {
    let mut qualifying: Vec<&Sample> = pixels.iter().filter(|s| passes(s, ACCENT_MASK)).collect();
    if qualifying.is_empty() {
        qualifying = pixels.iter().filter(|s| passes(s, AVERAGE_MASK)).collect();
    }
    if qualifying.is_empty() {
        return None;
    }

    let mut histogram = [0usize; HUE_BINS];
    for s in &qualifying {
        histogram[hue_bin(s.hsv.h)] += 1;
    }

    // First maximum wins
    let mut dominant_bin = 0;
    for (bin, &count) in histogram.iter().enumerate() {
        if count > histogram[dominant_bin] {
            dominant_bin = bin;
        }
    }

    let in_bin: Vec<&Sample> = qualifying
        .iter()
        .copied()
        .filter(|s| hue_bin(s.hsv.h) == dominant_bin)
        .collect();

    let n = in_bin.len() as f64;
    let avg_h = in_bin.iter().map(|s| s.hsv.h).sum::<f64>() / n;
    let avg_s = in_bin.iter().map(|s| s.hsv.s).sum::<f64>() / n;
    let avg_v = in_bin.iter().map(|s| s.hsv.v).sum::<f64>() / n;

    let dominance = histogram[dominant_bin] as f64 / qualifying.len() as f64;

    let (branch, target_s, target_v) = if dominance > ACCENT_DOMINANCE_THRESHOLD {
        (AccentBranch::Boosted, 1.0, avg_v.max(ACCENT_BOOSTED_VALUE_FLOOR))
    } else {
        (
            AccentBranch::Balanced,
            (avg_s * ACCENT_BALANCED_SATURATION_GAIN).min(ACCENT_BALANCED_SATURATION_CAP),
            avg_v,
        )
    };

    let color = Hsv::new(avg_h, target_s, target_v).to_rgb();
    trace!(
        "Accent bin {} dominance {:.2} ({:?}) -> {}",
        dominant_bin,
        dominance,
        branch,
        color
    );

    Some(AccentAnalysis {
        color,
        branch,
        dominant_bin,
        dominance,
    })
}

/// Accent analysis of a grid, exposing the branch taken
pub fn analyze_accent(grid: &RgbImage) -> Option<AccentAnalysis> {
    accent_color(&sample_pixels(grid))
}

fn quantize(channel: u8) -> u8 {
    (channel / BUCKET_WIDTH) * BUCKET_WIDTH + BUCKET_CENTER
}

/// Up to `count` most frequent quantized colors of the grid
///
/// Ties in frequency are ordered by bucket RGB so the ranking is stable.
pub fn dominant_colors(grid: &RgbImage, count: usize, colorful_only: bool) -> Vec<DominantColor> {
    let total = grid.pixels().len();
    if total == 0 || count == 0 {
        return Vec::new();
    }

    let mut buckets: HashMap<Rgb, usize> = HashMap::new();
    for p in grid.pixels() {
        let key = Rgb::new(quantize(p.0[0]), quantize(p.0[1]), quantize(p.0[2]));
        *buckets.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<(Rgb, usize)> = buckets.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| (a.0.r, a.0.g, a.0.b).cmp(&(b.0.r, b.0.g, b.0.b)))
    });

    ranked
        .into_iter()
        .filter(|(rgb, _)| !colorful_only || is_colorful(*rgb))
        .take(count)
        .map(|(rgb, n)| {
            let percentage = (n as f64 / total as f64 * 100.0 * 10.0).round() / 10.0;
            DominantColor {
                hex: rgb.to_hex(),
                rgb,
                percentage,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::{GRID_HEIGHT, GRID_WIDTH};
    use image::Rgb as Pixel;

    fn grid_from(colors: &[([u8; 3], usize)]) -> RgbImage {
        let mut grid = RgbImage::new(GRID_WIDTH, GRID_HEIGHT);
        let mut pixels = colors
            .iter()
            .flat_map(|(c, n)| std::iter::repeat(*c).take(*n));
        for pixel in grid.pixels_mut() {
            *pixel = Pixel(pixels.next().unwrap_or([0, 0, 0]));
        }
        grid
    }

    const CELLS: usize = (GRID_WIDTH * GRID_HEIGHT) as usize;

    #[test]
    fn test_average_mode_masks_dark_and_gray() {
        let grid = grid_from(&[([200, 0, 0], CELLS / 2), ([128, 128, 128], CELLS / 2)]);
        let color = ColorExtractor::new(ExtractionMode::Average).representative(&grid);
        assert_eq!(color, Rgb::new(200, 0, 0));
    }

    #[test]
    fn test_average_mode_means_survivors() {
        let grid = grid_from(&[([200, 0, 0], CELLS / 2), ([0, 0, 100], CELLS / 2)]);
        let color = ColorExtractor::new(ExtractionMode::Average).representative(&grid);
        assert_eq!(color, Rgb::new(100, 0, 50));
    }

    #[test]
    fn test_gray_screen_falls_back_to_mid_gray() {
        let grid = grid_from(&[([90, 90, 90], CELLS)]);
        for mode in [ExtractionMode::Average, ExtractionMode::Accent] {
            assert_eq!(ColorExtractor::new(mode).representative(&grid), MID_GRAY);
        }
        assert_eq!(
            ColorExtractor::new(ExtractionMode::Accent).representative(&RgbImage::new(GRID_WIDTH, GRID_HEIGHT)),
            MID_GRAY
        );
    }

    #[test]
    fn test_accent_dominant_hue_is_boosted() {
        // 40% of qualifying pixels in the red bin, the rest spread over six
        // other bins at 10% each
        let n = CELLS / 10;
        let grid = grid_from(&[
            ([200, 20, 20], 4 * n),
            ([20, 200, 20], n),
            ([20, 20, 200], n),
            ([200, 200, 20], n),
            ([20, 200, 200], n),
            ([200, 20, 200], n),
            ([120, 20, 200], CELLS - 9 * n),
        ]);

        let analysis = analyze_accent(&grid).unwrap();
        assert_eq!(analysis.branch, AccentBranch::Boosted);
        assert_eq!(analysis.dominant_bin, 0);
        assert!(analysis.dominance > 0.3);

        let hsv = analysis.color.to_hsv();
        assert_eq!(hsv.s, 1.0);
        assert!(hsv.v >= ACCENT_BOOSTED_VALUE_FLOOR - 1.0 / 255.0);
        assert_eq!(analysis.color, ColorExtractor::new(ExtractionMode::Accent).representative(&grid));
    }

    #[test]
    fn test_accent_value_floor_lifts_dim_color() {
        let grid = grid_from(&[([100, 10, 10], CELLS)]);
        let analysis = analyze_accent(&grid).unwrap();
        assert_eq!(analysis.branch, AccentBranch::Boosted);
        // 0.78 * 255 = 198.9
        assert_eq!(analysis.color, Rgb::new(198, 0, 0));
    }

    #[test]
    fn test_accent_balanced_branch() {
        // Six hues, none above 30%
        let n = CELLS / 6;
        let grid = grid_from(&[
            ([160, 100, 100], n + CELLS % 6),
            ([100, 160, 100], n),
            ([100, 100, 160], n),
            ([160, 160, 100], n),
            ([100, 160, 160], n),
            ([160, 100, 160], n),
        ]);

        let analysis = analyze_accent(&grid).unwrap();
        assert_eq!(analysis.branch, AccentBranch::Balanced);
        assert!(analysis.dominance <= 0.3);

        // Bin average saturation 0.375 * 1.5 = 0.5625, value kept at 160/255
        let hsv = analysis.color.to_hsv();
        assert!((hsv.s - 0.5625).abs() < 0.02, "saturation {}", hsv.s);
        assert!((hsv.v - 160.0 / 255.0).abs() < 2.0 / 255.0);
    }

    #[test]
    fn test_accent_saturation_cap() {
        // One hue spread thin across bins so no bin passes 30%, with high
        // saturation so the 1.5x gain would exceed the cap
        let n = CELLS / 4;
        let grid = grid_from(&[
            ([180, 40, 40], n),
            ([40, 180, 40], n),
            ([40, 40, 180], n),
            ([180, 180, 40], CELLS - 3 * n),
        ]);
        let analysis = analyze_accent(&grid).unwrap();
        assert_eq!(analysis.branch, AccentBranch::Balanced);
        let s = analysis.color.to_hsv().s;
        assert!((s - ACCENT_BALANCED_SATURATION_CAP).abs() < 0.01, "saturation {}", s);
    }

    #[test]
    fn test_accent_falls_back_to_average_mask() {
        // Saturation 40/255 passes the average mask but not the accent one
        let grid = grid_from(&[([120, 110, 101], CELLS)]);
        let analysis = analyze_accent(&grid).unwrap();
        assert_eq!(analysis.branch, AccentBranch::Boosted);
        assert_eq!(analysis.color.to_hsv().s, 1.0);
    }

    #[test]
    fn test_dominant_colors_ranked_by_frequency() {
        let grid = grid_from(&[
            ([40, 70, 180], 1152),
            ([170, 30, 60], 691),
            ([10, 10, 10], CELLS - 1152 - 691),
        ]);

        let all = dominant_colors(&grid, 10, false);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].hex, "#3050b0");
        assert_eq!(all[0].percentage, 50.0);
        assert_eq!(all[1].hex, "#b01030");
        assert_eq!(all[1].percentage, 30.0);

        let colorful = dominant_colors(&grid, 10, true);
        assert_eq!(colorful.len(), 2);
        assert!(colorful.iter().all(|c| c.hex != "#101010"));
    }

    #[test]
    fn test_dominant_colors_respects_count() {
        let grid = grid_from(&[
            ([40, 70, 180], 100),
            ([170, 30, 60], 90),
            ([30, 160, 60], 80),
            ([10, 10, 10], CELLS - 270),
        ]);
        let top = dominant_colors(&grid, 2, true);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].hex, "#3050b0");
        assert_eq!(top[1].hex, "#b01030");
    }

    #[test]
    fn test_dominant_colors_percentage_rounding() {
        let grid = grid_from(&[([40, 70, 180], 1), ([10, 10, 10], CELLS - 1)]);
        let all = dominant_colors(&grid, 10, false);
        // 1 / 2304 = 0.0434% rounds to 0.0
        assert_eq!(all[1].percentage, 0.0);
        assert_eq!(all[0].percentage, 100.0);
    }
}
