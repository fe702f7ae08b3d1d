//! Edge cropping and downsampling of captured frames.
//!
//! Every frame is reduced to a fixed [`GRID_WIDTH`] x [`GRID_HEIGHT`] analysis
//! grid so the cost of extraction does not depend on the display resolution.

use crate::capture::Frame;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::trace;

/// Analysis grid width
pub const GRID_WIDTH: u32 = 64;

/// Analysis grid height
pub const GRID_HEIGHT: u32 = 36;

/// Largest crop accepted from each edge, in percent
pub const MAX_CROP_PERCENT: f32 = 40.0;

/// Pixel-space crop rectangle inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Remove `crop_percent` of the frame from each edge
    ///
    /// The crop is clamped to `[0, 40]` and the margins shrink so that at
    /// least a 1x1 region remains for any non-empty frame.
    pub fn from_crop(frame_width: u32, frame_height: u32, crop_percent: f32) -> Self {
        let crop = if crop_percent.is_finite() {
            crop_percent.clamp(0.0, MAX_CROP_PERCENT)
        } else {
            0.0
        };

        let margin_x = clamp_margin(frame_width, (frame_width as f64 * crop as f64 / 100.0) as u32);
        let margin_y = clamp_margin(frame_height, (frame_height as f64 * crop as f64 / 100.0) as u32);

        Self {
            x: margin_x,
            y: margin_y,
            width: frame_width.saturating_sub(2 * margin_x),
            height: frame_height.saturating_sub(2 * margin_y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

fn clamp_margin(extent: u32, margin: u32) -> u32 {
    if extent == 0 {
        return 0;
    }
    if extent.saturating_sub(2 * margin) >= 1 {
        margin
    } else {
        (extent - 1) / 2
    }
}

/// Crop the edges of `frame` and reduce it to the analysis grid
///
/// Uses area averaging when the cropped region covers the grid in both
/// dimensions and nearest-neighbor resampling otherwise. An empty frame
/// yields an all-black grid.
pub fn crop_and_downsample(frame: &Frame, crop_percent: f32) -> RgbImage {
    let region = Region::from_crop(frame.width(), frame.height(), crop_percent);
    if region.is_empty() {
        trace!("Empty frame, returning black grid");
        return RgbImage::new(GRID_WIDTH, GRID_HEIGHT);
    }

    trace!(
        "Downsampling {}x{} region at ({}, {}) from {}x{} frame",
        region.width,
        region.height,
        region.x,
        region.y,
        frame.width(),
        frame.height()
    );

    let cropped = imageops::crop_imm(frame, region.x, region.y, region.width, region.height);
    if region.width >= GRID_WIDTH && region.height >= GRID_HEIGHT {
        imageops::thumbnail(&*cropped, GRID_WIDTH, GRID_HEIGHT)
    } else {
        imageops::resize(&cropped.to_image(), GRID_WIDTH, GRID_HEIGHT, FilterType::Nearest)
    }
}
