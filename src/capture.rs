//! Display capture.
//!
//! A [`FrameSource`] produces full-resolution RGB frames of one monitor. The
//! engines only ever talk to the trait, so the live display grabber, a still
//! image on disk, and test fixtures are interchangeable.

use crate::types::{CaptureError, MonitorIndex};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// A captured frame, 8-bit RGB, row-major
pub type Frame = RgbImage;

/// Anything that can grab a frame of a monitor
///
/// Implementations are called from a blocking thread and must not assume a
/// runtime is available.
pub trait FrameSource: Send + Sync {
    /// Capture the monitor at `monitor_index` (0 = primary)
    fn capture(&self, monitor_index: MonitorIndex) -> Result<Frame, CaptureError>;

    /// Number of monitors this source can capture
    fn monitor_count(&self) -> usize {
        1
    }
}

#[cfg(target_os = "macos")]
mod macos {
    use super::*;
    use core_graphics::display::{
        CGDirectDisplayID, CGDisplayBounds, CGGetActiveDisplayList, CGMainDisplayID,
    };
    use core_graphics::geometry::{CGPoint, CGRect, CGSize};
    use core_graphics::image::CGImage;
    use core_graphics::window::{kCGWindowImageBestResolution, CGWindowListCreateImage};
    use foreign_types_shared::ForeignType;

    /// Active displays, main display first
    pub fn display_ids() -> Vec<CGDirectDisplayID> {
        let mut display_count: u32 = 0;

        unsafe {
            CGGetActiveDisplayList(0, std::ptr::null_mut(), &mut display_count);
        }

        if display_count == 0 {
            return vec![];
        }

        let mut displays = vec![0u32; display_count as usize];
        unsafe {
            CGGetActiveDisplayList(display_count, displays.as_mut_ptr(), &mut display_count);
        }
        displays.truncate(display_count as usize);

        let main_display = unsafe { CGMainDisplayID() };
        displays.sort_by_key(|id| *id != main_display);
        displays
    }

    /// Capture an entire display
    pub fn capture_display(display_id: CGDirectDisplayID) -> Result<Frame, CaptureError> {
        let bounds = unsafe { CGDisplayBounds(display_id) };

        let rect = CGRect::new(
            &CGPoint::new(bounds.origin.x, bounds.origin.y),
            &CGSize::new(bounds.size.width, bounds.size.height),
        );

        let cg_image: CGImage = unsafe {
            let image_ref = CGWindowListCreateImage(
                rect,
                0, // kCGWindowListOptionAll
                0, // kCGNullWindowID
                kCGWindowImageBestResolution,
            );
            if image_ref.is_null() {
                return Err(CaptureError::PermissionDenied(
                    "screen recording permission is required".to_string(),
                ));
            }
            CGImage::from_ptr(image_ref)
        };

        convert_cgimage_to_rgb(&cg_image)
    }

    /// Convert a BGRA CGImage to an RGB frame, dropping alpha
    fn convert_cgimage_to_rgb(cg_image: &CGImage) -> Result<Frame, CaptureError> {
        let width = cg_image.width();
        let height = cg_image.height();
        let bytes_per_row = cg_image.bytes_per_row();
        let bytes_per_pixel = cg_image.bits_per_pixel() / 8;

        let data = cg_image.data();
        let bytes = data.bytes();

        if bytes.is_empty() || bytes_per_pixel < 3 {
            return Err(CaptureError::Failed("display returned no pixel data".to_string()));
        }

        let mut rgb_data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            let row_start = y * bytes_per_row;
            for x in 0..width {
                let pixel_start = row_start + x * bytes_per_pixel;
                if pixel_start + 2 >= bytes.len() {
                    return Err(CaptureError::Failed("truncated pixel buffer".to_string()));
                }
                let b = bytes[pixel_start];
                let g = bytes[pixel_start + 1];
                let r = bytes[pixel_start + 2];
                rgb_data.extend_from_slice(&[r, g, b]);
            }
        }

        RgbImage::from_raw(width as u32, height as u32, rgb_data)
            .ok_or_else(|| CaptureError::Failed("pixel buffer size mismatch".to_string()))
    }
}

/// Live capture of the physical displays
#[derive(Debug, Default)]
pub struct DisplayCapture;

impl DisplayCapture {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
impl FrameSource for DisplayCapture {
    fn capture(&self, monitor_index: MonitorIndex) -> Result<Frame, CaptureError> {
        let displays = macos::display_ids();
        let display_id = *displays
            .get(monitor_index)
            .ok_or(CaptureError::MonitorNotFound(monitor_index))?;

        trace!("Capturing display {} (monitor {})", display_id, monitor_index);
        let start = std::time::Instant::now();
        let frame = macos::capture_display(display_id)?;
        tracing::debug!(
            "Display {} captured {}x{} in {:?}",
            display_id,
            frame.width(),
            frame.height(),
            start.elapsed()
        );
        Ok(frame)
    }

    fn monitor_count(&self) -> usize {
        macos::display_ids().len().max(1)
    }
}

#[cfg(not(target_os = "macos"))]
impl FrameSource for DisplayCapture {
    fn capture(&self, _monitor_index: MonitorIndex) -> Result<Frame, CaptureError> {
        Err(CaptureError::Unsupported)
    }
}

/// Serves a still image from disk as every monitor's frame
///
/// The file is re-read on each capture so edits show up live.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for ImageFileSource {
    fn capture(&self, monitor_index: MonitorIndex) -> Result<Frame, CaptureError> {
        if monitor_index != 0 {
            return Err(CaptureError::MonitorNotFound(monitor_index));
        }
        trace!("Loading frame from {:?}", self.path);
        let frame = image::open(&self.path)?.to_rgb8();
        Ok(frame)
    }
}

/// Returns a fixed frame; useful for tests and dry runs
#[derive(Debug, Clone)]
pub struct StaticFrameSource {
    frame: Frame,
}

impl StaticFrameSource {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }

    /// A `width` x `height` frame filled with one color
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(width, height, Rgb(color)))
    }
}

impl FrameSource for StaticFrameSource {
    fn capture(&self, monitor_index: MonitorIndex) -> Result<Frame, CaptureError> {
        if monitor_index != 0 {
            warn!("Static source has a single monitor, ignoring index {}", monitor_index);
        }
        Ok(self.frame.clone())
    }
}
