//! Bar height measurement and quantization to levels 0-7.
//!
//! Two entry points with separate thresholds:
//! - [`BarQuantizer::parse_strip`] reads the canonical strip produced by the
//!   rectifier (threshold 200, heights normalized by the tallest bar)
//! - [`BarQuantizer::parse_frame`] reads bars straight from a frame whose
//!   columns are already known (threshold 130, heights normalized by the
//!   centre bar)

use image::RgbaImage;

use super::rectify::STRIP_WIDTH;
use crate::config::BarConfig;
use crate::models::{BAR_COUNT, CodeSequence};

/// Bar positions in an unrectified, axis-aligned frame
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BarLayout {
    /// Column of each bar, left to right
    pub columns: [u32; BAR_COUNT],
    /// First row of the measured band
    pub top: u32,
    /// Last row of the measured band (inclusive)
    pub bottom: u32,
}

impl BarLayout {
    /// Evenly spaced bars between the first and last column
    pub fn evenly_spaced(first: u32, last: u32, top: u32, bottom: u32) -> Self {
        let step = (last as f64 - first as f64) / (BAR_COUNT - 1) as f64;
        let mut columns = [0u32; BAR_COUNT];
        for (i, c) in columns.iter_mut().enumerate() {
            *c = (first as f64 + i as f64 * step).round() as u32;
        }
        Self {
            columns,
            top,
            bottom,
        }
    }
}

/// Turns bar heights into a validated [`CodeSequence`]
pub struct BarQuantizer;

const CENTER_BAR: usize = 11;

impl BarQuantizer {
    /// Read the 23 bars of a canonical strip (one bar every second column)
    pub fn parse_strip(strip: &RgbaImage, config: &BarConfig) -> Option<CodeSequence> {
        if strip.width() < STRIP_WIDTH || strip.height() == 0 {
            log::debug!("bars: strip is {}x{}", strip.width(), strip.height());
            return None;
        }
        let heights: Vec<u32> = (0..BAR_COUNT as u32)
            .map(|i| Self::column_height(strip, 2 * i, 0, strip.height() - 1, config.strip_threshold))
            .collect();
        let max = heights.iter().copied().max().unwrap_or(0);
        Self::validate(&Self::quantize(&heights, max)?)
    }

    /// Read bars from a frame at known columns.
    ///
    /// Legacy path: it trusts the layout instead of rectifying, and uses its
    /// own lower threshold.
    pub fn parse_frame(
        frame: &RgbaImage,
        layout: &BarLayout,
        config: &BarConfig,
    ) -> Option<CodeSequence> {
        let (width, height) = frame.dimensions();
        if height == 0 || layout.columns.iter().any(|&c| c >= width) {
            log::debug!("bars: layout outside the {}x{} frame", width, height);
            return None;
        }
        let bottom = layout.bottom.min(height - 1);
        let heights: Vec<u32> = layout
            .columns
            .iter()
            .map(|&x| Self::column_height(frame, x, layout.top, bottom, config.raw_frame_threshold))
            .collect();
        Self::validate(&Self::quantize(&heights, heights[CENTER_BAR])?)
    }

    /// Count of pixels in `x` between `top` and `bottom` whose red channel
    /// exceeds `threshold`
    fn column_height(image: &RgbaImage, x: u32, top: u32, bottom: u32, threshold: u8) -> u32 {
        (top..=bottom)
            .filter(|&y| image.get_pixel(x, y)[0] > threshold)
            .count() as u32
    }

    /// `round(h / reference * 8) - 1`, floored at 0 and capped at 7
    pub fn quantize(heights: &[u32], reference: u32) -> Option<Vec<u8>> {
        if reference == 0 {
            log::debug!("bars: reference height is zero");
            return None;
        }
        Some(
            heights
                .iter()
                .map(|&h| {
                    let scaled = (h as f64 / reference as f64 * 8.0).round() as i64 - 1;
                    scaled.clamp(0, 7) as u8
                })
                .collect(),
        )
    }

    fn validate(levels: &[u8]) -> Option<CodeSequence> {
        match CodeSequence::from_levels(levels) {
            Ok(seq) => seq,
            Err(e) => {
                log::debug!("bars: {}", e);
                None
            }
        }
    }
}
