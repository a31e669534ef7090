//! Synthetic code images.
//!
//! An idealized marker: a white logo disc with a one pixel gray rim on black,
//! followed by 23 white rectangular bars centred on the axis through the logo
//! centre. The whole code can be rotated about the logo centre and placed
//! anywhere in a frame. Used by the CLI to render encoded references, and by
//! tests and benchmarks as a scannable frame.

use image::{Rgba, RgbaImage};

use crate::models::{BAR_COUNT, CodeSequence, Point};

const RIM: u8 = 128;

/// Geometry of a synthetic code, in pixels
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SyntheticCode {
    /// Logo disc radius
    pub logo_radius: u32,
    /// Offset of bar 0's left edge from the logo centre, along the axis
    pub bar_origin: f64,
    /// Distance between bar left edges
    pub bar_pitch: f64,
    /// Bar width
    pub bar_width: u32,
    /// Half height of a level 0 bar
    pub base_half_height: f64,
    /// Half height added per level
    pub level_half_height: f64,
    /// Rotation about the logo centre, clockwise on screen
    pub rotation_degrees: f64,
}

impl Default for SyntheticCode {
    fn default() -> Self {
        Self::with_radius(36)
    }
}

impl SyntheticCode {
    /// Proportions that the default scan configuration reads back
    pub fn with_radius(logo_radius: u32) -> Self {
        let r = logo_radius as f64;
        Self {
            logo_radius,
            bar_origin: 1.6 * r,
            bar_pitch: 0.4 * r,
            bar_width: ((r / 9.0).round() as u32).max(1),
            base_half_height: r / 12.0,
            level_half_height: r / 12.0,
            rotation_degrees: 0.0,
        }
    }

    /// Same code rotated by `degrees`
    pub fn rotated(self, degrees: f64) -> Self {
        Self {
            rotation_degrees: degrees,
            ..self
        }
    }

    /// Frame dimensions of [`render`](Self::render); the logo centre sits at `(3r, 3r)`
    pub fn frame_size(&self) -> (u32, u32) {
        (14 * self.logo_radius, 6 * self.logo_radius)
    }

    /// Draw `sequence` into a new opaque frame of [`frame_size`](Self::frame_size)
    pub fn render(&self, sequence: &CodeSequence) -> RgbaImage {
        let (width, height) = self.frame_size();
        let c = (3 * self.logo_radius) as f64;
        self.render_at(sequence, width, height, Point::new(c, c))
    }

    /// Draw `sequence` into a `width x height` frame with the logo centre at `center`
    pub fn render_at(
        &self,
        sequence: &CodeSequence,
        width: u32,
        height: u32,
        center: Point,
    ) -> RgbaImage {
        let r = self.logo_radius as f64;
        let bar_width = self.bar_width as i64;
        let bars: Vec<(i64, f64)> = sequence
            .levels()
            .iter()
            .take(BAR_COUNT)
            .enumerate()
            .map(|(i, &level)| {
                let left = (self.bar_origin + i as f64 * self.bar_pitch).round() as i64;
                let half = self.base_half_height + level as f64 * self.level_half_height;
                (left, half)
            })
            .collect();
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();

        RgbaImage::from_fn(width, height, |x, y| {
            let (dx, dy) = (x as f64 - center.x, y as f64 - center.y);
            // position in code coordinates: u along the bar axis, v across it
            let u = cos * dx + sin * dy;
            let v = -sin * dx + cos * dy;
            let dist = (dx * dx + dy * dy).sqrt();
            let logo = if dist < r - 0.5 {
                255
            } else if dist <= r + 0.5 {
                RIM
            } else {
                0
            };
            let on_bar = u > r
                && bars.iter().any(|&(left, half)| {
                    left as f64 <= u && u < (left + bar_width) as f64 && v.abs() <= half
                });
            let value = if on_bar { 255 } else { logo };
            Rgba([value, value, value, 255])
        })
    }
}
