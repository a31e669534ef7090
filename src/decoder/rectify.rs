//! Code redraw: rotate the bar sequence to horizontal and resample it into a
//! fixed-size strip with one bar every second column.
//!
//! Steps, all evaluated lazily by mapping strip pixels back into the source:
//! 1. canvas: zero bar `4 * unit_x` right of the middle of a `2w x 2w`
//!    canvas, the code rotated level around it
//! 2. saturation blend against black, leaving the luminance
//! 3. 256x96 draft built from four horizontally jittered copies, screen blended
//! 4. calibration on the rightmost isolated bright bar
//! 5. horizontal rescale to 45 columns, black separators and guide bands

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::config::RectifyConfig;
use crate::models::{AngleDetail, GridEllipsoid, Point};
use crate::utils::blend::{over, saturation, screen};
use crate::utils::geometry::AffineTransform;

/// Draft strip width
pub const DRAFT_WIDTH: u32 = 256;
/// Draft and final strip height
pub const STRIP_HEIGHT: u32 = 96;
/// Final strip width: 23 bars with a separator between each pair
pub const STRIP_WIDTH: u32 = 45;

const BLACK: [u8; 3] = [0, 0, 0];
const GUIDE_ROWS: u32 = 2;

/// Mapping from strip space back to the source capture
#[derive(Debug, Clone, Copy)]
struct Canvas {
    to_source: AffineTransform,
    origin: f64,
    unit_x: f64,
    unit_y: f64,
}

impl Canvas {
    fn new(
        source_width: u32,
        ellipsoid: &GridEllipsoid,
        angle: &AngleDetail,
        config: &RectifyConfig,
    ) -> Option<Self> {
        let code_height = (ellipsoid.radius_a / 8.0).floor() * 8.0;
        if !(code_height > 0.0) {
            log::debug!("rectify: radius {} too small for a code", ellipsoid.radius_a);
            return None;
        }
        let unit_x = code_height / 16.0;
        let unit_y = code_height / 32.0;
        let origin = source_width as f64;
        let zero = angle.zero();

        let to_canvas = AffineTransform::identity()
            .translate(origin + config.zero_bar_offset * unit_x, origin)
            .rotate(-angle.alpha_degree)
            .translate(-zero.x, -zero.y);
        let to_source = to_canvas.inverse()?;

        Some(Self {
            to_source,
            origin,
            unit_x,
            unit_y,
        })
    }

    /// Canvas pixel after the saturation blend
    fn sample(&self, source: &RgbaImage, x: f64, y: f64) -> [u8; 3] {
        let p = self.to_source.apply(&Point::new(x, y));
        saturation(sample_bilinear(source, p), BLACK)
    }
}

/// Redraws the located code into the canonical strip
pub struct Rectifier;

impl Rectifier {
    /// Produce the 45x96 strip, `None` when no calibration bar is found
    pub fn redraw(
        source: &RgbaImage,
        ellipsoid: &GridEllipsoid,
        angle: &AngleDetail,
        config: &RectifyConfig,
    ) -> Option<RgbaImage> {
        let canvas = Canvas::new(source.width(), ellipsoid, angle, config)?;
        let draft = Self::draft(source, &canvas, config);
        let last = Self::calibrate(&draft, config)?;
        log::trace!("rectify: last bar at draft column {}", last);
        Some(Self::finalize(&draft, last, config))
    }

    fn draft(source: &RgbaImage, canvas: &Canvas, config: &RectifyConfig) -> RgbaImage {
        let copies = config.jitter_copies.max(1);
        let row_bytes = DRAFT_WIDTH as usize * 4;
        let mut buf = vec![0u8; row_bytes * STRIP_HEIGHT as usize];
        buf.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(v, row)| {
                let y = canvas.origin - (STRIP_HEIGHT / 2) as f64 * canvas.unit_y
                    + v as f64 * canvas.unit_y;
                for (u, px) in row.chunks_exact_mut(4).enumerate() {
                    let x = canvas.origin + u as f64 * canvas.unit_x;
                    let rgb = (0..copies).fold(BLACK, |acc, j| {
                        let jitter = j as f64 * canvas.unit_x / copies as f64;
                        screen(acc, canvas.sample(source, x + jitter, y))
                    });
                    px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
                }
            });
        RgbaImage::from_raw(DRAFT_WIDTH, STRIP_HEIGHT, buf)
            .unwrap_or_else(|| RgbaImage::new(DRAFT_WIDTH, STRIP_HEIGHT))
    }

    /// Centre column of the last bar.
    ///
    /// Scans from the right edge; the first quarter of the draft is never
    /// considered.
    pub(crate) fn calibrate(draft: &RgbaImage, config: &RectifyConfig) -> Option<f64> {
        let (width, height) = draft.dimensions();
        let mid = height / 2;
        let red = |x: u32, y: u32| draft.get_pixel(x, y)[0];
        let bright = |x: u32, y: u32| red(x, y) >= config.bright_threshold;
        let dark = |x: u32, y: u32| red(x, y) < config.dark_threshold;

        let found = (width / 4 + 1..width).rev().find(|&u| {
            [mid - 2, mid, mid + 2].iter().all(|&v| bright(u, v))
                && dark(u, 0)
                && dark(u, height - 1)
                && (u + 3 >= width || dark(u + 3, mid))
        });
        let Some(right) = found else {
            log::debug!("rectify: no calibration bar");
            return None;
        };
        let mut left = right;
        while left > 0 && bright(left - 1, mid) {
            left -= 1;
        }
        Some((left + right) as f64 / 2.0)
    }

    fn finalize(draft: &RgbaImage, last: f64, config: &RectifyConfig) -> RgbaImage {
        let first = config.zero_bar_offset;
        let step = (last - first) / (STRIP_WIDTH - 1) as f64;
        let max_x = (draft.width() - 1) as f64;

        RgbaImage::from_fn(STRIP_WIDTH, STRIP_HEIGHT, |x, y| {
            let rgb = if x % 2 == 1 {
                BLACK
            } else {
                let xd = (first + x as f64 * step).clamp(0.0, max_x);
                let x0 = xd.floor();
                let t = xd - x0;
                let a = draft.get_pixel(x0 as u32, y);
                let b = draft.get_pixel((x0 + 1.0).min(max_x) as u32, y);
                let mix = |i: usize| (a[i] as f64 * (1.0 - t) + b[i] as f64 * t).round() as u8;
                [mix(0), mix(1), mix(2)]
            };
            let rgb = if y < GUIDE_ROWS || y >= STRIP_HEIGHT - GUIDE_ROWS {
                over(rgb, BLACK, 0.5)
            } else {
                rgb
            };
            Rgba([rgb[0], rgb[1], rgb[2], 255])
        })
    }
}

/// Bilinear RGB sample; positions outside the image read as black
fn sample_bilinear(image: &RgbaImage, p: Point) -> [u8; 3] {
    if !p.is_finite() {
        return BLACK;
    }
    let (width, height) = (image.width() as i64, image.height() as i64);
    let x0 = p.x.floor();
    let y0 = p.y.floor();
    let (tx, ty) = (p.x - x0, p.y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let at = |x: i64, y: i64| -> [f64; 3] {
        if x < 0 || y < 0 || x >= width || y >= height {
            return [0.0; 3];
        }
        let px = image.get_pixel(x as u32, y as u32);
        [px[0] as f64, px[1] as f64, px[2] as f64]
    };
    let (p00, p10, p01, p11) = (at(x0, y0), at(x0 + 1, y0), at(x0, y0 + 1), at(x0 + 1, y0 + 1));

    let mut out = [0u8; 3];
    for i in 0..3 {
        let top = p00[i] * (1.0 - tx) + p10[i] * tx;
        let bottom = p01[i] * (1.0 - tx) + p11[i] * tx;
        out[i] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}
