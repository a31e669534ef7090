//! Grayscale filtering and photometric inversion.
//!
//! Luminance uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8.
//! Rows are processed in parallel with rayon.

use image::RgbaImage;
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Luminance of one RGB triple
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}

/// Grayscale-filter an RGBA image: every color channel becomes the pixel's
/// luminance, alpha is kept
pub fn grayscale_filter(image: &RgbaImage) -> RgbaImage {
    map_rows(image, |px| {
        let y = luminance(px[0], px[1], px[2]);
        [y, y, y, px[3]]
    })
}

/// Channel-invert an RGBA image (alpha is kept)
pub fn invert(image: &RgbaImage) -> RgbaImage {
    map_rows(image, |px| [255 - px[0], 255 - px[1], 255 - px[2], px[3]])
}

/// Convert packed RGB bytes into an opaque RGBA image
pub fn rgb_to_rgba(rgb: &[u8], width: usize, height: usize) -> Option<RgbaImage> {
    if rgb.len() != width * height * 3 {
        return None;
    }
    let mut out = vec![0u8; width * height * 4];
    out.par_chunks_mut(4)
        .zip(rgb.par_chunks(3))
        .for_each(|(dst, src)| {
            dst[..3].copy_from_slice(src);
            dst[3] = 255;
        });
    RgbaImage::from_raw(width as u32, height as u32, out)
}

fn map_rows(image: &RgbaImage, f: impl Fn(&[u8]) -> [u8; 4] + Sync) -> RgbaImage {
    let (width, height) = image.dimensions();
    let row_bytes = width as usize * 4;
    let mut out = vec![0u8; row_bytes * height as usize];
    if row_bytes > 0 {
        out.par_chunks_mut(row_bytes)
            .zip(image.as_raw().par_chunks(row_bytes))
            .for_each(|(dst, src)| {
                for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                    d.copy_from_slice(&f(s));
                }
            });
    }
    RgbaImage::from_raw(width, height, out).unwrap_or_else(|| RgbaImage::new(width, height))
}
