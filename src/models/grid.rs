use image::RgbaImage;
use image::imageops;
use rayon::prelude::*;
use std::borrow::Cow;

use super::pixel::{EdgeScore, Pixel};
use crate::config::EdgeConfig;
use crate::error::ScanError;

static OUTSIDE: Pixel = Pixel::OUTSIDE;

/// Dense row-major grid of classified pixels for one frame
#[derive(Debug, Clone)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Build a grid from a grayscale capture and its photometric inverse.
    ///
    /// Both images must share the same dimensions. Edge scores are taken
    /// from Gaussian-blurred copies (sigma `config.blur`) so the sparse edge
    /// scan sees a band around every contour instead of a one-pixel line;
    /// the stored channels stay sharp for the bright and dark tests. Rows
    /// are classified in parallel; the result does not depend on scheduling.
    pub fn build(
        source: &RgbaImage,
        inverted: &RgbaImage,
        config: &EdgeConfig,
    ) -> Result<Self, ScanError> {
        if source.dimensions() != inverted.dimensions() {
            return Err(ScanError::DimensionMismatch {
                source_width: source.width(),
                source_height: source.height(),
                inverted_width: inverted.width(),
                inverted_height: inverted.height(),
            });
        }
        let (width, height) = (source.width() as usize, source.height() as usize);
        if width == 0 || height == 0 {
            return Err(ScanError::EmptyFrame);
        }

        let (scored_src, scored_inv) = Self::smoothed(source, inverted, config.blur);
        let src = source.as_raw();
        let (score_src, score_inv) = (scored_src.as_raw(), scored_inv.as_raw());
        let (black, white) = (config.black_threshold, config.white_threshold);

        let mut pixels = vec![Pixel::default(); width * height];
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let base = y * width * 4;
                for (x, slot) in row.iter_mut().enumerate() {
                    let i = base + x * 4;
                    let scored = Pixel::classify(
                        [score_src[i], score_src[i + 1], score_src[i + 2], score_src[i + 3]],
                        [score_inv[i], score_inv[i + 1], score_inv[i + 2], score_inv[i + 3]],
                        x as u32,
                        y as u32,
                        black,
                        white,
                    );
                    *slot = Pixel {
                        r: src[i],
                        g: src[i + 1],
                        b: src[i + 2],
                        a: src[i + 3],
                        ..scored
                    };
                }
            });

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    fn smoothed<'a>(
        source: &'a RgbaImage,
        inverted: &'a RgbaImage,
        blur: usize,
    ) -> (Cow<'a, RgbaImage>, Cow<'a, RgbaImage>) {
        if blur == 0 {
            return (Cow::Borrowed(source), Cow::Borrowed(inverted));
        }
        let sigma = blur as f32;
        let (s, i) = rayon::join(
            || imageops::blur(source, sigma),
            || imageops::blur(inverted, sigma),
        );
        (Cow::Owned(s), Cow::Owned(i))
    }

    /// Build a grid by evaluating `f` for every coordinate
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(u32, u32) -> Pixel) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height as u32 {
            for x in 0..width as u32 {
                let mut p = f(x, y);
                p.x = x;
                p.y = y;
                pixels.push(p);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Get grid width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get grid height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at (x, y), or `None` outside the grid
    pub fn try_get(&self, x: i64, y: i64) -> Option<&Pixel> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width + x as usize)
    }

    /// Pixel at (x, y); coordinates outside the grid yield a `NotEdge` sentinel
    pub fn get(&self, x: i64, y: i64) -> &Pixel {
        self.try_get(x, y).unwrap_or(&OUTSIDE)
    }

    /// Edge score at (x, y), `NotEdge` outside the grid
    pub fn score(&self, x: i64, y: i64) -> EdgeScore {
        self.get(x, y).score
    }

    /// All pixels in row-major order
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }
}
