//! Frame preparation: viewfinder crop, grayscale filter and the inverted twin.

use image::RgbaImage;

use crate::error::ScanError;
use crate::utils::grayscale::{grayscale_filter, invert, rgb_to_rgba};

/// Region of the camera frame the user aims at the code
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewfinder {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Viewfinder {
    /// Viewfinder at an explicit position
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole frame
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Centred band of the given height spanning the full width
    pub fn centered_band(frame_width: u32, frame_height: u32, band_height: u32) -> Self {
        let band_height = band_height.min(frame_height);
        Self::new(0, (frame_height - band_height) / 2, frame_width, band_height)
    }

    fn check(&self, frame_width: u32, frame_height: u32) -> Result<(), ScanError> {
        let fits = self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= frame_width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= frame_height);
        if fits {
            Ok(())
        } else {
            Err(ScanError::ViewfinderOutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                frame_width,
                frame_height,
            })
        }
    }
}

/// Grayscale capture and its channel inverse, same dimensions
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    /// Grayscale-filtered viewfinder crop
    pub capture: RgbaImage,
    /// Channel inverse of `capture`
    pub inverted: RgbaImage,
}

/// Crop, filter and invert an RGBA frame
pub fn prepare_frame(frame: &RgbaImage, viewfinder: &Viewfinder) -> Result<PreparedFrame, ScanError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(ScanError::EmptyFrame);
    }
    viewfinder.check(frame.width(), frame.height())?;
    let crop = image::imageops::crop_imm(
        frame,
        viewfinder.x,
        viewfinder.y,
        viewfinder.width,
        viewfinder.height,
    )
    .to_image();
    let capture = grayscale_filter(&crop);
    let inverted = invert(&capture);
    Ok(PreparedFrame { capture, inverted })
}

/// Same as [`prepare_frame`] for packed RGB bytes
pub fn prepare_rgb(
    rgb: &[u8],
    width: usize,
    height: usize,
    viewfinder: &Viewfinder,
) -> Result<PreparedFrame, ScanError> {
    if width == 0 || height == 0 {
        return Err(ScanError::EmptyFrame);
    }
    let frame = rgb_to_rgba(rgb, width, height).ok_or(ScanError::BufferLength {
        expected: width * height * 3,
        actual: rgb.len(),
    })?;
    prepare_frame(&frame, viewfinder)
}
