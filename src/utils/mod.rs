//! Utility functions for image processing
//!
//! - Grayscale filtering and photometric inversion of captures
//! - Affine transforms for the code redraw
//! - W3C compositing blend modes (saturation, screen)

pub mod blend;
pub mod geometry;
pub mod grayscale;
