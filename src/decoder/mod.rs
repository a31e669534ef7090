//! Decoding after localisation
//!
//! - Rectification of the bar region into an upright strip
//! - Bar height quantization into a 23-level sequence
//! - The media reference codec: Gray code, interleaver, punctured
//!   convolutional code and CRC-8

/// Bar height measurement and level quantization
pub mod bars;
/// Parametrized CRC engine and the CRC-8 used by codes
pub mod crc;
/// Media reference to bar sequence
pub mod encoder;
/// Bar sequence to media reference
pub mod media_ref;
/// Affine redraw of the bar region and last bar calibration
pub mod rectify;
/// Code constants (Gray code, generators, inverse generator matrix)
pub mod tables;
