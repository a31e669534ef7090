//! spotify_code - Spotify Code scanning in pure Rust
//!
//! Locates the circular logo of a Spotify Code in a camera frame, finds the
//! zero bar and the last bar, redraws the 23 bars into an upright strip,
//! quantizes their heights and decodes the 37-bit media reference behind
//! them (Gray code, interleaver, convolutional code, CRC-8).
//!
//! ```no_run
//! use spotify_code::{Scanner, Viewfinder};
//!
//! let frame = image::open("code.png").unwrap().to_rgba8();
//! let viewfinder = Viewfinder::full(frame.width(), frame.height());
//! if let Ok(Some(media_ref)) = Scanner::new().scan_rgba(&frame, &viewfinder) {
//!     println!("media reference {media_ref}");
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Scan parameters (thresholds, margins, sampling steps)
pub mod config;
/// Strip rectification, bar quantization and the media reference codec
pub mod decoder;
/// Marker localisation (edges, logo, zero bar, last bar)
pub mod detector;
/// Input-shape errors
pub mod error;
/// Viewfinder crop and capture preparation
pub mod frame;
/// Core data structures (pixels, edge maps, marker geometry, bar sequences)
pub mod models;
/// Stage chaining, observers and telemetry
pub mod pipeline;
/// Synthetic code renderer
pub mod synth;
/// Dataset helpers shared by the CLI, benches and tests
pub mod tools;
/// Utility functions (grayscale, geometry, blending)
pub mod utils;

pub use config::ScanConfig;
pub use decoder::encoder::encode_media_ref;
pub use decoder::media_ref::{decode_levels, decode_sequence, spotify_bar_decode};
pub use error::ScanError;
pub use frame::{PreparedFrame, Viewfinder, prepare_frame, prepare_rgb};
pub use models::{CodeSequence, MediaRef, Point};
pub use pipeline::{DefaultStages, ScanObserver, ScanStages, ScanTelemetry, ScanTrace, Stage};
pub use synth::SyntheticCode;

use image::RgbaImage;

/// Scan an RGBA frame with the default configuration
///
/// The whole frame is the viewfinder. Returns `Ok(None)` when no code is read.
pub fn scan(frame: &RgbaImage) -> Result<Option<MediaRef>, ScanError> {
    Scanner::new().scan_rgba(frame, &Viewfinder::full(frame.width(), frame.height()))
}

/// Reusable scanner holding one configuration
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner with the calibrated defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner with an explicit configuration
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Create a scanner from `SPOTCODE_*` environment overrides
    pub fn from_env() -> Self {
        Self::with_config(ScanConfig::from_env())
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the viewfinder region of an RGBA frame
    pub fn scan_rgba(
        &self,
        frame: &RgbaImage,
        viewfinder: &Viewfinder,
    ) -> Result<Option<MediaRef>, ScanError> {
        let prepared = prepare_frame(frame, viewfinder)?;
        self.scan_prepared(&prepared, &mut ())
    }

    /// Scan the viewfinder region of packed RGB bytes
    pub fn scan_rgb(
        &self,
        rgb: &[u8],
        width: usize,
        height: usize,
        viewfinder: &Viewfinder,
    ) -> Result<Option<MediaRef>, ScanError> {
        let prepared = prepare_rgb(rgb, width, height, viewfinder)?;
        self.scan_prepared(&prepared, &mut ())
    }

    /// Scan an already prepared frame, reporting each stage to `observer`
    pub fn scan_prepared<O: ScanObserver + ?Sized>(
        &self,
        prepared: &PreparedFrame,
        observer: &mut O,
    ) -> Result<Option<MediaRef>, ScanError> {
        self.scan_with_stages(prepared, &DefaultStages, observer)
    }

    /// Scan with substituted stage implementations
    pub fn scan_with_stages<S, O>(
        &self,
        prepared: &PreparedFrame,
        stages: &S,
        observer: &mut O,
    ) -> Result<Option<MediaRef>, ScanError>
    where
        S: ScanStages + ?Sized,
        O: ScanObserver + ?Sized,
    {
        pipeline::scan_capture(
            &prepared.capture,
            &prepared.inverted,
            &self.config,
            stages,
            observer,
        )
    }
}
