//! Scan parameters, threaded explicitly through every stage.
//!
//! Defaults hold the calibrated constants. `ScanConfig::from_env` overlays
//! `SPOTCODE_*` variables on top of them; values that fail to parse keep the
//! default.

use serde::{Deserialize, Serialize};

fn parse_env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default)
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn parse_env_opt_f64(name: &str, default: Option<f64>) -> Option<f64> {
    match std::env::var(name) {
        Ok(v) if v.trim().eq_ignore_ascii_case("off") => None,
        Ok(v) => v
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .or(default),
        Err(_) => default,
    }
}

/// Pixel classification and edge pattern scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Channels below this are black
    pub black_threshold: u8,
    /// Channels at or above this are white
    pub white_threshold: u8,
    /// Stride of the edge scan in both axes
    pub scan_step: usize,
    /// Gaussian sigma, in pixels, applied to both images before scoring
    /// (`0` scores the sharp images). The scan keeps `3 * blur` pixels away
    /// from the border.
    pub blur: usize,
    /// Minimum matches required per diagonal direction
    pub min_cluster: usize,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            black_threshold: 20,
            white_threshold: 180,
            scan_step: 3,
            blur: 2,
            min_cluster: 2,
        }
    }
}

impl EdgeConfig {
    /// Distance kept from the grid border while scanning
    pub fn margin(&self) -> usize {
        self.blur.saturating_mul(3)
    }
}

/// Plausibility gates for the fitted logo ellipse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EllipsoidConfig {
    /// Required clearance from the top, left and bottom frame edges
    pub frame_margin: f64,
    /// Largest vertical radius as a fraction of the frame height
    pub max_radius_fraction: f64,
    /// Largest accepted `|radius_a - radius_b|`; `None` disables the check
    pub max_flatness: Option<f64>,
    /// Edge points farther from the centroid than this multiple of the
    /// median distance are dropped before fitting; `None` keeps every point
    pub outlier_factor: Option<f64>,
}

impl Default for EllipsoidConfig {
    fn default() -> Self {
        Self {
            frame_margin: 3.0,
            max_radius_fraction: 0.25,
            max_flatness: None,
            outlier_factor: Some(1.4),
        }
    }
}

/// Where the zero bar is reported once the window scan hits it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroBarAnchor {
    /// The first qualifying pixel, in column-major scan order
    FirstHit,
    /// Centre of the bright run containing the first qualifying pixel
    #[default]
    RunCenter,
}

impl std::str::FromStr for ZeroBarAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_hit" | "first" => Ok(Self::FirstHit),
            "run_center" | "center" => Ok(Self::RunCenter),
            other => Err(format!("unknown zero bar anchor '{}'", other)),
        }
    }
}

/// Zero bar search and the bright-isolated pixel test shared with the
/// boundary scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Window start, in radii right of the centre
    pub window_near: f64,
    /// Window end, in radii right of the centre
    pub window_far: f64,
    /// Window half height, in radii
    pub window_half_height: f64,
    /// Diagonal neighbour offset, in radii
    pub isolation_factor: f64,
    /// Red and green at or above this are white
    pub bright_threshold: u8,
    /// Red below this is black
    pub dark_threshold: u8,
    /// Reported zero bar location
    pub zero_bar_anchor: ZeroBarAnchor,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            window_near: 1.5,
            window_far: 2.0,
            window_half_height: 1.5,
            isolation_factor: 0.3,
            bright_threshold: 200,
            dark_threshold: 100,
            zero_bar_anchor: ZeroBarAnchor::RunCenter,
        }
    }
}

/// Last bar projection and polar search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Weight of the centre-to-zero-bar chord in the width estimate
    pub chord_coefficient: f64,
    /// Weight of the width difference in the width estimate
    pub difference_coefficient: f64,
    /// Horizontal stretch of the search ellipse
    pub horizontal_stretch: f64,
    /// Vertical stretch of the search ellipse
    pub vertical_stretch: f64,
    /// Angular step of the search, in degrees
    pub angle_step_degrees: f64,
    /// Report the last bar at the centre of the bar nearest the match
    /// extent, and take the rotation from the zero-to-last baseline
    pub refine_rotation: bool,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            chord_coefficient: 5.4,
            difference_coefficient: 0.0,
            horizontal_stretch: 1.2,
            vertical_stretch: 2.5,
            angle_step_degrees: 10.0,
            refine_rotation: true,
        }
    }
}

/// Code redraw into the canonical strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Strip columns left of the zero bar centre
    pub zero_bar_offset: f64,
    /// Horizontally jittered copies blended into the draft strip
    pub jitter_copies: usize,
    /// Red at or above this is part of a bar during calibration
    pub bright_threshold: u8,
    /// Red below this is background during calibration
    pub dark_threshold: u8,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            zero_bar_offset: 4.0,
            jitter_copies: 4,
            bright_threshold: 200,
            dark_threshold: 100,
        }
    }
}

/// Bar height measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    /// Red above this counts toward a bar in the canonical strip
    pub strip_threshold: u8,
    /// Red above this counts toward a bar when parsing a raw frame
    pub raw_frame_threshold: u8,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            strip_threshold: 200,
            raw_frame_threshold: 130,
        }
    }
}

/// Every tunable of the scan pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Grid and edge mapper
    pub edge: EdgeConfig,
    /// Ellipsoid locator
    pub ellipsoid: EllipsoidConfig,
    /// Orientation scanner
    pub orientation: OrientationConfig,
    /// Boundary scanner
    pub boundary: BoundaryConfig,
    /// Rectifier
    pub rectify: RectifyConfig,
    /// Bar quantizer
    pub bars: BarConfig,
}

impl ScanConfig {
    /// Defaults overlaid with `SPOTCODE_*` environment variables
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            edge: EdgeConfig {
                black_threshold: parse_env_u8("SPOTCODE_EDGE_BLACK", d.edge.black_threshold),
                white_threshold: parse_env_u8("SPOTCODE_EDGE_WHITE", d.edge.white_threshold),
                scan_step: parse_env_usize("SPOTCODE_EDGE_STEP", d.edge.scan_step).max(1),
                blur: parse_env_usize("SPOTCODE_EDGE_BLUR", d.edge.blur),
                min_cluster: parse_env_usize("SPOTCODE_EDGE_MIN_CLUSTER", d.edge.min_cluster),
            },
            ellipsoid: EllipsoidConfig {
                frame_margin: parse_env_f64("SPOTCODE_FRAME_MARGIN", d.ellipsoid.frame_margin),
                max_radius_fraction: parse_env_f64(
                    "SPOTCODE_MAX_RADIUS_FRACTION",
                    d.ellipsoid.max_radius_fraction,
                ),
                max_flatness: parse_env_opt_f64("SPOTCODE_MAX_FLATNESS", d.ellipsoid.max_flatness),
                outlier_factor: parse_env_opt_f64(
                    "SPOTCODE_OUTLIER_FACTOR",
                    d.ellipsoid.outlier_factor,
                ),
            },
            orientation: OrientationConfig {
                bright_threshold: parse_env_u8(
                    "SPOTCODE_BRIGHT",
                    d.orientation.bright_threshold,
                ),
                dark_threshold: parse_env_u8("SPOTCODE_DARK", d.orientation.dark_threshold),
                isolation_factor: parse_env_f64(
                    "SPOTCODE_ISOLATION_FACTOR",
                    d.orientation.isolation_factor,
                ),
                zero_bar_anchor: std::env::var("SPOTCODE_ZERO_BAR_ANCHOR")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(d.orientation.zero_bar_anchor),
                ..d.orientation
            },
            boundary: BoundaryConfig {
                angle_step_degrees: parse_env_f64(
                    "SPOTCODE_BOUNDARY_ANGLE_STEP",
                    d.boundary.angle_step_degrees,
                )
                .max(1.0),
                refine_rotation: std::env::var("SPOTCODE_REFINE_ROTATION")
                    .map(|v| !matches!(v.trim(), "0" | "false" | "off"))
                    .unwrap_or(d.boundary.refine_rotation),
                ..d.boundary
            },
            rectify: RectifyConfig {
                jitter_copies: parse_env_usize("SPOTCODE_JITTER_COPIES", d.rectify.jitter_copies)
                    .clamp(1, 16),
                ..d.rectify
            },
            bars: BarConfig {
                strip_threshold: parse_env_u8("SPOTCODE_STRIP_THRESHOLD", d.bars.strip_threshold),
                raw_frame_threshold: parse_env_u8(
                    "SPOTCODE_RAW_THRESHOLD",
                    d.bars.raw_frame_threshold,
                ),
            },
        }
    }
}
