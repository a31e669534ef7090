//! Zero bar search.
//!
//! The zero bar is the first short bar right of the logo and the first
//! thin bright feature in a window of `[1.5r, 2r]` to the right of the
//! circle centre. The redraw is anchored on it.

use super::{bar_center, is_bright_isolated, isolation_offset};
use crate::config::{OrientationConfig, ZeroBarAnchor};
use crate::models::{AngleDetail, GridEllipsoid, PixelGrid, Point};

/// Finds the zero bar and derives the rotation proxy from it
pub struct OrientationScanner;

impl OrientationScanner {
    /// Locate the zero bar to the right of the logo
    pub fn scan(
        grid: &PixelGrid,
        ellipsoid: &GridEllipsoid,
        config: &OrientationConfig,
    ) -> Option<AngleDetail> {
        let center = ellipsoid.average_center;
        let radius = ellipsoid.max_radius();
        let offset = isolation_offset(radius, config);

        let x_start = ((center.x + config.window_near * radius).ceil() as i64).max(0);
        let x_end = ((center.x + config.window_far * radius).floor() as i64)
            .min(grid.width() as i64 - 1);
        let y_start = ((center.y - config.window_half_height * radius).ceil() as i64).max(0);
        let y_end = ((center.y + config.window_half_height * radius).floor() as i64)
            .min(grid.height() as i64 - 1);

        let hit = (x_start..=x_end).find_map(|x| {
            (y_start..=y_end)
                .find(|&y| is_bright_isolated(grid, x, y, offset, config))
                .map(|y| (x, y))
        });
        let Some((x, y)) = hit else {
            log::debug!(
                "orientation: no zero bar in x=[{}, {}] y=[{}, {}]",
                x_start,
                x_end,
                y_start,
                y_end
            );
            return None;
        };

        let zero = match config.zero_bar_anchor {
            ZeroBarAnchor::FirstHit => Point::new(x as f64, y as f64),
            ZeroBarAnchor::RunCenter => bar_center(grid, x, y, offset * 4, config),
        };
        Self::angle(center, zero)
    }

    /// Rotation proxy from the centre-to-zero-bar vector
    pub(crate) fn angle(center: Point, zero: Point) -> Option<AngleDetail> {
        let alpha = slope_proxy(center, zero)?;
        log::trace!("orientation: zero=({}, {}) alpha={}", zero.x, zero.y, alpha);
        Some(AngleDetail::from_alpha(zero, alpha))
    }
}

/// `tan(dy/dx)` of the vector `from -> to`; `None` when vertical or not finite
pub(crate) fn slope_proxy(from: Point, to: Point) -> Option<f64> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0.0 {
        return None;
    }
    let alpha = (dy / dx).tan();
    if !alpha.is_finite() || !to.is_finite() {
        log::debug!("orientation: non-finite angle dx={} dy={}", dx, dy);
        return None;
    }
    Some(alpha)
}
