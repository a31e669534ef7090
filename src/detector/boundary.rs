//! Last bar search.
//!
//! Projects where the last bar should sit from the zero bar distance, then
//! sweeps a stretched polar pattern around that guess, shrinking the radius
//! each round, collecting every bright isolated pixel it lands on. The
//! zero-to-last baseline is about five times longer than the centre-to-zero
//! chord, so the rotation taken from it is the one the redraw uses.

use super::orientation::slope_proxy;
use super::{bar_center, is_bright_isolated, isolation_offset};
use crate::config::{BoundaryConfig, OrientationConfig};
use crate::models::{AngleDetail, BoundaryDetail, ClusterBounds, GridEllipsoid, PixelGrid, Point};

/// Locates the last bar of the code
pub struct BoundaryScanner;

impl BoundaryScanner {
    /// Estimate and refine the last bar position
    pub fn scan(
        grid: &PixelGrid,
        ellipsoid: &GridEllipsoid,
        angle: &AngleDetail,
        config: &BoundaryConfig,
        pixel_test: &OrientationConfig,
    ) -> Option<BoundaryDetail> {
        let center = ellipsoid.average_center;
        let zero = angle.zero();
        let length_bc = zero.y - center.y;
        let chord = center.distance(&zero);
        if !(chord > 0.0 && chord.is_finite()) {
            return None;
        }

        let offset = isolation_offset(ellipsoid.max_radius(), pixel_test);
        let diameter = 2.0 * ellipsoid.radius_a;
        let width_difference = (diameter - chord).abs().max(offset as f64);
        let estimated_width =
            config.chord_coefficient * chord + config.difference_coefficient * width_difference;
        let estimate = Point::new(
            zero.x + estimated_width * angle.alpha_degree.cos(),
            zero.y + length_bc * estimated_width / chord,
        );
        if !estimate.is_finite() {
            return None;
        }

        let matches: Vec<(i64, i64)> = Self::polar_samples(estimate, width_difference, config)
            .filter(|&(x, y)| is_bright_isolated(grid, x, y, offset, pixel_test))
            .collect();
        let bounds =
            ClusterBounds::from_points(matches.iter().map(|&(x, y)| (x as f64, y as f64)));
        let Some(bounds) = bounds else {
            log::debug!(
                "boundary: nothing bright around ({:.1}, {:.1}) wd={}",
                estimate.x,
                estimate.y,
                width_difference
            );
            return None;
        };
        let mut last = bounds.center();
        let mut alpha = angle.alpha_degree;
        if config.refine_rotation {
            // the extent may straddle two bars; measure the bar nearest its centre
            let nearest = matches.iter().min_by(|a, b| {
                let da = Point::new(a.0 as f64, a.1 as f64).distance(&last);
                let db = Point::new(b.0 as f64, b.1 as f64).distance(&last);
                da.total_cmp(&db).then(a.cmp(b))
            });
            if let Some(&(x, y)) = nearest {
                last = bar_center(grid, x, y, offset * 4, pixel_test);
                alpha = slope_proxy(zero, last).unwrap_or(alpha);
            }
        }

        log::trace!(
            "boundary: estimate=({:.1}, {:.1}) found=({}, {}) alpha={}",
            estimate.x,
            estimate.y,
            last.x,
            last.y,
            alpha
        );
        Some(BoundaryDetail {
            zero_left_x: zero.x,
            zero_left_y: zero.y,
            zero_right_x: last.x,
            zero_right_y: last.y,
            width_difference,
            estimated_width,
            estimated_last_zero_x: estimate.x,
            estimated_last_zero_y: estimate.y,
            alpha_degree: alpha,
        })
    }

    /// Rounded sample positions, outermost ring first
    fn polar_samples(
        estimate: Point,
        width_difference: f64,
        config: &BoundaryConfig,
    ) -> impl Iterator<Item = (i64, i64)> + '_ {
        let step = config.angle_step_degrees.max(1.0);
        let steps = (360.0 / step).round() as usize;
        let outer = width_difference.floor() as i64;
        (1..=outer).rev().flat_map(move |rho| {
            let rho = rho as f64;
            (0..steps).map(move |k| {
                let theta = (k as f64 * step).to_radians();
                let x = estimate.x + config.horizontal_stretch * rho * theta.cos();
                let y = estimate.y + config.vertical_stretch * rho * theta.sin();
                (x.round() as i64, y.round() as i64)
            })
        })
    }
}
