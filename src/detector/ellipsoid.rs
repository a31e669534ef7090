//! Logo fit from the edge clusters.
//!
//! The centroid and radii come from the edge points that survive the
//! outlier cut; the centre that later stages use is the midpoint of the two
//! cluster bounding boxes, which is less sensitive to one cluster having
//! more matches than the other.

use crate::config::EllipsoidConfig;
use crate::models::{ClusterBounds, EdgeDirection, EdgeMap, EdgeRecord, GridEllipsoid, Point};

/// Fits a [`GridEllipsoid`] to an [`EdgeMap`]
pub struct EllipsoidLocator;

impl EllipsoidLocator {
    /// Fit and gate the ellipse. `frame_height` is the grid height.
    ///
    /// Rejects degenerate fits, circles too tall for the frame and circles
    /// touching the top, left or bottom border.
    pub fn locate(
        edges: &EdgeMap,
        frame_height: usize,
        config: &EllipsoidConfig,
    ) -> Option<GridEllipsoid> {
        let edges = &Self::inliers(edges, config.outlier_factor);
        if edges.is_empty() {
            return None;
        }
        let n = edges.len() as f64;
        let (sum_x, sum_y) = edges
            .records()
            .iter()
            .fold((0.0, 0.0), |(sx, sy), r| (sx + r.x as f64, sy + r.y as f64));
        let centroid = Point::new(sum_x / n, sum_y / n);

        let (radius_a, radius_b) = edges.records().iter().fold((0.0f64, 0.0f64), |(a, b), r| {
            (
                a.max((r.x as f64 - centroid.x).abs()),
                b.max((r.y as f64 - centroid.y).abs()),
            )
        });

        let degenerate = [centroid.x, centroid.y, radius_a, radius_b]
            .iter()
            .any(|v| !v.is_finite() || *v == 0.0);
        if degenerate {
            log::debug!(
                "ellipsoid rejected: degenerate fit c=({}, {}) ra={} rb={}",
                centroid.x,
                centroid.y,
                radius_a,
                radius_b
            );
            return None;
        }

        let height = frame_height as f64;
        if radius_b > height * config.max_radius_fraction {
            log::debug!("ellipsoid rejected: rb={} too tall for h={}", radius_b, height);
            return None;
        }

        let margin = config.frame_margin;
        let inside = centroid.y - radius_b >= margin
            && centroid.x - radius_a >= margin
            && centroid.y + radius_b <= height - margin;
        if !inside {
            log::debug!(
                "ellipsoid rejected: c=({}, {}) ra={} rb={} touches the border",
                centroid.x,
                centroid.y,
                radius_a,
                radius_b
            );
            return None;
        }

        if let Some(limit) = config.max_flatness {
            if (radius_a - radius_b).abs() > limit {
                log::debug!("ellipsoid rejected: flatness {}", (radius_a - radius_b).abs());
                return None;
            }
        }

        let se_bounds = Self::cluster(edges, EdgeDirection::SE)?;
        let sw_bounds = Self::cluster(edges, EdgeDirection::SW)?;
        let average_center = se_bounds.center().midpoint(&sw_bounds.center());

        log::trace!(
            "ellipsoid: centre=({:.1}, {:.1}) ra={} rb={}",
            average_center.x,
            average_center.y,
            radius_a,
            radius_b
        );
        Some(GridEllipsoid {
            centroid,
            radius_a,
            radius_b,
            average_center,
            se_bounds,
            sw_bounds,
        })
    }

    /// Drop points farther than `factor` median distances from the centroid.
    ///
    /// Corner matches on bars right of the logo are rare but pull both the
    /// centre and `radius_a` far off.
    fn inliers(edges: &EdgeMap, factor: Option<f64>) -> EdgeMap {
        let records = edges.records();
        let Some(factor) = factor.filter(|_| !records.is_empty()) else {
            return edges.clone();
        };
        let n = records.len() as f64;
        let cx = records.iter().map(|r| r.x as f64).sum::<f64>() / n;
        let cy = records.iter().map(|r| r.y as f64).sum::<f64>() / n;
        let distance = |r: &EdgeRecord| (r.x as f64 - cx).hypot(r.y as f64 - cy);

        let mut distances: Vec<f64> = records.iter().map(distance).collect();
        distances.sort_by(f64::total_cmp);
        let mid = distances.len() / 2;
        let median = if distances.len() % 2 == 1 {
            distances[mid]
        } else {
            (distances[mid - 1] + distances[mid]) / 2.0
        };

        let limit = factor * median;
        let kept: Vec<EdgeRecord> = records
            .iter()
            .filter(|r| distance(*r) <= limit)
            .copied()
            .collect();
        if kept.len() < records.len() {
            log::debug!(
                "ellipsoid: dropped {} of {} edge points beyond {:.1}px",
                records.len() - kept.len(),
                records.len(),
                limit
            );
        }
        EdgeMap::new(kept)
    }

    fn cluster(edges: &EdgeMap, direction: EdgeDirection) -> Option<ClusterBounds> {
        ClusterBounds::from_points(
            edges
                .with_direction(direction)
                .map(|r| (r.x as f64, r.y as f64)),
        )
    }
}
