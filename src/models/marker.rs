//! Geometry derived from one frame: the logo ellipse, the zero bar and the
//! last bar. All values are in grid (viewfinder) pixel coordinates.

use super::point::Point;

/// Axis-aligned bounding extent of one edge cluster
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClusterBounds {
    /// Smallest x
    pub x_min: f64,
    /// Largest x
    pub x_max: f64,
    /// Smallest y
    pub y_min: f64,
    /// Largest y
    pub y_max: f64,
}

impl ClusterBounds {
    /// Bounds of a point cloud, `None` when empty
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let mut bounds = Self {
            x_min: x0,
            x_max: x0,
            y_min: y0,
            y_max: y0,
        };
        for (x, y) in iter {
            bounds.x_min = bounds.x_min.min(x);
            bounds.x_max = bounds.x_max.max(x);
            bounds.y_min = bounds.y_min.min(y);
            bounds.y_max = bounds.y_max.max(y);
        }
        Some(bounds)
    }

    /// Centre of the bounding box
    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }
}

/// Approximate circle/ellipse fitted to the logo's SE and SW edge clusters
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridEllipsoid {
    /// Arithmetic mean of every edge point
    pub centroid: Point,
    /// Largest horizontal deviation from the centroid
    pub radius_a: f64,
    /// Largest vertical deviation from the centroid
    pub radius_b: f64,
    /// Midpoint of the SE and SW bounding-box centres
    pub average_center: Point,
    /// Extent of the SE cluster
    pub se_bounds: ClusterBounds,
    /// Extent of the SW cluster
    pub sw_bounds: ClusterBounds,
}

impl GridEllipsoid {
    /// The larger of the two radii
    pub fn max_radius(&self) -> f64 {
        self.radius_a.max(self.radius_b)
    }

    /// Circle of known geometry, for callers that already know where the logo is
    pub fn from_circle(center: Point, radius: f64) -> Self {
        let bounds = ClusterBounds {
            x_min: center.x - radius,
            x_max: center.x + radius,
            y_min: center.y - radius,
            y_max: center.y + radius,
        };
        Self {
            centroid: center,
            radius_a: radius,
            radius_b: radius,
            average_center: center,
            se_bounds: bounds,
            sw_bounds: bounds,
        }
    }
}

/// Rotation of the marker, anchored on the zero bar.
///
/// `alpha_degree` is `tan(dy/dx)` of the centre-to-zero-bar vector. It is a
/// unitless slope proxy that later stages feed to `cos`/`sin`/rotation as if
/// it were radians; the calibration of every downstream constant depends on
/// that exact value.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AngleDetail {
    /// Zero bar column
    pub zero_x: f64,
    /// Zero bar row
    pub zero_y: f64,
    /// Rotation proxy
    pub alpha_degree: f64,
    /// Always 90
    pub beta_degree: f64,
    /// `90 - |alpha|`, carrying the sign of alpha
    pub gamma_degree: f64,
}

impl AngleDetail {
    /// Angle record for a zero bar at `zero` and rotation proxy `alpha`
    pub fn from_alpha(zero: Point, alpha: f64) -> Self {
        Self {
            zero_x: zero.x,
            zero_y: zero.y,
            alpha_degree: alpha,
            beta_degree: 90.0,
            gamma_degree: (90.0 - alpha.abs()).copysign(alpha),
        }
    }

    /// Zero bar location
    pub fn zero(&self) -> Point {
        Point::new(self.zero_x, self.zero_y)
    }
}

/// Extent of the bar sequence from the zero bar to the last bar
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundaryDetail {
    /// Zero bar column (same as `AngleDetail::zero_x`)
    pub zero_left_x: f64,
    /// Zero bar row (same as `AngleDetail::zero_y`)
    pub zero_left_y: f64,
    /// Last bar column
    pub zero_right_x: f64,
    /// Last bar row
    pub zero_right_y: f64,
    /// Gap between the expected circle diameter and the zero bar distance
    pub width_difference: f64,
    /// Projected distance from the zero bar to the last bar
    pub estimated_width: f64,
    /// Projected last bar column
    pub estimated_last_zero_x: f64,
    /// Projected last bar row
    pub estimated_last_zero_y: f64,
    /// Rotation proxy the redraw uses: the zero-to-last baseline when the
    /// last bar was refined, otherwise the orientation scanner's value
    pub alpha_degree: f64,
}

impl BoundaryDetail {
    /// Measured distance between the zero bar and the last bar
    pub fn measured_width(&self) -> f64 {
        Point::new(self.zero_left_x, self.zero_left_y)
            .distance(&Point::new(self.zero_right_x, self.zero_right_y))
    }

    /// Zero bar and rotation to redraw the code with
    pub fn redraw_angle(&self) -> AngleDetail {
        AngleDetail::from_alpha(Point::new(self.zero_left_x, self.zero_left_y), self.alpha_degree)
    }
}
