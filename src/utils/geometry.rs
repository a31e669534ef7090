//! Affine transforms for redrawing the code onto the canonical canvas

use crate::models::Point;

/// 2x3 affine matrix in canvas order: `(x, y) -> (a*x + c*y + e, b*x + d*y + f)`.
///
/// Builder methods follow 2D canvas semantics: `t.translate(..).rotate(..)`
/// rotates first and translates second when applied to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// The identity transform
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self` applied after `other`
    pub fn multiply(&self, other: &AffineTransform) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Append a translation
    pub fn translate(&self, tx: f64, ty: f64) -> Self {
        self.multiply(&Self {
            e: tx,
            f: ty,
            ..Self::identity()
        })
    }

    /// Append a rotation by `angle` radians (clockwise in image coordinates)
    pub fn rotate(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        self.multiply(&Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    /// Append a scale
    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        self.multiply(&Self {
            a: sx,
            d: sy,
            ..Self::identity()
        })
    }

    /// Transform a point
    pub fn apply(&self, p: &Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Inverse transform, `None` when singular
    pub fn inverse(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-12 || !det.is_finite() {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }
}
