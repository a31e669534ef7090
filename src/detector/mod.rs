//! Marker localisation stages
//!
//! - Edge mapping (SE/SW diagonal corner patterns of the logo)
//! - Ellipsoid fitting over the edge clusters
//! - Orientation from the zero bar
//! - Boundary search for the last bar

/// Last bar projection and polar point-cloud search
pub mod boundary;
/// Diagonal corner pattern scan over the pixel grid
pub mod edges;
/// Circle/ellipse fit and plausibility gates
pub mod ellipsoid;
/// Zero bar search and rotation proxy
pub mod orientation;

use crate::config::OrientationConfig;
use crate::models::{PixelGrid, Point};

/// Diagonal offset used by the bright-isolated test for a circle of `radius`
pub(crate) fn isolation_offset(radius: f64, config: &OrientationConfig) -> i64 {
    ((radius * config.isolation_factor).round() as i64).max(2)
}

/// Pixel is white in red and green
pub(crate) fn is_bright(grid: &PixelGrid, x: i64, y: i64, config: &OrientationConfig) -> bool {
    grid.try_get(x, y)
        .is_some_and(|p| p.r >= config.bright_threshold && p.g >= config.bright_threshold)
}

/// Pixel is white while its four diagonal neighbours at `offset` are black.
///
/// Isolates a thin bright bar from a broad white region.
pub(crate) fn is_bright_isolated(
    grid: &PixelGrid,
    x: i64,
    y: i64,
    offset: i64,
    config: &OrientationConfig,
) -> bool {
    if !is_bright(grid, x, y, config) {
        return false;
    }
    [(-1, -1), (1, -1), (-1, 1), (1, 1)]
        .iter()
        .all(|&(sx, sy)| grid.get(x + sx * offset, y + sy * offset).r < config.dark_threshold)
}

/// Last position reached walking from `start` in `dir` while `bright` holds,
/// at most `max_run` steps
fn run_end(start: i64, dir: i64, max_run: i64, bright: impl Fn(i64) -> bool) -> i64 {
    let mut pos = start;
    for _ in 0..max_run {
        if !bright(pos + dir) {
            break;
        }
        pos += dir;
    }
    pos
}

/// Centre of the bright bar through `(x, y)`.
///
/// Vertical run first, then the horizontal run on its middle row, then the
/// vertical run again on the middle column. On a tilted bar the first
/// column may clip a corner; the last pass measures through the bar's axis.
pub(crate) fn bar_center(
    grid: &PixelGrid,
    x: i64,
    y: i64,
    max_run: i64,
    config: &OrientationConfig,
) -> Point {
    let vertical = |col: i64, row: i64| {
        let top = run_end(row, -1, max_run, |yy| is_bright(grid, col, yy, config));
        let bottom = run_end(row, 1, max_run, |yy| is_bright(grid, col, yy, config));
        (top + bottom) as f64 / 2.0
    };

    let mut row = vertical(x, y);
    let row_i = Some(row.round() as i64)
        .filter(|&r| is_bright(grid, x, r, config))
        .unwrap_or(y);
    let left = run_end(x, -1, max_run, |xx| is_bright(grid, xx, row_i, config));
    let right = run_end(x, 1, max_run, |xx| is_bright(grid, xx, row_i, config));
    let column = (left + right) as f64 / 2.0;

    let col_i = column.round() as i64;
    if is_bright(grid, col_i, row_i, config) {
        row = vertical(col_i, row_i);
    }
    Point::new(column, row)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{Pixel, PixelGrid};

    /// Black grid with white rectangles `(x0, y0, x1, y1)` (inclusive)
    pub fn grid_with_rects(width: usize, height: usize, rects: &[(u32, u32, u32, u32)]) -> PixelGrid {
        PixelGrid::from_fn(width, height, |x, y| {
            let white = rects
                .iter()
                .any(|&(x0, y0, x1, y1)| (x0..=x1).contains(&x) && (y0..=y1).contains(&y));
            let v = if white { 255 } else { 0 };
            Pixel {
                r: v,
                g: v,
                b: v,
                a: 255,
                ..Pixel::default()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::grid_with_rects;
    use super::*;

    #[test]
    fn test_isolation_offset_floor() {
        let cfg = OrientationConfig::default();
        assert_eq!(isolation_offset(1.0, &cfg), 2);
        assert_eq!(isolation_offset(20.0, &cfg), 6);
    }

    #[test]
    fn test_bar_center_upright() {
        let cfg = OrientationConfig::default();
        let grid = grid_with_rects(40, 40, &[(10, 10, 13, 20)]);
        // from a corner pixel and from the middle
        assert_eq!(bar_center(&grid, 10, 10, 20, &cfg), Point::new(11.5, 15.0));
        assert_eq!(bar_center(&grid, 12, 17, 20, &cfg), Point::new(11.5, 15.0));
        // runs stop at max_run
        assert_eq!(bar_center(&grid, 10, 10, 2, &cfg), Point::new(11.0, 11.5));
    }

    #[test]
    fn test_bar_center_through_clipped_column() {
        // A staircase bar: column 10 covers rows 12..=20, columns 11..=13
        // cover rows 10..=20. The first column sees a short run; the final
        // pass measures on the middle column.
        let cfg = OrientationConfig::default();
        let grid = grid_with_rects(40, 40, &[(10, 12, 10, 20), (11, 10, 13, 20)]);
        assert_eq!(bar_center(&grid, 10, 12, 20, &cfg), Point::new(11.5, 15.0));
    }

    #[test]
    fn test_bright_isolated() {
        let cfg = OrientationConfig::default();
        let grid = grid_with_rects(40, 40, &[(10, 10, 12, 14), (25, 0, 39, 39)]);
        assert!(is_bright_isolated(&grid, 11, 12, 5, &cfg));
        // inside the broad region the diagonals are white
        assert!(!is_bright_isolated(&grid, 32, 20, 5, &cfg));
        assert!(!is_bright_isolated(&grid, 5, 5, 5, &cfg));
        assert!(!is_bright_isolated(&grid, -3, 5, 5, &cfg));
    }
}
