//! Diagonal corner pattern scan over the left half of the grid

use crate::config::EdgeConfig;
use crate::models::{EdgeDirection, EdgeMap, EdgeRecord, EdgeScore, PixelGrid};

/// Locates the SE and SW notches of the circular logo
pub struct EdgeMapper;

impl EdgeMapper {
    /// Scan the grid for corner patterns.
    ///
    /// Returns `None` when either diagonal has fewer than `min_cluster`
    /// matches or when the match count reaches half the grid width, which
    /// means the frame is texture rather than a marker.
    pub fn detect(grid: &PixelGrid, config: &EdgeConfig) -> Option<EdgeMap> {
        let width = grid.width();
        let height = grid.height();
        let margin = config.margin();
        let step = config.scan_step.max(1);
        let x_end = (width / 2).min(width.saturating_sub(margin));
        let y_end = height.saturating_sub(margin);

        let mut records = Vec::new();
        for y in (margin..y_end).step_by(step) {
            Self::scan_row(grid, y as i64, margin, x_end, step, &mut records);
        }

        let se = records
            .iter()
            .filter(|r| r.direction == EdgeDirection::SE)
            .count();
        let sw = records.len() - se;
        if se < config.min_cluster || sw < config.min_cluster {
            log::debug!("edge map rejected: se={} sw={}", se, sw);
            return None;
        }
        if records.len() >= width / 2 {
            log::debug!(
                "edge map rejected: {} edges for a {}px wide grid",
                records.len(),
                width
            );
            return None;
        }

        log::trace!("edge map: se={} sw={}", se, sw);
        Some(EdgeMap::new(records))
    }

    fn scan_row(
        grid: &PixelGrid,
        y: i64,
        x_start: usize,
        x_end: usize,
        step: usize,
        records: &mut Vec<EdgeRecord>,
    ) {
        for x in (x_start..x_end).step_by(step) {
            let x = x as i64;
            if !grid.score(x, y).is_compound() {
                continue;
            }
            let direction = if Self::is_corner(grid, x, y, 1) {
                EdgeDirection::SE
            } else if Self::is_corner(grid, x, y, -1) {
                EdgeDirection::SW
            } else {
                continue;
            };
            records.push(EdgeRecord::new(x as u32, y as u32, direction));
        }
    }

    /// Diagonal corner test; `s = 1` looks down-right (SE), `s = -1`
    /// down-left (SW)
    fn is_corner(grid: &PixelGrid, x: i64, y: i64, s: i64) -> bool {
        let at = |dx: i64, dy: i64| grid.score(x + dx, y + dy);

        // Along the diagonal
        if !(at(s, 1).is_compound() && at(2 * s, 2).is_compound() && at(5 * s, 5).is_edge()) {
            return false;
        }
        // Across the diagonal: the edge must be thin
        if at(-2 * s, 2).is_compound() || at(2 * s, -2).is_compound() {
            return false;
        }
        // and flanked by flat regions
        for k in 3..=4 {
            if at(-k * s, k) != EdgeScore::NotEdge || at(k * s, -k) != EdgeScore::NotEdge {
                return false;
            }
        }
        !Self::is_straight(grid, x, y, s)
    }

    /// Long vertical edges pass the diagonal test at their ends
    fn is_straight(grid: &PixelGrid, x: i64, y: i64, s: i64) -> bool {
        [0, 3 * s].iter().any(|&dx| {
            grid.score(x + dx, y + 6).is_compound() && grid.score(x + dx, y + 8).is_compound()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pixel;

    fn grid_with_lines(
        width: usize,
        height: usize,
        on_line: impl Fn(u32, u32) -> bool,
    ) -> PixelGrid {
        PixelGrid::from_fn(width, height, |x, y| Pixel {
            score: if on_line(x, y) {
                EdgeScore::CompoundEdge
            } else {
                EdgeScore::NotEdge
            },
            ..Pixel::default()
        })
    }

    fn two_diagonals(x: u32, y: u32) -> bool {
        let se = x == y && (15..=40).contains(&x);
        let sw = x + y == 99 && (40..=57).contains(&x);
        se || sw
    }

    #[test]
    fn test_detects_both_diagonals() {
        let grid = grid_with_lines(120, 80, two_diagonals);
        let map = EdgeMapper::detect(&grid, &EdgeConfig::default()).expect("edge map");

        assert!(map.count(EdgeDirection::SE) >= 2);
        assert!(map.count(EdgeDirection::SW) >= 2);
        assert!(map.with_direction(EdgeDirection::SE).all(|r| r.x == r.y));
        assert!(map.with_direction(EdgeDirection::SW).all(|r| r.x + r.y == 99));
        // left half only
        assert!(map.records().iter().all(|r| r.x < 60));
    }

    #[test]
    fn test_single_diagonal_rejected() {
        let grid = grid_with_lines(120, 80, |x, y| x == y && (15..=40).contains(&x));
        assert!(EdgeMapper::detect(&grid, &EdgeConfig::default()).is_none());
    }

    #[test]
    fn test_thick_edge_is_not_a_corner() {
        // A band nine pixels wide fails the across-diagonal test everywhere,
        // leaving only the SW line
        let grid = grid_with_lines(120, 80, |x, y| {
            let d = x as i64 - y as i64;
            ((-4..=4).contains(&d) && (15..=40).contains(&x)) || two_diagonals(x, y)
        });
        assert!(!EdgeMapper::is_corner(&grid, 24, 24, 1));
        assert!(EdgeMapper::detect(&grid, &EdgeConfig::default()).is_none());
    }

    #[test]
    fn test_vertical_edge_excluded() {
        // diagonal that turns into a vertical line below the scan point
        let grid = grid_with_lines(60, 60, |x, y| {
            (x == y && (15..=30).contains(&x)) || (x == 24 && (24..=50).contains(&y))
        });
        assert!(EdgeMapper::is_straight(&grid, 24, 24, 1));
        assert!(!EdgeMapper::is_straight(&grid, 18, 18, 1));
        assert!(!EdgeMapper::is_corner(&grid, 24, 24, 1));
        assert!(EdgeMapper::is_corner(&grid, 18, 18, 1));
    }

    #[test]
    fn test_texture_rejected() {
        // SE hatching in the top half, SW hatching in the bottom half
        let grid = grid_with_lines(40, 400, |x, y| {
            if y < 200 {
                (x as i64 - y as i64).rem_euclid(24) == 0
            } else {
                (x + y) % 24 == 0
            }
        });
        assert!(EdgeMapper::is_corner(&grid, 9, 9, 1));
        assert!(EdgeMapper::is_corner(&grid, 15, 225, -1));
        assert!(EdgeMapper::detect(&grid, &EdgeConfig::default()).is_none());
    }
}
