// =============================================================================
// AUTOTILE.RS — Neighbor-aware atlas selection for unified materials
//
// Pure functions: given a cell position and an `is_open(dx, dy)` predicate,
// work out which piece of a material's tile sheet goes where. No drawing
// happens here; the unified painter feeds the results to the compositor.
//
// Tile sheet layout (pixels):
// - Solid corners: 10 px grid, column `gtAtH`, row `gtAtV`, sampled 20×20
//   with a 5 px margin around the 10×10 corner piece.
// - Slopes: rows start at y = 90, one 30 px band per slope code.
// - Everything has a shadow copy SHADOW_OFFSET px to the right.
// =============================================================================

use crate::geometry::{GeoType, Rect, CELL_PX};

/// Horizontal distance from a sheet piece to its shadow copy.
pub const SHADOW_OFFSET: i32 = 120;

/// Margin drawn around every autotile piece.
const MARGIN: i32 = 5;

/// Half a cell: the size of one corner quadrant.
const HALF: i32 = CELL_PX / 2;

// ── Solid cells ───────────────────────────────────────────────────────────────

/// Sheet coordinates and placement of one resolved corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CornerPiece {
    /// Sheet column index.
    pub gt_at_h: i32,
    /// Sheet row index.
    pub gt_at_v: i32,
    /// Source rectangle in the tile sheet.
    pub src: Rect,
    /// Destination rectangle in grid-pixel space.
    pub dst: Rect,
}

/// Corner layout: two edge directions, starting row, quadrant offset.
struct Corner {
    edges: [(i32, i32); 2],
    row: i32,
    quadrant: (i32, i32),
}

const CORNERS: [Corner; 4] = [
    // top-left
    Corner { edges: [(-1, 0), (0, -1)], row: 2, quadrant: (0, 0) },
    // top-right
    Corner { edges: [(1, 0), (0, -1)], row: 4, quadrant: (HALF, 0) },
    // bottom-right
    Corner { edges: [(1, 0), (0, 1)], row: 6, quadrant: (HALF, HALF) },
    // bottom-left
    Corner { edges: [(-1, 0), (0, 1)], row: 6, quadrant: (0, HALF) },
];

/// Column and row for one corner, given the open state of its two edges and
/// (only consulted when both edges are open) its diagonal.
///
/// Both-open with an open diagonal is the fully enclosed piece `(10, 2)`.
pub fn classify_corner(first: bool, second: bool, diagonal: impl FnOnce() -> bool, row: i32) -> (i32, i32) {
    let mut v = row;
    let h = match (first, second) {
        (true, true) => {
            if diagonal() {
                v = 2;
                10
            } else {
                8
            }
        }
        (false, false) => 2,
        (false, true) => 4,
        (true, false) => 6,
    };

    // Row correction for the one-sided columns. Kept exactly as authored.
    if h == 4 {
        if v == 6 {
            v = 4;
        } else if v == 8 {
            v = 2;
        }
    } else if h == 6 && (v == 4 || v == 8) {
        v -= 2;
    }

    (h, v)
}

/// Resolve all four corners of a Solid cell at `(x, y)`.
///
/// Corners are evaluated top-left, top-right, bottom-right, bottom-left.
/// `is_open` receives neighbor offsets relative to the cell.
pub fn resolve_solid(x: i32, y: i32, mut is_open: impl FnMut(i32, i32) -> bool) -> [CornerPiece; 4] {
    let cell = Rect::cell(x, y);
    CORNERS.map(|corner| {
        let [(ax, ay), (bx, by)] = corner.edges;
        let first = is_open(ax, ay);
        let second = is_open(bx, by);
        let (h, v) = classify_corner(first, second, || is_open(ax + bx, ay + by), corner.row);

        let quadrant = Rect::new(cell.x + corner.quadrant.0, cell.y + corner.quadrant.1, HALF, HALF);
        CornerPiece {
            gt_at_h: h,
            gt_at_v: v,
            src: Rect::new((h - 1) * HALF - MARGIN, (v - 1) * HALF - MARGIN, CELL_PX, CELL_PX),
            dst: quadrant.expand(MARGIN),
        }
    })
}

// ── Slopes ────────────────────────────────────────────────────────────────────

/// One of the two pieces a slope is drawn with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlopePiece {
    /// Neighbor this piece looked at.
    pub direction: (i32, i32),
    pub open: bool,
    pub src: Rect,
    pub dst: Rect,
}

/// Neighbor directions a slope checks. `material_fixes` swaps the
/// NW/SW vectors to the corrected pair.
pub fn slope_directions(slope: GeoType, material_fixes: bool) -> Option<[(i32, i32); 2]> {
    Some(match (slope, material_fixes) {
        (GeoType::SlopeNE, _) => [(-1, 0), (0, 1)],
        (GeoType::SlopeES, _) => [(-1, 0), (0, -1)],
        (GeoType::SlopeNW, true) => [(0, 1), (1, 0)],
        (GeoType::SlopeSW, true) => [(0, -1), (1, 0)],
        (GeoType::SlopeNW, false) => [(1, 0), (0, 1)],
        (GeoType::SlopeSW, false) => [(1, 0), (0, -1)],
        _ => return None,
    })
}

/// Resolve both pieces of a slope cell. `None` when `slope` is not a slope.
///
/// Both pieces share one destination: the cell's grid-pixel rect grown by
/// 5 px on every side. Camera offsets are not applied here.
pub fn resolve_slope(
    x: i32,
    y: i32,
    slope: GeoType,
    material_fixes: bool,
    mut is_open: impl FnMut(i32, i32) -> bool,
) -> Option<[SlopePiece; 2]> {
    let directions = slope_directions(slope, material_fixes)?;
    let band = 90 + 30 * (slope.code() - 2);
    let dst = Rect::cell(x, y).expand(MARGIN);

    Some(directions.map(|(dx, dy)| {
        let open = is_open(dx, dy);
        let column = if open { 40 } else { 10 };
        SlopePiece {
            direction: (dx, dy),
            open,
            src: Rect::new(column, band, CELL_PX, CELL_PX).expand(MARGIN),
            dst,
        }
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn all_open(_: i32, _: i32) -> bool {
        true
    }

    fn all_closed(_: i32, _: i32) -> bool {
        false
    }

    // ── Corner classification ────────────────────────────────────────────

    #[test]
    fn both_edges_open_with_open_diagonal_is_enclosed() {
        assert_eq!(classify_corner(true, true, || true, 6), (10, 2));
    }

    #[test]
    fn both_edges_open_with_closed_diagonal_keeps_row() {
        assert_eq!(classify_corner(true, true, || false, 4), (8, 4));
    }

    #[test]
    fn diagonal_not_consulted_unless_both_edges_open() {
        let (h, _) = classify_corner(true, false, || panic!("diagonal consulted"), 2);
        assert_eq!(h, 6);
    }

    #[test]
    fn row_correction_for_column_four() {
        assert_eq!(classify_corner(false, true, || false, 6), (4, 4));
        assert_eq!(classify_corner(false, true, || false, 8), (4, 2));
        assert_eq!(classify_corner(false, true, || false, 2), (4, 2));
    }

    #[test]
    fn row_correction_for_column_six() {
        assert_eq!(classify_corner(true, false, || false, 4), (6, 2));
        assert_eq!(classify_corner(true, false, || false, 8), (6, 6));
        assert_eq!(classify_corner(true, false, || false, 6), (6, 6));
    }

    // ── Solid cells ──────────────────────────────────────────────────────

    #[test]
    fn isolated_solid_uses_column_two_and_starting_rows() {
        let pieces = resolve_solid(0, 0, all_closed);
        let hv: Vec<(i32, i32)> = pieces.iter().map(|p| (p.gt_at_h, p.gt_at_v)).collect();
        assert_eq!(hv, [(2, 2), (2, 4), (2, 6), (2, 6)]);
    }

    #[test]
    fn enclosed_solid_is_constant_for_every_corner() {
        for p in resolve_solid(3, 4, all_open) {
            assert_eq!((p.gt_at_h, p.gt_at_v), (10, 2));
            assert_eq!(p.src, Rect::new(85, 5, 20, 20));
        }
    }

    #[test]
    fn quadrant_destinations_are_expanded_by_margin() {
        let pieces = resolve_solid(1, 1, all_closed);
        assert_eq!(pieces[0].dst, Rect::new(15, 15, 20, 20));
        assert_eq!(pieces[1].dst, Rect::new(25, 15, 20, 20));
        assert_eq!(pieces[2].dst, Rect::new(25, 25, 20, 20));
        assert_eq!(pieces[3].dst, Rect::new(15, 25, 20, 20));
    }

    #[test]
    fn open_left_only_affects_left_corners() {
        let pieces = resolve_solid(0, 0, |dx, dy| (dx, dy) == (-1, 0));
        // top-left: (open, closed) -> 6, row 2
        assert_eq!((pieces[0].gt_at_h, pieces[0].gt_at_v), (6, 2));
        // top-right: (closed, closed) -> 2
        assert_eq!((pieces[1].gt_at_h, pieces[1].gt_at_v), (2, 4));
        // bottom-left: (open, closed) -> 6, row 6 unchanged
        assert_eq!((pieces[3].gt_at_h, pieces[3].gt_at_v), (6, 6));
    }

    // ── Slopes ───────────────────────────────────────────────────────────

    #[test]
    fn non_slope_has_no_directions() {
        assert!(slope_directions(GeoType::Solid, false).is_none());
        assert!(resolve_slope(0, 0, GeoType::Platform, true, all_open).is_none());
    }

    #[test]
    fn fixes_only_change_nw_and_sw() {
        for s in [GeoType::SlopeNE, GeoType::SlopeES] {
            assert_eq!(slope_directions(s, true), slope_directions(s, false));
        }
        for s in [GeoType::SlopeNW, GeoType::SlopeSW] {
            assert_ne!(slope_directions(s, true), slope_directions(s, false));
        }
    }

    #[test]
    fn slope_band_and_open_column() {
        let pieces = resolve_slope(2, 0, GeoType::SlopeES, false, |dx, _| dx == -1).unwrap();
        // ES code 4 -> band 150; first direction (-1, 0) open.
        assert!(pieces[0].open);
        assert_eq!(pieces[0].src, Rect::new(35, 145, 30, 30));
        assert!(!pieces[1].open);
        assert_eq!(pieces[1].src, Rect::new(5, 145, 30, 30));
        assert_eq!(pieces[0].dst, Rect::new(35, -5, 30, 30));
    }

    #[test]
    fn slope_pieces_share_the_grown_cell_rect() {
        for slope in [GeoType::SlopeNE, GeoType::SlopeNW, GeoType::SlopeES, GeoType::SlopeSW] {
            let pieces = resolve_slope(7, 3, slope, true, all_closed).unwrap();
            for piece in pieces {
                assert_eq!(piece.dst, Rect::new(135, 55, 30, 30));
                assert_eq!(piece.dst, Rect::cell(7, 3).expand(MARGIN));
            }
        }
    }
}
