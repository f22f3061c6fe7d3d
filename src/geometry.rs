// =============================================================================
// GEOMETRY.RS — Cell geometry and pixel rectangles
//
// Everything the renderer needs to know about the physical shape of a cell:
// - Geometry type (air, solid, the four slopes, platform, ...)
// - Decorative feature flags (poles, shortcut markers, ...)
// - Integer pixel rectangles in grid-pixel space (CELL_PX per cell)
// =============================================================================

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Pixel size of one grid cell.
pub const CELL_PX: i32 = 20;

// =============================================================================
// GEOMETRY TYPE
// =============================================================================

/// Physical classification of a cell.
///
/// The numeric codes are stable: tile spec grids store them and the slope
/// atlas rows are computed from them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoType {
    #[default]
    Air,
    Solid,
    SlopeNE,
    SlopeNW,
    SlopeES,
    SlopeSW,
    Platform,
    ShortcutEntrance,
    Glass,
}

impl GeoType {
    /// Numeric code as stored in tile spec grids.
    pub const fn code(self) -> i32 {
        match self {
            GeoType::Air => 0,
            GeoType::Solid => 1,
            GeoType::SlopeNE => 2,
            GeoType::SlopeNW => 3,
            GeoType::SlopeES => 4,
            GeoType::SlopeSW => 5,
            GeoType::Platform => 6,
            GeoType::ShortcutEntrance => 7,
            GeoType::Glass => 9,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => GeoType::Air,
            1 => GeoType::Solid,
            2 => GeoType::SlopeNE,
            3 => GeoType::SlopeNW,
            4 => GeoType::SlopeES,
            5 => GeoType::SlopeSW,
            6 => GeoType::Platform,
            7 => GeoType::ShortcutEntrance,
            9 => GeoType::Glass,
            _ => return None,
        })
    }

    #[inline]
    pub fn is_slope(self) -> bool {
        matches!(self, GeoType::SlopeNE | GeoType::SlopeNW | GeoType::SlopeES | GeoType::SlopeSW)
    }

    /// Solid or any slope: the shapes a material can connect through.
    #[inline]
    pub fn is_solid_or_slope(self) -> bool {
        self == GeoType::Solid || self.is_slope()
    }
}

// =============================================================================
// FEATURES
// =============================================================================

bitflags! {
    /// Decorative and gameplay markers a cell can carry on top of its type.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct GeoFeatures: u32 {
        const HORIZONTAL_POLE = 1 << 0;
        const VERTICAL_POLE = 1 << 1;
        const BATFLY_HIVE = 1 << 2;
        const SHORTCUT_ENTRANCE = 1 << 3;
        const SHORTCUT_PATH = 1 << 4;
        const ROOM_ENTRANCE = 1 << 5;
        const CREATURE_DEN = 1 << 6;
        const PLACE_ROCK = 1 << 7;
        const PLACE_SPEAR = 1 << 8;
        const CRACKED_TERRAIN = 1 << 9;
        const FORBID_FLY_CHAINS = 1 << 10;
        const GARBAGE_WORM_HOLE = 1 << 11;
        const WATERFALL = 1 << 12;
        const WACK_A_MOLE_HOLE = 1 << 13;
        const WORM_GRASS = 1 << 14;
        const SCAVENGER_HOLE = 1 << 15;

        /// Either pole direction.
        const POLES = Self::HORIZONTAL_POLE.bits() | Self::VERTICAL_POLE.bits();
    }
}

// =============================================================================
// CELL
// =============================================================================

/// One geometry cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoCell {
    pub geo_type: GeoType,
    pub features: GeoFeatures,
}

impl GeoCell {
    pub const AIR: Self = Self { geo_type: GeoType::Air, features: GeoFeatures::empty() };

    pub fn new(geo_type: GeoType) -> Self {
        Self { geo_type, features: GeoFeatures::empty() }
    }

    pub fn with_feature(mut self, features: GeoFeatures) -> Self {
        self.features |= features;
        self
    }

    /// True if the cell carries every flag in `features`.
    #[inline]
    pub fn has(&self, features: GeoFeatures) -> bool {
        self.features.contains(features)
    }

    #[inline]
    pub fn is(&self, geo_type: GeoType) -> bool {
        self.geo_type == geo_type
    }
}

// =============================================================================
// RECTANGLES
// =============================================================================

/// Integer rectangle in pixel space. Width and height may be zero; negative
/// sizes are never produced by the renderer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Pixel rectangle covering grid cell `(cx, cy)`.
    pub const fn cell(cx: i32, cy: i32) -> Self {
        Self::new(cx * CELL_PX, cy * CELL_PX, CELL_PX, CELL_PX)
    }

    /// Grow by `by` pixels on every side.
    pub const fn expand(self, by: i32) -> Self {
        Self::new(self.x - by, self.y - by, self.w + 2 * by, self.h + 2 * by)
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

// =============================================================================
// DIRECTIONS
// =============================================================================

/// Left, up, right, down. The order neighbor codes are built in.
pub const CARDINALS: [(i32, i32); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_and_skip_eight() {
        for code in 0..=9 {
            match GeoType::from_code(code) {
                Some(t) => assert_eq!(t.code(), code),
                None => assert_eq!(code, 8, "only code 8 is unassigned"),
            }
        }
    }

    #[test]
    fn slope_codes_are_consecutive_from_two() {
        assert_eq!(GeoType::SlopeNE.code(), 2);
        assert_eq!(GeoType::SlopeNW.code(), 3);
        assert_eq!(GeoType::SlopeES.code(), 4);
        assert_eq!(GeoType::SlopeSW.code(), 5);
    }

    #[test]
    fn features_insert_and_remove_independently() {
        let mut f = GeoFeatures::VERTICAL_POLE;
        f.insert(GeoFeatures::SHORTCUT_PATH);
        assert!(f.contains(GeoFeatures::VERTICAL_POLE));
        assert!(f.contains(GeoFeatures::SHORTCUT_PATH));
        assert!(!f.contains(GeoFeatures::HORIZONTAL_POLE));
        f.remove(GeoFeatures::VERTICAL_POLE);
        assert!(!f.contains(GeoFeatures::VERTICAL_POLE));
        assert!(f.contains(GeoFeatures::SHORTCUT_PATH));
    }

    #[test]
    fn cell_features_are_distinct_bits() {
        let all = GeoFeatures::all();
        assert_eq!(all.bits().count_ones(), 16);
        assert!(GeoCell::AIR.features.is_empty());

        let cell = GeoCell::AIR.with_feature(GeoFeatures::HORIZONTAL_POLE);
        assert!(cell.has(GeoFeatures::HORIZONTAL_POLE));
        assert!(!cell.has(GeoFeatures::POLES));
        assert!(cell.features.intersects(GeoFeatures::POLES));
    }

    #[test]
    fn features_serialize_by_flag_name() {
        let cell = GeoCell::new(GeoType::Glass).with_feature(GeoFeatures::WORM_GRASS | GeoFeatures::WATERFALL);
        let json = serde_json::to_string(&cell).unwrap();
        let back: GeoCell = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cell);
    }

    #[test]
    fn rect_expand_grows_every_side() {
        let r = Rect::cell(1, 2).expand(5);
        assert_eq!(r, Rect::new(15, 35, 30, 30));
    }
}
