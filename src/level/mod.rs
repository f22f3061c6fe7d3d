pub mod loader;

use std::sync::Arc;

use glam::Vec2;
use image::Rgba;

use crate::geometry::{GeoCell, GeoType};
use crate::registry::{MaterialDefinition, TileDefinition};

pub use loader::LevelLoader;

/// Geometry layers per level. Layer 0 is the front.
pub const GEO_LAYERS: usize = 3;

// ── Grid3 ─────────────────────────────────────────────────────────────────────

/// `width × height × 3` grid stored row-major, layer innermost.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid3<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid3<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self { width, height, cells: vec![fill; width * height * GEO_LAYERS] }
    }
}

impl<T> Grid3<T> {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32, layer: usize) -> Option<usize> {
        if !self.in_bounds(x, y) || layer >= GEO_LAYERS {
            return None;
        }
        Some(((y as usize) * self.width + x as usize) * GEO_LAYERS + layer)
    }

    pub fn get(&self, x: i32, y: i32, layer: usize) -> Option<&T> {
        self.index(x, y, layer).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, x: i32, y: i32, layer: usize) -> Option<&mut T> {
        self.index(x, y, layer).map(|i| &mut self.cells[i])
    }

    /// Write a cell. Out-of-bounds writes are ignored and reported as `false`.
    pub fn set(&mut self, x: i32, y: i32, layer: usize, value: T) -> bool {
        match self.get_mut(x, y, layer) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    fn same_shape<U>(&self, other: &Grid3<U>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

// ── TileCell ──────────────────────────────────────────────────────────────────

/// What the tile editor placed in a cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TileCell {
    /// Painted with the level's default material.
    #[default]
    Default,
    Material(Arc<MaterialDefinition>),
    /// Anchor cell of a placed tile.
    Head(Arc<TileDefinition>),
    /// Covered by a tile anchored elsewhere. `head` is `(x, y, layer)`.
    Body {
        head: (i32, i32, usize),
        definition: Option<Arc<TileDefinition>>,
    },
}

impl TileCell {
    /// Default and Material cells: the ones material painters consume.
    pub fn is_paintable(&self) -> bool {
        matches!(self, TileCell::Default | TileCell::Material(_))
    }
}

// ── Camera / lights ───────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RenderCamera {
    /// Top-left corner in grid-pixel space.
    pub coords: Vec2,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightSettings {
    pub angle: f32,
    pub flatness: i32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self { angle: 180.0, flatness: 1 }
    }
}

// ── LevelState ────────────────────────────────────────────────────────────────

/// Parsed level as handed over by the level owner.
///
/// The three grids always share one shape; they are only reachable through
/// accessors so none of them can be swapped for a differently sized one.
#[derive(Clone, Debug)]
pub struct LevelState {
    geometry: Grid3<GeoCell>,
    tiles: Grid3<TileCell>,
    material_colors: Grid3<Rgba<u8>>,
    pub default_material: Arc<MaterialDefinition>,
    pub cameras: Vec<RenderCamera>,
    pub light: LightSettings,
    pub seed: u32,
}

impl LevelState {
    /// Empty (all-air, all-default) level with one camera at the origin.
    pub fn new(width: usize, height: usize, default_material: Arc<MaterialDefinition>) -> Self {
        assert!(width > 0 && height > 0, "level must be at least 1x1, got {width}x{height}");
        Self::from_grids(
            Grid3::new(width, height, GeoCell::AIR),
            Grid3::new(width, height, TileCell::Default),
            Grid3::new(width, height, Rgba([0, 0, 0, 0])),
            default_material,
        )
    }

    /// Assemble a level from pre-built grids.
    ///
    /// # Panics
    /// When the grids do not share one shape.
    pub fn from_grids(
        geometry: Grid3<GeoCell>,
        tiles: Grid3<TileCell>,
        material_colors: Grid3<Rgba<u8>>,
        default_material: Arc<MaterialDefinition>,
    ) -> Self {
        assert!(
            geometry.same_shape(&tiles) && geometry.same_shape(&material_colors),
            "level grids disagree on shape: geometry {}x{}, tiles {}x{}, colors {}x{}",
            geometry.width,
            geometry.height,
            tiles.width,
            tiles.height,
            material_colors.width,
            material_colors.height,
        );
        Self {
            geometry,
            tiles,
            material_colors,
            default_material,
            cameras: vec![RenderCamera::default()],
            light: LightSettings::default(),
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.geometry.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.geometry.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.geometry.in_bounds(x, y)
    }

    pub fn geometry(&self) -> &Grid3<GeoCell> {
        &self.geometry
    }

    pub fn tiles(&self) -> &Grid3<TileCell> {
        &self.tiles
    }

    pub fn material_colors(&self) -> &Grid3<Rgba<u8>> {
        &self.material_colors
    }

    pub fn geo(&self, x: i32, y: i32, layer: usize) -> Option<&GeoCell> {
        self.geometry.get(x, y, layer)
    }

    /// Geometry type, `None` out of bounds.
    pub fn geo_type(&self, x: i32, y: i32, layer: usize) -> Option<GeoType> {
        self.geometry.get(x, y, layer).map(|c| c.geo_type)
    }

    pub fn tile(&self, x: i32, y: i32, layer: usize) -> Option<&TileCell> {
        self.tiles.get(x, y, layer)
    }

    pub fn set_geo(&mut self, x: i32, y: i32, layer: usize, cell: GeoCell) -> bool {
        self.geometry.set(x, y, layer, cell)
    }

    pub fn set_tile(&mut self, x: i32, y: i32, layer: usize, cell: TileCell) -> bool {
        self.tiles.set(x, y, layer, cell)
    }

    pub fn set_material_color(&mut self, x: i32, y: i32, layer: usize, color: Rgba<u8>) -> bool {
        self.material_colors.set(x, y, layer, color)
    }

    /// Place `def` with its head at `(x, y, layer)` and mark the rest of the
    /// footprint as body cells. Cells outside the level are skipped.
    pub fn place_tile(&mut self, def: Arc<TileDefinition>, x: i32, y: i32, layer: usize) {
        let (hx, hy) = def.head_offset();
        let (sx, sy) = (x - hx, y - hy);
        for fy in 0..def.height() {
            for fx in 0..def.width() {
                let (cx, cy) = (sx + fx, sy + fy);
                if (cx, cy) == (x, y) {
                    continue;
                }
                self.tiles.set(
                    cx,
                    cy,
                    layer,
                    TileCell::Body { head: (x, y, layer), definition: Some(Arc::clone(&def)) },
                );
            }
        }
        self.tiles.set(x, y, layer, TileCell::Head(def));
    }

    /// Tile definition a body cell belongs to. `None` unless the referenced
    /// head cell really is a `Head`.
    pub fn resolve_body(&self, x: i32, y: i32, layer: usize) -> Option<&Arc<TileDefinition>> {
        let TileCell::Body { head: (hx, hy, hz), .. } = self.tiles.get(x, y, layer)? else {
            return None;
        };
        match self.tiles.get(*hx, *hy, *hz)? {
            TileCell::Head(def) => Some(def),
            _ => None,
        }
    }

    /// Material painting cell `(x, y, layer)`: the assigned material, or the
    /// default material for `Default` cells.
    pub fn material_at(&self, x: i32, y: i32, layer: usize) -> Option<&Arc<MaterialDefinition>> {
        match self.tiles.get(x, y, layer)? {
            TileCell::Material(m) => Some(m),
            TileCell::Default => Some(&self.default_material),
            _ => None,
        }
    }

    /// First camera, or the origin when the level has none.
    pub fn primary_camera(&self) -> RenderCamera {
        self.cameras.first().copied().unwrap_or_default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MaterialRenderType, TileType};

    fn concrete() -> Arc<MaterialDefinition> {
        Arc::new(MaterialDefinition::new("Concrete", Rgba([150, 150, 150, 255]), MaterialRenderType::Unified))
    }

    #[test]
    fn grid_rejects_out_of_bounds_access() {
        let mut g = Grid3::new(2, 2, 0u8);
        assert!(g.get(2, 0, 0).is_none());
        assert!(g.get(0, -1, 0).is_none());
        assert!(g.get(0, 0, 3).is_none());
        assert!(!g.set(5, 5, 0, 1));
        assert!(g.set(1, 1, 2, 7));
        assert_eq!(g.get(1, 1, 2), Some(&7));
        assert_eq!(g.get(1, 1, 1), Some(&0));
    }

    #[test]
    #[should_panic(expected = "disagree on shape")]
    fn mismatched_grid_shapes_panic() {
        LevelState::from_grids(
            Grid3::new(3, 3, GeoCell::AIR),
            Grid3::new(3, 4, TileCell::Default),
            Grid3::new(3, 3, Rgba([0, 0, 0, 0])),
            concrete(),
        );
    }

    #[test]
    fn body_resolves_through_valid_head() {
        let mut level = LevelState::new(4, 4, concrete());
        let big = Arc::new(TileDefinition::new("Big Metal", (2, 2), TileType::VoxelStruct));
        level.place_tile(Arc::clone(&big), 2, 2, 0);

        // 2x2 head offset is (1, 1): footprint covers (1..=2, 1..=2).
        assert!(matches!(level.tile(2, 2, 0), Some(TileCell::Head(_))));
        assert_eq!(level.resolve_body(1, 1, 0).map(|d| d.name.as_str()), Some("Big Metal"));
        assert!(level.resolve_body(3, 3, 0).is_none());
    }

    #[test]
    fn body_with_dangling_head_is_inert() {
        let mut level = LevelState::new(3, 3, concrete());
        level.set_tile(0, 0, 0, TileCell::Body { head: (2, 2, 0), definition: None });
        assert!(level.resolve_body(0, 0, 0).is_none());
    }

    #[test]
    fn default_cells_report_default_material() {
        let level = LevelState::new(2, 2, concrete());
        assert_eq!(level.material_at(0, 0, 0).unwrap().name, "Concrete");
        assert!(level.material_at(9, 9, 0).is_none());
    }
}
