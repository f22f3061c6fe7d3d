pub mod autotile;
pub mod canvas;
pub mod compositor;
pub mod context;
pub mod materials;
pub mod packer;
pub mod scheduler;
pub mod tiles;

use glam::IVec2;

use crate::config::RenderConfig;
use crate::geometry::CELL_PX;
use crate::level::{LevelState, RenderCamera};
use crate::rng::DeterministicRng;

pub use canvas::{Blend, Canvas};
pub use compositor::{LayerCompositor, Stack};
pub use context::RenderContext;
pub use scheduler::LayerPass;

// ── CameraView ────────────────────────────────────────────────────────────────

/// The block of cells one camera sees, in grid coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CameraView {
    pub origin: IVec2,
    pub columns: i32,
    pub rows: i32,
}

impl CameraView {
    pub fn from_camera(camera: &RenderCamera) -> Self {
        Self {
            origin: (camera.coords / CELL_PX as f32).as_ivec2(),
            columns: crate::COLUMNS,
            rows: crate::ROWS,
        }
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        let rel = cell - self.origin;
        rel.x >= 0 && rel.y >= 0 && rel.x < self.columns && rel.y < self.rows
    }

    /// Every cell in the view, column by column.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        (0..self.columns)
            .flat_map(move |cx| (0..self.rows).map(move |cy| self.origin + IVec2::new(cx, cy)))
    }
}

// ── Painter ───────────────────────────────────────────────────────────────────

/// Everything one geometry-layer pass draws with.
///
/// Painters borrow the RNG and the compositor mutably for the whole pass, so
/// RNG calls happen strictly in drawing order.
pub struct Painter<'a> {
    pub level: &'a LevelState,
    pub context: &'a RenderContext,
    pub config: &'a RenderConfig,
    pub rng: &'a mut DeterministicRng,
    pub layers: &'a mut LayerCompositor,
    pub view: CameraView,
    /// Geometry layer being rendered (0..3).
    pub layer: usize,
}

impl Painter<'_> {
    /// Frontmost slot of the current geometry layer.
    #[inline]
    pub fn front_slot(&self) -> usize {
        compositor::layer_base(self.layer)
    }

    /// Split the RNG off so it can be lent to a routine that also draws.
    pub fn split(&mut self) -> (&mut DeterministicRng, TileDrawer<'_>) {
        let drawer = TileDrawer {
            level: self.level,
            context: self.context,
            config: self.config,
            layers: &mut *self.layers,
            view: self.view,
            layer: self.layer,
        };
        (&mut *self.rng, drawer)
    }
}

/// A [`Painter`] without its RNG.
pub struct TileDrawer<'a> {
    level: &'a LevelState,
    context: &'a RenderContext,
    config: &'a RenderConfig,
    layers: &'a mut LayerCompositor,
    pub view: CameraView,
    layer: usize,
}

impl TileDrawer<'_> {
    pub fn draw(&mut self, tile: &crate::registry::TileDefinition, x: i32, y: i32, rng: &mut DeterministicRng) {
        let mut p = Painter {
            level: self.level,
            context: self.context,
            config: self.config,
            rng,
            layers: &mut *self.layers,
            view: self.view,
            layer: self.layer,
        };
        tiles::draw_tile(&mut p, tile, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn view_origin_is_camera_pixels_over_cell_size() {
        let view = CameraView::from_camera(&RenderCamera { coords: Vec2::new(200.0, 45.0) });
        assert_eq!(view.origin, IVec2::new(10, 2));
        assert!(view.contains(IVec2::new(10, 2)));
        assert!(view.contains(IVec2::new(109, 61)));
        assert!(!view.contains(IVec2::new(110, 2)));
        assert!(!view.contains(IVec2::new(9, 2)));
    }

    #[test]
    fn view_cells_walk_columns_first() {
        let view = CameraView { origin: IVec2::ZERO, columns: 2, rows: 2 };
        let cells: Vec<IVec2> = view.cells().collect();
        assert_eq!(cells, [IVec2::new(0, 0), IVec2::new(0, 1), IVec2::new(1, 0), IVec2::new(1, 1)]);
    }
}
