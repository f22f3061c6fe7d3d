use std::sync::Arc;

use glam::IVec2;

use crate::geometry::{GeoFeatures, GeoType, Rect, CELL_PX};
use crate::level::TileCell;
use crate::registry::{MaterialDefinition, MaterialRenderType};
use crate::renderer::canvas::POLE_COLOR;
use crate::renderer::materials;
use crate::renderer::packer::{self, Prioritized};
use crate::renderer::{tiles, Painter};

/// What one geometry-layer pass classified and drew. Kept for inspection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerPass {
    pub layer: usize,
    /// Heads, material and default cells in scan order.
    pub draw_later: Vec<Prioritized>,
    /// `drawLast` heads, sorted by priority.
    pub draw_last: Vec<Prioritized>,
    pub entrances: Vec<Prioritized>,
    pub shortcuts: Vec<IVec2>,
    /// Pole markers drawn on the overlay.
    pub poles: usize,
    /// Material groups in dispatch order, with their cell counts.
    pub materials: Vec<(String, usize)>,
}

/// Scan the camera window and sort every cell into its bucket.
///
/// RNG use, per cell in scan order: one `next(1000)` for an entrance, one
/// `next(999)` for any queued cell.
pub fn classify(p: &mut Painter) -> LayerPass {
    let level = p.level;
    let layer = p.layer;
    let mut pass = LayerPass { layer, ..LayerPass::default() };

    for pos in p.view.cells() {
        let IVec2 { x, y } = pos;
        let (Some(cell), Some(top)) = (level.geo(x, y, layer), level.geo(x, y, 0)) else {
            continue;
        };

        if cell.has(GeoFeatures::VERTICAL_POLE) {
            let marker = Rect::new(x * CELL_PX + 8, y * CELL_PX, 4, CELL_PX);
            p.layers.overlay_mut().fill_rect(marker, POLE_COLOR);
            pass.poles += 1;
        }
        if cell.has(GeoFeatures::HORIZONTAL_POLE) {
            let marker = Rect::new(x * CELL_PX, y * CELL_PX + 8, CELL_PX, 4);
            p.layers.overlay_mut().fill_rect(marker, POLE_COLOR);
            pass.poles += 1;
        }

        if layer == 0 && top.is(GeoType::ShortcutEntrance) {
            pass.entrances.push(Prioritized { rnd: p.rng.next(1000), pos });
            continue;
        }

        if top.has(GeoFeatures::SHORTCUT_PATH) {
            let paintable = |l: usize| level.tile(x, y, l).is_some_and(TileCell::is_paintable);
            let front_path = layer == 0 && top.is(GeoType::Solid) && paintable(0);
            let back_path = layer == 1 && cell.is(GeoType::Solid) && !top.is(GeoType::Solid) && paintable(1);
            if front_path || back_path {
                pass.shortcuts.push(pos);
            }
        }

        match level.tile(x, y, layer) {
            Some(TileCell::Head(def)) if def.has_tag("drawLast") => {
                pass.draw_last.push(Prioritized { rnd: p.rng.next(999), pos });
            }
            Some(TileCell::Body { .. }) | None => {}
            Some(_) => pass.draw_later.push(Prioritized { rnd: p.rng.next(999), pos }),
        }
    }

    packer::sort_by_priority(&mut pass.draw_last);
    pass
}

/// Classify, then draw heads, material groups and `drawLast` heads.
pub fn render_layer(p: &mut Painter) -> LayerPass {
    let mut pass = classify(p);
    let level = p.level;
    let layer = p.layer;

    // Heads draw straight away; material cells are grouped.
    let mut groups: Vec<(Arc<MaterialDefinition>, Vec<IVec2>)> = Vec::new();
    for queued in &pass.draw_later {
        let IVec2 { x, y } = queued.pos;
        let material = match level.tile(x, y, layer) {
            Some(TileCell::Head(def)) => {
                tiles::draw_tile(p, def, x, y);
                continue;
            }
            Some(TileCell::Material(m)) => m,
            Some(TileCell::Default) => &level.default_material,
            _ => continue,
        };
        match groups.iter_mut().find(|(m, _)| **m == **material) {
            Some((_, cells)) => cells.push(queued.pos),
            None => groups.push((Arc::clone(material), vec![queued.pos])),
        }
    }

    for (material, cells) in &groups {
        if material.render_type == MaterialRenderType::Invisible && p.config.invisible_material_fix {
            log::debug!("scheduler: skipping invisible '{}'", material.name);
            continue;
        }
        log::debug!("scheduler: layer {layer} '{}' {} cells", material.name, cells.len());
        materials::handler_for(material.render_type)(p, material, cells);
        pass.materials.push((material.name.clone(), cells.len()));
    }

    for queued in &pass.draw_last {
        let IVec2 { x, y } = queued.pos;
        if let Some(TileCell::Head(def)) = level.tile(x, y, layer) {
            tiles::draw_tile(p, def, x, y);
        }
    }

    pass
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    use crate::renderer::canvas::BACKGROUND;

    use crate::config::RenderConfig;
    use crate::geometry::GeoCell;
    use crate::level::LevelState;
    use crate::registry::{Registry, TileDefinition, TileType};
    use crate::renderer::compositor::Stack;
    use crate::renderer::{CameraView, LayerCompositor, RenderContext};
    use crate::rng::DeterministicRng;

    fn material(name: &str, rt: MaterialRenderType) -> Arc<MaterialDefinition> {
        Arc::new(MaterialDefinition::new(name, Rgba([90, 90, 90, 255]), rt))
    }

    fn pass_over(level: &LevelState, layer: usize, config: &RenderConfig) -> (LayerPass, LayerCompositor) {
        let context = RenderContext::from_registry(&Registry::new());
        let mut rng = DeterministicRng::new(42);
        let mut layers = LayerCompositor::new(100, 100);
        let pass = {
            let mut p = Painter {
                level,
                context: &context,
                config,
                rng: &mut rng,
                layers: &mut layers,
                view: CameraView { origin: IVec2::ZERO, columns: 100, rows: 60 },
                layer,
            };
            render_layer(&mut p)
        };
        (pass, layers)
    }

    // ── Classification ───────────────────────────────────────────────────

    #[test]
    fn entrances_are_pulled_out_on_layer_zero_only() {
        let mut level = LevelState::new(2, 1, material("Concrete", MaterialRenderType::Unified));
        level.set_geo(0, 0, 0, GeoCell::new(GeoType::ShortcutEntrance));

        let (front, _) = pass_over(&level, 0, &RenderConfig::default());
        assert_eq!(front.entrances.len(), 1);
        assert_eq!(front.draw_later.len(), 1);

        let (back, _) = pass_over(&level, 1, &RenderConfig::default());
        assert!(back.entrances.is_empty());
        assert_eq!(back.draw_later.len(), 2);
    }

    #[test]
    fn shortcut_paths_follow_layer_rules() {
        let mut level = LevelState::new(2, 1, material("Concrete", MaterialRenderType::Unified));
        level.set_geo(0, 0, 0, GeoCell::new(GeoType::Solid).with_feature(GeoFeatures::SHORTCUT_PATH));
        level.set_geo(1, 0, 0, GeoCell::new(GeoType::Air).with_feature(GeoFeatures::SHORTCUT_PATH));
        level.set_geo(1, 0, 1, GeoCell::new(GeoType::Solid));

        let (front, _) = pass_over(&level, 0, &RenderConfig::default());
        assert_eq!(front.shortcuts, [IVec2::new(0, 0)]);
        let (back, _) = pass_over(&level, 1, &RenderConfig::default());
        assert_eq!(back.shortcuts, [IVec2::new(1, 0)]);
    }

    #[test]
    fn poles_go_to_overlay_not_slots() {
        let mut level = LevelState::new(1, 1, material("Concrete", MaterialRenderType::Unified));
        level.set_geo(0, 0, 0, GeoCell::AIR.with_feature(GeoFeatures::VERTICAL_POLE));
        let (pass, layers) = pass_over(&level, 0, &RenderConfig::default());
        assert_eq!(pass.poles, 1);
        assert_eq!(layers.overlay().pixel(9, 5), Some(POLE_COLOR));
        assert_eq!(layers.overlay().pixel(2, 5), Some(BACKGROUND));
        assert_eq!(layers.allocated(Stack::Primary), 0);
    }

    #[test]
    fn body_cells_are_not_queued_and_draw_last_is_separate() {
        let mut level = LevelState::new(3, 1, material("Concrete", MaterialRenderType::Unified));
        let wide = TileDefinition::new("Wide", (2, 1), TileType::VoxelStruct);
        level.place_tile(Arc::new(wide), 1, 0, 0);
        let lamp = TileDefinition::new("Lamp", (1, 1), TileType::VoxelStruct).with_tags(["drawLast"]);
        level.place_tile(Arc::new(lamp), 2, 0, 0);

        let (pass, _) = pass_over(&level, 0, &RenderConfig::default());
        // (0,0) is body, (1,0) head, (2,0) draw-last head.
        assert_eq!(pass.draw_later.iter().map(|c| c.pos).collect::<Vec<_>>(), [IVec2::new(1, 0)]);
        assert_eq!(pass.draw_last.len(), 1);
    }

    // ── Dispatch ─────────────────────────────────────────────────────────

    #[test]
    fn groups_dispatch_in_first_appearance_order() {
        let concrete = material("Concrete", MaterialRenderType::Unified);
        let bricks = material("Bricks", MaterialRenderType::Unified);
        let mut level = LevelState::new(3, 1, Arc::clone(&concrete));
        level.set_tile(0, 0, 0, TileCell::Material(Arc::clone(&bricks)));

        let (pass, _) = pass_over(&level, 0, &RenderConfig::default());
        assert_eq!(pass.materials, [("Bricks".to_string(), 1), ("Concrete".to_string(), 2)]);
    }

    #[test]
    fn invisible_fix_skips_invisible_groups() {
        let level = LevelState::new(1, 1, material("Invisible", MaterialRenderType::Invisible));
        let (on, _) = pass_over(&level, 0, &RenderConfig { invisible_material_fix: true, ..RenderConfig::default() });
        assert!(on.materials.is_empty());
        let (off, _) = pass_over(&level, 0, &RenderConfig::default());
        assert_eq!(off.materials.len(), 1);
    }

    #[test]
    fn heads_draw_into_front_slot_of_their_layer() {
        let mut level = LevelState::new(2, 2, material("Concrete", MaterialRenderType::Unified));
        let crate_tile = TileDefinition::new("Crate", (1, 1), TileType::VoxelStruct)
            .with_texture(Arc::new(RgbaImage::from_pixel(20, 21, Rgba([10, 10, 10, 255]))));
        level.place_tile(Arc::new(crate_tile), 1, 1, 2);

        let (_, layers) = pass_over(&level, 2, &RenderConfig::default());
        assert_eq!(layers.slot(Stack::Primary, 20).and_then(|c| c.pixel(30, 30)), Some(Rgba([10, 10, 10, 255])));
    }
}
