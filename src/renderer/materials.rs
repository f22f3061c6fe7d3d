// =============================================================================
// MATERIALS.RS — Material painters and the render-type strategy table
//
// One handler per render type, looked up with `handler_for`. A handler gets
// the cells of one material group (in queue order) and draws them:
//
// - Unified / Invisible: autotiled sheet pieces, platform floors, overlays
// - Tiles:  edge substitutes plus a per-material solid fill (see packer)
// - Pipe:   neighbor-coded atlas pieces in two slot pairs, trash decals
// - others: logged and skipped
// =============================================================================

use glam::IVec2;
use image::Rgba;

use crate::geometry::{GeoType, Rect, CARDINALS, CELL_PX};
use crate::level::{LevelState, TileCell};
use crate::registry::{MaterialDefinition, MaterialRenderType};
use crate::renderer::autotile::{self, SHADOW_OFFSET};
use crate::renderer::canvas::{Blend, BACKGROUND};
use crate::renderer::compositor::Stack;
use crate::renderer::context::{pipe_texture_name, PIPE_FRAMEWORK, TRASH_DECALS};
use crate::renderer::packer::{self, EdgeFamily, Prioritized, SolidFill};
use crate::renderer::{tiles, Painter};

/// Draws one material group.
pub type MaterialHandler = fn(&mut Painter, &MaterialDefinition, &[IVec2]);

/// Strategy table: render type → painter.
pub fn handler_for(render_type: MaterialRenderType) -> MaterialHandler {
    match render_type {
        MaterialRenderType::Unified | MaterialRenderType::Invisible => paint_unified,
        MaterialRenderType::Tiles => paint_tiles,
        MaterialRenderType::Pipe => paint_pipes,
        _ => paint_nothing,
    }
}

/// Whether the cell at `(x, y)` joins seamlessly with `material`.
///
/// Only Solid and slope cells painted with the same material count. Outside
/// the level, a cell is open when the level's default material is `material`.
pub fn is_open(level: &LevelState, material: &MaterialDefinition, x: i32, y: i32, layer: usize) -> bool {
    let Some(geo) = level.geo_type(x, y, layer) else {
        return *level.default_material == *material;
    };
    if !geo.is_solid_or_slope() {
        return false;
    }
    match level.tile(x, y, layer) {
        Some(TileCell::Material(m)) => **m == *material,
        Some(TileCell::Default) => *level.default_material == *material,
        _ => false,
    }
}

fn paint_nothing(_: &mut Painter, material: &MaterialDefinition, cells: &[IVec2]) {
    log::debug!(
        "materials: no painter for {:?} ('{}'); {} cells skipped",
        material.render_type,
        material.name,
        cells.len()
    );
}

// ── Unified ───────────────────────────────────────────────────────────────────

/// Repeat modulus of the texture overlay drawn on top of the sheet.
pub fn overlay_modulus(material: &str) -> i32 {
    match material {
        "Concrete" | "Cliff" | "Asphalt" => 45,
        "RainStone" => 6,
        "Bricks" => 1,
        "Tiny Signs" | "MassiveBulkMetal" => 10,
        "Non-Slip Metal" | "BulkMetal" => 5,
        _ => 0,
    }
}

/// Triangle that re-clears the open half of a slope cell.
pub fn slope_crop(slope: GeoType, x: i32, y: i32) -> Option<[IVec2; 3]> {
    let tl = IVec2::new(x, y) * CELL_PX;
    let br = IVec2::new(x + 1, y + 1) * CELL_PX;
    let bl = IVec2::new(tl.x, br.y);
    let tr = IVec2::new(br.x, tl.y);
    Some(match slope {
        GeoType::SlopeSW => [tl, br, bl],
        GeoType::SlopeES => [tr, bl, br],
        GeoType::SlopeNW => [bl, tr, tl],
        GeoType::SlopeNE => [br, tl, tr],
        _ => return None,
    })
}

fn paint_unified(p: &mut Painter, material: &MaterialDefinition, cells: &[IVec2]) {
    for &cell in cells {
        paint_unified_cell(p, material, cell.x, cell.y);
    }
}

/// Draw one cell of a unified material.
pub fn paint_unified_cell(p: &mut Painter, material: &MaterialDefinition, x: i32, y: i32) {
    let Some(geo) = p.level.geo_type(x, y, p.layer) else { return };
    let fixes = p.config.material_fixes;
    let front = p.front_slot();
    let sheet = p.context.tile_set(material, fixes);
    let (level, layer) = (p.level, p.layer);
    let open = |dx: i32, dy: i32| is_open(level, material, x + dx, y + dy, layer);
    let sand_block = material.name == "Sand Block";

    match geo {
        GeoType::Solid => {
            if let Some(sheet) = sheet.as_deref().filter(|_| !sand_block) {
                for piece in autotile::resolve_solid(x, y, open) {
                    p.layers.draw(Stack::Primary, front, sheet, piece.src, piece.dst, Blend::StripBackground);
                    let shadow = piece.src.offset(SHADOW_OFFSET, 0);
                    for d in 1..=9 {
                        p.layers.draw(Stack::Primary, front + d, sheet, shadow, piece.dst, Blend::StripBackground);
                    }
                }
            }
        }
        GeoType::SlopeNE | GeoType::SlopeNW | GeoType::SlopeES | GeoType::SlopeSW => {
            let pieces = autotile::resolve_slope(x, y, geo, fixes, open);
            if let (Some(sheet), Some(pieces)) = (sheet.as_deref(), pieces) {
                let shadow_only = material.name == "Scaffolding" && !fixes;
                for piece in pieces {
                    let shadow = piece.src.offset(SHADOW_OFFSET, 0);
                    if shadow_only {
                        for d in [5, 6, 8, 9] {
                            p.layers.draw(Stack::Primary, front + d, sheet, shadow, piece.dst, Blend::StripBackground);
                        }
                    } else if !sand_block {
                        p.layers.draw(Stack::Primary, front, sheet, piece.src, piece.dst, Blend::StripBackground);
                        for d in 1..=9 {
                            p.layers.draw(Stack::Primary, front + d, sheet, shadow, piece.dst, Blend::StripBackground);
                        }
                    }
                }
            }
        }
        GeoType::Platform => match p.context.platform_tile(material, fixes) {
            Some(floor) => tiles::draw_tile(p, &floor, x, y),
            None if material.name != "Invisible" => {
                log::debug!("materials: no floor sheet for '{}'", material.name);
            }
            None => {}
        },
        _ => {}
    }

    draw_overlay(p, material, geo, x, y);
}

fn draw_overlay(p: &mut Painter, material: &MaterialDefinition, geo: GeoType, x: i32, y: i32) {
    let modulus = overlay_modulus(&material.name);
    if modulus == 0 {
        return;
    }
    let Some(texture) = material.texture.as_deref() else { return };

    let src = if material.name == "Bricks" {
        Rect::new(0, 0, CELL_PX, CELL_PX)
    } else {
        Rect::new((x % modulus) * CELL_PX, (y % modulus) * CELL_PX, CELL_PX, CELL_PX)
    };
    let front = p.front_slot();
    let dst = Rect::cell(x, y);

    if geo == GeoType::Solid {
        p.layers.draw(Stack::Primary, front, texture, src, dst, Blend::StripBackground);
    } else if let Some([a, b, c]) = slope_crop(geo, x, y) {
        p.layers.draw(Stack::Primary, front, texture, src, dst, Blend::StripBackground);
        if let Some(slot) = p.layers.slot_mut(Stack::Primary, front) {
            slot.fill_triangle(a, b, c, BACKGROUND);
        }
    }
}

// ── Tiles ─────────────────────────────────────────────────────────────────────

/// Tile-type materials scan the whole level, not just the group handed in.
fn paint_tiles(p: &mut Painter, material: &MaterialDefinition, _cells: &[IVec2]) {
    let Some(recipe) = packer::recipe_for(&material.name) else {
        log::debug!("materials: no tile recipe for '{}'", material.name);
        return;
    };
    let edges = recipe.edge_family(p.config.material_fixes);
    let level = p.level;
    let layer = p.layer;
    let span = (level.width() + level.height()) as i32;

    // Collect candidates column by column.
    let mut queue: Vec<Prioritized> = Vec::new();
    for x in 0..level.width() as i32 {
        for y in 0..level.height() as i32 {
            let Some(geo) = level.geo_type(x, y, layer) else { continue };
            if geo == GeoType::Air {
                continue;
            }
            if !is_same_material(level, material, x, y, layer) {
                continue;
            }

            if geo == GeoType::Solid || edges.is_some() {
                queue.push(Prioritized { rnd: p.rng.next(span), pos: IVec2::new(x, y) });
            } else if let Some(standard) = p.context.standard().cloned() {
                if p.view.contains(IVec2::new(x, y)) {
                    paint_unified_cell(p, &standard, x, y);
                }
            }
        }
    }
    packer::sort_by_priority(&mut queue);

    if let SolidFill::EachCell { tile } = recipe.solids {
        let cells: Vec<IVec2> = queue.iter().map(|c| c.pos).collect();
        paint_each_cell(p, edges, tile, &cells);
        return;
    }

    // Peel every non-Solid cell off the back of the queue, drawing its edge
    // substitute if the family has one.
    for i in (0..queue.len()).rev() {
        let pos = queue[i].pos;
        let geo = level.geo_type(pos.x, pos.y, layer).unwrap_or(GeoType::Air);
        if geo == GeoType::Solid {
            continue;
        }
        queue.remove(i);
        if let Some(name) = edges.and_then(|family| family.tile_for(geo)) {
            draw_named(p, name, pos);
        }
    }

    let origins: Vec<IVec2> = queue.iter().map(|c| c.pos).collect();
    fill_solids(p, material, recipe.solids, origins);
}

/// Tile cell painted with `material`, directly or through the default.
fn is_same_material(level: &LevelState, material: &MaterialDefinition, x: i32, y: i32, layer: usize) -> bool {
    match level.tile(x, y, layer) {
        Some(TileCell::Material(m)) => **m == *material,
        Some(TileCell::Default) => *level.default_material == *material,
        _ => false,
    }
}

fn draw_named(p: &mut Painter, name: &str, pos: IVec2) {
    match p.context.tile(name) {
        Some(tile) => tiles::draw_tile(p, &tile, pos.x, pos.y),
        None => log::warn!("materials: tile '{name}' missing"),
    }
}

/// One backwards walk over the whole queue: Solid cells draw `solid`, the
/// others their edge substitute.
fn paint_each_cell(p: &mut Painter, edges: Option<&'static EdgeFamily>, solid: &str, cells: &[IVec2]) {
    let level = p.level;
    let layer = p.layer;
    for &pos in cells.iter().rev() {
        match level.geo_type(pos.x, pos.y, layer) {
            Some(GeoType::Solid) => draw_named(p, solid, pos),
            Some(geo) => {
                if let Some(name) = edges.and_then(|family| family.tile_for(geo)) {
                    draw_named(p, name, pos);
                }
            }
            None => {}
        }
    }
}

fn fill_solids(p: &mut Painter, material: &MaterialDefinition, fill: SolidFill, origins: Vec<IVec2>) {
    let context = p.context;
    let level = p.level;
    let layer = p.layer;

    match fill {
        SolidFill::MergeThenScatter { big, small } => {
            let (squares, rest) = packer::merge_squares(&origins);
            if let Some(tile) = context.tile(big) {
                let (hx, hy) = tile.head_offset();
                for corner in squares {
                    let anchor = corner + IVec2::new(hx, hy);
                    if p.view.contains(anchor) {
                        tiles::draw_tile(p, &tile, anchor.x, anchor.y);
                    }
                }
            }
            scatter_tile(p, small, rest);
        }
        SolidFill::Scatter { tile } => scatter_tile(p, tile, origins),
        SolidFill::Pool(kind) => {
            let (rng, mut drawer) = p.split();
            packer::pack_footprints(
                &origins,
                context.pool(kind),
                |x, y| level.geo_type(x, y, layer),
                rng,
                |placed, rng| {
                    if drawer.view.contains(placed.anchor) {
                        drawer.draw(&placed.tile, placed.anchor.x, placed.anchor.y, rng);
                    }
                },
            );
        }
        SolidFill::EachCell { tile } => paint_each_cell(p, None, tile, &origins),
        SolidFill::SandPool => {
            let pool = context.sand_pool();
            for &pos in origins.iter().rev() {
                let Some(i) = p.rng.index(pool.len()) else { break };
                tiles::draw_tile(p, &pool[i], pos.x, pos.y);
            }
        }
        SolidFill::TempleStone => {
            let is_stone = |c: IVec2| {
                level.geo_type(c.x, c.y, layer) == Some(GeoType::Solid) && is_same_material(level, material, c.x, c.y, layer)
            };
            let (rng, mut drawer) = p.split();
            packer::pack_temple_stone(&origins, is_stone, rng, |piece, origin, rng| {
                let name = piece.tile_name();
                let Some(tile) = context.tile(name) else {
                    log::warn!("materials: tile '{name}' missing");
                    return;
                };
                let (hx, hy) = tile.head_offset();
                drawer.draw(&tile, origin.x + hx, origin.y + hy, rng);
            });
        }
        SolidFill::Nothing => {}
    }
}

/// Draw `name` on every cell, in random order.
fn scatter_tile(p: &mut Painter, name: &str, cells: Vec<IVec2>) {
    let Some(tile) = p.context.tile(name) else {
        log::warn!("materials: tile '{name}' missing");
        return;
    };
    let (rng, mut drawer) = p.split();
    packer::scatter(cells, rng, |pos, rng| {
        if drawer.view.contains(pos) {
            drawer.draw(&tile, pos.x, pos.y, rng);
        }
    });
}

// ── Pipes ─────────────────────────────────────────────────────────────────────

/// Atlas column for a four-bit neighbor code over (−1,0), (0,−1), (1,0), (0,1).
pub fn pipe_column(code: [bool; 4], material_fixes: bool) -> i32 {
    match code.map(u8::from) {
        [0, 1, 0, 1] => 2,
        [1, 0, 1, 0] => 4,
        [1, 1, 1, 1] => 6,
        [0, 1, 1, 1] => 8,
        [1, 1, 0, 1] => 10,
        [1, 1, 1, 0] => 12,
        [1, 0, 1, 1] => 14,
        [0, 0, 1, 1] => 16,
        [1, 0, 0, 1] => 18,
        [1, 1, 0, 0] => 20,
        [0, 1, 1, 0] => 22,
        [1, 0, 0, 0] => 24,
        [0, 0, 1, 0] => 26,
        [0, 1, 0, 0] => 28,
        [0, 0, 0, 1] => 30,
        _ if material_fixes => 40,
        _ => 0,
    }
}

const PIPE_ROWS: [i32; 4] = [2, 4, 6, 8];
const TRASH_TINTS: [Rgba<u8>; 3] = [Rgba([255, 0, 0, 255]), Rgba([0, 255, 0, 255]), Rgba([0, 0, 255, 255])];

fn paint_pipes(p: &mut Painter, material: &MaterialDefinition, cells: &[IVec2]) {
    let Some(texture) = p.context.texture(pipe_texture_name(&material.name)) else {
        log::warn!("materials: pipe sheet for '{}' missing", material.name);
        return;
    };
    let framework = p.context.texture(PIPE_FRAMEWORK);
    let decals = p.context.texture(TRASH_DECALS);
    let fixes = p.config.material_fixes;

    for &IVec2 { x, y } in cells {
        let Some(geo) = p.level.geo_type(x, y, p.layer) else { continue };
        let base = p.front_slot();

        let column = match geo {
            GeoType::Air => continue,
            GeoType::Solid => {
                let mut code = [false; 4];
                for (bit, (dx, dy)) in code.iter_mut().zip(CARDINALS) {
                    let (nx, ny) = (x + dx, y + dy);
                    let coin = p.rng.next(2) == 1;
                    *bit = if coin && p.level.in_bounds(nx, ny) {
                        p.level.geo_type(nx, ny, p.layer) == Some(GeoType::Solid)
                    } else {
                        true
                    };
                    if !*bit {
                        *bit = is_open(p.level, material, nx, ny, p.layer);
                    }
                }
                if material.name == "Small Pipes" {
                    if let Some(fw) = framework.as_deref() {
                        let src = Rect::new(0, 0, CELL_PX, CELL_PX);
                        p.layers.draw(Stack::Primary, base + 5, fw, src, Rect::cell(x, y), Blend::StripBackground);
                    }
                }
                pipe_column(code, fixes)
            }
            GeoType::SlopeNW => 32,
            GeoType::SlopeNE => 34,
            GeoType::SlopeES => 36,
            GeoType::SlopeSW => 38,
            GeoType::Platform if fixes => 42,
            GeoType::Glass if fixes => 44,
            _ => 0,
        };

        let dst = Rect::cell(x, y).expand(CELL_PX / 2);
        for start in [base + 2, base + 7] {
            let row = PIPE_ROWS[(p.rng.next(4) - 1) as usize];
            let src = Rect::new((column - 1) * CELL_PX - 9, (row - 1) * CELL_PX - 9, 40, 40);
            for slot in [start, start + 1] {
                p.layers.draw(Stack::Primary, slot, &texture, src, dst, Blend::StripBackground);
            }
        }

        if material.name == "Trash" && (geo != GeoType::Glass || !fixes) {
            for _ in 0..3 {
                let slot = base + p.rng.next(9) as usize;
                let variant = p.rng.next(48) - 1;
                let jx = p.rng.next(21);
                let jy = p.rng.next(21);
                let tint = TRASH_TINTS[(p.rng.next(3) - 1) as usize];
                if let Some(decals) = decals.as_deref() {
                    let src = Rect::new(variant * 50, 0, 50, 50);
                    let dst = Rect::new(x * CELL_PX + 1 + jx, y * CELL_PX + 1 + jy, 50, 50);
                    p.layers.draw(Stack::Primary, slot, decals, src, dst, Blend::Tint(tint));
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
