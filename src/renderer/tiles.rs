// =============================================================================
// TILES.RS — Drawing one placed tile into the depth slots
//
// Every tile texture is a sheet of variant columns. One variant is
// `(w + 2·buffer) × (h + 2·buffer)` cells wide; rows below it hold the
// slices that go into deeper slots. Row 0 starts at pixel y = 1.
//
// RNG use per type:
//   Box           one roll per footprint cell
//   VoxelStruct   one roll (none when rnd == -1)
//   Displace H/V  one roll for the split point
//   RockType      one roll, then re-rolls at slots 4, 8, 12
//   SandType      one roll per slot
// =============================================================================

use std::iter;

use glam::IVec2;
use image::RgbaImage;

use crate::geometry::{GeoType, Rect, CARDINALS, CELL_PX};
use crate::registry::{TileDefinition, TileType};
use crate::renderer::canvas::Blend;
use crate::renderer::compositor::{layer_base, Stack, SLOT_COUNT};
use crate::renderer::Painter;

// ── Slot helpers ──────────────────────────────────────────────────────────────

/// `(slot, sheet_row)` for every repetition of every repeat entry, starting
/// at `base` and stopping before slot 30.
pub fn repeat_slots(base: usize, repeat: &[i32]) -> impl Iterator<Item = (usize, i32)> + '_ {
    repeat
        .iter()
        .enumerate()
        .flat_map(|(row, &count)| iter::repeat_n(row as i32, count.max(0) as usize))
        .enumerate()
        .map(move |(d, row)| (base + d, row))
        .take_while(|(slot, _)| *slot < SLOT_COUNT)
}

/// Variant columns to roll from. A non-positive `rnd` means one column.
fn variants(tile: &TileDefinition) -> i32 {
    tile.rnd.max(1)
}

/// End (exclusive) of the slot run for rock and sand tiles.
fn stacked_end(base: usize, tile: &TileDefinition) -> usize {
    let extra = if tile.has_specs_layer(1) { 10 } else { 0 };
    (base + 9 + extra).min(SLOT_COUNT - 1)
}

/// Side stacks a tile also writes to, chosen by its colour tags.
fn side_stacks(tile: &TileDefinition) -> Vec<Stack> {
    let a = tile.has_tag("effectColorA");
    let b = tile.has_tag("effectColorB");
    let mut stacks = Vec::new();
    if tile.has_tag("colored") && !a && !b {
        stacks.push(Stack::DarkestCopy);
    }
    if a {
        stacks.push(Stack::GradientA);
    }
    if b {
        stacks.push(Stack::GradientB);
    }
    stacks
}

// ── Geometry of a placement ───────────────────────────────────────────────────

/// Pixel extents of one variant, buffer included.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Sheet {
    w: i32,
    h: i32,
}

impl Sheet {
    fn of(tile: &TileDefinition) -> Self {
        let bf = tile.buffer_tiles;
        Self { w: (tile.width() + 2 * bf) * CELL_PX, h: (tile.height() + 2 * bf) * CELL_PX }
    }
}

/// Destination rectangle of `tile` anchored at `(x, y)`.
pub fn destination(tile: &TileDefinition, x: i32, y: i32) -> Rect {
    let (hx, hy) = tile.head_offset();
    let start = IVec2::new(x - hx, y - hy);
    let sheet = Sheet::of(tile);
    let bf = tile.buffer_tiles;
    Rect::new((start.x - bf) * CELL_PX, (start.y - bf) * CELL_PX, sheet.w, sheet.h)
}

// ── draw_tile ─────────────────────────────────────────────────────────────────

/// Draw `tile` with its head at `(x, y)` on the painter's geometry layer.
///
/// A tile without a texture draws nothing.
pub fn draw_tile(p: &mut Painter, tile: &TileDefinition, x: i32, y: i32) {
    let Some(texture) = tile.texture.as_deref() else {
        log::debug!("tiles: '{}' has no texture; skipped", tile.name);
        return;
    };

    match tile.tile_type {
        TileType::Box => draw_box(p, tile, texture, x, y),
        TileType::VoxelStruct => draw_voxel(p, tile, texture, x, y),
        TileType::VoxelStructRandomDisplaceHorizontal => draw_displaced(p, tile, texture, x, y, false),
        TileType::VoxelStructRandomDisplaceVertical => draw_displaced(p, tile, texture, x, y, true),
        TileType::VoxelStructRockType => draw_rock(p, tile, texture, x, y),
        TileType::VoxelStructSandType => draw_sand(p, tile, texture, x, y),
    }
}

fn draw_box(p: &mut Painter, tile: &TileDefinition, texture: &RgbaImage, x: i32, y: i32) {
    let sheet = Sheet::of(tile);
    let dest = destination(tile, x, y);
    let src = Rect::new(0, tile.width() * tile.height() * CELL_PX, sheet.w, sheet.h);
    let front = p.front_slot();

    for _ in 0..tile.width() * tile.height() {
        let rnd = p.rng.next(variants(tile));
        let s = src.offset(sheet.w * (rnd - 1), 0);
        p.layers.draw(Stack::Primary, front, texture, s, dest, Blend::StripBackground);
    }
}

/// Variant column for a voxel tile.
fn voxel_variant(p: &mut Painter, tile: &TileDefinition, x: i32, y: i32) -> i32 {
    let mut rnd = if tile.rnd == -1 {
        // Count solid-ish cardinals until the first open one.
        let mut n = 1;
        for (dx, dy) in CARDINALS {
            let t = p.level.geo_type(x + dx, y + dy, 0).unwrap_or(GeoType::Solid);
            if matches!(t, GeoType::Air | GeoType::Platform) {
                break;
            }
            n += 1;
        }
        n
    } else {
        p.rng.next(variants(tile))
    };

    if tile.has_tag("ramp") {
        let here = p.level.geo_type(x, y, 0).unwrap_or(GeoType::Solid);
        rnd = if here == GeoType::SlopeNW { 1 } else { 2 };
    }
    rnd
}

fn draw_voxel(p: &mut Painter, tile: &TileDefinition, texture: &RgbaImage, x: i32, y: i32) {
    let sheet = Sheet::of(tile);
    let dest = destination(tile, x, y);
    let rnd = voxel_variant(p, tile, x, y);
    let src = Rect::new(sheet.w * (rnd - 1), 1, sheet.w, sheet.h);
    let front = p.front_slot();
    let sides = side_stacks(tile);

    p.layers.draw(Stack::Primary, front, texture, src, dest, Blend::StripBackground);

    for (slot, row) in repeat_slots(layer_base(p.layer), &tile.repeat) {
        let s = src.offset(0, sheet.h * row);
        p.layers.draw(Stack::Primary, slot, texture, s, dest, Blend::StripBackground);
        for &stack in &sides {
            p.layers.draw(stack, slot, texture, s, dest, Blend::Darkest);
        }
    }
}

fn draw_displaced(p: &mut Painter, tile: &TileDefinition, texture: &RgbaImage, x: i32, y: i32, vertical: bool) {
    let sheet = Sheet::of(tile);
    let dest = destination(tile, x, y);
    let front = p.front_slot();
    let sides = side_stacks(tile);

    // The part before the split goes to the far end of the destination.
    let halves = if vertical {
        let split = p.rng.next(sheet.h);
        [
            (Rect::new(0, 1, sheet.w, split), Rect::new(dest.x, dest.bottom() - split, dest.w, split)),
            (Rect::new(0, 1 + split, sheet.w, sheet.h - split), Rect::new(dest.x, dest.y, dest.w, dest.h - split)),
        ]
    } else {
        let split = p.rng.next(sheet.w);
        [
            (Rect::new(0, 1, split, sheet.h), Rect::new(dest.right() - split, dest.y, split, dest.h)),
            (Rect::new(split, 1, sheet.w - split, sheet.h), Rect::new(dest.x, dest.y, dest.w - split, dest.h)),
        ]
    };

    for (src, dst) in halves {
        p.layers.draw(Stack::Primary, front, texture, src, dst, Blend::StripBackground);
    }

    for (slot, row) in repeat_slots(layer_base(p.layer), &tile.repeat) {
        for (src, dst) in halves {
            let s = src.offset(0, sheet.h * row);
            p.layers.draw(Stack::Primary, slot, texture, s, dst, Blend::StripBackground);
            for &stack in &sides {
                p.layers.draw(stack, slot, texture, s.offset(sheet.w, 0), dst, Blend::Darkest);
            }
        }
    }
}

fn draw_rock(p: &mut Painter, tile: &TileDefinition, texture: &RgbaImage, x: i32, y: i32) {
    let sheet = Sheet::of(tile);
    let dest = destination(tile, x, y);
    let src = Rect::new(0, 1, sheet.w, sheet.h);
    let base = layer_base(p.layer);
    let sides = side_stacks(tile);

    let count = variants(tile);
    let mut rnd = p.rng.next(count);
    for slot in base..stacked_end(base, tile) {
        if matches!(slot, 4 | 8 | 12) {
            rnd = p.rng.next(count);
        }
        let s = src.offset(sheet.w * (rnd - 1), 0);
        p.layers.draw(Stack::Primary, slot, texture, s, dest, Blend::StripBackground);
        draw_sides(p, &sides, slot, texture, s.offset(sheet.w * count, 0), dest);
    }
}

fn draw_sand(p: &mut Painter, tile: &TileDefinition, texture: &RgbaImage, x: i32, y: i32) {
    let sheet = Sheet::of(tile);
    let dest = destination(tile, x, y);
    let src = Rect::new(0, 1, sheet.w, sheet.h);
    let base = layer_base(p.layer) + 1;
    let sides = side_stacks(tile);

    let count = variants(tile);
    for slot in base..stacked_end(base, tile) {
        let rnd = p.rng.next(count);
        let s = src.offset(sheet.w * (rnd - 1), 0);
        p.layers.draw(Stack::Primary, slot, texture, s, dest, Blend::StripBackground);
        draw_sides(p, &sides, slot, texture, s.offset(sheet.w * count, 0), dest);
    }
}

/// Colour copy for rock and sand: stripped into the DC stack, darkest into
/// the gradients.
fn draw_sides(p: &mut Painter, sides: &[Stack], slot: usize, texture: &RgbaImage, src: Rect, dest: Rect) {
    for &stack in sides {
        let blend = if stack == Stack::DarkestCopy { Blend::StripBackground } else { Blend::Darkest };
        p.layers.draw(stack, slot, texture, src, dest, blend);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
