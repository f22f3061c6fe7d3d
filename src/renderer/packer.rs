// =============================================================================
// PACKER.RS — Greedy footprint packing for tile-pool materials
//
// Materials such as "Random Machines" are not painted cell by cell: the
// renderer fills their area with whole multi-cell tiles picked at random from
// a pool. The packer decides where each tile goes:
//
// 1. Origins are visited in random-priority order.
// 2. At each unconsumed origin, the pool is shuffled and the first tile whose
//    footprint fits is placed.
// 3. A tile fits when every footprint cell is a candidate of this material
//    and every constrained cell (spec != -1) is unclaimed and has exactly the
//    geometry the spec asks for.
//
// An origin with no fitting tile is left empty. That is normal.
//
// The packer never draws. Placement callbacks run at the moment a tile is
// chosen so the caller can draw it with the same RNG before the next shuffle.
// =============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use glam::IVec2;

use crate::geometry::GeoType;
use crate::registry::TileDefinition;
use crate::rng::DeterministicRng;

// ── Placement ─────────────────────────────────────────────────────────────────

/// A tile chosen for a spot.
#[derive(Clone, Debug)]
pub struct Placement {
    pub tile: Arc<TileDefinition>,
    /// Top-left footprint cell.
    pub origin: IVec2,
    /// Head cell: `origin + head_offset`.
    pub anchor: IVec2,
}

impl Placement {
    pub fn new(tile: Arc<TileDefinition>, origin: IVec2) -> Self {
        let (hx, hy) = tile.head_offset();
        let anchor = origin + IVec2::new(hx, hy);
        Self { tile, origin, anchor }
    }

    /// Footprint cells with a spec other than `-1`.
    pub fn claimed_cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        let (w, h) = self.tile.size;
        (0..w).flat_map(move |sx| (0..h).map(move |sy| (sx, sy))).filter_map(move |(sx, sy)| {
            (self.tile.spec(sx, sy) != -1).then_some(self.origin + IVec2::new(sx, sy))
        })
    }
}

/// Outcome of one [`pack_footprints`] run.
#[derive(Clone, Debug, Default)]
pub struct PackReport {
    pub placements: Vec<Placement>,
    pub consumed: HashSet<IVec2>,
    /// Origins where no pool tile fit.
    pub unfilled: Vec<IVec2>,
}

// ── Priorities ────────────────────────────────────────────────────────────────

/// A cell with the random priority it was queued with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Prioritized {
    pub rnd: i32,
    pub pos: IVec2,
}

/// Stable ascending sort by priority.
pub fn sort_by_priority(cells: &mut [Prioritized]) {
    cells.sort_by_key(|c| c.rnd);
}

/// Shuffle `pool` by drawing one `next(1000)` per tile, in pool order, and
/// sorting ascending (stable on ties).
pub fn shuffle_pool(pool: &[Arc<TileDefinition>], rng: &mut DeterministicRng) -> Vec<Arc<TileDefinition>> {
    let mut keyed: Vec<(i32, &Arc<TileDefinition>)> = pool.iter().map(|t| (rng.next(1000), t)).collect();
    keyed.sort_by_key(|(rnd, _)| *rnd);
    keyed.into_iter().map(|(_, t)| Arc::clone(t)).collect()
}

// ── Legality ──────────────────────────────────────────────────────────────────

/// Whether `tile` fits with its top-left corner at `origin`.
///
/// `geo` reports the live geometry of a cell, `None` out of bounds.
pub fn is_legal<G>(
    tile: &TileDefinition,
    origin: IVec2,
    occupied: &HashSet<IVec2>,
    consumed: &HashSet<IVec2>,
    geo: &G,
) -> bool
where
    G: Fn(i32, i32) -> Option<GeoType>,
{
    let (w, h) = tile.size;
    for sx in 0..w {
        for sy in 0..h {
            let cell = origin + IVec2::new(sx, sy);
            if !occupied.contains(&cell) {
                return false;
            }
            let spec = tile.spec(sx, sy);
            if spec == -1 {
                continue;
            }
            if consumed.contains(&cell) {
                return false;
            }
            match geo(cell.x, cell.y) {
                Some(t) if t.code() == spec => {}
                _ => return false,
            }
        }
    }
    true
}

// ── Packing ───────────────────────────────────────────────────────────────────

/// Fill `origins` (already in priority order) with tiles from `pool`.
///
/// RNG use, in order: for every origin not yet consumed, one `next(1000)` per
/// pool tile; then whatever `place` draws for the chosen tile.
pub fn pack_footprints<G, F>(
    origins: &[IVec2],
    pool: &[Arc<TileDefinition>],
    geo: G,
    rng: &mut DeterministicRng,
    mut place: F,
) -> PackReport
where
    G: Fn(i32, i32) -> Option<GeoType>,
    F: FnMut(&Placement, &mut DeterministicRng),
{
    let occupied: HashSet<IVec2> = origins.iter().copied().collect();
    let mut report = PackReport::default();

    for &origin in origins {
        if report.consumed.contains(&origin) {
            continue;
        }

        let shuffled = shuffle_pool(pool, rng);
        let chosen = shuffled
            .into_iter()
            .find(|tile| is_legal(tile, origin, &occupied, &report.consumed, &geo));

        match chosen {
            Some(tile) => {
                let placement = Placement::new(tile, origin);
                place(&placement, rng);
                report.consumed.extend(placement.claimed_cells());
                report.placements.push(placement);
            }
            None => report.unfilled.push(origin),
        }
    }

    log::debug!(
        "packer: {} origins, {} placed, {} unfilled",
        origins.len(),
        report.placements.len(),
        report.unfilled.len()
    );
    report
}

/// Find 2×2 blocks for the merged big-stone pass.
///
/// Walks `order`; a live cell whose right, lower and lower-right neighbors
/// are live candidates too becomes the top-left of a block and all four cells
/// die. Returns the block corners and the cells left over, both in walk order.
pub fn merge_squares(order: &[IVec2]) -> (Vec<IVec2>, Vec<IVec2>) {
    let candidates: HashSet<IVec2> = order.iter().copied().collect();
    let mut deleted: HashSet<IVec2> = HashSet::new();
    let mut squares = Vec::new();

    const PARTNERS: [IVec2; 3] = [IVec2::new(1, 0), IVec2::new(0, 1), IVec2::new(1, 1)];

    for &cell in order {
        if deleted.contains(&cell) {
            continue;
        }
        let fits = PARTNERS.iter().all(|&d| {
            let n = cell + d;
            candidates.contains(&n) && !deleted.contains(&n)
        });
        if fits {
            deleted.insert(cell);
            for d in PARTNERS {
                deleted.insert(cell + d);
            }
            squares.push(cell);
        }
    }

    let rest = order.iter().copied().filter(|c| !deleted.contains(c)).collect();
    (squares, rest)
}

/// Visit `cells` in random order: repeatedly pick `next(len) - 1` and remove
/// that entry.
pub fn scatter<F>(mut cells: Vec<IVec2>, rng: &mut DeterministicRng, mut visit: F)
where
    F: FnMut(IVec2, &mut DeterministicRng),
{
    while let Some(i) = rng.index(cells.len()) {
        let cell = cells.remove(i);
        visit(cell, rng);
    }
}

// ── Temple stone ─────────────────────────────────────────────────────────────

/// Pieces the temple stone fill is built from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TemplePiece {
    /// 4×3 block with its four corners cut off, placed on a fixed lattice.
    Big,
    /// 3×2 block.
    Medium,
    /// 2×1 block.
    Wide,
    Small,
    /// Slope filling the cut corner between two big stones.
    Corner(GeoType),
}

impl TemplePiece {
    pub fn tile_name(self) -> &'static str {
        match self {
            TemplePiece::Big => "Big Temple Stone No Slopes",
            TemplePiece::Medium => "Medium Temple Stone",
            TemplePiece::Wide => "Wide Temple Stone",
            TemplePiece::Small => "Small Temple Stone",
            TemplePiece::Corner(geo) => TEMPLE_STONE.tile_for(geo).unwrap_or(TEMPLE_STONE.slope_ne),
        }
    }
}

/// Cells a big stone centred on `(0, 0)` covers. Top-left is `(-1, -1)`.
const BIG_TEMPLE: [IVec2; 8] = [
    IVec2::new(-1, 0),
    IVec2::new(0, -1),
    IVec2::new(0, 0),
    IVec2::new(0, 1),
    IVec2::new(1, -1),
    IVec2::new(1, 0),
    IVec2::new(1, 1),
    IVec2::new(2, 0),
];

/// Cells a medium stone picked at `(0, 0)` covers. Top-left is `(-1, 0)`.
const MEDIUM_TEMPLE: [IVec2; 6] = [
    IVec2::new(-1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 0),
    IVec2::new(0, 1),
    IVec2::new(1, 0),
    IVec2::new(1, 1),
];

/// Corner slots around a big stone, with the slope drawn into each.
const TEMPLE_CORNERS: [(IVec2, GeoType); 4] = [
    (IVec2::new(-1, -1), GeoType::SlopeES),
    (IVec2::new(2, -1), GeoType::SlopeSW),
    (IVec2::new(2, 1), GeoType::SlopeNW),
    (IVec2::new(-1, 1), GeoType::SlopeNE),
];

/// Cells where a big temple stone may be centred.
pub fn on_temple_lattice(cell: IVec2) -> bool {
    (cell.x.rem_euclid(6) == 0 && cell.y.rem_euclid(4) == 0)
        || (cell.x.rem_euclid(6) == 3 && cell.y.rem_euclid(4) == 2)
}

/// Plan the temple stone fill over `order` (Solid cells in queue order).
///
/// `is_stone` tells whether a cell is Solid temple stone of the same layer.
/// `place` gets each piece with the top-left cell of its footprint, at the
/// moment it is chosen.
///
/// 1. Every lattice cell whose whole big footprint is stone gets a big stone.
///    Its four cut corners are remembered per direction.
/// 2. A cell that is both a top-left and a bottom-right corner (or both a
///    top-right and a bottom-left one) sits between two big stones and is
///    dropped.
/// 3. The remaining cells are picked at random (`next(len) - 1`). A corner
///    cell gets its slope. Otherwise a medium stone is tried, then a wide
///    stone reaching left, then right, then a small stone.
pub fn pack_temple_stone<S, F>(order: &[IVec2], is_stone: S, rng: &mut DeterministicRng, mut place: F)
where
    S: Fn(IVec2) -> bool,
    F: FnMut(TemplePiece, IVec2, &mut DeterministicRng),
{
    let mut live: Vec<IVec2> = order.to_vec();
    let mut corners: [Vec<IVec2>; 4] = Default::default();

    for &cell in order {
        if !on_temple_lattice(cell) || !BIG_TEMPLE.iter().all(|&d| is_stone(cell + d)) {
            continue;
        }
        place(TemplePiece::Big, cell + IVec2::new(-1, -1), rng);
        for (slot, (d, _)) in corners.iter_mut().zip(TEMPLE_CORNERS) {
            slot.push(cell + d);
        }
        live.retain(|c| !BIG_TEMPLE.iter().any(|&d| cell + d == *c));
    }

    live.retain(|c| !(corners[0].contains(c) && corners[2].contains(c)));
    live.retain(|c| !(corners[1].contains(c) && corners[3].contains(c)));

    let is_corner = |c: IVec2| corners.iter().any(|slot| slot.contains(&c));

    while let Some(i) = rng.index(live.len()) {
        let cell = live[i];

        if let Some((_, geo)) = corners.iter().zip(TEMPLE_CORNERS).find(|(slot, _)| slot.contains(&cell)).map(|(_, c)| c)
        {
            place(TemplePiece::Corner(geo), cell, rng);
            live.retain(|c| *c != cell);
            continue;
        }

        let medium_fits = MEDIUM_TEMPLE.iter().all(|&d| {
            let c = cell + d;
            is_stone(c) && !is_corner(c) && live.contains(&c)
        });
        if medium_fits {
            place(TemplePiece::Medium, cell + IVec2::new(-1, 0), rng);
            live.retain(|c| !MEDIUM_TEMPLE.iter().any(|&d| cell + d == *c));
            continue;
        }

        let pairs = |c: IVec2| is_stone(c) && live.contains(&c) && !is_corner(c);
        let left = cell - IVec2::X;
        let right = cell + IVec2::X;
        if pairs(left) {
            place(TemplePiece::Wide, left, rng);
            live.retain(|c| *c != left);
        } else if pairs(right) {
            place(TemplePiece::Wide, cell, rng);
            live.retain(|c| *c != right);
        } else {
            place(TemplePiece::Small, cell, rng);
        }
        live.retain(|c| *c != cell);
    }
}

// ── Recipes ───────────────────────────────────────────────────────────────────

/// Fixed single-cell substitutes drawn over slopes and platforms.
#[derive(Debug)]
pub struct EdgeFamily {
    pub slope_ne: &'static str,
    pub slope_nw: &'static str,
    pub slope_sw: &'static str,
    pub slope_se: &'static str,
    /// Platform substitute. Families without one leave platforms bare.
    pub floor: Option<&'static str>,
}

impl EdgeFamily {
    /// Substitute tile for `geo`. `None` for shapes the family does not cover.
    pub fn tile_for(&self, geo: GeoType) -> Option<&'static str> {
        match geo {
            GeoType::SlopeNE => Some(self.slope_ne),
            GeoType::SlopeNW => Some(self.slope_nw),
            GeoType::SlopeSW => Some(self.slope_sw),
            GeoType::SlopeES => Some(self.slope_se),
            GeoType::Platform => self.floor,
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        [self.slope_ne, self.slope_nw, self.slope_sw, self.slope_se].into_iter().chain(self.floor)
    }
}

pub const SMALL_STONE: EdgeFamily = EdgeFamily {
    slope_ne: "Small Stone Slope NE",
    slope_nw: "Small Stone Slope NW",
    slope_sw: "Small Stone Slope SW",
    slope_se: "Small Stone Slope SE",
    floor: Some("Small Stone Floor"),
};

pub const SMALL_MACHINE: EdgeFamily = EdgeFamily {
    slope_ne: "Small Machine Slope NE",
    slope_nw: "Small Machine Slope NW",
    slope_sw: "Small Machine Slope SW",
    slope_se: "Small Machine Slope SE",
    floor: Some("Small Machine Floor"),
};

pub const SMALL_METAL: EdgeFamily = EdgeFamily {
    slope_ne: "Small Metal Slope NE",
    slope_nw: "Small Metal Slope NW",
    slope_sw: "Small Metal Slope SW",
    slope_se: "Small Metal Slope SE",
    floor: Some("Small Metal Floor"),
};

pub const MOSAIC: EdgeFamily = EdgeFamily {
    slope_ne: "4Mosaic Slope NE",
    slope_nw: "4Mosaic Stone Slope NW",
    slope_sw: "4Mosaic Stone Slope SW",
    slope_se: "4Mosaic Stone Slope SE",
    floor: Some("4Mosaic Stone Floor"),
};

pub const BRICK: EdgeFamily = EdgeFamily {
    slope_ne: "3DBrick Slope NE",
    slope_nw: "3DBrick Slope NW",
    slope_sw: "3DBrick Slope SW",
    slope_se: "3DBrick Slope SE",
    floor: Some("3DBrick Floor"),
};

pub const TEMPLE_STONE: EdgeFamily = EdgeFamily {
    slope_ne: "Temple Stone Slope NE",
    slope_nw: "Temple Stone Slope NW",
    slope_sw: "Temple Stone Slope SW",
    slope_se: "Temple Stone Slope SE",
    floor: None,
};

/// Pools built once from the registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    RandomMachines,
    RandomMetal,
    RandomMetals,
    ChaoticStone2,
}

/// What happens to the Solid cells left after the edge pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolidFill {
    /// 2×2 merge into `big`, the rest scattered as `small`.
    MergeThenScatter { big: &'static str, small: &'static str },
    /// Every cell drawn as `tile`, in random order.
    Scatter { tile: &'static str },
    /// Footprint packing from a pool.
    Pool(PoolKind),
    /// Every cell drawn as `tile`, walking the queue backwards.
    EachCell { tile: &'static str },
    /// One random sand-pool tile per cell, walking the queue backwards.
    SandPool,
    /// Big stones on a lattice, then medium, wide and small ones at random.
    TempleStone,
    /// Solid cells draw nothing.
    Nothing,
}

/// How one tile-type material is painted.
#[derive(Debug)]
pub struct TileRecipe {
    pub material: &'static str,
    pub edges: Option<&'static EdgeFamily>,
    pub solids: SolidFill,
}

impl TileRecipe {
    /// Edge family in effect. Temple stone always draws its slopes; every
    /// other family needs material fixes on.
    pub fn edge_family(&self, material_fixes: bool) -> Option<&'static EdgeFamily> {
        self.edges.filter(|_| material_fixes || self.solids == SolidFill::TempleStone)
    }

    /// Tiles this recipe references by name (must exist in the registry).
    pub fn required_tiles(&self, material_fixes: bool) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        // Edge cells only reach the queue when the family is in effect.
        if let Some(edges) = self.edge_family(material_fixes) {
            names.extend(edges.names());
        }
        match self.solids {
            SolidFill::MergeThenScatter { big, small } => names.extend([big, small]),
            SolidFill::Scatter { tile } | SolidFill::EachCell { tile } => names.push(tile),
            SolidFill::TempleStone => names.extend(
                [TemplePiece::Big, TemplePiece::Medium, TemplePiece::Wide, TemplePiece::Small].map(TemplePiece::tile_name),
            ),
            SolidFill::Pool(_) | SolidFill::SandPool | SolidFill::Nothing => {}
        }
        names
    }
}

pub static RECIPES: &[TileRecipe] = &[
    TileRecipe {
        material: "Chaotic Stone",
        edges: Some(&SMALL_STONE),
        solids: SolidFill::MergeThenScatter { big: "Square Stone", small: "Small Stone" },
    },
    TileRecipe {
        material: "Tiled Stone",
        edges: Some(&SMALL_STONE),
        solids: SolidFill::Scatter { tile: "Small Stone" },
    },
    TileRecipe {
        material: "Chaotic Stone 2",
        edges: Some(&SMALL_STONE),
        solids: SolidFill::Pool(PoolKind::ChaoticStone2),
    },
    TileRecipe {
        material: "Random Machines",
        edges: Some(&SMALL_MACHINE),
        solids: SolidFill::Pool(PoolKind::RandomMachines),
    },
    TileRecipe {
        material: "Random Machines 2",
        edges: Some(&SMALL_MACHINE),
        solids: SolidFill::Pool(PoolKind::RandomMachines),
    },
    TileRecipe {
        material: "Small Machines",
        edges: Some(&SMALL_MACHINE),
        solids: SolidFill::Pool(PoolKind::RandomMachines),
    },
    TileRecipe {
        material: "Random Metal",
        edges: Some(&SMALL_METAL),
        solids: SolidFill::Pool(PoolKind::RandomMetal),
    },
    TileRecipe {
        material: "Random Metals",
        edges: Some(&SMALL_METAL),
        solids: SolidFill::Pool(PoolKind::RandomMetals),
    },
    TileRecipe { material: "4Mosaic", edges: Some(&MOSAIC), solids: SolidFill::Nothing },
    TileRecipe { material: "Temple Stone", edges: Some(&TEMPLE_STONE), solids: SolidFill::TempleStone },
    TileRecipe {
        material: "3DBricks",
        edges: Some(&BRICK),
        solids: SolidFill::EachCell { tile: "3DBrick Square" },
    },
    TileRecipe { material: "Dune Sand", edges: None, solids: SolidFill::SandPool },
];

pub fn recipe_for(material: &str) -> Option<&'static TileRecipe> {
    RECIPES.iter().find(|r| r.material == material)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
