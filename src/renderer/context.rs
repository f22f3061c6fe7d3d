use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;

use crate::config::RenderConfig;
use crate::error::EngineError;
use crate::registry::{MaterialDefinition, MaterialRenderType, Registry, TileDefinition, TileType};
use crate::renderer::packer::{self, PoolKind};

// ── Pool membership ───────────────────────────────────────────────────────────

const RANDOM_MACHINES: &[&str] = &[
    "Metal Holes", "Dyson Fan", "Big Fan", "machine box A", "machine box B", "machine box C_E",
    "machine box C_W", "machine box C_Sym", "Tank Holder", "Machine Box D", "Machine Box E L",
    "Machine Box E R", "Pillar Machine", "Mud Elevator", "Elevator Track", "Huge Fan", "Sky Box",
    "Pole Holder", "valve", "Hub Machine", "Monster Fan", "Compressor L", "Compressor R",
    "Compressor Segment", "Giant Screw", "Pipe Box R", "Pipe Box L", "Door Holder R",
    "Door Holder L", "Piston Top", "Piston Segment Empty", "Piston Head", "Piston Segment Filled",
    "Piston Bottom", "Piston Segment Horizontal A", "Piston Segment Horizontal B",
    "Vertical Conveyor Belt B", "Ventilation Box Empty", "Drill Head", "Drill A", "Drill B",
    "Conveyor Belt Segment", "Conveyor Belt Wheel", "Conveyor Belt Covered", "Conveyor Belt L",
    "Conveyor Belt R", "Drill Shell A", "Drill Shell B", "Drill Shell Top", "Drill Shell Bottom",
    "Big Drill", "Drill Rim", "Small Machine A", "Small Machine B", "Small Machine C",
    "Small Machine D", "Small Machine E", "Small Machine F", "Small Machine G",
];

const RANDOM_METAL: &[&str] = &[
    "Small Metal",
    "Metal Floor",
    "Square Metal",
    "Big Metal",
    "Big Metal Marked",
    "C Beam Horizontal AA",
    "C Beam Horizontal AB",
    "C Beam Vertical AA",
    "C Beam Vertical BA",
    "Plate 2",
];

const CHAOTIC_STONE_2_TAGS: &[&str] = &["chaoticStone2", "chaoticStone2 : rare", "chaoticStone2 : very rare"];

const CHAOTIC_STONE_2_NAMES: &[&str] =
    &["Small Stone", "Square Stone", "Tall Stone", "Wide Stone", "Big Stone", "Big Stone Marked"];

/// Largest footprint the machine and metals pools accept, per axis.
const MAX_POOL_EXTENT: i32 = 8;

fn pool_accepts(kind: PoolKind, tile: &TileDefinition) -> bool {
    let fits = tile.width() <= MAX_POOL_EXTENT && tile.height() <= MAX_POOL_EXTENT;
    match kind {
        PoolKind::RandomMachines => fits && RANDOM_MACHINES.contains(&tile.name.as_str()),
        PoolKind::RandomMetal => RANDOM_METAL.contains(&tile.name.as_str()),
        PoolKind::RandomMetals => {
            fits && RANDOM_METAL.contains(&tile.name.as_str()) && !tile.has_specs_layer(1)
        }
        PoolKind::ChaoticStone2 => {
            CHAOTIC_STONE_2_TAGS.iter().any(|t| tile.has_tag(t))
                || CHAOTIC_STONE_2_NAMES.contains(&tile.name.as_str())
        }
    }
}

// ── Pipe textures ─────────────────────────────────────────────────────────────

/// Atlas a pipe-family material samples.
pub fn pipe_texture_name(material: &str) -> &'static str {
    match material {
        "Small Pipes" => "pipeTiles",
        "Trash" => "trashTiles",
        "LargeTrash" => "largeTrashTiles",
        "Dirt" => "dirtTiles",
        _ => "sandyDirtTiles",
    }
}

pub const TRASH_DECALS: &str = "assortedTrash";
pub const PIPE_FRAMEWORK: &str = "framework";

// ── RenderContext ─────────────────────────────────────────────────────────────

/// Everything the painters read but never change, built once per registry.
#[derive(Clone, Debug)]
pub struct RenderContext {
    registry: Registry,
    pools: HashMap<PoolKind, Vec<Arc<TileDefinition>>>,
    sand_pool: Vec<Arc<TileDefinition>>,
    standard: Option<Arc<MaterialDefinition>>,
    /// Synthetic platform tiles keyed by texture name.
    floors: HashMap<String, Arc<TileDefinition>>,
}

impl RenderContext {
    pub fn from_registry(registry: &Registry) -> Self {
        let kinds = [PoolKind::RandomMachines, PoolKind::RandomMetal, PoolKind::RandomMetals, PoolKind::ChaoticStone2];
        let pools: HashMap<PoolKind, Vec<Arc<TileDefinition>>> = kinds
            .into_iter()
            .map(|kind| {
                let members = registry.tiles.iter().filter(|t| pool_accepts(kind, t)).cloned().collect();
                (kind, members)
            })
            .collect();

        let sand_pool: Vec<Arc<TileDefinition>> = registry
            .tiles
            .iter()
            .filter(|t| t.size == (1, 1) && t.tile_type == TileType::VoxelStructSandType)
            .cloned()
            .collect();

        let floors = registry
            .textures
            .iter()
            .filter_map(|(name, texture)| floor_tile(name, texture).map(|t| (name.to_string(), Arc::new(t))))
            .collect::<HashMap<_, _>>();

        for (kind, members) in &pools {
            log::debug!("context: pool {kind:?} has {} tiles", members.len());
        }
        log::debug!("context: {} sand tiles, {} floor tiles", sand_pool.len(), floors.len());

        Self {
            standard: registry.materials.get("Standard"),
            registry: registry.clone(),
            pools,
            sand_pool,
            floors,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn tile(&self, name: &str) -> Option<Arc<TileDefinition>> {
        self.registry.tiles.get(name)
    }

    pub fn texture(&self, name: &str) -> Option<Arc<RgbaImage>> {
        self.registry.textures.get(name)
    }

    pub fn pool(&self, kind: PoolKind) -> &[Arc<TileDefinition>] {
        self.pools.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn sand_pool(&self) -> &[Arc<TileDefinition>] {
        &self.sand_pool
    }

    /// Fallback unified material for non-solid cells of tile materials.
    pub fn standard(&self) -> Option<&Arc<MaterialDefinition>> {
        self.standard.as_ref()
    }

    // ── Unified sheets ───────────────────────────────────────────────────

    /// Name of the tile-set sheet `material` is drawn from.
    pub fn tile_set_name(material: &MaterialDefinition, material_fixes: bool) -> String {
        match material.name.as_str() {
            "Scaffolding" if material_fixes => "ScaffoldingDR".to_string(),
            "Invisible" => "SuperStructure".to_string(),
            name => name.to_string(),
        }
    }

    /// `tileSet{name}` sheet, or the material's own texture.
    pub fn tile_set(&self, material: &MaterialDefinition, material_fixes: bool) -> Option<Arc<RgbaImage>> {
        let name = Self::tile_set_name(material, material_fixes);
        self.texture(&format!("tileSet{name}")).or_else(|| material.texture.clone())
    }

    /// Floor tile drawn on Platform cells of a unified material.
    pub fn platform_tile(&self, material: &MaterialDefinition, material_fixes: bool) -> Option<Arc<TileDefinition>> {
        let key = match material.name.as_str() {
            "Invisible" => return None,
            "Stained Glass" => "SGFL".to_string(),
            "Sand Block" | "Scaffolding" | "Tiny Signs" if !material_fixes => "tileSetBigMetalFloor".to_string(),
            _ => format!("tileSet{}Floor", Self::tile_set_name(material, material_fixes)),
        };
        self.floors.get(&key).cloned()
    }

    // ── Validation ───────────────────────────────────────────────────────

    /// Fail when a tile or texture `material` references by name is missing.
    pub fn validate(&self, material: &MaterialDefinition, config: &RenderConfig) -> Result<(), EngineError> {
        match material.render_type {
            MaterialRenderType::Tiles => {
                let Some(recipe) = packer::recipe_for(&material.name) else {
                    return Ok(());
                };
                for name in recipe.required_tiles(config.material_fixes) {
                    let tile = self.registry.tile(name)?;
                    if tile.texture.is_none() {
                        return Err(EngineError::MissingTexture(name.to_string()));
                    }
                }
                Ok(())
            }
            MaterialRenderType::Pipe => {
                self.registry.textures.require(pipe_texture_name(&material.name))?;
                match material.name.as_str() {
                    "Trash" => self.registry.textures.require(TRASH_DECALS).map(drop),
                    "Small Pipes" => self.registry.textures.require(PIPE_FRAMEWORK).map(drop),
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

/// Synthetic 1×1 floor tile for `SGFL` and every `tileSet…Floor` sheet.
fn floor_tile(name: &str, texture: &Arc<RgbaImage>) -> Option<TileDefinition> {
    let tile = if name == "SGFL" {
        TileDefinition::new(name, (1, 1), TileType::VoxelStruct).with_repeat(vec![10])
    } else if name.starts_with("tileSet") && name.ends_with("Floor") {
        TileDefinition::new(name, (1, 1), TileType::VoxelStruct)
            .with_buffer(1)
            .with_repeat(vec![6, 1, 1, 1, 1])
    } else {
        return None;
    };
    Some(tile.with_texture(Arc::clone(texture)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
