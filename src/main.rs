//! Preview renderer: builds a small demo level, renders all three geometry
//! layers and writes the composed canvas to a PNG.
//!
//! ```text
//! strata [output.png] [config.json] [texture-folder]
//! ```
//!
//! `RUST_LOG=debug` shows what every pass classified and drew.

use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec2;
use image::{Rgba, RgbaImage};

use strata::geometry::{GeoCell, GeoFeatures, GeoType};
use strata::level::TileCell;
use strata::registry::{MaterialDefinition, MaterialRenderType, TextureLibrary, TileDefinition, TileType};
use strata::{Engine, EngineError, LevelLoader, LevelState, Registry, RenderConfig};

// ── Demo assets ───────────────────────────────────────────────────────────────

const WIDTH: usize = 48;
const HEIGHT: usize = 30;

/// Sheet in the unified layout: 10 px corner grid on the left, the same
/// pieces darkened 120 px to the right.
fn unified_sheet(base: [u8; 3]) -> RgbaImage {
    RgbaImage::from_fn(240, 200, |x, y| {
        let shade = ((x % 120) / 10 + y / 10) as u8 * 4;
        let dim = if x >= 120 { 2 } else { 1 };
        let [r, g, b] = base.map(|c| c.saturating_sub(shade) / dim);
        Rgba([r, g, b, 255])
    })
}

/// Two 2×2 variants, each with one repeat row below.
fn crate_sheet() -> RgbaImage {
    RgbaImage::from_fn(80, 81, |x, y| {
        let edge = x % 40 < 2 || x % 40 > 37 || (y + 39) % 40 < 2;
        let wood = if x < 40 { [150, 100, 50] } else { [120, 80, 40] };
        let [r, g, b] = if edge { [60, 40, 20] } else { wood };
        Rgba([r, g, b, 255])
    })
}

fn demo_registry(textures: TextureLibrary) -> Registry {
    let mut registry = Registry { textures, ..Registry::default() };

    let concrete = MaterialDefinition::new("Concrete", Rgba([150, 150, 150, 255]), MaterialRenderType::Unified)
        .with_texture(Arc::new(unified_sheet([170, 170, 165])));
    let bricks = MaterialDefinition::new("Bricks", Rgba([160, 70, 60, 255]), MaterialRenderType::Unified)
        .with_texture(Arc::new(unified_sheet([180, 90, 70])));
    registry.materials.add_category("Materials", Rgba([200, 200, 200, 255]), vec![concrete, bricks]);

    let crate_tile = TileDefinition::new("Crate", (2, 2), TileType::VoxelStruct)
        .with_rnd(2)
        .with_repeat(vec![3, 3])
        .with_texture(Arc::new(crate_sheet()));
    registry.tiles.add_category("Misc", Rgba([150, 100, 50, 255]), vec![crate_tile]);

    registry
}

fn demo_level(registry: &Registry) -> Result<LevelState, EngineError> {
    let concrete = registry.material("Concrete")?;
    let bricks = registry.material("Bricks")?;
    let crate_tile = registry.tile("Crate")?;

    let mut level = LevelState::new(WIDTH, HEIGHT, concrete).with_seed(1234);

    let (w, h) = (WIDTH as i32, HEIGHT as i32);
    for layer in 0..3 {
        for x in 0..w {
            for y in h - 4 - layer as i32..h {
                level.set_geo(x, y, layer, GeoCell::new(GeoType::Solid));
            }
        }
    }

    // Brick wall on the front layer with a slope leading up to it.
    for y in h - 12..h - 4 {
        for x in 20..26 {
            level.set_geo(x, y, 0, GeoCell::new(GeoType::Solid));
            level.set_tile(x, y, 0, TileCell::Material(Arc::clone(&bricks)));
        }
    }
    level.set_geo(19, h - 5, 0, GeoCell::new(GeoType::SlopeNW));

    for x in 30..38 {
        level.set_geo(x, h - 10, 0, GeoCell::new(GeoType::Platform));
    }
    for y in 4..h - 4 {
        level.set_geo(10, y, 1, GeoCell::AIR.with_feature(GeoFeatures::VERTICAL_POLE));
    }

    level.place_tile(crate_tile, 34, h - 6, 0);
    Ok(level)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn run() -> Result<(), EngineError> {
    let mut args = std::env::args().skip(1);
    let output = PathBuf::from(args.next().unwrap_or_else(|| "strata-preview.png".to_string()));
    let config = match args.next() {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    let textures = match args.next() {
        Some(folder) => TextureLibrary::load_folder(folder)?,
        None => TextureLibrary::new(),
    };

    let registry = demo_registry(textures);
    let mut engine = Engine::new(config, &registry);
    engine.initialize();

    let job_registry = registry.clone();
    let loader = LevelLoader::spawn(move || demo_level(&job_registry));
    engine.load(loader.wait()?)?;

    let layers = engine.render_all();
    log::info!("rendered {layers} geometry layers");

    if let Some(canvas) = engine.compose(Vec2::new(1.0, -1.0)) {
        canvas.image().save(&output)?;
        log::info!("wrote {}", output.display());
    }
    engine.dispose();
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("strata: {e}");
        std::process::exit(1);
    }
}
