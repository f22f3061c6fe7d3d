use std::sync::Arc;

use glam::Vec2;
use image::{Rgba, RgbaImage};

use strata::geometry::{GeoCell, GeoFeatures, GeoType};
use strata::level::{LevelLoader, LevelState, TileCell};
use strata::registry::{MaterialDefinition, MaterialRenderType, Registry, TileDefinition, TileType};
use strata::renderer::canvas::POLE_COLOR;
use strata::renderer::Stack;
use strata::{Engine, EngineError, RenderConfig};

/// Unified sheet whose pixels name their own 10 px grid cell: red is the
/// column, green the row, both times ten.
fn labelled_sheet() -> RgbaImage {
    RgbaImage::from_fn(240, 200, |x, y| {
        let blue = if x < 120 { 100 } else { 50 };
        Rgba([((x % 120) / 10 * 10) as u8, (y / 10 * 10) as u8, blue, 255])
    })
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.textures.insert("tileSetSlate", labelled_sheet());
    registry
}

fn slate() -> Arc<MaterialDefinition> {
    Arc::new(MaterialDefinition::new("Slate", Rgba([80, 80, 90, 255]), MaterialRenderType::Unified))
}

/// 5×5 level with a 3×3 Solid block at (1, 1)..=(3, 3) on the front layer.
fn block_level(seed: u32) -> LevelState {
    let mut level = LevelState::new(5, 5, slate()).with_seed(seed);
    for x in 1..=3 {
        for y in 1..=3 {
            level.set_geo(x, y, 0, GeoCell::new(GeoType::Solid));
        }
    }
    level
}

fn config() -> RenderConfig {
    RenderConfig::default().with_canvas(100, 100).with_material_fixes(false)
}

fn ready_engine(level: LevelState) -> Engine {
    let mut engine = Engine::new(config(), &registry());
    engine.initialize();
    engine.load(level).expect("level loads");
    engine
}

// ── End to end ───────────────────────────────────────────────────────────────

#[test]
fn solid_block_corners_pick_expected_sheet_cells() {
    let mut engine = ready_engine(block_level(42));
    assert_eq!(engine.render_all(), 3);

    let front = engine.compositor().and_then(|c| c.slot(Stack::Primary, 0)).expect("front slot drawn");
    for i in 0..3 {
        for j in 0..3 {
            let (cx, cy) = (1 + i, 1 + j);
            // Top-left corner: column from (left open, up open), row 2.
            let column = match (i > 0, j > 0) {
                (false, false) => 2,
                (true, false) => 6,
                (false, true) => 4,
                (true, true) => 10,
            };
            let expected = Rgba([((column - 1) * 10) as u8, 10, 100, 255]);
            assert_eq!(front.pixel(cx * 20 + 2, cy * 20 + 2), Some(expected), "cell ({cx}, {cy})");
        }
    }
}

#[test]
fn shadow_slots_hold_the_darker_copy() {
    let mut engine = ready_engine(block_level(42));
    engine.render();

    let layers = engine.compositor().expect("initialized");
    for d in 1..10 {
        let slot = layers.slot(Stack::Primary, d).expect("shadow slot drawn");
        assert_eq!(slot.pixel(42, 42).map(|p| p.0[2]), Some(50));
    }
    assert!(layers.slot(Stack::Primary, 10).is_none());
}

#[test]
fn poles_of_every_layer_reach_the_composed_canvas() {
    let mut level = block_level(42);
    level.set_geo(0, 0, 2, GeoCell::AIR.with_feature(GeoFeatures::VERTICAL_POLE));
    level.set_geo(1, 0, 1, GeoCell::AIR.with_feature(GeoFeatures::HORIZONTAL_POLE));
    let mut engine = ready_engine(level);
    engine.render_all();
    assert_eq!(engine.last_pass().map(|p| p.poles), Some(1));

    let out = engine.compose(Vec2::new(0.5, 0.5)).expect("composed");
    // The overlay sits at the compose origin (29, 29), whatever the offset.
    assert_eq!(out.pixel(29 + 9, 29 + 5), Some(POLE_COLOR));
    assert_eq!(out.pixel(29 + 25, 29 + 9), Some(POLE_COLOR));
}

#[test]
fn output_is_identical_across_runs() {
    let run = || {
        let mut engine = ready_engine(block_level(42));
        engine.render_all();
        engine.compose(Vec2::new(0.5, 0.25)).map(|c| c.image().clone())
    };
    let first = run().expect("composed");
    let second = run().expect("composed");
    assert_eq!(first.as_raw(), second.as_raw());
}

#[test]
fn classification_is_kept_for_inspection() {
    let mut engine = ready_engine(block_level(42));
    engine.render();
    let pass = engine.last_pass().expect("one pass done");
    assert_eq!(pass.layer, 0);
    // Every cell is a Default tile; all 25 are queued.
    assert_eq!(pass.draw_later.len(), 25);
    assert_eq!(pass.materials, [("Slate".to_string(), 25)]);
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[test]
fn render_before_initialize_is_a_no_op() {
    let mut engine = Engine::new(config(), &registry());
    assert_eq!(engine.render(), None);
    assert!(engine.compositor().is_none());
}

#[test]
fn fourth_render_is_a_no_op() {
    let mut engine = ready_engine(block_level(1));
    assert_eq!(engine.render(), Some(0));
    assert_eq!(engine.render(), Some(1));
    assert_eq!(engine.render(), Some(2));
    let rng_before = engine.rng().clone();
    assert_eq!(engine.render(), None);
    assert_eq!(engine.rng(), &rng_before);
}

#[test]
fn render_after_dispose_is_a_no_op() {
    let mut engine = ready_engine(block_level(1));
    engine.dispose();
    assert_eq!(engine.render(), None);
    assert!(engine.compose(Vec2::ZERO).is_none());
    assert!(engine.load(block_level(2)).is_ok());
    assert!(engine.level().is_none());
}

#[test]
fn load_with_missing_recipe_tile_errors() {
    let mut engine = Engine::new(config(), &registry());
    engine.initialize();

    let stone = Arc::new(MaterialDefinition::new("Tiled Stone", Rgba([9, 9, 9, 255]), MaterialRenderType::Tiles));
    let mut level = block_level(1);
    level.set_tile(2, 2, 0, TileCell::Material(stone));

    match engine.load(level) {
        Err(EngineError::MissingTile(name)) => assert_eq!(name, "Small Stone"),
        other => panic!("expected a missing tile, got {other:?}"),
    }
    assert!(engine.level().is_none());
}

#[test]
fn temple_stone_requires_its_slopes_with_fixes_off() {
    let mut engine = Engine::new(config(), &registry());
    engine.initialize();

    let temple = Arc::new(MaterialDefinition::new("Temple Stone", Rgba([9, 9, 9, 255]), MaterialRenderType::Tiles));
    match engine.load(LevelState::new(2, 2, temple)) {
        Err(EngineError::MissingTile(name)) => assert_eq!(name, "Temple Stone Slope NE"),
        other => panic!("expected a missing tile, got {other:?}"),
    }
}

#[test]
fn recipe_tile_without_texture_is_a_missing_texture() {
    let mut registry = registry();
    registry.tiles.insert(TileDefinition::new("Small Stone", (1, 1), TileType::VoxelStruct));
    let mut engine = Engine::new(config(), &registry);
    engine.initialize();

    let stone = Arc::new(MaterialDefinition::new("Tiled Stone", Rgba([9, 9, 9, 255]), MaterialRenderType::Tiles));
    let err = engine.load(LevelState::new(2, 2, stone)).unwrap_err();
    assert!(matches!(err, EngineError::MissingTexture(name) if name == "Small Stone"));
}

#[test]
fn tiles_material_scatters_its_stone() {
    let mut registry = registry();
    let stone_sheet = RgbaImage::from_pixel(20, 21, Rgba([40, 120, 40, 255]));
    registry.tiles.insert(
        TileDefinition::new("Small Stone", (1, 1), TileType::VoxelStruct).with_texture(Arc::new(stone_sheet)),
    );
    let stone = Arc::new(MaterialDefinition::new("Tiled Stone", Rgba([9, 9, 9, 255]), MaterialRenderType::Tiles));

    let mut engine = Engine::new(config(), &registry);
    engine.initialize();
    let mut level = LevelState::new(3, 3, stone).with_seed(7);
    level.set_geo(1, 1, 0, GeoCell::new(GeoType::Solid));
    engine.load(level).expect("stone tile is present");
    engine.render();

    let front = engine.compositor().and_then(|c| c.slot(Stack::Primary, 0)).expect("stone drawn");
    assert_eq!(front.pixel(30, 30), Some(Rgba([40, 120, 40, 255])));
}

// ── Background loading ───────────────────────────────────────────────────────

#[test]
fn level_from_loader_is_taken_once_finished() {
    let mut engine = Engine::new(config(), &registry());
    engine.initialize();

    let mut loader = LevelLoader::spawn(|| Ok(block_level(42)));
    let mut loaded = false;
    for _ in 0..1000 {
        if engine.load_when_ready(&mut loader).expect("job succeeds") {
            loaded = true;
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    assert!(loaded);
    assert_eq!(engine.level().map(|l| l.seed), Some(42));
}
