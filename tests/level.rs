use std::sync::Arc;

use image::Rgba;

use strata::geometry::{GeoCell, GeoFeatures, GeoType};
use strata::level::{Grid3, LevelLoader, LevelState, TileCell, GEO_LAYERS};
use strata::registry::{MaterialDefinition, MaterialRenderType, TileDefinition, TileType};
use strata::EngineError;

fn concrete() -> Arc<MaterialDefinition> {
    Arc::new(MaterialDefinition::new("Concrete", Rgba([150, 150, 150, 255]), MaterialRenderType::Unified))
}

// ── Tiles in the grid ────────────────────────────────────────────────────────

#[test]
fn head_offset_rounds_up_for_even_sizes() {
    let offsets: Vec<(i32, i32)> = [(1, 1), (2, 2), (3, 3), (4, 1), (5, 2)]
        .into_iter()
        .map(|size| TileDefinition::new("t", size, TileType::Box).head_offset())
        .collect();
    assert_eq!(offsets, [(0, 0), (1, 1), (1, 1), (2, 0), (2, 1)]);
}

#[test]
fn placed_tile_marks_head_and_body_cells() {
    let mut level = LevelState::new(6, 6, concrete());
    let shelf = Arc::new(TileDefinition::new("Shelf", (3, 2), TileType::VoxelStruct));
    level.place_tile(shelf, 2, 3, 1);

    // 3x2 head offset is (1, 1): footprint is x 1..=3, y 2..=3.
    let mut heads = 0;
    let mut bodies = 0;
    for x in 0..6 {
        for y in 0..6 {
            match level.tile(x, y, 1) {
                Some(TileCell::Head(_)) => heads += 1,
                Some(TileCell::Body { head, .. }) => {
                    assert_eq!(*head, (2, 3, 1));
                    assert!((1..=3).contains(&x) && (2..=3).contains(&y));
                    bodies += 1;
                }
                _ => {}
            }
        }
    }
    assert_eq!((heads, bodies), (1, 5));
    assert!(matches!(level.tile(2, 3, 0), Some(TileCell::Default)));
}

#[test]
fn tile_hanging_off_the_level_keeps_in_bounds_cells() {
    let mut level = LevelState::new(2, 2, concrete());
    let big = Arc::new(TileDefinition::new("Big", (3, 3), TileType::VoxelStruct));
    level.place_tile(big, 0, 0, 0);
    assert!(matches!(level.tile(0, 0, 0), Some(TileCell::Head(_))));
    assert_eq!(level.resolve_body(1, 1, 0).map(|d| d.name.as_str()), Some("Big"));
}

// ── Geometry ─────────────────────────────────────────────────────────────────

#[test]
fn layers_are_independent() {
    let mut level = LevelState::new(3, 3, concrete());
    level.set_geo(1, 1, 2, GeoCell::new(GeoType::Glass).with_feature(GeoFeatures::HORIZONTAL_POLE));
    assert_eq!(level.geo_type(1, 1, 2), Some(GeoType::Glass));
    assert_eq!(level.geo_type(1, 1, 0), Some(GeoType::Air));
    assert!(level.geo(1, 1, 2).is_some_and(|c| c.has(GeoFeatures::HORIZONTAL_POLE)));
    assert!(level.geo(1, 1, GEO_LAYERS).is_none());
}

#[test]
#[should_panic]
fn grids_of_different_shape_are_rejected() {
    LevelState::from_grids(
        Grid3::new(4, 4, GeoCell::AIR),
        Grid3::new(4, 4, TileCell::Default),
        Grid3::new(5, 4, Rgba([0, 0, 0, 0])),
        concrete(),
    );
}

// ── Background loading ───────────────────────────────────────────────────────

#[test]
fn loader_hands_over_finished_level() {
    let loader = LevelLoader::spawn(|| Ok(LevelState::new(7, 3, concrete()).with_seed(99)));
    let level = loader.wait().expect("job succeeds");
    assert_eq!((level.width(), level.height(), level.seed), (7, 3, 99));
}

#[test]
fn loader_passes_job_errors_through() {
    let loader = LevelLoader::spawn(|| Err(EngineError::MissingMaterial("Rubble".into())));
    assert!(matches!(loader.wait(), Err(EngineError::MissingMaterial(name)) if name == "Rubble"));
}
