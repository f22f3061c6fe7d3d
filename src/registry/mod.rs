pub mod material;
pub mod textures;
pub mod tile;

use std::collections::HashMap;
use std::sync::Arc;

use image::Rgba;

use crate::error::EngineError;

pub use material::{MaterialDefinition, MaterialRenderType};
pub use textures::TextureLibrary;
pub use tile::{TileDefinition, TileType};

// ── Named ─────────────────────────────────────────────────────────────────────

/// Anything a [`Dex`] can index by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for TileDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for MaterialDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}

// ── Category ──────────────────────────────────────────────────────────────────

/// A named, coloured group of definitions as shown in the editor palette.
#[derive(Clone, Debug)]
pub struct Category<T> {
    pub name: String,
    pub color: Rgba<u8>,
    pub members: Vec<Arc<T>>,
}

// ── Dex ───────────────────────────────────────────────────────────────────────

/// Name → definition lookup plus category enumeration.
///
/// Iteration follows insertion order, so pools built from a dex are stable
/// from run to run.
#[derive(Clone, Debug)]
pub struct Dex<T> {
    by_name: HashMap<String, Arc<T>>,
    ordered: Vec<Arc<T>>,
    categories: Vec<Category<T>>,
}

impl<T> Default for Dex<T> {
    fn default() -> Self {
        Self { by_name: HashMap::new(), ordered: Vec::new(), categories: Vec::new() }
    }
}

impl<T: Named> Dex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category and its members. A member whose name is already known
    /// keeps its first definition; the category still lists the existing one.
    pub fn add_category(&mut self, name: impl Into<String>, color: Rgba<u8>, members: Vec<T>) {
        let mut shared = Vec::with_capacity(members.len());
        for def in members {
            shared.push(self.insert(def));
        }
        self.categories.push(Category { name: name.into(), color, members: shared });
    }

    /// Add a definition outside any category. Returns the stored definition.
    pub fn insert(&mut self, def: T) -> Arc<T> {
        if let Some(existing) = self.by_name.get(def.name()) {
            log::warn!("registry: duplicate definition '{}'; keeping the first", def.name());
            return Arc::clone(existing);
        }
        let def = Arc::new(def);
        self.by_name.insert(def.name().to_string(), Arc::clone(&def));
        self.ordered.push(Arc::clone(&def));
        def
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.by_name.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.ordered.iter()
    }

    pub fn categories(&self) -> &[Category<T>] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category<T>> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Name of the category `name` belongs to.
    pub fn category_of(&self, name: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.members.iter().any(|m| m.name() == name))
            .map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Every definition and texture the renderer may reference.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    pub tiles: Dex<TileDefinition>,
    pub materials: Dex<MaterialDefinition>,
    pub textures: TextureLibrary,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile(&self, name: &str) -> Result<Arc<TileDefinition>, EngineError> {
        self.tiles.get(name).ok_or_else(|| EngineError::MissingTile(name.to_string()))
    }

    pub fn material(&self, name: &str) -> Result<Arc<MaterialDefinition>, EngineError> {
        self.materials.get(name).ok_or_else(|| EngineError::MissingMaterial(name.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const GREY: Rgba<u8> = Rgba([128, 128, 128, 255]);

    fn tile(name: &str) -> TileDefinition {
        TileDefinition::new(name, (1, 1), TileType::VoxelStruct)
    }

    #[test]
    fn lookup_by_name_and_category() {
        let mut dex = Dex::new();
        dex.add_category("Stone", GREY, vec![tile("Small Stone"), tile("Square Stone")]);
        dex.add_category("Metal", GREY, vec![tile("Small Metal")]);

        assert!(dex.get("Square Stone").is_some());
        assert!(dex.get("Big Stone").is_none());
        assert_eq!(dex.category("Stone").unwrap().members.len(), 2);
        assert_eq!(dex.category_of("Small Metal"), Some("Metal"));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut dex = Dex::new();
        for name in ["c", "a", "b"] {
            dex.insert(tile(name));
        }
        let names: Vec<&str> = dex.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn duplicate_keeps_first_definition() {
        let mut dex = Dex::new();
        dex.insert(tile("x").with_rnd(4));
        let kept = dex.insert(tile("x").with_rnd(9));
        assert_eq!(kept.rnd, 4);
        assert_eq!(dex.len(), 1);
    }

    #[test]
    fn registry_lookup_errors_name_the_missing_entry() {
        let reg = Registry::new();
        assert!(matches!(reg.tile("SGFL"), Err(EngineError::MissingTile(n)) if n == "SGFL"));
        assert!(matches!(reg.material("Concrete"), Err(EngineError::MissingMaterial(_))));
    }
}
