use std::sync::Arc;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Algorithm family a material is painted with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialRenderType {
    Unified,
    Tiles,
    Pipe,
    Invisible,
    LargeTrash,
    Dirt,
    Ceramic,
    DensePipe,
    Ridge,
    CeramicA,
    CeramicB,
    RandomPipes,
    Rock,
    RoughRock,
    Sandy,
    MegaTrash,
    WV,
    CustomUnified,
}

/// A named paint applied over solid, slope and platform geometry.
#[derive(Clone, Debug)]
pub struct MaterialDefinition {
    pub name: String,
    /// Editor swatch colour.
    pub color: Rgba<u8>,
    pub render_type: MaterialRenderType,
    /// Material's own texture. Unified materials fall back to it when no
    /// `tileSet…` texture exists; overlay patterns always sample it.
    pub texture: Option<Arc<RgbaImage>>,
}

impl MaterialDefinition {
    pub fn new(name: impl Into<String>, color: Rgba<u8>, render_type: MaterialRenderType) -> Self {
        Self { name: name.into(), color, render_type, texture: None }
    }

    pub fn with_texture(mut self, texture: Arc<RgbaImage>) -> Self {
        self.texture = Some(texture);
        self
    }
}

impl PartialEq for MaterialDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for MaterialDefinition {}
