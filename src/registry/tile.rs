use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

// ── TileType ──────────────────────────────────────────────────────────────────

/// How a tile's texture is laid out and drawn into depth slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    /// Flat face drawn once into the front slot.
    Box,
    /// Stack of slices, one texture row per repeat entry.
    VoxelStruct,
    VoxelStructRandomDisplaceHorizontal,
    VoxelStructRandomDisplaceVertical,
    /// Same image in every slot, variant re-rolled every few slots.
    VoxelStructRockType,
    /// Variant rolled per slot.
    VoxelStructSandType,
}

// ── TileDefinition ────────────────────────────────────────────────────────────

/// A named, sized sprite with per-cell geometry requirements.
#[derive(Clone, Debug)]
pub struct TileDefinition {
    pub name: String,
    /// Footprint in grid cells `(w, h)`.
    pub size: (i32, i32),
    /// Extra cells of texture margin drawn around the footprint.
    pub buffer_tiles: i32,
    pub tile_type: TileType,
    /// Row-major `h × w` geometry codes, `-1` for "any".
    pub specs: Vec<i32>,
    /// Optional second spec layer (geometry one layer deeper).
    pub specs2: Option<Vec<i32>>,
    /// Number of depth slots each texture row is repeated into.
    pub repeat: Vec<i32>,
    /// Number of variant columns in the texture. `-1` picks by neighbors.
    pub rnd: i32,
    pub tags: Vec<String>,
    pub texture: Option<Arc<RgbaImage>>,
}

impl TileDefinition {
    /// A `w × h` tile with "any" specs, one variant, no repeats.
    pub fn new(name: impl Into<String>, size: (i32, i32), tile_type: TileType) -> Self {
        assert!(size.0 > 0 && size.1 > 0, "tile size must be positive, got {size:?}");
        Self {
            name: name.into(),
            size,
            buffer_tiles: 0,
            tile_type,
            specs: vec![-1; (size.0 * size.1) as usize],
            specs2: None,
            repeat: Vec::new(),
            rnd: 1,
            tags: Vec::new(),
            texture: None,
        }
    }

    /// Replace the spec grid. `specs` is row-major and must hold `w × h` codes.
    pub fn with_specs(mut self, specs: Vec<i32>) -> Self {
        assert_eq!(
            specs.len(),
            (self.size.0 * self.size.1) as usize,
            "spec grid of '{}' does not match its {}x{} footprint",
            self.name,
            self.size.0,
            self.size.1
        );
        self.specs = specs;
        self
    }

    pub fn with_specs2(mut self, specs: Vec<i32>) -> Self {
        assert_eq!(specs.len(), (self.size.0 * self.size.1) as usize);
        self.specs2 = Some(specs);
        self
    }

    pub fn with_repeat(mut self, repeat: Vec<i32>) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_rnd(mut self, rnd: i32) -> Self {
        self.rnd = rnd;
        self
    }

    pub fn with_buffer(mut self, buffer_tiles: i32) -> Self {
        self.buffer_tiles = buffer_tiles;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_texture(mut self, texture: Arc<RgbaImage>) -> Self {
        self.texture = Some(texture);
        self
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.size.0
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.size.1
    }

    /// Spec code at footprint cell `(sx, sy)`; `-1` outside the footprint.
    pub fn spec(&self, sx: i32, sy: i32) -> i32 {
        if sx < 0 || sy < 0 || sx >= self.size.0 || sy >= self.size.1 {
            return -1;
        }
        self.specs[(sy * self.size.0 + sx) as usize]
    }

    /// Whether spec layer `layer` (0 or 1) constrains any cell.
    pub fn has_specs_layer(&self, layer: usize) -> bool {
        match layer {
            0 => self.specs.iter().any(|&s| s != -1),
            1 => self.specs2.as_ref().is_some_and(|s| s.iter().any(|&v| v != -1)),
            _ => false,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Anchor cell relative to the footprint's top-left corner.
    ///
    /// `(⌈w/2 + 0.4999⌉ − 1, ⌈h/2 + 0.4999⌉ − 1)`. The bias puts the head of an
    /// even-sized tile right of and below the centre line.
    pub fn head_offset(&self) -> (i32, i32) {
        (head_axis(self.size.0), head_axis(self.size.1))
    }
}

#[inline]
fn head_axis(extent: i32) -> i32 {
    (extent as f32 / 2.0 + 0.4999).ceil() as i32 - 1
}

impl PartialEq for TileDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TileDefinition {}

// ── Tests ─────────────────────────────────────────────────────────────────────
