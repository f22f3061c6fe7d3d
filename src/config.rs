use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ── RenderConfig ──────────────────────────────────────────────────────────────

/// Renderer switches and output size.
///
/// Every field has a default, so a config file only needs to list the
/// switches it changes:
///
/// ```json
/// { "material_fixes": true }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Enables the corrected edge handling: slope neighbor vectors, edge tile
    /// substitutes for packed materials, pipe platform/glass tiles.
    pub material_fixes: bool,
    /// Skips materials with the `Invisible` render type entirely.
    pub invisible_material_fix: bool,
    /// Lets rough rock spread into neighboring cells. Carried for config
    /// compatibility; no painter reads it yet.
    pub rough_rock_spreads_more: bool,
    /// Output canvas width in pixels.
    pub canvas_width: u32,
    /// Output canvas height in pixels.
    pub canvas_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            material_fixes:          false,
            invisible_material_fix:  false,
            rough_rock_spreads_more: false,
            canvas_width:            crate::CANVAS_WIDTH,
            canvas_height:           crate::CANVAS_HEIGHT,
        }
    }
}

impl RenderConfig {
    /// Parse a config from JSON text. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Same config with `material_fixes` switched.
    pub fn with_material_fixes(mut self, on: bool) -> Self {
        self.material_fixes = on;
        self
    }

    /// Same config with a different canvas size.
    pub fn with_canvas(mut self, width: u32, height: u32) -> Self {
        self.canvas_width = width;
        self.canvas_height = height;
        self
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
