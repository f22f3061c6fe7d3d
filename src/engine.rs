use std::collections::HashSet;

use glam::Vec2;

use crate::config::RenderConfig;
use crate::error::EngineError;
use crate::level::loader::LevelLoader;
use crate::level::{LevelState, TileCell, GEO_LAYERS};
use crate::registry::{MaterialDefinition, Registry};
use crate::renderer::{scheduler, CameraView, Canvas, LayerCompositor, LayerPass, Painter, RenderContext};
use crate::rng::DeterministicRng;

// ── Engine ────────────────────────────────────────────────────────────────────

/// Owns everything a preview render needs: the immutable [`RenderContext`],
/// the slot buffers, the loaded level and the RNG stream.
///
/// Lifecycle: `new` → [`initialize`](Self::initialize) → [`load`](Self::load)
/// → three [`render`](Self::render) calls (one per geometry layer) →
/// [`compose`](Self::compose). `load` may be called again at any time to
/// start over. After [`dispose`](Self::dispose) every call is a no-op.
pub struct Engine {
    config: RenderConfig,
    context: RenderContext,
    compositor: Option<LayerCompositor>,
    level: Option<LevelState>,
    rng: DeterministicRng,
    /// Next geometry layer to render.
    cursor: usize,
    disposed: bool,
    last_pass: Option<LayerPass>,
}

impl Engine {
    pub fn new(config: RenderConfig, registry: &Registry) -> Self {
        Self {
            config,
            context: RenderContext::from_registry(registry),
            compositor: None,
            level: None,
            rng: DeterministicRng::new(0),
            cursor: 0,
            disposed: false,
            last_pass: None,
        }
    }

    /// Allocate the slot stacks. Calling it twice keeps the existing buffers.
    pub fn initialize(&mut self) {
        if self.disposed {
            log::warn!("engine: initialize after dispose ignored");
            return;
        }
        if self.compositor.is_some() {
            return;
        }
        let (w, h) = (self.config.canvas_width, self.config.canvas_height);
        self.compositor = Some(LayerCompositor::new(w, h));
        log::info!("engine: initialized {w}x{h} canvas");
    }

    pub fn is_initialized(&self) -> bool {
        self.compositor.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Take ownership of `level` and get ready to render it from layer 0.
    ///
    /// Every material the level uses is checked for the tiles and textures
    /// its painter references by name; the first one missing is returned and
    /// the previous state is left untouched.
    pub fn load(&mut self, level: LevelState) -> Result<(), EngineError> {
        let Some(compositor) = self.compositor.as_mut() else {
            log::warn!("engine: load before initialize ignored");
            return Ok(());
        };

        for material in used_materials(&level) {
            self.context.validate(material, &self.config)?;
        }

        compositor.clear();
        self.rng.reseed(level.seed);
        self.cursor = 0;
        self.last_pass = None;
        log::info!(
            "engine: loaded {}x{} level, seed {}",
            level.width(),
            level.height(),
            level.seed
        );
        self.level = Some(level);
        Ok(())
    }

    /// Load the level from `loader` once its job has finished.
    ///
    /// Returns `Ok(false)` while the job is still running.
    pub fn load_when_ready(&mut self, loader: &mut LevelLoader) -> Result<bool, EngineError> {
        match loader.poll() {
            None => Ok(false),
            Some(result) => {
                self.load(result?)?;
                Ok(true)
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Render the next geometry layer, front to back. Returns the layer that
    /// was drawn, or `None` once all three are done.
    pub fn render(&mut self) -> Option<usize> {
        let Some(layers) = self.compositor.as_mut() else {
            log::warn!("engine: render before initialize ignored");
            return None;
        };
        let Some(level) = self.level.as_ref() else {
            log::warn!("engine: render with no level loaded ignored");
            return None;
        };
        if self.cursor >= GEO_LAYERS {
            log::debug!("engine: all {GEO_LAYERS} layers already rendered");
            return None;
        }

        let layer = self.cursor;
        let mut painter = Painter {
            level,
            context: &self.context,
            config: &self.config,
            rng: &mut self.rng,
            layers,
            view: CameraView::from_camera(&level.primary_camera()),
            layer,
        };
        let pass = scheduler::render_layer(&mut painter);
        log::debug!(
            "engine: layer {layer} done, {} queued, {} draw-last, {} material groups",
            pass.draw_later.len(),
            pass.draw_last.len(),
            pass.materials.len()
        );

        self.last_pass = Some(pass);
        self.cursor += 1;
        Some(layer)
    }

    /// Render every remaining layer. Returns how many were drawn.
    pub fn render_all(&mut self) -> usize {
        std::iter::from_fn(|| self.render()).count()
    }

    /// Flatten all slots into the output canvas, placing slot `l` at
    /// `round(29 - l · offset)`, then the pole overlay on top.
    pub fn compose(&mut self, offset: Vec2) -> Option<&Canvas> {
        match self.compositor.as_mut() {
            Some(layers) => Some(layers.compose(offset)),
            None => {
                log::warn!("engine: compose before initialize ignored");
                None
            }
        }
    }

    /// Drop the buffers and the level. Every later call is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.compositor = None;
        self.level = None;
        self.last_pass = None;
        self.disposed = true;
        log::info!("engine: disposed");
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn compositor(&self) -> Option<&LayerCompositor> {
        self.compositor.as_ref()
    }

    pub fn level(&self) -> Option<&LevelState> {
        self.level.as_ref()
    }

    /// Classification result of the most recent render.
    pub fn last_pass(&self) -> Option<&LayerPass> {
        self.last_pass.as_ref()
    }

    /// Geometry layer the next `render` will draw.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn rng(&self) -> &DeterministicRng {
        &self.rng
    }
}

/// Default material first, then every material painted into a tile cell,
/// each once.
fn used_materials(level: &LevelState) -> Vec<&MaterialDefinition> {
    let mut seen = HashSet::new();
    let mut out: Vec<&MaterialDefinition> = Vec::new();
    seen.insert(level.default_material.name.as_str());
    out.push(&level.default_material);

    for y in 0..level.height() as i32 {
        for x in 0..level.width() as i32 {
            for layer in 0..GEO_LAYERS {
                if let Some(TileCell::Material(m)) = level.tile(x, y, layer) {
                    if seen.insert(m.name.as_str()) {
                        out.push(m);
                    }
                }
            }
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
