use glam::Vec2;
use image::{Rgba, RgbaImage};

use crate::geometry::Rect;
use crate::renderer::canvas::{Blend, Canvas, BACKGROUND};

/// Depth slots per stack.
pub const SLOT_COUNT: usize = 30;

/// Depth sub-slots owned by one geometry layer.
pub const SUBLAYERS: usize = 10;

/// Where slot 0 lands on the output canvas. Deeper slots move away from it
/// against the parallax offset.
pub const COMPOSE_ORIGIN: Vec2 = Vec2::splat(29.0);

/// First slot of geometry layer `layer`.
#[inline]
pub const fn layer_base(layer: usize) -> usize {
    layer * SUBLAYERS
}

// ── Stack ─────────────────────────────────────────────────────────────────────

/// The four parallel slot stacks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stack {
    /// What gets composed into the canvas.
    Primary,
    /// Darkest-blend duplicate used for flat colour tinting.
    DarkestCopy,
    /// Effect-colour channel A.
    GradientA,
    /// Effect-colour channel B.
    GradientB,
}

// ── SlotStack ─────────────────────────────────────────────────────────────────

/// Thirty lazily allocated buffers. A slot nobody drew into stays `None`,
/// which reads exactly like a cleared buffer.
#[derive(Clone, Debug)]
struct SlotStack {
    slots: Vec<Option<Canvas>>,
}

impl SlotStack {
    fn new() -> Self {
        Self { slots: vec![None; SLOT_COUNT] }
    }

    fn get(&self, slot: usize) -> Option<&Canvas> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn get_or_alloc(&mut self, slot: usize, width: u32, height: u32) -> Option<&mut Canvas> {
        let entry = self.slots.get_mut(slot)?;
        Some(entry.get_or_insert_with(|| Canvas::new(width, height)))
    }

    fn clear(&mut self) {
        for s in &mut self.slots {
            *s = None;
        }
    }

    fn allocated(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

// ── LayerCompositor ───────────────────────────────────────────────────────────

/// Owns every off-screen buffer the renderer draws into.
///
/// Slot indices at or above [`SLOT_COUNT`] are accepted everywhere and
/// silently ignored: painters compute `layer * 10 + d` without clamping and
/// rely on this.
///
/// Field order is drop order: the output canvas and overlay are released
/// before the slot stacks.
#[derive(Clone, Debug)]
pub struct LayerCompositor {
    canvas: Canvas,
    overlay: Canvas,
    primary: SlotStack,
    darkest: SlotStack,
    gradient_a: SlotStack,
    gradient_b: SlotStack,
    width: u32,
    height: u32,
}

impl LayerCompositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Canvas::new(width, height),
            overlay: Canvas::new(width, height),
            primary: SlotStack::new(),
            darkest: SlotStack::new(),
            gradient_a: SlotStack::new(),
            gradient_b: SlotStack::new(),
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    fn stack(&self, stack: Stack) -> &SlotStack {
        match stack {
            Stack::Primary => &self.primary,
            Stack::DarkestCopy => &self.darkest,
            Stack::GradientA => &self.gradient_a,
            Stack::GradientB => &self.gradient_b,
        }
    }

    fn stack_mut(&mut self, stack: Stack) -> &mut SlotStack {
        match stack {
            Stack::Primary => &mut self.primary,
            Stack::DarkestCopy => &mut self.darkest,
            Stack::GradientA => &mut self.gradient_a,
            Stack::GradientB => &mut self.gradient_b,
        }
    }

    /// Read a slot. `None` when the slot was never drawn into or is out of
    /// range.
    pub fn slot(&self, stack: Stack, slot: usize) -> Option<&Canvas> {
        self.stack(stack).get(slot)
    }

    /// Writable slot, allocated on first use. `None` for slots ≥ 30.
    pub fn slot_mut(&mut self, stack: Stack, slot: usize) -> Option<&mut Canvas> {
        let (w, h) = (self.width, self.height);
        self.stack_mut(stack).get_or_alloc(slot, w, h)
    }

    /// Number of allocated buffers in `stack`.
    pub fn allocated(&self, stack: Stack) -> usize {
        self.stack(stack).allocated()
    }

    pub fn draw(&mut self, stack: Stack, slot: usize, texture: &RgbaImage, src: Rect, dst: Rect, blend: Blend) {
        if let Some(canvas) = self.slot_mut(stack, slot) {
            canvas.draw_texture(texture, src, dst, blend);
        }
    }

    pub fn fill_rect(&mut self, stack: Stack, slot: usize, rect: Rect, color: Rgba<u8>) {
        if let Some(canvas) = self.slot_mut(stack, slot) {
            canvas.fill_rect(rect, color);
        }
    }

    /// Decoration layer (pole markers). Kept across passes until the next
    /// [`clear`](Self::clear); composed above every slot.
    pub fn overlay(&self) -> &Canvas {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut Canvas {
        &mut self.overlay
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Drop every slot in every stack and blank the canvas and overlay.
    pub fn clear(&mut self) {
        self.primary.clear();
        self.darkest.clear();
        self.gradient_a.clear();
        self.gradient_b.clear();
        self.canvas.clear(BACKGROUND);
        self.overlay.clear(BACKGROUND);
    }

    /// Flatten the primary stack into the canvas, back to front.
    ///
    /// Slot `l` lands at `round(COMPOSE_ORIGIN - l * offset)` and is overlaid
    /// with background stripping, so slot 0 ends up on top. The overlay goes
    /// last, at slot 0's position.
    pub fn compose(&mut self, offset: Vec2) -> &Canvas {
        self.canvas.clear(BACKGROUND);
        for l in (0..SLOT_COUNT).rev() {
            let Some(layer) = self.primary.get(l) else { continue };
            let (dx, dy) = slot_position(l, offset);
            self.canvas.overlay(layer, dx, dy);
        }
        let (dx, dy) = slot_position(0, offset);
        self.canvas.overlay(&self.overlay, dx, dy);
        &self.canvas
    }
}

/// Top-left pixel of slot `l` on the composed canvas.
pub fn slot_position(l: usize, offset: Vec2) -> (i32, i32) {
    let at = (COMPOSE_ORIGIN - offset * l as f32).round();
    (at.x as i32, at.y as i32)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
