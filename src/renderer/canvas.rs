// =============================================================================
// CANVAS.RS — CPU image-compositing service
//
// Off-screen buffers the compositor draws into. Provides exactly the
// operations the painters need:
// - clear / filled rectangle / filled triangle
// - textured rectangle (nearest-neighbour scaled) with a blend mode
// - background-stripping overlay of one canvas onto another
//
// Background is opaque white. "Stripping" means white source pixels are
// treated as holes, so white parts of tile sheets never cover anything.
// =============================================================================

use glam::IVec2;
use image::{Rgba, RgbaImage};

use crate::geometry::Rect;

/// Colour every buffer is cleared to.
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Pure red used for pole markers.
pub const POLE_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

#[inline]
pub fn is_background(p: &Rgba<u8>) -> bool {
    p.0[0] == 255 && p.0[1] == 255 && p.0[2] == 255
}

// ── Blend ─────────────────────────────────────────────────────────────────────

/// How a textured draw combines with the destination.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Blend {
    /// Copy every non-transparent source pixel.
    Replace,
    /// Copy non-background source pixels only.
    StripBackground,
    /// Like `StripBackground`, but kept pixels are written as one flat colour.
    Tint(Rgba<u8>),
    /// Keep the darker value per channel.
    Darkest,
}

// ── Canvas ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// New canvas cleared to [`BACKGROUND`].
    pub fn new(width: u32, height: u32) -> Self {
        Self { image: RgbaImage::from_pixel(width, height, BACKGROUND) }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn clear(&mut self, color: Rgba<u8>) {
        for p in self.image.pixels_mut() {
            *p = color;
        }
    }

    /// Pixel at `(x, y)`, `None` outside the canvas.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        if x < 0 || y < 0 {
            return None;
        }
        self.image.get_pixel_checked(x as u32, y as u32).copied()
    }

    /// True when every pixel is background.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(is_background)
    }

    /// Clip `rect` to the canvas. Returns `(x0, y0, x1, y1)` half-open, or
    /// `None` when nothing is left.
    fn clip(&self, rect: Rect) -> Option<(i32, i32, i32, i32)> {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = rect.right().min(self.width() as i32);
        let y1 = rect.bottom().min(self.height() as i32);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else { return };
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Fill the triangle `a b c` (either winding). Pixels whose centre lies on
    /// an edge are included.
    pub fn fill_triangle(&mut self, a: IVec2, b: IVec2, c: IVec2, color: Rgba<u8>) {
        let min = a.min(b).min(c);
        let max = a.max(b).max(c);
        let Some((x0, y0, x1, y1)) = self.clip(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
        else {
            return;
        };

        // Doubled coordinates keep pixel centres integral.
        let (a2, b2, c2) = (a * 2, b * 2, c * 2);
        let edge = |p: IVec2, q: IVec2, r: IVec2| -> i64 {
            (q.x - p.x) as i64 * (r.y - p.y) as i64 - (q.y - p.y) as i64 * (r.x - p.x) as i64
        };

        for y in y0..y1 {
            for x in x0..x1 {
                let p = IVec2::new(2 * x + 1, 2 * y + 1);
                let e0 = edge(a2, b2, p);
                let e1 = edge(b2, c2, p);
                let e2 = edge(c2, a2, p);
                let inside = (e0 >= 0 && e1 >= 0 && e2 >= 0) || (e0 <= 0 && e1 <= 0 && e2 <= 0);
                if inside {
                    self.image.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    /// Draw region `src` of `texture` scaled into `dst`.
    ///
    /// Source pixels outside the texture and fully transparent pixels are
    /// skipped. Destination pixels outside the canvas are clipped.
    pub fn draw_texture(&mut self, texture: &RgbaImage, src: Rect, dst: Rect, blend: Blend) {
        if src.is_empty() || dst.is_empty() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.clip(dst) else { return };
        let (tw, th) = (texture.width() as i64, texture.height() as i64);

        for y in y0..y1 {
            let sy = src.y as i64 + (y - dst.y) as i64 * src.h as i64 / dst.h as i64;
            if sy < 0 || sy >= th {
                continue;
            }
            for x in x0..x1 {
                let sx = src.x as i64 + (x - dst.x) as i64 * src.w as i64 / dst.w as i64;
                if sx < 0 || sx >= tw {
                    continue;
                }
                let s = *texture.get_pixel(sx as u32, sy as u32);
                if s.0[3] == 0 {
                    continue;
                }
                let d = self.image.get_pixel_mut(x as u32, y as u32);
                match blend {
                    Blend::Replace => *d = s,
                    Blend::StripBackground => {
                        if !is_background(&s) {
                            *d = s;
                        }
                    }
                    Blend::Tint(color) => {
                        if !is_background(&s) {
                            *d = color;
                        }
                    }
                    Blend::Darkest => {
                        for ch in 0..3 {
                            d.0[ch] = d.0[ch].min(s.0[ch]);
                        }
                        d.0[3] = 255;
                    }
                }
            }
        }
    }

    /// Copy every non-background pixel of `other`, shifted by `(dx, dy)`.
    pub fn overlay(&mut self, other: &Canvas, dx: i32, dy: i32) {
        for (x, y, p) in other.image.enumerate_pixels() {
            if is_background(p) {
                continue;
            }
            let tx = x as i64 + dx as i64;
            let ty = y as i64 + dy as i64;
            if tx < 0 || ty < 0 || tx >= self.width() as i64 || ty >= self.height() as i64 {
                continue;
            }
            self.image.put_pixel(tx as u32, ty as u32, *p);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
