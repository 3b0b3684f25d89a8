//! Composite renderers: Compound, Clipper, Transition, Proxy (spec.md
//! §4.8 "Composite renderers").
//!
//! These wrap child [`Renderer`]s rather than drawing pixels
//! themselves, so grounding is spec.md §4.8's own description plus the
//! driver contract in [`crate::renderer`] — the teacher has no
//! multi-child compositing of its own (AGG draws through a single
//! pipeline per call), so the setup/cleanup-ordering and damage
//! forwarding here directly implement spec.md §4.8's "all children's
//! setups complete before parent's span_fn callable; failure rolls back
//! previously-set-up children."

use crate::error::RendererError;
use crate::matrix::{IntRect, Rect};
use crate::renderer::{Renderer, RendererOps, RendererState, SpanFn};
use crate::span_compositor::{interp_256, Rop};
use crate::surface::Surface;

/// One layer of a [`Compound`] renderer: a child renderer plus the rop
/// it draws with.
pub struct Layer {
    pub renderer: Renderer,
    pub rop: Rop,
}

/// Draws an ordered list of child renderers, each with its own rop, in
/// order; bounds is the union of all layers (spec.md §4.8 "Compound").
pub struct Compound {
    pub layers: Vec<Layer>,
}

impl RendererOps for Compound {
    fn base_name(&self) -> &'static str {
        "compound"
    }

    fn bounds(&self) -> Rect {
        self.layers.iter().fold(Rect { x: 0.0, y: 0.0, w: 0.0, h: 0.0 }, |acc, layer| {
            let b = layer.renderer.bounds_get();
            let x0 = acc.x.min(b.x);
            let y0 = acc.y.min(b.y);
            let x1 = (acc.x + acc.w).max(b.x + b.w);
            let y1 = (acc.y + acc.h).max(b.y + b.h);
            Rect { x: x0, y: y0, w: x1 - x0, h: y1 - y0 }
        })
    }

    fn has_changed(&self) -> bool {
        self.layers.iter().any(|l| l.renderer.has_changed())
    }

    fn sw_setup(&mut self, surface: &Surface, _state: &RendererState) -> Result<SpanFn, RendererError> {
        let mut set_up = Vec::new();
        for layer in &self.layers {
            layer.renderer.rop_set(layer.rop);
            if let Err(e) = layer.renderer.sw_setup(surface) {
                for r in &set_up {
                    let r: &Renderer = r;
                    r.sw_cleanup(surface);
                }
                return Err(e);
            }
            set_up.push(layer.renderer.clone());
        }
        let layers: Vec<Renderer> = self.layers.iter().map(|l| l.renderer.clone()).collect();
        Ok(Box::new(move |x, y, len, dst: &mut [u32]| {
            for layer in &layers {
                layer.draw_span(x, y, len, dst);
            }
        }))
    }

    fn sw_cleanup(&mut self, surface: &Surface) {
        for layer in &self.layers {
            layer.renderer.sw_cleanup(surface);
        }
    }
}

/// Draws `content` but only within `clip`; pixels outside are left
/// untouched (spec.md §4.8 "Clipper").
pub struct Clipper {
    pub content: Renderer,
    pub clip: IntRect,
}

impl RendererOps for Clipper {
    fn base_name(&self) -> &'static str {
        "clipper"
    }

    fn bounds(&self) -> Rect {
        Rect { x: self.clip.x as f64, y: self.clip.y as f64, w: self.clip.w as f64, h: self.clip.h as f64 }
    }

    fn has_changed(&self) -> bool {
        self.content.has_changed()
    }

    fn damages(&self, destination_bounds: IntRect, old_bounds: IntRect, changed: bool, cb: &mut dyn FnMut(IntRect, bool)) {
        if changed {
            cb(old_bounds.intersect(&destination_bounds), true);
            cb(destination_bounds, false);
        }
    }

    fn sw_setup(&mut self, surface: &Surface, _state: &RendererState) -> Result<SpanFn, RendererError> {
        self.content.sw_setup(surface)?;
        let content = self.content.clone();
        let clip = self.clip;
        Ok(Box::new(move |x, y, len, dst: &mut [u32]| {
            if y < clip.y || y >= clip.y + clip.h {
                return;
            }
            let lo = clip.x.max(x);
            let hi = (clip.x + clip.w).min(x + len as i32);
            if hi <= lo {
                return;
            }
            let offset = (lo - x) as usize;
            let sub_len = (hi - lo) as usize;
            content.draw_span(lo, y, sub_len, &mut dst[offset..offset + sub_len]);
        }))
    }

    fn sw_cleanup(&mut self, surface: &Surface) {
        self.content.sw_cleanup(surface);
    }
}

/// Per-pixel linear interpolation between two child renderers by
/// `level` in `[0, 1]` (spec.md §4.8 "Transition").
pub struct Transition {
    pub source: Renderer,
    pub target: Renderer,
    pub level: f64,
}

impl RendererOps for Transition {
    fn base_name(&self) -> &'static str {
        "transition"
    }

    fn bounds(&self) -> Rect {
        self.source.bounds_get()
    }

    fn has_changed(&self) -> bool {
        self.source.has_changed() || self.target.has_changed()
    }

    fn sw_setup(&mut self, surface: &Surface, _state: &RendererState) -> Result<SpanFn, RendererError> {
        self.source.rop_set(Rop::Fill);
        self.target.rop_set(Rop::Fill);
        self.source.sw_setup(surface)?;
        if let Err(e) = self.target.sw_setup(surface) {
            self.source.sw_cleanup(surface);
            return Err(e);
        }
        let source = self.source.clone();
        let target = self.target.clone();
        let factor = (self.level.clamp(0.0, 1.0) * 256.0).round() as u32;
        Ok(Box::new(move |x, y, len, dst: &mut [u32]| {
            let mut src_row = vec![0u32; len];
            let mut tgt_row = vec![0u32; len];
            source.draw_span(x, y, len, &mut src_row);
            target.draw_span(x, y, len, &mut tgt_row);
            for i in 0..len {
                dst[i] = interp_256(256 - factor, src_row[i], tgt_row[i]);
            }
        }))
    }

    fn sw_cleanup(&mut self, surface: &Surface) {
        self.source.sw_cleanup(surface);
        self.target.sw_cleanup(surface);
    }
}

/// Forwards its entire behavior to a wrapped renderer (spec.md §4.8
/// "Proxy").
pub struct Proxy {
    pub wrapped: Renderer,
}

impl RendererOps for Proxy {
    fn base_name(&self) -> &'static str {
        "proxy"
    }

    fn bounds(&self) -> Rect {
        self.wrapped.bounds_get()
    }

    fn has_changed(&self) -> bool {
        self.wrapped.has_changed()
    }

    fn sw_setup(&mut self, surface: &Surface, _state: &RendererState) -> Result<SpanFn, RendererError> {
        self.wrapped.sw_setup(surface)?;
        let wrapped = self.wrapped.clone();
        Ok(Box::new(move |x, y, len, dst: &mut [u32]| {
            wrapped.draw_span(x, y, len, dst);
        }))
    }

    fn sw_cleanup(&mut self, surface: &Surface) {
        self.wrapped.sw_cleanup(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Buffer, PixelFormat};
    use crate::renderer_solid::Solid;

    fn solid(color: u32) -> Renderer {
        let r = Renderer::new(Box::new(Solid));
        r.color_set(color);
        r
    }

    #[test]
    fn compound_bottom_fill_top_blend_composites_correctly() {
        let bottom = Layer { renderer: solid(0xFFFF0000), rop: Rop::Fill };
        let top = Layer { renderer: solid(0x80000000), rop: Rop::Blend };
        let r = Renderer::new(Box::new(Compound { layers: vec![bottom, top] }));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 4, 4).unwrap());
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(0, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 4) };
            assert_eq!(pixels[0], 0xFF7F0000);
        });
    }

    #[test]
    fn transition_midpoint_averages_colors() {
        let r = Renderer::new(Box::new(Transition { source: solid(0xFFFF0000), target: solid(0xFF0000FF), level: 0.5 }));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 4, 4).unwrap());
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(0, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 4) };
            let p = pixels[0];
            let r_ch = (p >> 16) & 0xff;
            let b_ch = p & 0xff;
            assert!((r_ch as i32 - 0x7F).abs() <= 1);
            assert!((b_ch as i32 - 0x7F).abs() <= 1);
        });
    }

    #[test]
    fn clipper_leaves_pixels_outside_clip_untouched() {
        let r = Renderer::new(Box::new(Clipper { content: solid(0xFFFF0000), clip: IntRect { x: 1, y: 1, w: 2, h: 2 } }));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 4, 4).unwrap());
        surface.buffer().with_row_mut(0, |row| {
            let pixels: &mut [u32] = unsafe { std::slice::from_raw_parts_mut(row.as_mut_ptr() as *mut u32, 4) };
            pixels.fill(0xFF00FF00);
        });
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(0, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 4) };
            assert_eq!(pixels[0], 0xFF00FF00);
        });
    }
}
