//! Concrete leaf renderers backed by a flat color pattern: Solid,
//! Checker, Stripes (spec.md §4.8 "Concrete leaf contracts").
//!
//! Grounded on the driver contract in [`crate::renderer`]; the per-pixel
//! math (tile/stripe index + antialiased edge) follows the same
//! coverage-via-distance-to-boundary idea as
//! `examples/original_source`'s rasterizer edge evaluation, simplified
//! to one axis since these patterns have no curved boundary.

use crate::error::RendererError;
use crate::matrix::Rect;
use crate::renderer::{RendererOps, RendererState, SpanFn};
use crate::span_compositor::{interp_256, Rop};
use crate::surface::Surface;

/// Fills its entire (infinite) bounds with one color, via `Fill` or
/// `Blend` depending on the shared `rop` (spec.md §4.8 "Solid/Background
/// fills w/ color via Fill/Blend span").
pub struct Solid;

impl RendererOps for Solid {
    fn base_name(&self) -> &'static str {
        "solid"
    }

    fn bounds(&self) -> Rect {
        Rect { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY, w: f64::INFINITY, h: f64::INFINITY }
    }

    fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
        let color = state.color;
        let rop = state.rop;
        Ok(Box::new(move |_x, _y, len, dst: &mut [u32]| {
            for px in dst.iter_mut().take(len) {
                *px = match rop {
                    Rop::Fill => color,
                    Rop::Blend => crate::span_compositor::blend_over(color, *px),
                };
            }
        }))
    }

    fn sw_cleanup(&mut self, _surface: &Surface) {}
}

/// Tiles two colors on a `w x h` grid, with antialiased tile boundaries
/// along the (transformed) x axis — since the driver already walks rows
/// in device space, only the x boundary needs subpixel treatment here;
/// the y boundary is resolved by which row `sw_fill` is called for.
pub struct Checker {
    pub tile_w: f64,
    pub tile_h: f64,
    pub color_a: u32,
    pub color_b: u32,
}

impl RendererOps for Checker {
    fn base_name(&self) -> &'static str {
        "checker"
    }

    fn bounds(&self) -> Rect {
        Rect { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY, w: f64::INFINITY, h: f64::INFINITY }
    }

    fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
        if self.tile_w <= 0.0 || self.tile_h <= 0.0 {
            return Err(RendererError::InvalidGeometry("checker tile size <= 0".to_string()));
        }
        let (a, b) = (self.color_a, self.color_b);
        let (tw, th) = (self.tile_w, self.tile_h);
        let rop = state.rop;
        Ok(Box::new(move |x0, y, len, dst: &mut [u32]| {
            let row_parity = (y as f64 / th).floor() as i64 & 1;
            for (i, px) in dst.iter_mut().take(len).enumerate() {
                let x = x0 + i as i32;
                let col_parity = (x as f64 / tw).floor() as i64 & 1;
                let parity = (row_parity ^ col_parity) & 1;
                let tile_x = x as f64 - (x as f64 / tw).floor() * tw;
                let edge_dist = tile_x.min(tw - tile_x);
                let coverage = (edge_dist.min(0.5) / 0.5).clamp(0.0, 1.0);
                let near = if parity == 0 { a } else { b };
                let far = if parity == 0 { b } else { a };
                let factor = (coverage * 256.0).round().clamp(0.0, 256.0) as u32;
                let color = interp_256(factor, near, far);
                *px = match rop {
                    Rop::Fill => color,
                    Rop::Blend => crate::span_compositor::blend_over(color, *px),
                };
            }
        }))
    }

    fn sw_cleanup(&mut self, _surface: &Surface) {}
}

/// Horizontal bands alternating between two colors, each with its own
/// thickness, antialiased at the band edges (spec.md §4.8 "Stripes").
pub struct Stripes {
    pub thickness_a: f64,
    pub thickness_b: f64,
    pub color_a: u32,
    pub color_b: u32,
}

impl RendererOps for Stripes {
    fn base_name(&self) -> &'static str {
        "stripes"
    }

    fn bounds(&self) -> Rect {
        Rect { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY, w: f64::INFINITY, h: f64::INFINITY }
    }

    fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
        if self.thickness_a <= 0.0 || self.thickness_b <= 0.0 {
            return Err(RendererError::InvalidGeometry("stripe thickness <= 0".to_string()));
        }
        let period = self.thickness_a + self.thickness_b;
        let (ta, a, b) = (self.thickness_a, self.color_a, self.color_b);
        let rop = state.rop;
        Ok(Box::new(move |_x0, y, len, dst: &mut [u32]| {
            let within = y as f64 - (y as f64 / period).floor() * period;
            let (near, far, edge_dist) = if within < ta {
                (a, b, (ta - within).min(within))
            } else {
                (b, a, (period - within).min(within - ta))
            };
            let coverage = (edge_dist.min(0.5) / 0.5).clamp(0.0, 1.0);
            let factor = (coverage * 256.0).round().clamp(0.0, 256.0) as u32;
            let color = interp_256(factor, near, far);
            for px in dst.iter_mut().take(len) {
                *px = match rop {
                    Rop::Fill => color,
                    Rop::Blend => crate::span_compositor::blend_over(color, *px),
                };
            }
        }))
    }

    fn sw_cleanup(&mut self, _surface: &Surface) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Buffer, PixelFormat};
    use crate::renderer::Renderer;

    #[test]
    fn solid_fills_surface_with_color() {
        let r = Renderer::new(Box::new(Solid));
        r.color_set(0xFF808080);
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 32, 32).unwrap());
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(10, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 32) };
            assert!(pixels.iter().all(|&p| p == 0xFF808080));
        });
    }

    #[test]
    fn checker_rejects_zero_tile_size() {
        let mut c = Checker { tile_w: 0.0, tile_h: 4.0, color_a: 0xFFFFFFFF, color_b: 0xFF000000 };
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 4, 4).unwrap());
        let state = RendererState::default();
        assert!(c.sw_setup(&surface, &state).is_err());
    }

    #[test]
    fn stripes_alternate_far_from_edges() {
        let mut s = Stripes { thickness_a: 10.0, thickness_b: 10.0, color_a: 0xFFFFFFFF, color_b: 0xFF000000 };
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 4, 4).unwrap());
        let state = RendererState::default();
        let span_fn = s.sw_setup(&surface, &state).unwrap();
        let mut row_a = vec![0u32; 4];
        span_fn(0, 5, 4, &mut row_a);
        let mut row_b = vec![0u32; 4];
        span_fn(0, 15, 4, &mut row_b);
        assert_ne!(row_a[0], row_b[0]);
    }
}
