//! Image renderer: samples a source [`Buffer`] through the destination
//! renderer's transform with a chosen quality level (spec.md §4.8
//! "Image"). Grounded on the teacher's `image_accessors.rs`/
//! `image_filters.rs` (nearest/bilinear sample accessors) and
//! `rendering_buffer.rs`'s row-pointer addressing, adapted from AGG's
//! generic `span_image_filter` templates down to the three concrete
//! quality levels spec.md names.

use crate::buffer::Buffer;
use crate::error::RendererError;
use crate::matrix::{Matrix, Rect};
use crate::renderer::{RendererOps, RendererState, SpanFn};
use crate::span_compositor::Rop;
use crate::surface::Surface;

/// Sampling quality (spec.md §4.8: "Fast(nearest)/Good(bilinear)/
/// Best(pre-downscale+bilinear shrink>=2x)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Fast,
    Good,
    Best,
}

/// Reads one premultiplied ARGB8888 pixel from `buf` at `(x, y)`,
/// returning transparent for out-of-range coordinates (spec.md §4.8
/// "out-of-range = transparent").
fn sample_nearest(buf: &Buffer, x: i32, y: i32) -> u32 {
    let (w, h) = buf.size();
    if x < 0 || y < 0 || x as u32 >= w || y as u32 >= h {
        return 0;
    }
    buf.with_row(y as u32, |row| {
        let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, w as usize) };
        pixels[x as usize]
    })
    .unwrap_or(0)
}

fn channel(p: u32, shift: u32) -> u32 {
    (p >> shift) & 0xff
}

fn sample_bilinear(buf: &Buffer, fx: f64, fy: f64) -> u32 {
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let x0 = x0 as i32;
    let y0 = y0 as i32;

    let p00 = sample_nearest(buf, x0, y0);
    let p10 = sample_nearest(buf, x0 + 1, y0);
    let p01 = sample_nearest(buf, x0, y0 + 1);
    let p11 = sample_nearest(buf, x0 + 1, y0 + 1);

    let mut out = 0u32;
    for shift in [24, 16, 8, 0] {
        let top = channel(p00, shift) as f64 * (1.0 - tx) + channel(p10, shift) as f64 * tx;
        let bottom = channel(p01, shift) as f64 * (1.0 - tx) + channel(p11, shift) as f64 * tx;
        let v = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u32;
        out |= v << shift;
    }
    out
}

/// Pre-downscale a source buffer by box-averaging `factor x factor`
/// blocks, used by [`Quality::Best`] when shrinking by 2x or more
/// (spec.md §4.8).
fn box_downscale(buf: &Buffer, factor: u32) -> Buffer {
    let (w, h) = buf.size();
    let new_w = (w / factor).max(1);
    let new_h = (h / factor).max(1);
    let out = Buffer::new(buf.format(), new_w, new_h).expect("downscale size is always >= 1");
    for oy in 0..new_h {
        out.with_row_mut(oy, |row| {
            let out_pixels: &mut [u32] = unsafe { std::slice::from_raw_parts_mut(row.as_mut_ptr() as *mut u32, new_w as usize) };
            for (ox, px) in out_pixels.iter_mut().enumerate() {
                let mut sums = [0u64; 4];
                let mut count = 0u64;
                for dy in 0..factor {
                    for dx in 0..factor {
                        let sx = ox as u32 * factor + dx;
                        let sy = oy * factor + dy;
                        if sx < w && sy < h {
                            let p = sample_nearest(buf, sx as i32, sy as i32);
                            for (k, shift) in [24u32, 16, 8, 0].into_iter().enumerate() {
                                sums[k] += channel(p, shift) as u64;
                            }
                            count += 1;
                        }
                    }
                }
                let count = count.max(1);
                *px = ((sums[0] / count) as u32) << 24
                    | ((sums[1] / count) as u32) << 16
                    | ((sums[2] / count) as u32) << 8
                    | (sums[3] / count) as u32;
            }
        });
    }
    out
}

pub struct Image {
    pub source: Buffer,
    pub quality: Quality,
}

impl RendererOps for Image {
    fn base_name(&self) -> &'static str {
        "image"
    }

    fn bounds(&self) -> Rect {
        let (w, h) = self.source.size();
        Rect { x: 0.0, y: 0.0, w: w as f64, h: h as f64 }
    }

    fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
        let (w, h) = self.source.size();
        let shrink_factor = {
            // Best quality pre-downscales when the renderer's own
            // transform shrinks the image by 2x or more on either axis.
            let sx = (state.transformation.xx.hypot(state.transformation.yx)).max(1e-9);
            let sy = (state.transformation.xy.hypot(state.transformation.yy)).max(1e-9);
            let min_scale = sx.min(sy);
            if min_scale > 0.0 && min_scale < 0.5 {
                (1.0 / min_scale).floor() as u32
            } else {
                1
            }
        };

        let effective_source = if self.quality == Quality::Best && shrink_factor >= 2 {
            box_downscale(&self.source, shrink_factor)
        } else {
            self.source.clone()
        };

        let inverse = state.transformation.inverse().ok_or(RendererError::SingularMatrix)?;
        let (ox, oy) = state.origin;
        let quality = if self.quality == Quality::Best { Quality::Good } else { self.quality };
        let (_ew, _eh) = (w, h);
        let rop = state.rop;

        Ok(Box::new(move |x0, y, len, dst: &mut [u32]| {
            for (i, px) in dst.iter_mut().take(len).enumerate() {
                let dx = (x0 + i as i32) as f64 - ox;
                let dy = y as f64 - oy;
                let src_pt = inverse.point_transform(crate::matrix::Point { x: dx, y: dy });
                let sample = match quality {
                    Quality::Fast => sample_nearest(&effective_source, src_pt.x.round() as i32, src_pt.y.round() as i32),
                    Quality::Good | Quality::Best => sample_bilinear(&effective_source, src_pt.x, src_pt.y),
                };
                *px = match rop {
                    Rop::Fill => sample,
                    Rop::Blend => crate::span_compositor::blend_over(sample, *px),
                };
            }
        }))
    }

    fn sw_cleanup(&mut self, _surface: &Surface) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelFormat;
    use crate::renderer::Renderer;

    fn two_by_two() -> Buffer {
        let b = Buffer::new(PixelFormat::Argb8888Pre, 2, 2).unwrap();
        let colors = [0xFFFF0000u32, 0xFF00FF00, 0xFF0000FF, 0xFF000000];
        for (y, chunk) in colors.chunks(2).enumerate() {
            b.with_row_mut(y as u32, |row| {
                let pixels: &mut [u32] = unsafe { std::slice::from_raw_parts_mut(row.as_mut_ptr() as *mut u32, 2) };
                pixels.copy_from_slice(chunk);
            });
        }
        b
    }

    #[test]
    fn nearest_identity_reproduces_source_pixel() {
        let src = two_by_two();
        assert_eq!(sample_nearest(&src, 0, 0), 0xFFFF0000);
        assert_eq!(sample_nearest(&src, 1, 1), 0xFF000000);
    }

    #[test]
    fn out_of_range_nearest_is_transparent() {
        let src = two_by_two();
        assert_eq!(sample_nearest(&src, -1, 0), 0);
        assert_eq!(sample_nearest(&src, 5, 5), 0);
    }

    #[test]
    fn identity_image_render_reproduces_corners() {
        let src = two_by_two();
        let r = Renderer::new(Box::new(Image { source: src, quality: Quality::Fast }));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 2, 2).unwrap());
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(0, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 2) };
            assert_eq!(pixels[0], 0xFFFF0000);
        });
    }

    #[test]
    fn box_downscale_halves_dimensions() {
        let src = Buffer::new(PixelFormat::Argb8888Pre, 4, 4).unwrap();
        let down = box_downscale(&src, 2);
        assert_eq!(down.size(), (2, 2));
    }
}
