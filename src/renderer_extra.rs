//! Image-domain and compositing renderer variants spec.md §4.8 names
//! but that don't fit neatly under solid/gradient/image/compound:
//! Pattern, Hswitch, Perlin, RadialDistortion, DisplacementMap.
//!
//! Grounded on `examples/original_source/src/lib/renderer/filter/hswitch.c`
//! (Hswitch's left/right split at `w - w*step`),
//! `examples/original_source/src/lib/util/enesim_perlin.c` (the noise
//! lattice + interpolation), `examples/original_source/src/lib/renderer/
//! enesim_renderer_dispmap.h` (displacement map's two-surface contract),
//! and `examples/original_source/src/lib/renderer/enesim_renderer_pattern.h`
//! (pattern's windowed source tiling). Per spec.md §9 Open Question 4,
//! these four have only identity/affine source material; the projective
//! path is therefore handled by falling back to the renderer's own
//! affine component (the same recovery spec.md §7 already specifies for
//! a singular matrix), not by a from-scratch projective derivation.

use crate::buffer::Buffer;
use crate::error::RendererError;
use crate::matrix::Rect;
use crate::renderer::{Renderer, RendererOps, RendererState, SpanFn};
use crate::span_compositor::{interp_256, Rop};
use crate::surface::Surface;

fn sample_argb(buf: &Buffer, x: i32, y: i32) -> u32 {
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

/// Tiles `source` across the plane, windowed to `window` in source
/// space before wrapping (spec.md §4.8 "Pattern: repeating source in a
/// window").
pub struct Pattern {
    pub source: Buffer,
    pub window_w: u32,
    pub window_h: u32,
}

impl RendererOps for Pattern {
    fn base_name(&self) -> &'static str {
        "pattern"
    }

    fn bounds(&self) -> Rect {
        Rect { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY, w: f64::INFINITY, h: f64::INFINITY }
    }

    fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
        if self.window_w == 0 || self.window_h == 0 {
            return Err(RendererError::InvalidGeometry("pattern window size <= 0".to_string()));
        }
        let source = self.source.clone();
        let (ww, wh) = (self.window_w as i32, self.window_h as i32);
        let rop = state.rop;
        Ok(Box::new(move |x0, y, len, dst: &mut [u32]| {
            let sy = y.rem_euclid(wh);
            for (i, px) in dst.iter_mut().take(len).enumerate() {
                let sx = (x0 + i as i32).rem_euclid(ww);
                let color = sample_argb(&source, sx, sy);
                *px = match rop {
                    Rop::Fill => color,
                    Rop::Blend => crate::span_compositor::blend_over(color, *px),
                };
            }
        }))
    }

    fn sw_cleanup(&mut self, _surface: &Surface) {}
}

/// Horizontal dissolve between two child renderers, split at
/// `w - w * step` and antialiased at the seam (spec.md §4.8
/// "Hswitch"), grounded on `hswitch.c`'s `_generic_good`.
pub struct Hswitch {
    pub left: Renderer,
    pub right: Renderer,
    pub w: u32,
    pub step: f64,
}

impl RendererOps for Hswitch {
    fn base_name(&self) -> &'static str {
        "hswitch"
    }

    fn bounds(&self) -> Rect {
        self.left.bounds_get()
    }

    fn has_changed(&self) -> bool {
        self.left.has_changed() || self.right.has_changed()
    }

    fn sw_setup(&mut self, surface: &Surface, _state: &RendererState) -> Result<SpanFn, RendererError> {
        if self.w == 0 {
            return Err(RendererError::InvalidGeometry("hswitch w <= 0".to_string()));
        }
        let step = self.step.clamp(0.0, 1.0);
        self.left.sw_setup(surface)?;
        if let Err(e) = self.right.sw_setup(surface) {
            self.left.sw_cleanup(surface);
            return Err(e);
        }
        let left = self.left.clone();
        let right = self.right.clone();
        let mx_f = self.w as f64 - self.w as f64 * step;
        let mx = mx_f.floor() as i32;
        let frac = mx_f - mx_f.floor();
        Ok(Box::new(move |x0, y, len, dst: &mut [u32]| {
            for (i, px) in dst.iter_mut().take(len).enumerate() {
                let x = x0 + i as i32;
                let mut p0 = 0u32;
                if x > mx {
                    right.draw_span(x, y, 1, std::slice::from_mut(&mut p0));
                } else if x < mx {
                    left.draw_span(x, y, 1, std::slice::from_mut(&mut p0));
                } else {
                    let mut p_left = 0u32;
                    let mut p_right = 0u32;
                    left.draw_span(x, y, 1, std::slice::from_mut(&mut p_left));
                    right.draw_span(0, y, 1, std::slice::from_mut(&mut p_right));
                    let factor = (frac * 256.0).round().clamp(0.0, 256.0) as u32;
                    p0 = interp_256(factor, p_right, p_left);
                }
                *px = p0;
            }
        }))
    }

    fn sw_cleanup(&mut self, surface: &Surface) {
        self.left.sw_cleanup(surface);
        self.right.sw_cleanup(surface);
    }
}

/// One lattice-noise octave's frequency/amplitude coefficients, matching
/// `enesim_perlin_coeff_set`'s `per^i` / `2^i * freq` progression.
fn perlin_coeffs(octaves: u32, persistence: f64, xfreq: f64, yfreq: f64, amplitude: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut xfreqs = vec![xfreq * 2.0];
    let mut yfreqs = vec![yfreq * 2.0];
    let mut ampls = vec![amplitude * persistence];
    for i in 1..octaves as usize {
        xfreqs.push(xfreqs[i - 1] * 2.0);
        yfreqs.push(yfreqs[i - 1] * 2.0);
        ampls.push(ampls[i - 1] * persistence);
    }
    (xfreqs, yfreqs, ampls)
}

/// Integer-lattice hash noise, grounded on `enesim_perlin.c`'s `noise()`.
fn lattice_noise(x: i32, y: i32) -> f64 {
    let mut n = x.wrapping_add(y.wrapping_mul(57));
    n = (n << 13) ^ n;
    let n = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789221))
        .wrapping_add(1376312589)
        & 0x7fffffff;
    1.0 - (n as f64 / 1073741824.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + (b - a) * t
}

fn interpolated_noise(x: f64, y: f64) -> f64 {
    let ix = x.floor();
    let iy = y.floor();
    let fx = x - ix;
    let fy = y - iy;
    let (ix, iy) = (ix as i32, iy as i32);
    let v1 = lattice_noise(ix, iy);
    let v2 = lattice_noise(ix + 1, iy);
    let v3 = lattice_noise(ix, iy + 1);
    let v4 = lattice_noise(ix + 1, iy + 1);
    let top = lerp(fx, v1, v2);
    let bottom = lerp(fx, v3, v4);
    lerp(fy, top, bottom)
}

/// Tileable multi-octave value noise rendered as a grayscale fill
/// (spec.md §4.8 "perlin" leaf renderer).
pub struct Perlin {
    pub octaves: u32,
    pub persistence: f64,
    pub xfreq: f64,
    pub yfreq: f64,
    pub amplitude: f64,
    pub color: u32,
}

impl RendererOps for Perlin {
    fn base_name(&self) -> &'static str {
        "perlin"
    }

    fn bounds(&self) -> Rect {
        Rect { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY, w: f64::INFINITY, h: f64::INFINITY }
    }

    fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
        if self.octaves == 0 {
            return Err(RendererError::InvalidGeometry("perlin octaves == 0".to_string()));
        }
        let (xfreqs, yfreqs, ampls) = perlin_coeffs(self.octaves, self.persistence, self.xfreq, self.yfreq, self.amplitude);
        let max_ampl: f64 = ampls.iter().sum::<f64>().max(1e-9);
        let color = self.color;
        let rop = state.rop;
        Ok(Box::new(move |x0, y, len, dst: &mut [u32]| {
            for (i, px) in dst.iter_mut().take(len).enumerate() {
                let x = (x0 + i as i32) as f64;
                let mut total = 0.0;
                for k in 0..xfreqs.len() {
                    total += interpolated_noise(x * xfreqs[k], y as f64 * yfreqs[k]) * ampls[k];
                }
                let v = ((total / max_ampl).clamp(-1.0, 1.0) * 0.5 + 0.5).clamp(0.0, 1.0);
                let factor = (v * 256.0).round().clamp(0.0, 256.0) as u32;
                let shade = interp_256(factor, color, color & 0xFF000000);
                *px = match rop {
                    Rop::Fill => shade,
                    Rop::Blend => crate::span_compositor::blend_over(shade, *px),
                };
            }
        }))
    }

    fn sw_cleanup(&mut self, _surface: &Surface) {}
}

/// Perturbs sample coordinates radially from `center` by `factor *
/// distance`, then samples `source` (image-domain distortion; spec.md
/// §4.8 "radial distortion").
pub struct RadialDistortion {
    pub source: Buffer,
    pub center: crate::matrix::Point,
    pub factor: f64,
}

impl RendererOps for RadialDistortion {
    fn base_name(&self) -> &'static str {
        "radialdistortion"
    }

    fn bounds(&self) -> Rect {
        let (w, h) = self.source.size();
        Rect { x: 0.0, y: 0.0, w: w as f64, h: h as f64 }
    }

    fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
        let source = self.source.clone();
        let (cx, cy) = (self.center.x, self.center.y);
        let factor = self.factor;
        let rop = state.rop;
        // Projective transforms fall back to this renderer's affine
        // component, per spec.md §9 Open Question 4.
        let inverse = state.transformation.inverse().unwrap_or_else(crate::matrix::Matrix::identity);
        Ok(Box::new(move |x0, y, len, dst: &mut [u32]| {
            for (i, px) in dst.iter_mut().take(len).enumerate() {
                let p = inverse.point_transform(crate::matrix::Point { x: (x0 + i as i32) as f64, y: y as f64 });
                let dx = p.x - cx;
                let dy = p.y - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let scale = 1.0 + factor * dist;
                let sx = (cx + dx * scale).round() as i32;
                let sy = (cy + dy * scale).round() as i32;
                let color = sample_argb(&source, sx, sy);
                *px = match rop {
                    Rop::Fill => color,
                    Rop::Blend => crate::span_compositor::blend_over(color, *px),
                };
            }
        }))
    }

    fn sw_cleanup(&mut self, _surface: &Surface) {}
}

/// Which color channel of the map surface drives an axis' offset,
/// matching `enesim_renderer_dispmap_{x,y}_channel_set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    fn shift(self) -> u32 {
        match self {
            Channel::A => 24,
            Channel::R => 16,
            Channel::G => 8,
            Channel::B => 0,
        }
    }
}

/// Perturbs `source` sampling coordinates by `map`'s `x_channel`/
/// `y_channel` values scaled by `factor` (spec.md §4.8 "displacement
/// map"), grounded on `enesim_renderer_dispmap.h`'s two-surface
/// contract.
pub struct DisplacementMap {
    pub source: Buffer,
    pub map: Buffer,
    pub factor: f64,
    pub x_channel: Channel,
    pub y_channel: Channel,
}

impl RendererOps for DisplacementMap {
    fn base_name(&self) -> &'static str {
        "dispmap"
    }

    fn bounds(&self) -> Rect {
        let (w, h) = self.source.size();
        Rect { x: 0.0, y: 0.0, w: w as f64, h: h as f64 }
    }

    fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
        let source = self.source.clone();
        let map = self.map.clone();
        let factor = self.factor;
        let (xc, yc) = (self.x_channel, self.y_channel);
        let rop = state.rop;
        Ok(Box::new(move |x0, y, len, dst: &mut [u32]| {
            for (i, px) in dst.iter_mut().take(len).enumerate() {
                let x = x0 + i as i32;
                let m = sample_argb(&map, x, y);
                let dx = (channel(m, xc.shift()) as f64 / 255.0 - 0.5) * factor;
                let dy = (channel(m, yc.shift()) as f64 / 255.0 - 0.5) * factor;
                let color = sample_argb(&source, (x as f64 + dx).round() as i32, (y as f64 + dy).round() as i32);
                *px = match rop {
                    Rop::Fill => color,
                    Rop::Blend => crate::span_compositor::blend_over(color, *px),
                };
            }
        }))
    }

    fn sw_cleanup(&mut self, _surface: &Surface) {}
}
