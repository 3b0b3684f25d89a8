//! Shape renderers: rectangle, circle, ellipse, line, path, figure
//! (spec.md §4.8 "Shape renderers", §3 "Shape state"). Each shape
//! computes a fill path and/or a stroke path, feeds it through
//! [`crate::curve_normalizer`] → [`crate::edge`] → [`crate::bifigure`],
//! and rasterizes the combined coverage.
//!
//! Grounded on the component chain itself (C4→C5→C7 in spec.md §2); the
//! rectangle/circle/ellipse path construction follows the teacher's
//! `rounded_rect.rs`/`ellipse.rs` vertex generators, adapted to emit
//! [`crate::path::Path`] command streams instead of `VertexSource`
//! iterators.

use crate::bifigure::{resolve_solid, BiFigure};
use crate::curve_normalizer::CurveNormalizer;
use crate::edge::EdgeTable;
use crate::error::RendererError;
use crate::figure::Figure;
use crate::matrix::{FixedMatrix, Rect};
use crate::path::Path;
use crate::renderer::{Renderer, RendererOps, RendererState, SpanFn};
use crate::span_compositor::Rop;
use crate::stroke::{dash_split, StrokeCap, StrokeJoin, StrokeLocation, Stroker};
use crate::surface::Surface;

/// Stroke properties (spec.md §3 "Shape state (extension)").
#[derive(Clone)]
pub struct StrokeState {
    pub color: u32,
    /// When set, overrides `color` with this renderer's sampled pixels
    /// (spec.md §3 stroke `_renderer`).
    pub renderer: Option<Renderer>,
    pub weight: f64,
    pub location: StrokeLocation,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
    /// `(dash_len, gap_len)` pairs; empty means a solid stroke.
    pub dashes: Vec<(f64, f64)>,
    pub dash_start: f64,
}

impl Default for StrokeState {
    fn default() -> Self {
        Self { color: 0xFF000000, renderer: None, weight: 0.0, location: StrokeLocation::Center, cap: StrokeCap::Butt, join: StrokeJoin::Miter, dashes: Vec::new(), dash_start: 0.0 }
    }
}

/// Fill properties (spec.md §3 "Shape state (extension)").
#[derive(Clone)]
pub struct FillState {
    pub color: u32,
    /// When set, overrides `color` with this renderer's sampled pixels
    /// (spec.md §3 fill `_renderer`).
    pub renderer: Option<Renderer>,
    pub rule: crate::basics::FillingRule,
}

impl Default for FillState {
    fn default() -> Self {
        Self { color: 0xFFFFFFFF, renderer: None, rule: crate::basics::FillingRule::NonZero }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawMode {
    pub fill: bool,
    pub stroke: bool,
}

impl Default for DrawMode {
    fn default() -> Self {
        Self { fill: true, stroke: false }
    }
}

/// What geometry a [`Shape`] renderer generates.
pub enum Geometry {
    Rectangle { x: f64, y: f64, w: f64, h: f64 },
    Circle { cx: f64, cy: f64, r: f64 },
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64 },
    Line { x0: f64, y0: f64, x1: f64, y1: f64 },
    Path(Path),
    Figure(Figure),
}

impl Geometry {
    fn bounds(&self) -> Rect {
        match self {
            Geometry::Rectangle { x, y, w, h } => Rect { x: *x, y: *y, w: *w, h: *h },
            Geometry::Circle { cx, cy, r } => Rect { x: cx - r, y: cy - r, w: 2.0 * r, h: 2.0 * r },
            Geometry::Ellipse { cx, cy, rx, ry } => Rect { x: cx - rx, y: cy - ry, w: 2.0 * rx, h: 2.0 * ry },
            Geometry::Line { x0, y0, x1, y1 } => {
                let xmin = x0.min(*x1);
                let ymin = y0.min(*y1);
                Rect { x: xmin, y: ymin, w: (x1 - x0).abs(), h: (y1 - y0).abs() }
            }
            Geometry::Path(_) => Rect { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY, w: f64::INFINITY, h: f64::INFINITY },
            Geometry::Figure(f) => {
                let b = f.bounds();
                Rect { x: b.xmin, y: b.ymin, w: b.xmax - b.xmin, h: b.ymax - b.ymin }
            }
        }
    }

    /// Build a closed-path command stream for this geometry, used for
    /// both the fill figure and (before offsetting) the stroke figure.
    fn to_path(&self) -> Option<Path> {
        match self {
            Geometry::Rectangle { x, y, w, h } => {
                let mut p = Path::new();
                p.move_to(*x, *y).line_to(x + w, *y).line_to(x + w, y + h).line_to(*x, y + h).close();
                Some(p)
            }
            Geometry::Circle { cx, cy, r } => {
                if *r <= 0.0 {
                    return None;
                }
                circle_path(*cx, *cy, *r, *r)
            }
            Geometry::Ellipse { cx, cy, rx, ry } => {
                if *rx <= 0.0 || *ry <= 0.0 {
                    return None;
                }
                circle_path(*cx, *cy, *rx, *ry)
            }
            Geometry::Line { x0, y0, x1, y1 } => {
                let mut p = Path::new();
                p.move_to(*x0, *y0).line_to(*x1, *y1);
                Some(p)
            }
            Geometry::Path(p) => Some(p.clone()),
            Geometry::Figure(_) => None,
        }
    }
}

fn circle_path(cx: f64, cy: f64, rx: f64, ry: f64) -> Option<Path> {
    let mut p = Path::new();
    // Four 90-degree arcs approximate the ellipse; ArcTo is normalized
    // exactly (via bezier_arc::BezierArcSvg) by the curve normalizer,
    // so this does not introduce extra flattening error.
    p.move_to(cx + rx, cy);
    p.arc_to(rx, ry, 0.0, false, true, cx, cy + ry);
    p.arc_to(rx, ry, 0.0, false, true, cx - rx, cy);
    p.arc_to(rx, ry, 0.0, false, true, cx, cy - ry);
    p.arc_to(rx, ry, 0.0, false, true, cx + rx, cy);
    p.close();
    Some(p)
}

/// A shape renderer (spec.md §4.8 "Shape renderers"): computes fill and
/// stroke sub-figures from its geometry and rasterizes them together
/// via a [`BiFigure`].
pub struct Shape {
    pub geometry: Geometry,
    pub fill: FillState,
    pub stroke: StrokeState,
    pub draw_mode: DrawMode,
}

impl RendererOps for Shape {
    fn base_name(&self) -> &'static str {
        "shape"
    }

    fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }

    fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
        let fill_figure = match &self.geometry {
            Geometry::Figure(f) => f.clone(),
            _ => {
                let path = self.geometry.to_path().ok_or_else(|| RendererError::InvalidGeometry("degenerate shape".to_string()))?;
                CurveNormalizer::normalize(&path)
            }
        };

        if self.draw_mode.fill && fill_figure.is_empty() {
            return Err(RendererError::InvalidGeometry("shape has no fill geometry".to_string()));
        }

        let fill_table = EdgeTable::build(&fill_figure);

        let stroke_table = if self.draw_mode.stroke && self.stroke.weight > 0.0 {
            let mut stroked = Figure::new();
            let stroker = Stroker { weight: self.stroke.weight, location: self.stroke.location, join: self.stroke.join, cap: self.stroke.cap, miter_limit: 4.0 };
            for polygon in &fill_figure.polygons {
                if self.stroke.dashes.is_empty() {
                    stroker.stroke_polygon(polygon, &mut stroked);
                } else {
                    for segment in dash_split(polygon, &self.stroke.dashes, self.stroke.dash_start) {
                        stroker.stroke_polygon(&segment, &mut stroked);
                    }
                }
            }
            EdgeTable::build(&stroked)
        } else {
            EdgeTable::build(&Figure::new())
        };

        let bifigure = BiFigure::new(fill_table, stroke_table);
        let fixed_matrix = FixedMatrix::from(&state.transformation);
        let class = crate::rasterizer::TransformClass::classify(&fixed_matrix, state.transformation.classify());
        let fill_rule = self.fill.rule;
        let fill_color = self.fill.color;
        let stroke_color = self.stroke.color;
        let fill_half_width = crate::fixed::FIXED_HALF;
        let stroke_half_width = crate::fixed::from_double((self.stroke.weight / 2.0).max(0.5));
        let rop = state.rop;

        let fill_renderer = match &self.fill.renderer {
            Some(r) => {
                r.rop_set(Rop::Fill);
                r.sw_setup(_surface)?;
                Some(r.clone())
            }
            None => None,
        };
        let stroke_renderer = match &self.stroke.renderer {
            Some(r) => {
                r.rop_set(Rop::Fill);
                if let Err(e) = r.sw_setup(_surface) {
                    if let Some(fr) = &fill_renderer {
                        fr.sw_cleanup(_surface);
                    }
                    return Err(e);
                }
                Some(r.clone())
            }
            None => None,
        };

        Ok(Box::new(move |x0, y, len, dst: &mut [u32]| {
            let row = bifigure.composite_row(&fixed_matrix, class, y, x0, len, fill_rule, fill_half_width, stroke_half_width);
            let mut fill_row = vec![0u32; len];
            if let Some(r) = &fill_renderer {
                r.draw_span(x0, y, len, &mut fill_row);
            }
            let mut stroke_row = vec![0u32; len];
            if let Some(r) = &stroke_renderer {
                r.draw_span(x0, y, len, &mut stroke_row);
            }
            for (i, (px, pixel)) in dst.iter_mut().take(len).zip(row.into_iter()).enumerate() {
                let fc = if fill_renderer.is_some() { fill_row[i] } else { fill_color };
                let sc = if stroke_renderer.is_some() { stroke_row[i] } else { stroke_color };
                let color = resolve_solid(pixel, fc, sc);
                *px = match rop {
                    Rop::Fill => color,
                    Rop::Blend => crate::span_compositor::blend_over(color, *px),
                };
            }
        }))
    }

    fn sw_cleanup(&mut self, surface: &Surface) {
        if let Some(r) = &self.fill.renderer {
            r.sw_cleanup(surface);
        }
        if let Some(r) = &self.stroke.renderer {
            r.sw_cleanup(surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Buffer, PixelFormat};
    use crate::renderer::Renderer;

    #[test]
    fn filled_square_path_covers_interior() {
        let mut p = Path::new();
        p.move_to(10.0, 10.0).line_to(20.0, 10.0).line_to(20.0, 20.0).line_to(10.0, 20.0).close();
        let shape = Shape { geometry: Geometry::Path(p), fill: FillState { color: 0xFF00FF00, renderer: None, rule: crate::basics::FillingRule::NonZero }, stroke: StrokeState::default(), draw_mode: DrawMode { fill: true, stroke: false } };
        let r = Renderer::new(Box::new(shape));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 32, 32).unwrap());
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(15, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 32) };
            assert_eq!(pixels[15], 0xFF00FF00);
        });
    }

    #[test]
    fn zero_radius_circle_is_invalid_geometry() {
        let shape = Shape { geometry: Geometry::Circle { cx: 16.0, cy: 16.0, r: 0.0 }, fill: FillState::default(), stroke: StrokeState::default(), draw_mode: DrawMode::default() };
        let r = Renderer::new(Box::new(shape));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 32, 32).unwrap());
        assert!(r.draw(&surface, None, 0, 0, 1).is_err());
    }

    #[test]
    fn circle_with_fill_and_stroke_draws_both() {
        let shape = Shape {
            geometry: Geometry::Circle { cx: 16.0, cy: 16.0, r: 8.0 },
            fill: FillState { color: 0xFFFFFFFF, renderer: None, rule: crate::basics::FillingRule::NonZero },
            stroke: StrokeState { color: 0xFF000000, weight: 2.0, location: StrokeLocation::Center, cap: StrokeCap::Butt, join: StrokeJoin::Miter, ..StrokeState::default() },
            draw_mode: DrawMode { fill: true, stroke: true },
        };
        let r = Renderer::new(Box::new(shape));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 32, 32).unwrap());
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(16, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 32) };
            assert_eq!(pixels[16], 0xFFFFFFFF);
        });
    }

    #[test]
    fn dashed_stroke_produces_gaps_along_the_outline() {
        let shape = Shape {
            geometry: Geometry::Rectangle { x: 4.0, y: 4.0, w: 24.0, h: 24.0 },
            fill: FillState { color: 0, renderer: None, rule: crate::basics::FillingRule::NonZero },
            stroke: StrokeState { color: 0xFFFFFFFF, weight: 2.0, dashes: vec![(4.0, 4.0)], ..StrokeState::default() },
            draw_mode: DrawMode { fill: false, stroke: true },
        };
        let r = Renderer::new(Box::new(shape));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 32, 32).unwrap());
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(4, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 32) };
            assert!(pixels[4] != 0 || pixels[20] != 0);
        });
    }

    #[test]
    fn fill_renderer_source_overrides_fill_color() {
        let source = Renderer::new(Box::new(crate::renderer_solid::Solid));
        source.color_set(0xFF00FF00);
        let mut p = Path::new();
        p.move_to(10.0, 10.0).line_to(20.0, 10.0).line_to(20.0, 20.0).line_to(10.0, 20.0).close();
        let shape = Shape {
            geometry: Geometry::Path(p),
            fill: FillState { color: 0xFFFF0000, renderer: Some(source), rule: crate::basics::FillingRule::NonZero },
            stroke: StrokeState::default(),
            draw_mode: DrawMode { fill: true, stroke: false },
        };
        let r = Renderer::new(Box::new(shape));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 32, 32).unwrap());
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(15, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 32) };
            assert_eq!(pixels[15], 0xFF00FF00);
        });
    }
}
