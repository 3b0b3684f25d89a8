//! Curve normalizer (C3): expands a [`crate::path::Path`] command stream
//! into straight-line polygons by recursive subdivision bounded by a
//! flatness threshold.
//!
//! Quadratic/cubic subdivision is a from-scratch recursive de Casteljau
//! walk grounded on the same algorithm `curves.rs`'s `Curve3Div`/
//! `Curve4Div` use, simplified to the flatness-only termination rule
//! spec.md §4.3 calls for (AGG's own `Curve4Div` additionally tracks an
//! angle tolerance and cusp limit, which this module does not need).
//! Arc-to-cubic conversion reuses `bezier_arc::BezierArcSvg`'s endpoint
//! parameterization unchanged.

use crate::bezier_arc::BezierArcSvg;
use crate::figure::{Figure, Polygon};
use crate::math::calc_sq_distance;
use crate::path::{Path, PathCommand};

/// Default flatness threshold in post-transform device space (spec.md §4.3).
pub const DEFAULT_FLATNESS: f64 = 1.0 / 256.0;

/// Recursion depth cap; a segment is emitted as a line once reached even if
/// the flatness test has not yet passed (spec.md §4.3).
pub const MAX_RECURSION_DEPTH: u32 = 10;

#[derive(Debug, Clone, Copy)]
struct Vtx {
    x: f64,
    y: f64,
}

/// Walks a [`Path`], resolving smooth/arc segments and flattening curves,
/// emitting the result into a [`Figure`].
pub struct CurveNormalizer {
    pub flatness: f64,
    last: Vtx,
    start: Vtx,
    /// Reflection point for `SmoothQuadTo`/`SmoothCubicTo`, `None` when the
    /// previous command was not a curve (spec.md §4.3 + SPEC_FULL.md §3.3).
    last_ctrl: Option<Vtx>,
    figure: Figure,
    has_open_polygon: bool,
}

impl CurveNormalizer {
    pub fn new() -> Self {
        Self {
            flatness: DEFAULT_FLATNESS,
            last: Vtx { x: 0.0, y: 0.0 },
            start: Vtx { x: 0.0, y: 0.0 },
            last_ctrl: None,
            figure: Figure::new(),
            has_open_polygon: false,
        }
    }

    pub fn with_flatness(flatness: f64) -> Self {
        Self { flatness, ..Self::new() }
    }

    /// Normalize `path` into a fresh [`Figure`] of straight-line polygons.
    pub fn normalize(path: &Path) -> Figure {
        let mut n = Self::new();
        n.run(path);
        n.figure
    }

    fn current_polygon(&mut self) -> &mut Polygon {
        if !self.has_open_polygon {
            self.figure.add_polygon();
            self.has_open_polygon = true;
        }
        self.figure.polygons.last_mut().unwrap()
    }

    fn emit_point(&mut self, p: Vtx) {
        self.current_polygon().add_point(crate::matrix::Point { x: p.x, y: p.y });
        self.last = p;
    }

    fn run(&mut self, path: &Path) {
        for cmd in &path.commands {
            match *cmd {
                PathCommand::MoveTo { x, y } => {
                    self.has_open_polygon = false;
                    self.start = Vtx { x, y };
                    self.last = self.start;
                    self.last_ctrl = None;
                    self.emit_point(self.start);
                }
                PathCommand::LineTo { x, y } => {
                    self.last_ctrl = None;
                    self.emit_point(Vtx { x, y });
                }
                PathCommand::QuadTo { cx, cy, x, y } => {
                    let p0 = self.last;
                    let c = Vtx { x: cx, y: cy };
                    let p1 = Vtx { x, y };
                    self.last_ctrl = Some(c);
                    self.flatten_quad(p0, c, p1, 0);
                }
                PathCommand::SmoothQuadTo { x, y } => {
                    let p0 = self.last;
                    let c = self.reflect(p0);
                    let p1 = Vtx { x, y };
                    self.last_ctrl = Some(c);
                    self.flatten_quad(p0, c, p1, 0);
                }
                PathCommand::CubicTo { cx0, cy0, cx1, cy1, x, y } => {
                    let p0 = self.last;
                    let c0 = Vtx { x: cx0, y: cy0 };
                    let c1 = Vtx { x: cx1, y: cy1 };
                    let p1 = Vtx { x, y };
                    self.last_ctrl = Some(c1);
                    self.flatten_cubic(p0, c0, c1, p1, 0);
                }
                PathCommand::SmoothCubicTo { cx, cy, x, y } => {
                    let p0 = self.last;
                    let c0 = self.reflect(p0);
                    let c1 = Vtx { x: cx, y: cy };
                    let p1 = Vtx { x, y };
                    self.last_ctrl = Some(c1);
                    self.flatten_cubic(p0, c0, c1, p1, 0);
                }
                PathCommand::ArcTo { rx, ry, angle, large, sweep, x, y } => {
                    self.last_ctrl = None;
                    self.flatten_arc(rx, ry, angle, large, sweep, x, y);
                }
                PathCommand::Close { close } => {
                    if close && self.has_open_polygon {
                        self.current_polygon().close();
                    }
                    self.last_ctrl = None;
                    self.last = self.start;
                }
            }
        }
    }

    /// Reflect the previous curve's final control point through the
    /// current position, falling back to the current position when the
    /// previous segment was not a curve (SPEC_FULL.md §3.3).
    fn reflect(&self, current: Vtx) -> Vtx {
        match self.last_ctrl {
            Some(prev) => Vtx { x: 2.0 * current.x - prev.x, y: 2.0 * current.y - prev.y },
            None => current,
        }
    }

    fn flatten_quad(&mut self, p0: Vtx, c: Vtx, p1: Vtx, depth: u32) {
        if depth >= MAX_RECURSION_DEPTH || quad_is_flat(p0, c, p1, self.flatness) {
            self.emit_point(p1);
            return;
        }
        let p01 = midpoint(p0, c);
        let p12 = midpoint(c, p1);
        let p012 = midpoint(p01, p12);
        self.flatten_quad(p0, p01, p012, depth + 1);
        self.flatten_quad(p012, p12, p1, depth + 1);
    }

    fn flatten_cubic(&mut self, p0: Vtx, c0: Vtx, c1: Vtx, p1: Vtx, depth: u32) {
        if depth >= MAX_RECURSION_DEPTH || cubic_is_flat(p0, c0, c1, p1, self.flatness) {
            self.emit_point(p1);
            return;
        }
        let p01 = midpoint(p0, c0);
        let p12 = midpoint(c0, c1);
        let p23 = midpoint(c1, p1);
        let p012 = midpoint(p01, p12);
        let p123 = midpoint(p12, p23);
        let p0123 = midpoint(p012, p123);
        self.flatten_cubic(p0, p01, p012, p0123, depth + 1);
        self.flatten_cubic(p0123, p123, p23, p1, depth + 1);
    }

    #[allow(clippy::too_many_arguments)]
    fn flatten_arc(&mut self, rx: f64, ry: f64, angle: f64, large: bool, sweep: bool, x: f64, y: f64) {
        let p0 = self.last;
        if rx.abs() < 1e-12 || ry.abs() < 1e-12 {
            self.emit_point(Vtx { x, y });
            return;
        }
        let svg = BezierArcSvg::new_with_params(p0.x, p0.y, rx, ry, angle, large, sweep, x, y);
        let verts = svg.vertices();
        let n = svg.num_vertices();
        if n < 8 {
            self.emit_point(Vtx { x, y });
            return;
        }
        // verts holds [x0,y0, cx0,cy0, cx1,cy1, x1,y1, cx0,cy0, cx1,cy1, x2,y2, ...]
        // first point is the current position; walk remaining cubic groups.
        let mut i = 2;
        let mut cur = p0;
        while i + 5 < n {
            let c0 = Vtx { x: verts[i], y: verts[i + 1] };
            let c1 = Vtx { x: verts[i + 2], y: verts[i + 3] };
            let p1 = Vtx { x: verts[i + 4], y: verts[i + 5] };
            self.flatten_cubic(cur, c0, c1, p1, 0);
            cur = p1;
            i += 6;
        }
    }
}

impl Default for CurveNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn midpoint(a: Vtx, b: Vtx) -> Vtx {
    Vtx { x: (a.x + b.x) * 0.5, y: (a.y + b.y) * 0.5 }
}

/// Maximum deviation of point `p` from the chord `(a,b)`, squared.
fn point_to_chord_sq_distance(p: Vtx, a: Vtx, b: Vtx) -> f64 {
    calc_sq_distance(p.x, p.y, a.x, a.y).min(calc_sq_distance(p.x, p.y, b.x, b.y)).min({
        // perpendicular distance when the foot of the perpendicular lies on the segment
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq < 1e-30 {
            f64::INFINITY
        } else {
            let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq;
            if (0.0..=1.0).contains(&t) {
                let proj = Vtx { x: a.x + t * dx, y: a.y + t * dy };
                calc_sq_distance(p.x, p.y, proj.x, proj.y)
            } else {
                f64::INFINITY
            }
        }
    })
}

fn quad_is_flat(p0: Vtx, c: Vtx, p1: Vtx, flatness: f64) -> bool {
    point_to_chord_sq_distance(c, p0, p1) <= flatness * flatness
}

fn cubic_is_flat(p0: Vtx, c0: Vtx, c1: Vtx, p1: Vtx, flatness: f64) -> bool {
    let tol = flatness * flatness;
    point_to_chord_sq_distance(c0, p0, p1) <= tol && point_to_chord_sq_distance(c1, p0, p1) <= tol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_lines_pass_through_unchanged() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).line_to(10.0, 0.0).line_to(10.0, 10.0);
        let fig = CurveNormalizer::normalize(&p);
        assert_eq!(fig.polygons.len(), 1);
        assert_eq!(fig.polygons[0].points.len(), 3);
    }

    #[test]
    fn quad_curve_flattens_into_multiple_points() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).quad_to(50.0, 100.0, 100.0, 0.0);
        let fig = CurveNormalizer::normalize(&p);
        assert!(fig.polygons[0].points.len() > 2);
        let last = *fig.polygons[0].points.last().unwrap();
        assert!((last.x - 100.0).abs() < 1e-9);
        assert!((last.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn smooth_cubic_without_prior_curve_uses_current_point_as_control() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).smooth_cubic_to(10.0, 0.0, 20.0, 10.0);
        let fig = CurveNormalizer::normalize(&p);
        let last = *fig.polygons[0].points.last().unwrap();
        assert!((last.x - 20.0).abs() < 1e-6);
        assert!((last.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn close_marks_polygon_closed() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).line_to(10.0, 0.0).line_to(10.0, 10.0).close();
        let fig = CurveNormalizer::normalize(&p);
        assert!(fig.polygons[0].closed);
    }

    #[test]
    fn arc_to_produces_line_for_zero_radius() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).arc_to(0.0, 0.0, 0.0, false, true, 10.0, 10.0);
        let fig = CurveNormalizer::normalize(&p);
        let last = *fig.polygons[0].points.last().unwrap();
        assert_eq!((last.x, last.y), (10.0, 10.0));
    }

    #[test]
    fn recursion_depth_is_capped() {
        // A degenerate "curve" whose control point never converges should
        // still terminate via the depth cap rather than recursing forever.
        let mut p = Path::new();
        p.move_to(0.0, 0.0).quad_to(1e6, 1e6, 1.0, 1.0);
        let fig = CurveNormalizer::with_flatness(1e-12).run_and_take(&p);
        assert!(fig.polygons[0].points.len() < (1 << (MAX_RECURSION_DEPTH + 2)));
    }

    impl CurveNormalizer {
        fn run_and_take(mut self, path: &Path) -> Figure {
            self.run(path);
            self.figure
        }
    }
}
