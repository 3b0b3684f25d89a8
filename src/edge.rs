//! Edge/vector tables (C5): convert a [`Figure`] into an array of
//! fixed-point edges sorted by minimum-y, ready for scanline traversal.
//!
//! Grounded on `examples/original_source/src/lib/rasterizer/enesim_rasterizer_basic.c`'s
//! `Enesim_F16p16_Edge`/`Enesim_F16p16_Vector` fields (`xx0,yy0,xx1,yy1,
//! a,b,c,e,de`) and the per-row stepping it performs
//! (`edge->de = (v->a * axx) >> 16`, `edge->e = ((v->a*xx)>>16) +
//! ((v->b*yy)>>16) + v->c`); the line-equation normalization itself is
//! spelled out in spec.md §4.5 since the original header defining
//! `Enesim_F16p16_Vector` is not part of the retrieved source pack.

use crate::figure::Figure;
use crate::fixed::{self, Fixed};

/// A single fixed-point edge: two endpoints plus a normalized line
/// equation `e(x,y) = a*x + b*y + c` such that `|a|^2 + |b|^2 ≈ 2^16` and
/// `e` approximates signed perpendicular distance in pixels, scaled by
/// `2^16` (spec.md §3 "Edge (fixed point)").
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub xx0: Fixed,
    pub yy0: Fixed,
    pub xx1: Fixed,
    pub yy1: Fixed,
    pub a: Fixed,
    pub b: Fixed,
    pub c: Fixed,
    /// Per-row working state: current value of `e` at the row's leftmost
    /// sampled x, filled in by the rasterizer (C6), not at table build
    /// time.
    pub e: Fixed,
    /// Per-pixel increment of `e`, also filled in by the rasterizer.
    pub de: Fixed,
}

impl Edge {
    /// Build a normalized edge from two double-precision endpoints
    /// already in device space.
    fn from_segment(x0: f64, y0: f64, x1: f64, y1: f64) -> Option<Edge> {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1e-9 {
            return None;
        }
        let f = 65536.0_f64;
        let a = -dy * f / len;
        let b = dx * f / len;
        let c = f * (y1 * x0 - x1 * y0) / len;

        let (yy0, yy1, xx0, xx1) = if y0 <= y1 { (y0, y1, x0, x1) } else { (y1, y0, x1, x0) };

        Some(Edge {
            xx0: fixed::from_double(xx0),
            yy0: fixed::from_double(yy0),
            xx1: fixed::from_double(xx1),
            yy1: fixed::from_double(yy1),
            a: fixed::from_double(a),
            b: fixed::from_double(b),
            c: fixed::from_double(c),
            e: 0,
            de: 0,
        })
    }

    /// min/max x of the edge in fixed point, accounting for the
    /// min/max-y-based endpoint swap performed at construction (which
    /// does not guarantee x ordering).
    pub fn x_range(&self) -> (Fixed, Fixed) {
        if self.xx0 <= self.xx1 {
            (self.xx0, self.xx1)
        } else {
            (self.xx1, self.xx0)
        }
    }
}

/// Fixed-point bounds of a built edge table, matching the `{lxx, rxx,
/// tyy, byy}` the original rasterizer caches per figure.
#[derive(Debug, Clone, Copy)]
pub struct EdgeBounds {
    pub lxx: Fixed,
    pub rxx: Fixed,
    pub tyy: Fixed,
    pub byy: Fixed,
}

/// A figure's edges, sorted by ascending minimum-y, plus cached bounds.
#[derive(Debug, Clone)]
pub struct EdgeTable {
    pub edges: Vec<Edge>,
    pub bounds: EdgeBounds,
}

impl EdgeTable {
    /// Build an edge table from every segment of every polygon in
    /// `figure`. Degenerate (near-zero-length) segments are dropped.
    pub fn build(figure: &Figure) -> EdgeTable {
        let mut edges = Vec::new();
        for polygon in &figure.polygons {
            for (p0, p1) in polygon.edges() {
                if let Some(e) = Edge::from_segment(p0.x, p0.y, p1.x, p1.y) {
                    edges.push(e);
                }
            }
        }
        edges.sort_by_key(|e| e.yy0);

        let mut lxx = Fixed::MAX;
        let mut rxx = Fixed::MIN;
        let mut tyy = Fixed::MAX;
        let mut byy = Fixed::MIN;
        for e in &edges {
            let (x0, x1) = e.x_range();
            lxx = lxx.min(x0);
            rxx = rxx.max(x1);
            tyy = tyy.min(e.yy0);
            byy = byy.max(e.yy1);
        }
        if edges.is_empty() {
            lxx = 0;
            rxx = 0;
            tyy = 0;
            byy = 0;
        }

        EdgeTable { edges, bounds: EdgeBounds { lxx, rxx, tyy, byy } }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Polygon;
    use crate::matrix::Point;

    fn unit_square() -> Figure {
        let mut fig = Figure::new();
        let p = fig.add_polygon();
        p.add_point(Point { x: 0.0, y: 0.0 });
        p.add_point(Point { x: 10.0, y: 0.0 });
        p.add_point(Point { x: 10.0, y: 10.0 });
        p.add_point(Point { x: 0.0, y: 10.0 });
        p.close();
        fig
    }

    #[test]
    fn closed_square_produces_four_edges() {
        let table = EdgeTable::build(&unit_square());
        assert_eq!(table.edges.len(), 4);
    }

    #[test]
    fn edges_sorted_by_min_y() {
        let table = EdgeTable::build(&unit_square());
        for w in table.edges.windows(2) {
            assert!(w[0].yy0 <= w[1].yy0);
        }
    }

    #[test]
    fn normalization_keeps_ab_length_near_one_scaled() {
        let table = EdgeTable::build(&unit_square());
        for e in &table.edges {
            let a = fixed::to_double(e.a);
            let b = fixed::to_double(e.b);
            let len = (a * a + b * b).sqrt();
            assert!((len - 1.0).abs() < 0.01, "len={len}");
        }
    }

    #[test]
    fn line_equation_vanishes_at_endpoints() {
        let table = EdgeTable::build(&unit_square());
        for e in &table.edges {
            let a = fixed::to_double(e.a);
            let b = fixed::to_double(e.b);
            let c = fixed::to_double(e.c);
            let x0 = fixed::to_double(e.xx0);
            let y0 = fixed::to_double(e.yy0);
            let x1 = fixed::to_double(e.xx1);
            let y1 = fixed::to_double(e.yy1);
            assert!((a * x0 + b * y0 + c).abs() < 0.05);
            assert!((a * x1 + b * y1 + c).abs() < 0.05);
        }
    }

    #[test]
    fn open_polygon_contributes_one_fewer_edge() {
        let mut p = Polygon::new();
        p.add_point(Point { x: 0.0, y: 0.0 });
        p.add_point(Point { x: 10.0, y: 0.0 });
        p.add_point(Point { x: 10.0, y: 10.0 });
        let mut fig = Figure::new();
        fig.polygons.push(p);
        let table = EdgeTable::build(&fig);
        assert_eq!(table.edges.len(), 2);
    }

    #[test]
    fn bounds_match_polygon_extent() {
        let table = EdgeTable::build(&unit_square());
        assert_eq!(fixed::to_int(table.bounds.tyy), 0);
        assert_eq!(fixed::to_int(table.bounds.byy), 10);
    }
}
