//! Stroked outline generation (C4, stroked generator half).
//!
//! Walks each polygon of a fill figure and builds offset/inset polygons
//! per spec.md §4.4, using the join/cap primitives of `math_stroke.rs`
//! (`MathStroke::calc_join`/`calc_cap` miter/round geometry) adapted to
//! the simpler normal-vector bookkeeping spec.md describes rather than
//! AGG's `VertexDist`-based vertex-distance cache.

use crate::figure::{Figure, Polygon};
use crate::math::calc_intersection;
use crate::matrix::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeLocation {
    Inside,
    Outside,
    Center,
}

#[derive(Debug, Clone, Copy)]
pub struct Stroker {
    pub weight: f64,
    pub location: StrokeLocation,
    pub join: StrokeJoin,
    pub cap: StrokeCap,
    pub miter_limit: f64,
}

impl Stroker {
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            location: StrokeLocation::Center,
            join: StrokeJoin::Miter,
            cap: StrokeCap::Butt,
            miter_limit: 4.0,
        }
    }

    /// Half-widths `(outward, inward)` relative to the original polygon
    /// boundary, per spec.md §4.4 "Width adjustments respect `location`".
    fn half_widths(&self) -> (f64, f64) {
        match self.location {
            StrokeLocation::Center => (self.weight * 0.5, self.weight * 0.5),
            StrokeLocation::Outside => (self.weight, 0.0),
            StrokeLocation::Inside => (0.0, self.weight),
        }
    }

    /// Build the stroke figure for one input polygon, appending produced
    /// polygon(s) to `out`.
    pub fn stroke_polygon(&self, polygon: &Polygon, out: &mut Figure) {
        let n = polygon.points.len();
        if n < 2 {
            return;
        }
        let (outward, inward) = self.half_widths();
        if outward <= 0.0 && inward <= 0.0 {
            return;
        }

        if polygon.closed && n >= 3 {
            self.stroke_closed(polygon, outward, inward, out);
        } else {
            self.stroke_open(polygon, outward, inward, out);
        }
    }

    fn stroke_closed(&self, polygon: &Polygon, outward: f64, inward: f64, out: &mut Figure) {
        let outer = self.offset_ring(&polygon.points, true, outward);
        let mut inner = self.offset_ring(&polygon.points, true, -inward);
        inner.reverse();

        let op = out.add_polygon();
        op.closed = true;
        for p in outer {
            op.points.push(p);
        }
        let ip = out.add_polygon();
        ip.closed = true;
        for p in inner {
            ip.points.push(p);
        }
    }

    fn stroke_open(&self, polygon: &Polygon, outward: f64, inward: f64, out: &mut Figure) {
        let forward = self.offset_chain(&polygon.points, outward);
        let mut backward_pts: Vec<Point> = polygon.points.iter().rev().copied().collect();
        let backward = self.offset_chain(&backward_pts, inward);
        backward_pts.clear();

        let p = out.add_polygon();
        p.closed = true;
        for pt in forward {
            p.points.push(pt);
        }
        if self.cap != StrokeCap::Butt {
            self.emit_cap(p, polygon.points[n_last(polygon)], polygon.points[polygon.points.len() - 2], outward, inward);
        }
        for pt in backward {
            p.points.push(pt);
        }
        if self.cap != StrokeCap::Butt {
            self.emit_cap(p, polygon.points[0], polygon.points[1], inward, outward);
        }
    }

    fn emit_cap(&self, p: &mut Polygon, v0: Point, v1: Point, w: f64, _other: f64) {
        let dx = v1.x - v0.x;
        let dy = v1.y - v0.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1e-12 || w <= 0.0 {
            return;
        }
        let tx = dx / len;
        let ty = dy / len;
        let nx = -ty;
        let ny = tx;
        match self.cap {
            StrokeCap::Butt => {}
            StrokeCap::Square => {
                p.points.push(Point { x: v0.x - nx * w - tx * w, y: v0.y - ny * w - ty * w });
                p.points.push(Point { x: v0.x + nx * w - tx * w, y: v0.y + ny * w - ty * w });
            }
            StrokeCap::Round => {
                let steps = 8;
                let a0 = (-ny).atan2(-nx);
                let a1 = ny.atan2(nx);
                let (a0, a1) = if a1 < a0 { (a0, a1 + 2.0 * std::f64::consts::PI) } else { (a0, a1) };
                for i in 0..=steps {
                    let t = a0 + (a1 - a0) * (i as f64 / steps as f64);
                    p.points.push(Point { x: v0.x + t.cos() * w, y: v0.y + t.sin() * w });
                }
            }
        }
    }

    /// Offset every vertex of an open polyline by `dist` along its local
    /// normal, inserting join geometry at interior vertices.
    fn offset_chain(&self, pts: &[Point], dist: f64) -> Vec<Point> {
        if dist <= 0.0 {
            return Vec::new();
        }
        let n = pts.len();
        let mut result = Vec::with_capacity(n + 4);
        for i in 0..n - 1 {
            let a = pts[i];
            let b = pts[i + 1];
            let (nx, ny) = normal(a, b);
            let oa = Point { x: a.x + nx * dist, y: a.y + ny * dist };
            let ob = Point { x: b.x + nx * dist, y: b.y + ny * dist };
            if i > 0 {
                self.join_into(&mut result, pts[i - 1], a, b, dist, oa);
            } else {
                result.push(oa);
            }
            result.push(ob);
        }
        result
    }

    /// Offset every edge of a closed ring by `dist` (signed: positive =
    /// along the left normal), joining consecutive offset edges at each
    /// vertex.
    fn offset_ring(&self, pts: &[Point], _closed: bool, dist: f64) -> Vec<Point> {
        if dist == 0.0 {
            return Vec::new();
        }
        let sign = dist.signum();
        let d = dist.abs();
        let n = pts.len();
        let mut result = Vec::with_capacity(n + 4);
        for i in 0..n {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            let prev = pts[(i + n - 1) % n];
            let (nx, ny) = normal(a, b);
            let (nx, ny) = (nx * sign, ny * sign);
            let oa = Point { x: a.x + nx * d, y: a.y + ny * d };
            self.join_into(&mut result, prev, a, b, d, oa);
        }
        result
    }

    /// Append the join geometry between the edge ending at `a` and the
    /// edge `(a,b)`, given the already-computed offset point `oa` on the
    /// `(a,b)` edge's normal.
    fn join_into(&self, result: &mut Vec<Point>, prev: Point, a: Point, b: Point, dist: f64, oa: Point) {
        let (pnx, pny) = normal(prev, a);
        let (bnx, bny) = normal(a, b);
        let sign = dist.signum();
        let d = dist.abs();
        let prev_offset = Point { x: a.x + pnx * sign * d, y: a.y + pny * sign * d };

        let convex = cross(prev, a, b) * sign >= 0.0;
        match (self.join, convex) {
            (_, true) | (StrokeJoin::Bevel, false) => {
                result.push(prev_offset);
                result.push(oa);
            }
            (StrokeJoin::Miter, false) => {
                if let Some((ix, iy)) = calc_intersection(
                    prev_offset.x - (a.x - prev.x),
                    prev_offset.y - (a.y - prev.y),
                    prev_offset.x,
                    prev_offset.y,
                    oa.x,
                    oa.y,
                    oa.x + (b.x - a.x),
                    oa.y + (b.y - a.y),
                ) {
                    let miter_len = ((ix - a.x).powi(2) + (iy - a.y).powi(2)).sqrt();
                    if miter_len / d.max(1e-12) <= self.miter_limit {
                        result.push(Point { x: ix, y: iy });
                    } else {
                        result.push(prev_offset);
                        result.push(oa);
                    }
                } else {
                    result.push(prev_offset);
                    result.push(oa);
                }
            }
            (StrokeJoin::Round, false) => {
                let a0 = (pny * sign).atan2(pnx * sign);
                let a1 = (bny * sign).atan2(bnx * sign);
                let (a0, a1) = if sign > 0.0 && a1 < a0 {
                    (a0, a1 + 2.0 * std::f64::consts::PI)
                } else if sign < 0.0 && a1 > a0 {
                    (a0, a1 - 2.0 * std::f64::consts::PI)
                } else {
                    (a0, a1)
                };
                let steps = 8;
                for i in 0..=steps {
                    let t = a0 + (a1 - a0) * (i as f64 / steps as f64);
                    result.push(Point { x: a.x + t.cos() * d, y: a.y + t.sin() * d });
                }
            }
        }
    }
}

/// Split `polygon` into open dash segments along `dashes` (alternating
/// on/off lengths in source units), starting `dash_start` units into the
/// pattern (spec.md §3 "Shape state (extension)" `dashes: List`).
/// Grounded on `vcgen_dash.rs`'s accumulate-distance-then-emit algorithm,
/// adapted to operate directly on `Polygon` points rather than AGG's
/// vertex-source adaptor chain. An empty or all-zero pattern returns the
/// polygon unchanged (no dashing).
pub fn dash_split(polygon: &Polygon, dashes: &[(f64, f64)], dash_start: f64) -> Vec<Polygon> {
    if dashes.is_empty() || dashes.iter().all(|&(d, g)| d <= 0.0 && g <= 0.0) {
        return vec![polygon.clone()];
    }
    let mut points = polygon.points.clone();
    if polygon.closed && !points.is_empty() {
        points.push(points[0]);
    }
    if points.len() < 2 {
        return Vec::new();
    }

    let pattern: Vec<f64> = dashes.iter().flat_map(|&(d, g)| [d.max(0.0), g.max(0.0)]).collect();
    let total: f64 = pattern.iter().sum();
    if total <= 0.0 {
        return vec![polygon.clone()];
    }

    let mut idx = 0usize;
    let mut remaining_in_dash = pattern[0];
    let mut consumed = dash_start.rem_euclid(total);
    while consumed > 0.0 {
        if consumed < remaining_in_dash {
            remaining_in_dash -= consumed;
            break;
        }
        consumed -= remaining_in_dash;
        idx = (idx + 1) % pattern.len();
        remaining_in_dash = pattern[idx];
    }

    let mut out = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let is_on = |i: usize| i % 2 == 0;
    if is_on(idx) {
        current.push(points[0]);
    }

    for window in points.windows(2) {
        let (a, b) = (window[0], window[1]);
        let mut seg_len = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        let mut seg_start = a;
        while seg_len > 0.0 {
            if remaining_in_dash >= seg_len {
                remaining_in_dash -= seg_len;
                if is_on(idx) {
                    current.push(b);
                }
                seg_len = 0.0;
            } else {
                let t = remaining_in_dash / seg_len;
                let mid = Point { x: seg_start.x + (b.x - seg_start.x) * t, y: seg_start.y + (b.y - seg_start.y) * t };
                if is_on(idx) {
                    current.push(mid);
                    out.push(std::mem::take(&mut current));
                } else {
                    current.push(mid);
                }
                seg_len -= remaining_in_dash;
                seg_start = mid;
                idx = (idx + 1) % pattern.len();
                remaining_in_dash = pattern[idx];
            }
        }
    }
    if current.len() >= 2 {
        out.push(current);
    }

    out.into_iter()
        .filter(|pts| pts.len() >= 2)
        .map(|pts| {
            let mut p = Polygon::new();
            for pt in pts {
                p.add_point(pt);
            }
            p
        })
        .collect()
}

fn n_last(p: &Polygon) -> usize {
    p.points.len() - 1
}

/// Left-hand unit normal of the directed edge `(a,b)`.
fn normal(a: Point, b: Point) -> (f64, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        return (0.0, 0.0);
    }
    (-dy / len, dx / len)
}

fn cross(prev: Point, a: Point, b: Point) -> f64 {
    (a.x - prev.x) * (b.y - a.y) - (a.y - prev.y) * (b.x - a.x)
}
