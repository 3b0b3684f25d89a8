//! Polygon and figure types — the output of the path-to-figure stage (C4)
//! and the input to edge-table construction (C5).
//!
//! Grounded on `examples/original_source/src/lib/renderer/enesim_renderer_figure.c`
//! (`Enesim_Renderer_Figure_Polygon`/`_Vertex`, `enesim_figure_polygon_add`),
//! with point deduplication by distance threshold implemented directly here.

use crate::matrix::Point;

/// Points closer together than this (in the same units as the polygon's
/// coordinates) are merged into one, per spec.md §3 "Polygon" invariant.
pub const DEFAULT_THRESHOLD: f64 = 1.0 / 256.0;

/// Axis-aligned bounds, cached on a [`Polygon`] and [`Figure`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn empty() -> Self {
        Self { xmin: f64::INFINITY, ymin: f64::INFINITY, xmax: f64::NEG_INFINITY, ymax: f64::NEG_INFINITY }
    }

    pub fn is_empty(&self) -> bool {
        self.xmin > self.xmax || self.ymin > self.ymax
    }

    pub fn add_point(&mut self, p: Point) {
        self.xmin = self.xmin.min(p.x);
        self.ymin = self.ymin.min(p.y);
        self.xmax = self.xmax.max(p.x);
        self.ymax = self.ymax.max(p.y);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Bounds {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}

/// An ordered list of points forming one contour of a [`Figure`].
///
/// Invariant (spec.md §3): a polygon used by the rasterizer has at least 2
/// points; 3 if it is `closed` or used for fill. Points closer than
/// `threshold` are merged on insertion, matching the C++/C convention of
/// collapsing near-duplicate vertices produced by curve flattening.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub points: Vec<Point>,
    pub closed: bool,
    pub threshold: f64,
    bounds: Bounds,
}

impl Polygon {
    pub fn new() -> Self {
        Self { points: Vec::new(), closed: false, threshold: DEFAULT_THRESHOLD, bounds: Bounds::empty() }
    }

    /// Append a point, merging it into the last one if closer than
    /// `threshold`.
    pub fn add_point(&mut self, p: Point) {
        if let Some(last) = self.points.last() {
            let dx = p.x - last.x;
            let dy = p.y - last.y;
            if (dx * dx + dy * dy).sqrt() < self.threshold {
                return;
            }
        }
        self.bounds.add_point(p);
        self.points.push(p);
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_valid_for_fill(&self) -> bool {
        self.points.len() >= 3
    }

    pub fn is_valid_for_stroke(&self) -> bool {
        self.points.len() >= 2
    }

    /// Edge iterator: `(p_i, p_{i+1})` pairs, closing the last-to-first gap
    /// when `closed`.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        let extra = if self.closed && n >= 2 { 1 } else { 0 };
        (0..n.saturating_sub(1) + extra).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }
}

impl Default for Polygon {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered list of polygons defining a 2D region, with cached bounds
/// equal to the union of its polygons' bounds.
#[derive(Debug, Clone, Default)]
pub struct Figure {
    pub polygons: Vec<Polygon>,
}

impl Figure {
    pub fn new() -> Self {
        Self { polygons: Vec::new() }
    }

    pub fn add_polygon(&mut self) -> &mut Polygon {
        self.polygons.push(Polygon::new());
        self.polygons.last_mut().unwrap()
    }

    pub fn bounds(&self) -> Bounds {
        self.polygons.iter().fold(Bounds::empty(), |acc, p| acc.union(&p.bounds()))
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_points_closer_than_threshold() {
        let mut p = Polygon::new();
        p.add_point(Point { x: 0.0, y: 0.0 });
        p.add_point(Point { x: 0.0001, y: 0.0001 });
        p.add_point(Point { x: 5.0, y: 0.0 });
        assert_eq!(p.points.len(), 2);
    }

    #[test]
    fn bounds_track_inserted_points() {
        let mut p = Polygon::new();
        p.add_point(Point { x: 1.0, y: 2.0 });
        p.add_point(Point { x: 4.0, y: -1.0 });
        let b = p.bounds();
        assert_eq!(b, Bounds { xmin: 1.0, ymin: -1.0, xmax: 4.0, ymax: 2.0 });
    }

    #[test]
    fn figure_bounds_is_union_of_polygons() {
        let mut f = Figure::new();
        f.add_polygon().add_point(Point { x: 0.0, y: 0.0 });
        f.polygons[0].add_point(Point { x: 1.0, y: 1.0 });
        f.add_polygon().add_point(Point { x: 5.0, y: 5.0 });
        f.polygons[1].add_point(Point { x: 6.0, y: 6.0 });
        let b = f.bounds();
        assert_eq!(b, Bounds { xmin: 0.0, ymin: 0.0, xmax: 6.0, ymax: 6.0 });
    }

    #[test]
    fn closed_polygon_edges_wrap_around() {
        let mut p = Polygon::new();
        p.add_point(Point { x: 0.0, y: 0.0 });
        p.add_point(Point { x: 1.0, y: 0.0 });
        p.add_point(Point { x: 1.0, y: 1.0 });
        p.close();
        let edges: Vec<_> = p.edges().collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2].1, Point { x: 0.0, y: 0.0 });
    }
}
