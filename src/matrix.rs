//! 3×3 transformation matrix with identity/affine/projective classification.
//!
//! Grounded on `examples/original_source/src/include/private/matrix.h`
//! (`Enesim_Matrix`/`Enesim_Matrix_Type`) and cross-checked against the
//! teacher's own `trans_perspective.rs` (now folded into this module —
//! see `DESIGN.md`), whose `sx,shy,w0,shx,sy,w1,tx,ty,w2` fields are
//! algebraically the same 3×3 matrix under a different naming
//! (`sx↔xx`, `shx↔xy`, `tx↔xz`, `shy↔yx`, `sy↔yy`, `ty↔yz`, `w0↔zx`,
//! `w1↔zy`, `w2↔zz`), once the matrix is read as acting on the
//! homogeneous column vector `[x, y, 1]`:
//!
//! ```text
//! | xx xy xz |   | x |   | x' |
//! | yx yy yz | * | y | = | y' |
//! | zx zy zz |   | 1 |   | w' |
//! ```
//!
//! with the final point `(x'/w', y'/w')`. This module keeps the spec's
//! field names directly rather than wrapping the teacher's two separate
//! `TransAffine`/`TransPerspective` types, since the rasterizer
//! (`rasterizer.rs`) needs a single type it can classify and cache as
//! fixed point regardless of which kind the caller built.

use crate::basics::is_equal_eps;
use crate::fixed::{self, Fixed};

/// Tolerance used when classifying off-diagonal entries as zero.
pub const CLASSIFY_EPSILON: f64 = 1.0 / 65536.0;

/// Determinant magnitude below which a matrix is considered singular.
pub const SINGULAR_EPSILON: f64 = 1e-12;

/// The classification of a [`Matrix`], recomputed after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Identity,
    Affine,
    Projective,
}

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// An integer-coordinate rectangle (destination-space bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl IntRect {
    pub fn empty() -> Self {
        Self { x: 0, y: 0, w: 0, h: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Intersection of two rectangles; empty (`w`/`h == 0`) if disjoint.
    pub fn intersect(&self, other: &IntRect) -> IntRect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.w).min(other.x + other.w);
        let y1 = (self.y + self.h).min(other.y + other.h);
        if x1 <= x0 || y1 <= y0 {
            IntRect::empty()
        } else {
            IntRect { x: x0, y: y0, w: x1 - x0, h: y1 - y0 }
        }
    }

    pub fn union(&self, other: &IntRect) -> IntRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.w).max(other.x + other.w);
        let y1 = (self.y + self.h).max(other.y + other.h);
        IntRect { x: x0, y: y0, w: x1 - x0, h: y1 - y0 }
    }
}

/// A quadrilateral — the image of a [`Rect`]'s four corners under a
/// (possibly projective) transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub x3: f64,
    pub y3: f64,
}

/// A 3×3 transformation matrix acting on the homogeneous column vector
/// `[x, y, 1]` (see module docs for the exact layout).
#[derive(Debug, Clone, Copy)]
pub struct Matrix {
    pub xx: f64,
    pub xy: f64,
    pub xz: f64,
    pub yx: f64,
    pub yy: f64,
    pub yz: f64,
    pub zx: f64,
    pub zy: f64,
    pub zz: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        Self {
            xx: 1.0,
            xy: 0.0,
            xz: 0.0,
            yx: 0.0,
            yy: 1.0,
            yz: 0.0,
            zx: 0.0,
            zy: 0.0,
            zz: 1.0,
        }
    }

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self { xz: dx, yz: dy, ..Self::identity() }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { xx: sx, yy: sy, ..Self::identity() }
    }

    pub fn rotate(angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();
        Self { xx: c, xy: -s, yx: s, yy: c, ..Self::identity() }
    }

    /// Matrix product `self * other` (apply `other` first, then `self`).
    pub fn compose(&self, other: &Matrix) -> Matrix {
        Matrix {
            xx: self.xx * other.xx + self.xy * other.yx + self.xz * other.zx,
            xy: self.xx * other.xy + self.xy * other.yy + self.xz * other.zy,
            xz: self.xx * other.xz + self.xy * other.yz + self.xz * other.zz,
            yx: self.yx * other.xx + self.yy * other.yx + self.yz * other.zx,
            yy: self.yx * other.xy + self.yy * other.yy + self.yz * other.zy,
            yz: self.yx * other.xz + self.yy * other.yz + self.yz * other.zz,
            zx: self.zx * other.xx + self.zy * other.yx + self.zz * other.zx,
            zy: self.zx * other.xy + self.zy * other.yy + self.zz * other.zy,
            zz: self.zx * other.xz + self.zy * other.yz + self.zz * other.zz,
        }
    }

    /// Classify, tolerating `CLASSIFY_EPSILON` on entries that must be zero.
    pub fn classify(&self) -> MatrixKind {
        let near_zero = |v: f64| v.abs() < CLASSIFY_EPSILON;
        if near_zero(self.zx) && near_zero(self.zy) && is_equal_eps(self.zz, 1.0, CLASSIFY_EPSILON)
        {
            if near_zero(self.xy)
                && near_zero(self.yx)
                && near_zero(self.xz)
                && near_zero(self.yz)
                && is_equal_eps(self.xx, 1.0, CLASSIFY_EPSILON)
                && is_equal_eps(self.yy, 1.0, CLASSIFY_EPSILON)
            {
                MatrixKind::Identity
            } else {
                MatrixKind::Affine
            }
        } else {
            MatrixKind::Projective
        }
    }

    pub fn determinant(&self) -> f64 {
        self.xx * (self.yy * self.zz - self.yz * self.zy)
            - self.xy * (self.yx * self.zz - self.yz * self.zx)
            + self.xz * (self.yx * self.zy - self.yy * self.zx)
    }

    /// Full 3×3 inverse via the adjugate matrix. Returns `None` (caller
    /// falls back to identity bounds per spec.md §3) when the determinant
    /// magnitude is below [`SINGULAR_EPSILON`].
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Matrix {
            xx: (self.yy * self.zz - self.yz * self.zy) * inv_det,
            xy: (self.xz * self.zy - self.xy * self.zz) * inv_det,
            xz: (self.xy * self.yz - self.xz * self.yy) * inv_det,
            yx: (self.yz * self.zx - self.yx * self.zz) * inv_det,
            yy: (self.xx * self.zz - self.xz * self.zx) * inv_det,
            yz: (self.xz * self.yx - self.xx * self.yz) * inv_det,
            zx: (self.yx * self.zy - self.yy * self.zx) * inv_det,
            zy: (self.xy * self.zx - self.xx * self.zy) * inv_det,
            zz: (self.xx * self.yy - self.xy * self.yx) * inv_det,
        })
    }

    /// Transform a point, dividing through by the homogeneous `w` for
    /// projective matrices (identity for affine, where `w` is always 1).
    pub fn point_transform(&self, p: Point) -> Point {
        let x = p.x * self.xx + p.y * self.xy + self.xz;
        let y = p.x * self.yx + p.y * self.yy + self.yz;
        let w = p.x * self.zx + p.y * self.zy + self.zz;
        if (w - 1.0).abs() < 1e-15 {
            Point { x, y }
        } else {
            Point { x: x / w, y: y / w }
        }
    }

    /// Transform a rectangle's four corners into a (possibly non-rectangular,
    /// under projective matrices) quadrilateral.
    pub fn rectangle_transform(&self, r: Rect) -> Quad {
        let p0 = self.point_transform(Point { x: r.x, y: r.y });
        let p1 = self.point_transform(Point { x: r.x + r.w, y: r.y });
        let p2 = self.point_transform(Point { x: r.x + r.w, y: r.y + r.h });
        let p3 = self.point_transform(Point { x: r.x, y: r.y + r.h });
        Quad {
            x0: p0.x,
            y0: p0.y,
            x1: p1.x,
            y1: p1.y,
            x2: p2.x,
            y2: p2.y,
            x3: p3.x,
            y3: p3.y,
        }
    }
}

/// The 16.16 fixed-point form of a [`Matrix`], cached on a renderer at
/// `sw_setup` time (spec.md §4.1: "derived from the double matrix by
/// per-element conversion and cached on the renderer at setup time").
#[derive(Debug, Clone, Copy)]
pub struct FixedMatrix {
    pub xx: Fixed,
    pub xy: Fixed,
    pub xz: Fixed,
    pub yx: Fixed,
    pub yy: Fixed,
    pub yz: Fixed,
    pub zx: Fixed,
    pub zy: Fixed,
    pub zz: Fixed,
}

impl From<&Matrix> for FixedMatrix {
    fn from(m: &Matrix) -> Self {
        FixedMatrix {
            xx: fixed::from_double(m.xx),
            xy: fixed::from_double(m.xy),
            xz: fixed::from_double(m.xz),
            yx: fixed::from_double(m.yx),
            yy: fixed::from_double(m.yy),
            yz: fixed::from_double(m.yz),
            zx: fixed::from_double(m.zx),
            zy: fixed::from_double(m.zy),
            zz: fixed::from_double(m.zz),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_classifies_as_identity() {
        assert_eq!(Matrix::identity().classify(), MatrixKind::Identity);
    }

    #[test]
    fn zero_translation_is_still_identity() {
        assert_eq!(Matrix::translate(0.0, 0.0).classify(), MatrixKind::Identity);
    }

    #[test]
    fn nonzero_translation_is_affine() {
        assert_eq!(Matrix::translate(3.0, 4.0).classify(), MatrixKind::Affine);
    }

    #[test]
    fn rotation_is_affine() {
        assert_eq!(Matrix::rotate(0.7).classify(), MatrixKind::Affine);
    }

    #[test]
    fn compose_affine_affine_is_affine() {
        let a = Matrix::translate(1.0, 2.0);
        let b = Matrix::rotate(0.3);
        assert_eq!(a.compose(&b).classify(), MatrixKind::Affine);
    }

    #[test]
    fn projective_when_z_row_nontrivial() {
        let mut m = Matrix::identity();
        m.zx = 0.001;
        assert_eq!(m.classify(), MatrixKind::Projective);
    }

    #[test]
    fn translate_then_inverse_round_trips_a_point() {
        let m = Matrix::rotate(0.5).compose(&Matrix::translate(10.0, -3.0));
        let inv = m.inverse().expect("invertible");
        let p = Point { x: 5.0, y: 7.0 };
        let q = m.point_transform(p);
        let back = inv.point_transform(q);
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Matrix { xx: 0.0, xy: 0.0, xz: 0.0, yx: 0.0, yy: 0.0, yz: 0.0, zx: 0.0, zy: 0.0, zz: 1.0 };
        assert!(m.inverse().is_none());
    }

    #[test]
    fn rectangle_transform_under_identity_is_unchanged() {
        let r = Rect { x: 1.0, y: 2.0, w: 3.0, h: 4.0 };
        let q = Matrix::identity().rectangle_transform(r);
        assert_eq!(q.x0, 1.0);
        assert_eq!(q.y2, 6.0);
    }

    #[test]
    fn int_rect_intersect_and_union() {
        let a = IntRect { x: 0, y: 0, w: 10, h: 10 };
        let b = IntRect { x: 5, y: 5, w: 10, h: 10 };
        let i = a.intersect(&b);
        assert_eq!(i, IntRect { x: 5, y: 5, w: 5, h: 5 });
        let u = a.union(&b);
        assert_eq!(u, IntRect { x: 0, y: 0, w: 15, h: 15 });
    }
}
