//! # vectra
//!
//! A software 2D vector graphics rasterization and compositing engine:
//! paths in, anti-aliased pixels out. Pure Rust, no required third-party
//! dependencies for the core library — the same zero-dependency stance
//! the teacher this crate grew from took for its rasterizer core.
//!
//! The engine takes abstract vector descriptions (paths, shapes,
//! gradients, patterns, images) plus a transformation, and produces
//! premultiplied ARGB8888 pixels in a destination [`buffer::Buffer`] via
//! a software backend that walks the output scanline by scanline.
//!
//! ## Pipeline
//!
//! ```text
//! Path commands → [curve_normalizer] → [path → figure] → [edge tables]
//!   → [bifigure setup] → [rasterizer scanline] → [span_compositor]
//!   → destination surface rows
//! ```
//!
//! 1. **Fixed-point & matrix** ([`fixed`], [`matrix`]) — 16.16 scalars,
//!    3x3 matrices classified Identity/Affine/Projective.
//! 2. **Color & compositor** ([`span_compositor`]) — premultiplied
//!    ARGB8888 blending parameterized by fill/blend rop.
//! 3. **Curve normalizer** ([`curve_normalizer`]) — flattens quadratic,
//!    cubic, and arc segments into polylines by recursive subdivision.
//! 4. **Path → figure** ([`path`], [`figure`], [`stroke`]) — command
//!    stream to polygon figure; stroking offsets a second figure.
//! 5. **Edge/vector tables** ([`edge`]) — figure to sorted fixed-point
//!    edges with line-equation coefficients.
//! 6. **Scanline rasterizer** ([`rasterizer`]) — per-pixel coverage
//!    across identity/affine/projective transform paths.
//! 7. **BiFigure compositor** ([`bifigure`]) — fill+stroke combined in
//!    one antialiased pass.
//! 8. **Renderer tree driver** ([`renderer`] and the `renderer_*`
//!    modules, [`buffer`], [`surface`], [`concurrency`]) — the
//!    polymorphic renderer graph, damage tracking, and the row-striped
//!    multi-threaded draw loop.

pub mod basics;
pub mod math;

pub mod fixed;
pub mod matrix;

pub mod span_compositor;

pub mod bezier_arc;
pub mod curve_normalizer;
pub mod path;

pub mod figure;
pub mod stroke;

pub mod edge;

pub mod rasterizer;

pub mod bifigure;

pub mod error;

pub mod buffer;
pub mod concurrency;
pub mod surface;

pub mod renderer;
pub mod renderer_composite;
pub mod renderer_extra;
pub mod renderer_gradient;
pub mod renderer_image;
pub mod renderer_shape;
pub mod renderer_solid;
