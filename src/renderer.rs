//! Renderer tree driver (C8): the polymorphic renderer shared state,
//! vtable, damage tracking, and draw-call driver loop (spec.md §3
//! "Renderer"/"Renderer state", §4.8, §9).
//!
//! §9 says the "class hierarchy" of renderer variants maps to a
//! tagged-union with an ops vtable per variant and shared base state.
//! This crate expresses that as a `RendererOps` trait object held
//! alongside a `RendererState` pair (current/past) in one `RendererNode`
//! — the trait object is the vtable, the surrounding struct is the base
//! record, matching §9's "shared state in base record, variant-specific
//! inline. No open subclassing at runtime."
//!
//! The auto-naming counter (`NameFactory`) is grounded on
//! `SPEC_FULL.md` §3.4 (`<class><n>` naming behind a `Mutex`), and is
//! process-wide per spec.md §9 "Global state".

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::sync::OnceLock;

use crate::concurrency::render_rows_striped;
use crate::error::{RendererError, SetupLogEntry};
use crate::matrix::{IntRect, Matrix, Rect};
use crate::span_compositor::Rop;
use crate::surface::Surface;

/// Capability flags a renderer variant supports (spec.md §4.8
/// `features_get`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features(u32);

impl Features {
    pub const TRANSLATE: Features = Features(1 << 0);
    pub const AFFINE: Features = Features(1 << 1);
    pub const PROJECTIVE: Features = Features(1 << 2);
    pub const ARGB8888: Features = Features(1 << 3);
    pub const COLOR_MASK: Features = Features(1 << 4);
    pub const QUALITY: Features = Features(1 << 5);
    pub const ROP: Features = Features(1 << 6);

    pub const fn empty() -> Self {
        Features(0)
    }

    pub fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Features {
    type Output = Features;
    fn bitor(self, rhs: Features) -> Features {
        Features(self.0 | rhs.0)
    }
}

/// A span function produced by a successful `sw_setup`: fills `len`
/// destination pixels starting at `(x, y)` into `dst`. `Send + Sync`
/// since [`crate::concurrency::render_rows_striped`] shares it across
/// worker threads.
pub type SpanFn = Box<dyn Fn(i32, i32, usize, &mut [u32]) + Send + Sync>;

/// Shared renderer state (spec.md §3 "Renderer state"): the fields
/// every variant carries regardless of what it draws.
#[derive(Clone)]
pub struct RendererState {
    pub visibility: bool,
    pub rop: Rop,
    /// Premultiplied ARGB8888.
    pub color: u32,
    pub transformation: Matrix,
    pub origin: (f64, f64),
    pub mask: Option<Renderer>,
    pub name: Option<String>,
    pub changed: bool,
}

impl Default for RendererState {
    fn default() -> Self {
        Self {
            visibility: true,
            rop: Rop::Fill,
            color: 0xFFFFFFFF,
            transformation: Matrix::identity(),
            origin: (0.0, 0.0),
            mask: None,
            name: None,
            changed: true,
        }
    }
}

/// Per-variant behavior (the vtable of spec.md §4.8/§9). Requires
/// `Send` since a `Renderer` is shared across worker threads by the
/// row-striping driver loop (spec.md §5).
pub trait RendererOps: Send {
    /// Short class name used for auto-naming (`<class><n>`).
    fn base_name(&self) -> &'static str;

    /// Bounds in the renderer's own coordinate space, before
    /// origin/transform are applied.
    fn bounds(&self) -> Rect;

    /// Whether this variant's own content changed since the last
    /// commit (distinct from the shared state's `changed` flag, which
    /// `Renderer::has_changed` already accounts for). Composite
    /// renderers override this to recurse into children.
    fn has_changed(&self) -> bool {
        false
    }

    /// Emit dirty rectangles via `cb(rect, was_old)`. The default
    /// emits `old_bounds` and the renderer's current destination
    /// bounds when `has_changed` is true, per spec.md §4.8's default
    /// rule; composite/shape renderers override to forward child
    /// damage clipped to their own bounds.
    fn damages(&self, destination_bounds: IntRect, old_bounds: IntRect, changed: bool, cb: &mut dyn FnMut(IntRect, bool)) {
        if changed {
            cb(old_bounds, true);
            cb(destination_bounds, false);
        }
    }

    /// Prepare to draw: lock inputs, pick a kernel, return the span
    /// function. Failure must not leave partial state behind.
    fn sw_setup(&mut self, surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError>;

    /// Release anything `sw_setup` allocated or locked.
    fn sw_cleanup(&mut self, surface: &Surface);
}

struct RendererNode {
    id: u64,
    current: RendererState,
    past: RendererState,
    variant: Box<dyn RendererOps>,
    span_fn: Option<SpanFn>,
}

/// A reference-counted handle to a renderer node (spec.md §3
/// "Renderer...Ref-counted"). Cloning shares the same node; Rust's `Arc`
/// drop glue is this crate's `_unref`. `Arc<Mutex<_>>` rather than
/// `Rc<RefCell<_>>` for the same reason as [`crate::buffer::Buffer`]:
/// the row-striping driver loop calls a renderer's span function from
/// multiple worker threads.
#[derive(Clone)]
pub struct Renderer(Arc<Mutex<RendererNode>>);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn name_factory() -> &'static Mutex<HashMap<&'static str, u32>> {
    static FACTORY: OnceLock<Mutex<HashMap<&'static str, u32>>> = OnceLock::new();
    FACTORY.get_or_init(|| Mutex::new(HashMap::new()))
}

fn auto_name(base: &'static str) -> String {
    let mut table = name_factory().lock().unwrap();
    let counter = table.entry(base).or_insert(0);
    *counter += 1;
    format!("{base}{}", *counter)
}

impl Renderer {
    pub fn new(variant: Box<dyn RendererOps>) -> Self {
        let base = variant.base_name();
        let mut state = RendererState::default();
        state.name = Some(auto_name(base));
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Renderer(Arc::new(Mutex::new(RendererNode { id, current: state, past: RendererState::default(), variant, span_fn: None })))
    }

    pub fn id(&self) -> u64 {
        self.0.lock().unwrap().id
    }

    pub fn name(&self) -> String {
        self.0.lock().unwrap().current.name.clone().unwrap_or_default()
    }

    pub fn transformation_set(&self, m: Matrix) {
        let mut n = self.0.lock().unwrap();
        n.current.transformation = m;
        n.current.changed = true;
    }

    pub fn transformation_get(&self) -> Matrix {
        self.0.lock().unwrap().current.transformation
    }

    pub fn origin_set(&self, dx: f64, dy: f64) {
        let mut n = self.0.lock().unwrap();
        n.current.origin = (dx, dy);
        n.current.changed = true;
    }

    pub fn origin_get(&self) -> (f64, f64) {
        self.0.lock().unwrap().current.origin
    }

    pub fn color_set(&self, color: u32) {
        let mut n = self.0.lock().unwrap();
        n.current.color = color;
        n.current.changed = true;
    }

    pub fn color_get(&self) -> u32 {
        self.0.lock().unwrap().current.color
    }

    pub fn rop_set(&self, rop: Rop) {
        let mut n = self.0.lock().unwrap();
        n.current.rop = rop;
        n.current.changed = true;
    }

    pub fn rop_get(&self) -> Rop {
        self.0.lock().unwrap().current.rop
    }

    pub fn visibility_set(&self, visible: bool) {
        let mut n = self.0.lock().unwrap();
        n.current.visibility = visible;
        n.current.changed = true;
    }

    pub fn visibility_get(&self) -> bool {
        self.0.lock().unwrap().current.visibility
    }

    pub fn mask_set(&self, mask: Option<Renderer>) {
        let mut n = self.0.lock().unwrap();
        n.current.mask = mask;
        n.current.changed = true;
    }

    pub fn mask_get(&self) -> Option<Renderer> {
        self.0.lock().unwrap().current.mask.clone()
    }

    pub fn bounds_get(&self) -> Rect {
        self.0.lock().unwrap().variant.bounds()
    }

    /// Own bounds with origin and transformation applied, in
    /// destination (device) space. Falls back to an identity-bounds
    /// translation if the transform is singular, per spec.md §3's
    /// matrix invariant and the `SingularMatrix` recovery rule in §7.
    pub fn destination_bounds_get(&self) -> IntRect {
        let n = self.0.lock().unwrap();
        let b = n.variant.bounds();
        let (dx, dy) = n.current.origin;
        let quad = n.current.transformation.rectangle_transform(b);
        let xs = [quad.x0, quad.x1, quad.x2, quad.x3];
        let ys = [quad.y0, quad.y1, quad.y2, quad.y3];
        let xmin = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let xmax = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let ymin = ys.iter().cloned().fold(f64::INFINITY, f64::min);
        let ymax = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        IntRect {
            x: (xmin + dx).floor() as i32,
            y: (ymin + dy).floor() as i32,
            w: ((xmax - xmin).ceil().max(0.0)) as i32,
            h: ((ymax - ymin).ceil().max(0.0)) as i32,
        }
    }

    pub fn features_get(&self) -> Features {
        let n = self.0.lock().unwrap();
        let mut f = Features::ARGB8888 | Features::ROP;
        match n.current.transformation.classify() {
            crate::matrix::MatrixKind::Identity => f = f | Features::TRANSLATE,
            crate::matrix::MatrixKind::Affine => f = f | Features::AFFINE,
            crate::matrix::MatrixKind::Projective => f = f | Features::PROJECTIVE,
        }
        if n.current.mask.is_some() {
            f = f | Features::COLOR_MASK;
        }
        f
    }

    /// True if the shared state changed since the last commit or the
    /// variant itself (or any nested child, recursively, via the
    /// variant's own `has_changed`) reports a change.
    pub fn has_changed(&self) -> bool {
        let n = self.0.lock().unwrap();
        n.current.changed || n.variant.has_changed()
    }

    pub fn damages_get(&self, old_bounds: IntRect, mut cb: impl FnMut(IntRect, bool)) {
        let destination_bounds = self.destination_bounds_get();
        let changed = self.has_changed();
        let n = self.0.lock().unwrap();
        n.variant.damages(destination_bounds, old_bounds, changed, &mut cb);
    }

    /// Begin setup: reentrancy-guarded against the surface's
    /// outstanding-setup set (spec.md §4.8 "2nd setup without cleanup
    /// is a fatal contract violation").
    ///
    /// On failure, appends this renderer's own entry to whatever log
    /// the error already carries (spec.md §7 "each renderer adds a line
    /// with its name, file, line, function, and formatted message") and
    /// re-wraps as `ChildSetupFailed`, so a failure nested arbitrarily
    /// deep inside a composite renderer surfaces at `draw`/`draw_list`
    /// with one line per renderer on the failure path, root cause first.
    pub fn sw_setup(&self, surface: &Surface) -> Result<(), RendererError> {
        let id = self.id();
        surface.begin_setup(id)?;
        let span_fn = {
            let mut n = self.0.lock().unwrap();
            let state = n.current.clone();
            n.variant.sw_setup(surface, &state)
        };
        match span_fn {
            Ok(f) => {
                self.0.lock().unwrap().span_fn = Some(f);
                Ok(())
            }
            Err(e) => {
                surface.end_setup(id);
                let mut log = e.setup_log();
                log.push(SetupLogEntry { renderer_name: self.name(), file: file!(), line: line!(), function: "sw_setup", message: e.to_string() });
                Err(RendererError::ChildSetupFailed(log))
            }
        }
    }

    /// Invoke this renderer's already-setup span function directly,
    /// bypassing the driver loop's own locking/row-striping. Composite
    /// renderers (Compound, Clipper, Transition, Proxy) use this to call
    /// a child's span as part of their own span function.
    pub fn draw_span(&self, x: i32, y: i32, len: usize, dst: &mut [u32]) {
        let n = self.0.lock().unwrap();
        if let Some(span_fn) = &n.span_fn {
            span_fn(x, y, len, dst);
        }
    }

    pub fn sw_cleanup(&self, surface: &Surface) {
        let id = self.id();
        {
            let mut n = self.0.lock().unwrap();
            n.variant.sw_cleanup(surface);
            n.span_fn = None;
            n.past = n.current.clone();
            n.current.changed = false;
        }
        surface.end_setup(id);
    }

    /// Driver loop (spec.md §4.8 "Driver loop"): effective area =
    /// `clip ∩ surface bounds ∩ destination bounds`, then one
    /// `span_fn` call per row, optionally striped across `workers`
    /// threads (spec.md §5).
    pub fn draw(&self, surface: &Surface, clip: Option<IntRect>, x: i32, y: i32, workers: usize) -> Result<(), RendererError> {
        self.draw_list(surface, clip.map(|c| vec![c]).as_deref().unwrap_or(&[]), x, y, workers)
    }

    /// Same as [`Renderer::draw`] but iterating the draw area per clip
    /// rectangle in `clips` (spec.md §6 `_draw_list`); an empty `clips`
    /// draws the whole destination-bounds area unclipped.
    pub fn draw_list(&self, surface: &Surface, clips: &[IntRect], x: i32, y: i32, workers: usize) -> Result<(), RendererError> {
        if !self.visibility_get() {
            return Ok(());
        }
        let (sw, sh) = surface.buffer().size();
        let surface_bounds = IntRect { x: 0, y: 0, w: sw as i32, h: sh as i32 };
        let dest_bounds = self.destination_bounds_get();

        let _write_guard = surface.try_lock_write().ok_or(RendererError::Unsupported("surface locked".to_string()))?;
        self.sw_setup(surface)?;

        let areas: Vec<IntRect> = if clips.is_empty() {
            vec![surface_bounds.intersect(&dest_bounds)]
        } else {
            clips.iter().map(|c| c.intersect(&surface_bounds).intersect(&dest_bounds)).collect()
        };

        for area in areas {
            if area.is_empty() {
                continue;
            }
            let n = self.0.clone();
            let stride = sw as usize;
            render_rows_striped(area.y, area.h.max(0) as u32, workers, |row| {
                let borrow = n.lock().unwrap();
                if let Some(span_fn) = &borrow.span_fn {
                    surface.buffer().with_row_mut(row as u32, |bytes| {
                        let pixels: &mut [u32] = bytemuck_cast_u32(bytes, stride);
                        let len = area.w.max(0) as usize;
                        let start = area.x.max(0) as usize;
                        let end = (start + len).min(pixels.len());
                        if start < end {
                            span_fn(area.x + x, row + y, end - start, &mut pixels[start..end]);
                        }
                    });
                }
            });
        }

        self.sw_cleanup(surface);
        Ok(())
    }
}

/// Reinterpret a row of raw bytes as `u32` premultiplied ARGB pixels.
/// `stride` is the row width in pixels (ARGB8888-family buffers only;
/// this module never touches the narrower formats directly).
fn bytemuck_cast_u32(bytes: &mut [u8], stride: usize) -> &mut [u32] {
    debug_assert!(bytes.len() >= stride * 4);
    // Safe: `Buffer` allocates ARGB8888-family rows as `stride * 4`
    // bytes with no padding, and `u32` has no alignment requirement
    // stricter than the allocator already guarantees for a `Vec<u8>`
    // on every platform this crate targets.
    unsafe { std::slice::from_raw_parts_mut(bytes.as_mut_ptr() as *mut u32, stride) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Buffer, PixelFormat};

    struct Solid(u32);
    impl RendererOps for Solid {
        fn base_name(&self) -> &'static str {
            "solid"
        }
        fn bounds(&self) -> Rect {
            Rect { x: 0.0, y: 0.0, w: f64::INFINITY, h: f64::INFINITY }
        }
        fn sw_setup(&mut self, _surface: &Surface, state: &RendererState) -> Result<SpanFn, RendererError> {
            let color = state.color;
            Ok(Box::new(move |_x, _y, len, dst: &mut [u32]| {
                for i in 0..len {
                    dst[i] = color;
                }
            }))
        }
        fn sw_cleanup(&mut self, _surface: &Surface) {}
    }

    #[test]
    fn auto_naming_increments_per_class() {
        let a = Renderer::new(Box::new(Solid(0xFFFFFFFF)));
        let b = Renderer::new(Box::new(Solid(0xFFFFFFFF)));
        assert_ne!(a.name(), b.name());
        assert!(a.name().starts_with("solid"));
    }

    #[test]
    fn fresh_renderer_reports_changed() {
        let r = Renderer::new(Box::new(Solid(0xFFFFFFFF)));
        assert!(r.has_changed());
    }

    #[test]
    fn setters_mark_changed() {
        let r = Renderer::new(Box::new(Solid(0xFFFFFFFF)));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 2, 2).unwrap());
        r.sw_setup(&surface).unwrap();
        r.sw_cleanup(&surface);
        assert!(!r.has_changed());
        r.color_set(0xFF000000);
        assert!(r.has_changed());
    }

    #[test]
    fn second_setup_without_cleanup_fails() {
        let r = Renderer::new(Box::new(Solid(0xFFFFFFFF)));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 2, 2).unwrap());
        r.sw_setup(&surface).unwrap();
        assert!(r.sw_setup(&surface).is_err());
        r.sw_cleanup(&surface);
    }

    #[test]
    fn solid_fill_draws_color_into_surface() {
        let r = Renderer::new(Box::new(Solid(0xFF808080)));
        let surface = Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 4, 4).unwrap());
        r.draw(&surface, None, 0, 0, 1).unwrap();
        surface.buffer().with_row(0, |row| {
            let pixels: &[u32] = unsafe { std::slice::from_raw_parts(row.as_ptr() as *const u32, 4) };
            assert!(pixels.iter().all(|&p| p == 0xFF808080));
        });
    }
}
