//! Path command stream — the public input type for the curve normalizer
//! (C3).
//!
//! Grounded on the command-stream shape of the now-superseded
//! `path_storage.rs` (AGG's flat `u32`-tagged vertex array) and
//! `examples/original_source/enesim/lib/util/enesim_path.c`'s command
//! dispatch, reworked as a Rust sum type per spec.md §3 instead of AGG's
//! packed command byte.

/// One command in a path's command stream.
///
/// `ArcTo.angle` is in radians (see `SPEC_FULL.md` §3.2); callers using
/// SVG-style degrees must convert before pushing the command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadTo { cx: f64, cy: f64, x: f64, y: f64 },
    SmoothQuadTo { x: f64, y: f64 },
    CubicTo { cx0: f64, cy0: f64, cx1: f64, cy1: f64, x: f64, y: f64 },
    SmoothCubicTo { cx: f64, cy: f64, x: f64, y: f64 },
    ArcTo { rx: f64, ry: f64, angle: f64, large: bool, sweep: bool, x: f64, y: f64 },
    Close { close: bool },
}

/// An ordered list of [`PathCommand`]s.
///
/// This is a thin container: normalization (curve flattening, smooth/arc
/// resolution) happens in `curve_normalizer`, which walks a `Path` and
/// produces a [`crate::figure::Figure`].
#[derive(Debug, Clone, Default)]
pub struct Path {
    pub commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self { commands: Vec::new() }
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::MoveTo { x, y });
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::LineTo { x, y });
        self
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::QuadTo { cx, cy, x, y });
        self
    }

    pub fn smooth_quad_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::SmoothQuadTo { x, y });
        self
    }

    pub fn cubic_to(&mut self, cx0: f64, cy0: f64, cx1: f64, cy1: f64, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::CubicTo { cx0, cy0, cx1, cy1, x, y });
        self
    }

    pub fn smooth_cubic_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::SmoothCubicTo { cx, cy, x, y });
        self
    }

    /// `angle` in radians; see [`PathCommand::ArcTo`].
    pub fn arc_to(&mut self, rx: f64, ry: f64, angle: f64, large: bool, sweep: bool, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::ArcTo { rx, ry, angle, large, sweep, x, y });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.commands.push(PathCommand::Close { close: true });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_appends_commands_in_order() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).line_to(1.0, 0.0).close();
        assert_eq!(
            p.commands,
            vec![
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::LineTo { x: 1.0, y: 0.0 },
                PathCommand::Close { close: true },
            ]
        );
    }

    #[test]
    fn clear_empties_command_list() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.clear();
        assert!(p.is_empty());
    }
}
