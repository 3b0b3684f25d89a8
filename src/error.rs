//! Error kinds and the setup log chain (spec.md §7).
//!
//! The teacher carries no error-handling crate (`Cargo.toml`: "Core
//! library has no required external dependencies"), so this is a
//! hand-written enum with manual `Display`/`std::error::Error` impls
//! rather than `thiserror`, per `SPEC_FULL.md` §2.1.

use std::fmt;

/// Error kinds a renderer's setup or a buffer operation can fail with
/// (spec.md §7 table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    /// Degenerate shape: radius ≤ 0, polygon with < 2 points, size < 1.
    InvalidGeometry(String),
    /// Transform cannot be inverted where needed (e.g. image bounds).
    /// Recovery: callers fall back to identity bounds and continue.
    SingularMatrix,
    /// Renderer variant lacks a kernel for the current transform class
    /// or destination format.
    Unsupported(String),
    /// A nested renderer's setup failed; carries one log entry per
    /// renderer on the failure path, oldest (root cause) first. Built up
    /// by [`crate::renderer::Renderer::sw_setup`] as the error
    /// propagates out through each enclosing renderer.
    ChildSetupFailed(SetupLog),
    /// Requested backend is not compiled in.
    BackendUnavailable(String),
    /// Buffer or edge-table allocation failed.
    Allocation,
}

impl RendererError {
    /// The log accumulated so far, if this error already carries one;
    /// empty otherwise. Used by [`crate::renderer::Renderer::sw_setup`]
    /// to extend the chain with its own entry before re-wrapping.
    pub fn setup_log(&self) -> SetupLog {
        match self {
            RendererError::ChildSetupFailed(log) => log.clone(),
            _ => SetupLog::new(),
        }
    }
}

impl fmt::Display for RendererError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererError::InvalidGeometry(msg) => write!(f, "invalid geometry: {msg}"),
            RendererError::SingularMatrix => write!(f, "matrix is singular"),
            RendererError::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            RendererError::ChildSetupFailed(log) => write!(f, "child setup failed:\n{log}"),
            RendererError::BackendUnavailable(name) => write!(f, "backend unavailable: {name}"),
            RendererError::Allocation => write!(f, "allocation failed"),
        }
    }
}

impl std::error::Error for RendererError {}

/// One entry in a [`SetupLog`]: the renderer name, source location, and
/// a formatted message (spec.md §7 "each renderer adds a line with its
/// name, file, line, function, and formatted message").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupLogEntry {
    pub renderer_name: String,
    pub file: &'static str,
    pub line: u32,
    pub function: &'static str,
    pub message: String,
}

impl fmt::Display for SetupLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {} [{}]: {}", self.file, self.line, self.function, self.renderer_name, self.message)
    }
}

/// A chain of setup-failure log entries a caller can dump, oldest first
/// (spec.md §7 "Setup errors are collected into a log chain").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupLog {
    entries: Vec<SetupLogEntry>,
}

impl SetupLog {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, entry: SetupLogEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SetupLogEntry] {
        &self.entries
    }

    /// Append `other`'s entries after this log's own, matching the
    /// rollback/chaining behavior a parent renderer performs when a
    /// child's setup fails.
    pub fn extend(&mut self, other: SetupLog) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Display for SetupLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let e = RendererError::InvalidGeometry("radius <= 0".to_string());
        assert_eq!(e.to_string(), "invalid geometry: radius <= 0");
    }

    #[test]
    fn setup_log_of_a_fresh_error_is_empty() {
        let e = RendererError::Allocation;
        assert!(e.setup_log().is_empty());
    }

    #[test]
    fn child_setup_failed_carries_and_extends_the_log() {
        let mut log = SetupLog::new();
        log.push(SetupLogEntry { renderer_name: "circle1".into(), file: "f", line: 1, function: "sw_setup", message: "invalid geometry: radius <= 0".into() });
        let inner = RendererError::ChildSetupFailed(log);

        let mut outer_log = inner.setup_log();
        outer_log.push(SetupLogEntry { renderer_name: "compound1".into(), file: "f", line: 2, function: "sw_setup", message: "child setup failed".into() });
        let outer = RendererError::ChildSetupFailed(outer_log);

        match outer {
            RendererError::ChildSetupFailed(log) => {
                assert_eq!(log.entries().len(), 2);
                assert_eq!(log.entries()[0].renderer_name, "circle1");
                assert_eq!(log.entries()[1].renderer_name, "compound1");
            }
            _ => panic!("expected ChildSetupFailed"),
        }
    }

    #[test]
    fn setup_log_extend_appends_in_order() {
        let mut a = SetupLog::new();
        a.push(SetupLogEntry { renderer_name: "a".into(), file: "f", line: 1, function: "g", message: "first".into() });
        let mut b = SetupLog::new();
        b.push(SetupLogEntry { renderer_name: "b".into(), file: "f", line: 2, function: "g", message: "second".into() });
        a.extend(b);
        assert_eq!(a.entries().len(), 2);
        assert_eq!(a.entries()[1].message, "second");
    }
}
