//! Core types for navspy.
//!
//! These are the values that flow between the bounds calculator, the
//! activation tracker and the host collaborators.

use std::fmt;

use crate::host::GeometryProvider;

// =============================================================================
// Identity
// =============================================================================

/// Identity of a navigation link (one tracked target).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TargetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque handle to a spied-on section.
///
/// Only the geometry provider knows how to resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionRef(String);

impl SectionRef {
    pub fn new(section: impl Into<String>) -> Self {
        Self(section.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// Scroll interval `[top, bottom]` (both inclusive) in which a target is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub top: i64,
    pub bottom: i64,
}

impl Range {
    pub const fn new(top: i64, bottom: i64) -> Self {
        Self { top, bottom }
    }

    /// Check if a scroll position falls inside this range.
    pub fn contains(&self, position: f64) -> bool {
        self.top as f64 <= position && position <= self.bottom as f64
    }
}

/// Global scroll bounds across every target range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub min: i64,
    pub max: i64,
}

impl Envelope {
    pub fn contains(&self, position: f64) -> bool {
        self.min as f64 <= position && position <= self.max as f64
    }
}

// =============================================================================
// Targets
// =============================================================================

/// A (link, section) pair tracked by the spy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: TargetId,
    pub section: SectionRef,
    /// `None` until bounds have been computed.
    pub range: Option<Range>,
}

impl Target {
    pub fn new(id: impl Into<TargetId>, section: SectionRef) -> Self {
        Self {
            id: id.into(),
            section,
            range: None,
        }
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    /// Whether the scroll position is inside this target's range.
    ///
    /// A target without a range never matches.
    pub fn matches(&self, position: f64) -> bool {
        self.range.is_some_and(|range| range.contains(position))
    }
}

// =============================================================================
// Scroll snapshot
// =============================================================================

/// Document and viewport measurements read once per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollSnapshot {
    pub position: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollSnapshot {
    pub fn new(position: f64, viewport_height: f64, document_height: f64) -> Self {
        Self {
            position,
            viewport_height,
            document_height,
        }
    }

    /// Read the current measurements from a geometry provider.
    pub fn read(geometry: &dyn GeometryProvider) -> Self {
        Self {
            position: geometry.scroll_position(),
            viewport_height: geometry.viewport_height(),
            document_height: geometry.document_height(),
        }
    }

    /// True when the viewport already touches the end of the document.
    pub fn at_bottom(&self) -> bool {
        self.position + self.viewport_height >= self.document_height
    }
}

// =============================================================================
// Lifecycle events
// =============================================================================

/// Lifecycle notification delivered to a [`VisualSink`](crate::host::VisualSink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpyEvent {
    /// Scroll position moved inside the envelope.
    Enter,
    /// Scroll position left the envelope.
    Exit,
    Activate(TargetId),
    Deactivate(TargetId),
}

bitflags::bitflags! {
    /// Transitions produced by a single evaluation.
    ///
    /// Combine with bitwise OR: `Transitions::DEACTIVATE | Transitions::ACTIVATE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Transitions: u8 {
        const NONE = 0;
        const ENTER = 1 << 0;
        const EXIT = 1 << 1;
        const ACTIVATE = 1 << 2;
        const DEACTIVATE = 1 << 3;
    }
}
