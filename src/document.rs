//! Flow Document - Headless page model laid out by Taffy
//!
//! Sections are stacked top to bottom in a flex column (with optional padding
//! and gap) and measured by Taffy. Navigation markers map link ids to
//! sections. The document serves as both [`TargetDiscovery`] and
//! [`GeometryProvider`], so it can drive a spy without a browser:
//!
//! - hidden sections get `display: none`, take no space, and their markers
//!   are left out of discovery
//! - markers pointing at unknown sections are reported as unresolved
//! - the scroll position is clamped to `[0, document_height - viewport_height]`
//!
//! Layout is recomputed lazily after any structural change.
//!
//! # Example
//!
//! ```
//! use navspy::document::FlowDocument;
//! use navspy::GeometryProvider;
//!
//! let doc = FlowDocument::new(80.0, 20.0).with_padding(2.0).with_gap(1.0);
//! doc.add_section("intro", 10.0);
//! doc.add_section("usage", 30.0);
//!
//! assert_eq!(doc.section_top(&"usage".into()), Some(13.0));
//! assert_eq!(doc.document_height(), 45.0);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use taffy::{
    AvailableSpace, Dimension, Display, FlexDirection, LengthPercentage, NodeId, Rect, Size,
    Style, TaffyTree,
};

use crate::bounds::SectionGeometry;
use crate::error::SpyError;
use crate::host::{GeometryProvider, SpyMarker, TargetDiscovery};
use crate::types::{SectionRef, TargetId};

// =============================================================================
// DOCUMENT CONTENT
// =============================================================================

#[derive(Debug, Clone)]
struct Section {
    id: String,
    height: f32,
    visible: bool,
}

#[derive(Debug, Clone)]
struct Marker {
    link: TargetId,
    section: String,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    width: f32,
    padding: f32,
    gap: f32,
}

/// Output of one layout pass.
#[derive(Debug, Clone, Default)]
struct Measured {
    sections: HashMap<String, SectionGeometry>,
    content_height: f64,
}

#[derive(Debug)]
struct Content {
    sections: Vec<Section>,
    markers: Vec<Marker>,
    measured: Option<Measured>,
}

impl Content {
    fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|section| section.id == id)
    }

    fn invalidate(&mut self) {
        self.measured = None;
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

fn section_style(section: &Section) -> Style {
    Style {
        display: if section.visible {
            Display::Flex
        } else {
            Display::None
        },
        flex_shrink: 0.0,
        size: Size {
            width: Dimension::Auto,
            height: Dimension::Length(section.height),
        },
        ..Default::default()
    }
}

fn root_style(frame: Frame) -> Style {
    let padding = LengthPercentage::Length(frame.padding);
    Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        size: Size {
            width: Dimension::Length(frame.width),
            height: Dimension::Auto,
        },
        padding: Rect {
            left: padding,
            right: padding,
            top: padding,
            bottom: padding,
        },
        gap: Size {
            width: LengthPercentage::Length(0.0),
            height: LengthPercentage::Length(frame.gap),
        },
        ..Default::default()
    }
}

/// Lay out the sections as a column and read back their offsets.
fn measure(sections: &[Section], frame: Frame) -> Result<Measured, SpyError> {
    let mut tree: TaffyTree<()> = TaffyTree::new();

    let mut nodes: Vec<NodeId> = Vec::with_capacity(sections.len());
    for section in sections {
        nodes.push(tree.new_leaf(section_style(section))?);
    }
    let root = tree.new_with_children(root_style(frame), &nodes)?;

    tree.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(frame.width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    let mut measured = Measured {
        sections: HashMap::with_capacity(sections.len()),
        content_height: f64::from(tree.layout(root)?.size.height),
    };

    for (section, &node) in sections.iter().zip(&nodes) {
        if !section.visible {
            continue;
        }
        let layout = tree.layout(node)?;
        measured.sections.insert(
            section.id.clone(),
            SectionGeometry {
                top: f64::from(layout.location.y),
                height: f64::from(layout.size.height),
            },
        );
    }

    Ok(measured)
}

// =============================================================================
// FLOW DOCUMENT
// =============================================================================

/// Headless document: a column of sections, a nav with spy markers, and a
/// scrollable viewport.
///
/// Every mutator takes `&self`, so the document can be shared through an
/// `Rc` between the host and the spy.
pub struct FlowDocument {
    frame: Cell<Frame>,
    viewport_height: Cell<f64>,
    scroll: Cell<f64>,
    content: RefCell<Content>,
}

impl FlowDocument {
    pub fn new(width: f32, viewport_height: f64) -> Self {
        Self {
            frame: Cell::new(Frame {
                width,
                padding: 0.0,
                gap: 0.0,
            }),
            viewport_height: Cell::new(viewport_height),
            scroll: Cell::new(0.0),
            content: RefCell::new(Content {
                sections: Vec::new(),
                markers: Vec::new(),
                measured: None,
            }),
        }
    }

    /// Space above the first and below the last section.
    pub fn with_padding(self, padding: f32) -> Self {
        self.update_frame(|frame| frame.padding = padding);
        self
    }

    /// Space between consecutive visible sections.
    pub fn with_gap(self, gap: f32) -> Self {
        self.update_frame(|frame| frame.gap = gap);
        self
    }

    fn update_frame(&self, f: impl FnOnce(&mut Frame)) {
        let mut frame = self.frame.get();
        f(&mut frame);
        self.frame.set(frame);
        self.content.borrow_mut().invalidate();
    }

    // =========================================================================
    // CONTENT
    // =========================================================================

    /// Append a section and a nav marker for it (link id = section id).
    pub fn add_section(&self, id: &str, height: f32) {
        self.add_unlinked_section(id, height);
        self.add_marker(id, id);
    }

    /// Append a section without a nav marker.
    pub fn add_unlinked_section(&self, id: &str, height: f32) {
        let mut content = self.content.borrow_mut();
        content.sections.push(Section {
            id: id.to_string(),
            height,
            visible: true,
        });
        content.invalidate();
    }

    /// Append a nav marker spying on `section`.
    ///
    /// The section does not have to exist; dangling markers are reported as
    /// unresolved during discovery.
    pub fn add_marker(&self, link: impl Into<TargetId>, section: &str) {
        self.content.borrow_mut().markers.push(Marker {
            link: link.into(),
            section: section.to_string(),
        });
    }

    /// Remove a section. Markers pointing at it become unresolved.
    pub fn remove_section(&self, id: &str) -> bool {
        let mut content = self.content.borrow_mut();
        let before = content.sections.len();
        content.sections.retain(|section| section.id != id);
        let removed = content.sections.len() != before;
        if removed {
            content.invalidate();
        }
        removed
    }

    pub fn set_section_height(&self, id: &str, height: f32) -> bool {
        let mut content = self.content.borrow_mut();
        let Some(section) = content.section_mut(id) else {
            return false;
        };
        section.height = height;
        content.invalidate();
        true
    }

    pub fn set_section_visible(&self, id: &str, visible: bool) -> bool {
        let mut content = self.content.borrow_mut();
        let Some(section) = content.section_mut(id) else {
            return false;
        };
        section.visible = visible;
        content.invalidate();
        true
    }

    /// Section ids in document order (hidden ones included).
    pub fn section_ids(&self) -> Vec<String> {
        self.content
            .borrow()
            .sections
            .iter()
            .map(|section| section.id.clone())
            .collect()
    }

    /// Geometry of a visible section.
    pub fn section_geometry(&self, id: &str) -> Option<SectionGeometry> {
        self.with_measured(|measured| measured.sections.get(id).copied())
    }

    // =========================================================================
    // VIEWPORT
    // =========================================================================

    /// Resize the viewport. Width changes trigger a relayout.
    pub fn set_viewport(&self, width: f32, height: f64) {
        if self.frame.get().width != width {
            self.update_frame(|frame| frame.width = width);
        }
        self.viewport_height.set(height);
    }

    pub fn width(&self) -> f32 {
        self.frame.get().width
    }

    /// Largest reachable scroll position.
    pub fn max_scroll(&self) -> f64 {
        (self.content_height() - self.viewport_height.get()).max(0.0)
    }

    /// Scroll to an absolute position (clamped). Returns the new position.
    pub fn scroll_to(&self, position: f64) -> f64 {
        let clamped = position.clamp(0.0, self.max_scroll());
        self.scroll.set(clamped);
        clamped
    }

    /// Scroll by a delta. Returns `true` if the position changed.
    pub fn scroll_by(&self, delta: f64) -> bool {
        let current = self.scroll_position();
        self.scroll_to(current + delta) != current
    }

    /// Scroll so that a section's top edge sits at the top of the viewport.
    pub fn scroll_to_section(&self, id: &str) -> Option<f64> {
        let geometry = self.section_geometry(id)?;
        Some(self.scroll_to(geometry.top))
    }

    // =========================================================================
    // MEASUREMENT
    // =========================================================================

    /// Force a layout pass, surfacing layout errors.
    pub fn relayout(&self) -> Result<(), SpyError> {
        let mut content = self.content.borrow_mut();
        let measured = measure(&content.sections, self.frame.get())?;
        content.measured = Some(measured);
        Ok(())
    }

    fn with_measured<R>(&self, f: impl FnOnce(&Measured) -> R) -> R {
        let needs_layout = self.content.borrow().measured.is_none();
        if needs_layout {
            if let Err(err) = self.relayout() {
                tracing::warn!(error = %err, "document layout failed");
                self.content.borrow_mut().measured = Some(Measured::default());
            }
        }
        let content = self.content.borrow();
        match content.measured.as_ref() {
            Some(measured) => f(measured),
            None => f(&Measured::default()),
        }
    }

    /// Height of the laid-out content, padding included.
    pub fn content_height(&self) -> f64 {
        self.with_measured(|measured| measured.content_height)
    }
}

impl TargetDiscovery for FlowDocument {
    fn list_targets(&self) -> Result<Vec<SpyMarker>, SpyError> {
        let content = self.content.borrow();
        let markers = content
            .markers
            .iter()
            .filter_map(|marker| {
                match content.sections.iter().find(|s| s.id == marker.section) {
                    None => Some(SpyMarker::unresolved(marker.link.clone())),
                    Some(section) if !section.visible => None,
                    Some(section) => Some(SpyMarker::new(
                        marker.link.clone(),
                        SectionRef::new(section.id.clone()),
                    )),
                }
            })
            .collect();
        Ok(markers)
    }
}

impl GeometryProvider for FlowDocument {
    fn section_top(&self, section: &SectionRef) -> Option<f64> {
        self.section_geometry(section.as_str()).map(|g| g.top)
    }

    fn section_height(&self, section: &SectionRef) -> Option<f64> {
        self.section_geometry(section.as_str()).map(|g| g.height)
    }

    /// Content height, but never less than the viewport.
    fn document_height(&self) -> f64 {
        self.content_height().max(self.viewport_height.get())
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height.get()
    }

    fn scroll_position(&self) -> f64 {
        self.scroll.get().clamp(0.0, self.max_scroll())
    }
}

// =============================================================================
// TESTS
// =============================================================================
