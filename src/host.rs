//! Host collaborators
//!
//! The spy never touches a concrete UI toolkit. Everything it needs from the
//! surrounding page goes through these traits:
//!
//! - [`TargetDiscovery`] - which links are spying on which sections
//! - [`GeometryProvider`] - section offsets, document/viewport size, scroll position
//! - [`ListenerRegistry`] - scroll and resize notifications
//! - [`VisualSink`] - where lifecycle events go (CSS classes, custom events, ...)
//!
//! # Example
//!
//! ```
//! use navspy::{SpyCallbacks, TargetId, VisualSink};
//!
//! let mut sink = SpyCallbacks {
//!     on_activate: Some(Box::new(|id: &TargetId| println!("{id} is active"))),
//!     ..Default::default()
//! };
//! sink.activate(&TargetId::new("intro"));
//! ```

use crate::error::SpyError;
use crate::types::{SectionRef, SpyEvent, TargetId};

/// Teardown handle returned by a [`ListenerRegistry`].
pub type Disposer = Box<dyn FnOnce()>;

/// Notification handler registered with a [`ListenerRegistry`].
pub type Handler = Box<dyn FnMut()>;

// =============================================================================
// DISCOVERY
// =============================================================================

/// A spy marker found in the navigation control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpyMarker {
    pub id: TargetId,
    /// `None` when the marker's section reference cannot be resolved.
    pub section: Option<SectionRef>,
}

impl SpyMarker {
    pub fn new(id: impl Into<TargetId>, section: impl Into<SectionRef>) -> Self {
        Self {
            id: id.into(),
            section: Some(section.into()),
        }
    }

    pub fn unresolved(id: impl Into<TargetId>) -> Self {
        Self {
            id: id.into(),
            section: None,
        }
    }
}

/// Enumerates spy markers in document order.
///
/// Implementations must leave out markers whose section is not visible.
pub trait TargetDiscovery {
    fn list_targets(&self) -> Result<Vec<SpyMarker>, SpyError>;
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Read-only document and viewport measurements.
pub trait GeometryProvider {
    /// Document-relative top offset of a section, `None` if it cannot be resolved.
    fn section_top(&self, section: &SectionRef) -> Option<f64>;
    /// Outer height of a section, `None` if it cannot be resolved.
    fn section_height(&self, section: &SectionRef) -> Option<f64>;
    fn document_height(&self) -> f64;
    fn viewport_height(&self) -> f64;
    fn scroll_position(&self) -> f64;
}

// =============================================================================
// LISTENERS
// =============================================================================

/// Scroll/resize subscription.
///
/// Each registration returns a [`Disposer`] that removes the handler.
pub trait ListenerRegistry {
    fn on_scroll(&mut self, handler: Handler) -> Disposer;
    fn on_resize(&mut self, handler: Handler) -> Disposer;
}

// =============================================================================
// VISUAL SINK
// =============================================================================

/// Receives lifecycle notifications and applies any observable side effect.
pub trait VisualSink {
    fn enter(&mut self);
    fn exit(&mut self);
    fn activate(&mut self, id: &TargetId);
    fn deactivate(&mut self, id: &TargetId);
}

/// Callbacks fired on spy lifecycle events
#[derive(Default)]
pub struct SpyCallbacks {
    pub on_enter: Option<Box<dyn Fn()>>,
    pub on_exit: Option<Box<dyn Fn()>>,
    pub on_activate: Option<Box<dyn Fn(&TargetId)>>,
    pub on_deactivate: Option<Box<dyn Fn(&TargetId)>>,
}

impl VisualSink for SpyCallbacks {
    fn enter(&mut self) {
        if let Some(ref on_enter) = self.on_enter {
            on_enter();
        }
    }

    fn exit(&mut self) {
        if let Some(ref on_exit) = self.on_exit {
            on_exit();
        }
    }

    fn activate(&mut self, id: &TargetId) {
        if let Some(ref on_activate) = self.on_activate {
            on_activate(id);
        }
    }

    fn deactivate(&mut self, id: &TargetId) {
        if let Some(ref on_deactivate) = self.on_deactivate {
            on_deactivate(id);
        }
    }
}

/// Records every event in order.
impl VisualSink for Vec<SpyEvent> {
    fn enter(&mut self) {
        self.push(SpyEvent::Enter);
    }

    fn exit(&mut self) {
        self.push(SpyEvent::Exit);
    }

    fn activate(&mut self, id: &TargetId) {
        self.push(SpyEvent::Activate(id.clone()));
    }

    fn deactivate(&mut self, id: &TargetId) {
        self.push(SpyEvent::Deactivate(id.clone()));
    }
}

/// Discards every event.
impl VisualSink for () {
    fn enter(&mut self) {}
    fn exit(&mut self) {}
    fn activate(&mut self, _id: &TargetId) {}
    fn deactivate(&mut self, _id: &TargetId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_callbacks_fire() {
        let enters = Rc::new(Cell::new(0));
        let activated = Rc::new(RefCell::new(Vec::new()));

        let enters_clone = enters.clone();
        let activated_clone = activated.clone();
        let mut sink = SpyCallbacks {
            on_enter: Some(Box::new(move || enters_clone.set(enters_clone.get() + 1))),
            on_activate: Some(Box::new(move |id: &TargetId| {
                activated_clone.borrow_mut().push(id.to_string())
            })),
            ..Default::default()
        };

        sink.enter();
        sink.activate(&TargetId::new("intro"));
        // No callback registered - silently ignored
        sink.exit();
        sink.deactivate(&TargetId::new("intro"));

        assert_eq!(enters.get(), 1);
        assert_eq!(*activated.borrow(), vec!["intro".to_string()]);
    }

    #[test]
    fn test_event_log_sink() {
        let mut log: Vec<SpyEvent> = Vec::new();
        log.enter();
        log.activate(&TargetId::new("a"));
        log.deactivate(&TargetId::new("a"));
        log.exit();

        assert_eq!(
            log,
            vec![
                SpyEvent::Enter,
                SpyEvent::Activate(TargetId::new("a")),
                SpyEvent::Deactivate(TargetId::new("a")),
                SpyEvent::Exit,
            ]
        );
    }

    #[test]
    fn test_marker_constructors() {
        let marker = SpyMarker::new("link", "#section");
        assert_eq!(marker.section, Some(SectionRef::new("#section")));
        assert_eq!(SpyMarker::unresolved("link").section, None);
    }
}
