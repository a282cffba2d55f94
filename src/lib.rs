//! # navspy
//!
//! Scroll spy for navigation controls.
//!
//! A nav control lists links, each pointing at a section of the page. As the
//! viewport scrolls, navspy works out which section is "current" and tells a
//! [`VisualSink`] when the link for it activates or deactivates, and when the
//! scroll position enters or leaves the region covered by the sections.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals): the
//! active target is also exposed as a signal, so effects can follow it.
//!
//! ## Architecture
//!
//! ```text
//! TargetDiscovery + GeometryProvider → bounds (Range per target, Envelope)
//!                                          ↓
//! ListenerRegistry (scroll/resize) → ActivationTracker → VisualSink
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (TargetId, Range, Envelope, ScrollSnapshot, SpyEvent)
//! - [`config`] - Spy options (offsets, bottom-out) and JSON loading
//! - [`bounds`] - Activation ranges and the envelope
//! - [`tracker`] - The activation state machine
//! - [`host`] - Traits the spy needs from its surroundings
//! - [`spy`] - [`NavSpy`], wiring a tracker to a host
//! - [`document`] - Headless, Taffy-measured page
//! - [`input`] - Crossterm bridge for terminal hosts
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use navspy::document::FlowDocument;
//! use navspy::{NavSpy, SpyEvent, SpyHost, SpyOptions, TargetId, input::TerminalHost};
//!
//! let doc = Rc::new(FlowDocument::new(60.0, 20.0));
//! doc.add_section("intro", 40.0);
//! doc.add_section("usage", 40.0);
//!
//! let events: Vec<SpyEvent> = Vec::new();
//! let host = SpyHost::new(doc.clone(), doc.clone(), events);
//! let mut listeners = TerminalHost::new();
//!
//! let spy = NavSpy::attach(SpyOptions::default(), host, &mut listeners).unwrap();
//! assert_eq!(spy.active(), Some(TargetId::new("intro")));
//! ```

pub mod bounds;
pub mod config;
pub mod document;
pub mod error;
pub mod host;
pub mod input;
pub mod spy;
pub mod tracker;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use bounds::{Offsets, SectionGeometry, compute_envelope, compute_range};

pub use config::SpyOptions;

pub use error::{ConfigError, SpyError};

pub use host::{
    Disposer, GeometryProvider, Handler, ListenerRegistry, SpyCallbacks, SpyMarker,
    TargetDiscovery, VisualSink,
};

pub use spy::{NavSpy, SpyCommand, SpyHost};

pub use tracker::ActivationTracker;
