//! NavSpy - Public widget handle
//!
//! Wires the bounds calculator and activation tracker to the host:
//! - scroll notification → evaluate the current scroll position
//! - resize notification → re-measure ranges of the current targets
//! - `refresh` → reset, re-discover, re-measure, evaluate
//!
//! Each spy owns its state; several spies on one page share nothing.
//!
//! # Example
//!
//! ```ignore
//! use navspy::{NavSpy, SpyCallbacks, SpyHost, SpyOptions};
//!
//! let spy = NavSpy::attach(
//!     SpyOptions::default().with_top(64),
//!     SpyHost::new(document.clone(), document.clone(), SpyCallbacks {
//!         on_activate: Some(Box::new(|id: &TargetId| highlight(id))),
//!         on_deactivate: Some(Box::new(|id: &TargetId| unhighlight(id))),
//!         ..Default::default()
//!     }),
//!     &mut registry,
//! )?;
//!
//! spy.pause();   // e.g. during a programmatic jump
//! spy.unpause(); // re-evaluates immediately
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use spark_signals::Signal;

use crate::bounds::{measure_targets, remeasure};
use crate::config::SpyOptions;
use crate::error::SpyError;
use crate::host::{Disposer, GeometryProvider, ListenerRegistry, TargetDiscovery, VisualSink};
use crate::tracker::ActivationTracker;
use crate::types::{Envelope, ScrollSnapshot, Target, TargetId, Transitions};

// =============================================================================
// HOST
// =============================================================================

/// Collaborators a spy reads from and reports to.
pub struct SpyHost {
    pub discovery: Rc<dyn TargetDiscovery>,
    pub geometry: Rc<dyn GeometryProvider>,
    pub sink: Box<dyn VisualSink>,
}

impl SpyHost {
    pub fn new(
        discovery: Rc<dyn TargetDiscovery>,
        geometry: Rc<dyn GeometryProvider>,
        sink: impl VisualSink + 'static,
    ) -> Self {
        Self {
            discovery,
            geometry,
            sink: Box::new(sink),
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Named spy operations, for hosts that drive the spy from text
/// (key bindings, command palettes, scripting bridges).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpyCommand {
    Refresh,
    Pause,
    Unpause,
}

impl SpyCommand {
    pub fn name(self) -> &'static str {
        match self {
            SpyCommand::Refresh => "refresh",
            SpyCommand::Pause => "pause",
            SpyCommand::Unpause => "unpause",
        }
    }
}

impl FromStr for SpyCommand {
    type Err = SpyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "refresh" => Ok(SpyCommand::Refresh),
            "pause" => Ok(SpyCommand::Pause),
            "unpause" => Ok(SpyCommand::Unpause),
            other => Err(SpyError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for SpyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// SPY STATE
// =============================================================================

struct SpyState {
    options: SpyOptions,
    discovery: Rc<dyn TargetDiscovery>,
    geometry: Rc<dyn GeometryProvider>,
    sink: Box<dyn VisualSink>,
    tracker: ActivationTracker,
}

impl SpyState {
    fn snapshot(&self) -> ScrollSnapshot {
        ScrollSnapshot::read(self.geometry.as_ref())
    }

    fn scroll_check(&mut self) -> Transitions {
        let snapshot = self.snapshot();
        self.tracker.evaluate(snapshot, self.sink.as_mut())
    }

    fn refresh(&mut self) -> Result<(), SpyError> {
        self.tracker.reset(self.sink.as_mut());

        let markers = match self.discovery.list_targets() {
            Ok(markers) => markers,
            Err(err) => {
                // Leave a target-less spy behind: every evaluation is a no-op
                self.tracker.set_targets(Vec::new(), self.sink.as_mut());
                return Err(err);
            }
        };

        let targets = measure_targets(markers, self.geometry.as_ref(), self.options.offsets());
        self.tracker.set_targets(targets, self.sink.as_mut());
        tracing::debug!(
            targets = self.tracker.targets().len(),
            envelope = ?self.tracker.envelope(),
            "spy refreshed"
        );

        self.scroll_check();
        Ok(())
    }

    fn recompute_bounds(&mut self) {
        let offsets = self.options.offsets();
        let geometry = self.geometry.as_ref();

        let mut targets = self.tracker.targets().to_vec();
        targets.retain_mut(|target| remeasure(target, geometry, offsets));

        self.tracker.set_targets(targets, self.sink.as_mut());
        tracing::debug!(envelope = ?self.tracker.envelope(), "spy bounds recomputed");
    }
}

/// Run a listener notification against a live, non-busy spy.
fn notify(state: &Weak<RefCell<SpyState>>, kind: &'static str, f: impl FnOnce(&mut SpyState)) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let Ok(mut state) = state.try_borrow_mut() else {
        tracing::warn!(notification = kind, "ignoring re-entrant spy notification");
        return;
    };
    f(&mut *state);
}

// =============================================================================
// NAV SPY
// =============================================================================

/// A live spy attached to one navigation control.
///
/// Listeners are detached when the spy is destroyed or dropped.
pub struct NavSpy {
    state: Rc<RefCell<SpyState>>,
    disposers: Vec<Disposer>,
}

impl NavSpy {
    /// Attach a spy: subscribe to scroll and resize, then run an initial refresh.
    ///
    /// Fails if the initial target discovery fails; listeners registered so
    /// far are detached again.
    pub fn attach(
        options: SpyOptions,
        host: SpyHost,
        registry: &mut dyn ListenerRegistry,
    ) -> Result<Self, SpyError> {
        let state = Rc::new(RefCell::new(SpyState {
            options,
            discovery: host.discovery,
            geometry: host.geometry,
            sink: host.sink,
            tracker: ActivationTracker::new(options.bottom_out),
        }));

        let on_scroll = {
            let state = Rc::downgrade(&state);
            registry.on_scroll(Box::new(move || {
                notify(&state, "scroll", |state| {
                    state.scroll_check();
                })
            }))
        };
        let on_resize = {
            let state = Rc::downgrade(&state);
            registry.on_resize(Box::new(move || {
                notify(&state, "resize", SpyState::recompute_bounds)
            }))
        };

        let mut spy = Self {
            state,
            disposers: vec![on_scroll, on_resize],
        };
        spy.refresh()?;

        tracing::debug!(?options, "spy attached");
        Ok(spy)
    }

    /// Reset state, re-discover targets, recompute ranges and evaluate.
    pub fn refresh(&mut self) -> Result<(), SpyError> {
        self.state.borrow_mut().refresh()
    }

    /// Ignore scroll notifications until [`unpause`](Self::unpause).
    pub fn pause(&mut self) {
        self.state.borrow_mut().tracker.pause();
    }

    /// Resume and immediately evaluate the current scroll position.
    pub fn unpause(&mut self) -> Transitions {
        let mut state = self.state.borrow_mut();
        let snapshot = state.snapshot();
        let SpyState { tracker, sink, .. } = &mut *state;
        tracker.unpause(snapshot, sink.as_mut())
    }

    /// Activate a target by id. Returns `false` for unknown ids.
    pub fn activate(&mut self, id: &TargetId) -> bool {
        let mut state = self.state.borrow_mut();
        let SpyState { tracker, sink, .. } = &mut *state;
        tracker.activate(id, sink.as_mut())
    }

    /// Deactivate a target by id. Returns `false` unless it was the active one.
    pub fn deactivate(&mut self, id: &TargetId) -> bool {
        let mut state = self.state.borrow_mut();
        let SpyState { tracker, sink, .. } = &mut *state;
        tracker.deactivate(id, sink.as_mut())
    }

    /// Run a named command.
    pub fn dispatch(&mut self, command: SpyCommand) -> Result<(), SpyError> {
        match command {
            SpyCommand::Refresh => self.refresh()?,
            SpyCommand::Pause => self.pause(),
            SpyCommand::Unpause => {
                self.unpause();
            }
        }
        Ok(())
    }

    /// Detach listeners and drop the spy.
    pub fn destroy(self) {
        drop(self);
    }

    // =========================================================================
    // STATE ACCESS
    // =========================================================================

    pub fn active(&self) -> Option<TargetId> {
        self.state.borrow().tracker.active()
    }

    /// Reactive handle to the active target id.
    pub fn active_signal(&self) -> Signal<Option<TargetId>> {
        self.state.borrow().tracker.active_signal()
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().tracker.is_paused()
    }

    pub fn in_bounds(&self) -> bool {
        self.state.borrow().tracker.in_bounds()
    }

    pub fn envelope(&self) -> Option<Envelope> {
        self.state.borrow().tracker.envelope()
    }

    /// Targets in document order, with their current ranges.
    pub fn targets(&self) -> Vec<Target> {
        self.state.borrow().tracker.targets().to_vec()
    }

    pub fn options(&self) -> SpyOptions {
        self.state.borrow().options
    }
}

impl Drop for NavSpy {
    fn drop(&mut self) {
        for dispose in self.disposers.drain(..) {
            dispose();
        }
        tracing::debug!("spy detached");
    }
}

// =============================================================================
// TESTS
// =============================================================================
