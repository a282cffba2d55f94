//! Activation Tracker - Scroll position to active target
//!
//! Holds the per-instance activation state and turns each scroll position
//! into at most one activation change:
//!
//! - `OutOfBounds` - position outside the envelope, nothing active
//! - `InBounds` idle - inside the envelope but no range matched yet
//! - `InBounds(target)` - exactly one target active
//!
//! Targets are scanned in insertion (document) order and the first range
//! containing the position wins. When bottom-out is enabled and the viewport
//! already touches the end of the document, the last target is forced active
//! even if the page can never scroll far enough to reach its own range.
//!
//! The active id lives in a signal so hosts can derive UI from it; the
//! tracker is its only writer.

use spark_signals::{signal, Signal};

use crate::bounds::envelope_of;
use crate::host::VisualSink;
use crate::types::{Envelope, ScrollSnapshot, Target, TargetId, Transitions};

// =============================================================================
// ACTIVATION STATE
// =============================================================================

struct ActivationState {
    active: Signal<Option<TargetId>>,
    in_bounds: bool,
    paused: bool,
    last_target: Option<TargetId>,
}

impl ActivationState {
    fn new() -> Self {
        Self {
            active: signal(None),
            in_bounds: false,
            paused: false,
            last_target: None,
        }
    }
}

// =============================================================================
// TRACKER
// =============================================================================

/// Scroll-driven activation state machine for one spy instance.
pub struct ActivationTracker {
    targets: Vec<Target>,
    envelope: Option<Envelope>,
    state: ActivationState,
    bottom_out: bool,
}

impl ActivationTracker {
    pub fn new(bottom_out: bool) -> Self {
        Self {
            targets: Vec::new(),
            envelope: None,
            state: ActivationState::new(),
            bottom_out,
        }
    }

    /// Currently active target, if any.
    pub fn active(&self) -> Option<TargetId> {
        self.state.active.get()
    }

    /// Reactive handle to the active target.
    pub fn active_signal(&self) -> Signal<Option<TargetId>> {
        self.state.active.clone()
    }

    pub fn is_active(&self, id: &TargetId) -> bool {
        self.active().as_ref() == Some(id)
    }

    pub fn in_bounds(&self) -> bool {
        self.state.in_bounds
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn envelope(&self) -> Option<Envelope> {
        self.envelope
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Target used for bottom-out (last in insertion order).
    pub fn last_target(&self) -> Option<&TargetId> {
        self.state.last_target.as_ref()
    }

    // =========================================================================
    // TARGETS
    // =========================================================================

    /// Replace the target set and recompute the envelope.
    ///
    /// If the active target is no longer part of the set it is deactivated.
    pub fn set_targets(&mut self, targets: Vec<Target>, sink: &mut dyn VisualSink) {
        self.envelope = envelope_of(&targets);
        self.state.last_target = targets.last().map(|target| target.id.clone());
        self.targets = targets;

        if let Some(active) = self.active() {
            if !self.targets.iter().any(|target| target.id == active) {
                self.deactivate_current(sink);
            }
        }
    }

    /// Drop activation state ahead of a refresh.
    ///
    /// The sink is told about the active target and the bounds being left, so
    /// it never holds stale visual state across a refresh.
    pub fn reset(&mut self, sink: &mut dyn VisualSink) {
        self.deactivate_current(sink);
        if self.state.in_bounds {
            self.state.in_bounds = false;
            sink.exit();
        }
    }

    // =========================================================================
    // EVALUATION
    // =========================================================================

    /// Evaluate a scroll position and apply at most one activation change.
    pub fn evaluate(&mut self, snapshot: ScrollSnapshot, sink: &mut dyn VisualSink) -> Transitions {
        if self.state.paused {
            tracing::trace!(position = snapshot.position, "spy paused, skipping evaluation");
            return Transitions::NONE;
        }

        let Some(envelope) = self.envelope else {
            return Transitions::NONE;
        };

        let position = snapshot.position;
        let mut transitions = Transitions::NONE;

        if !envelope.contains(position) {
            transitions |= self.deactivate_current(sink);
            if self.state.in_bounds {
                self.state.in_bounds = false;
                tracing::debug!(position, "left spy bounds");
                sink.exit();
                transitions |= Transitions::EXIT;
            }
            return transitions;
        }

        if !self.state.in_bounds {
            self.state.in_bounds = true;
            tracing::debug!(position, "entered spy bounds");
            sink.enter();
            transitions |= Transitions::ENTER;
        }

        // Bottom-out: the page cannot scroll any further but the position is
        // still short of the envelope's end
        if self.bottom_out && snapshot.at_bottom() && position < envelope.max as f64 {
            if let Some(last) = self.state.last_target.clone() {
                return transitions | self.switch_to(last, sink);
            }
        }

        let first_match = self
            .targets
            .iter()
            .find(|target| target.matches(position))
            .map(|target| target.id.clone());

        if let Some(id) = first_match {
            transitions |= self.switch_to(id, sink);
        }

        transitions
    }

    /// Freeze evaluation.
    pub fn pause(&mut self) {
        self.state.paused = true;
    }

    /// Resume evaluation and immediately re-evaluate once.
    pub fn unpause(&mut self, snapshot: ScrollSnapshot, sink: &mut dyn VisualSink) -> Transitions {
        self.state.paused = false;
        self.evaluate(snapshot, sink)
    }

    // =========================================================================
    // MANUAL ACTIVATION
    // =========================================================================

    /// Activate a target by id.
    ///
    /// Returns `false` if no target has that id.
    pub fn activate(&mut self, id: &TargetId, sink: &mut dyn VisualSink) -> bool {
        if !self.targets.iter().any(|target| &target.id == id) {
            return false;
        }
        self.switch_to(id.clone(), sink);
        true
    }

    /// Deactivate a target by id.
    ///
    /// Returns `false` if that target is not the active one.
    pub fn deactivate(&mut self, id: &TargetId, sink: &mut dyn VisualSink) -> bool {
        if !self.is_active(id) {
            return false;
        }
        self.deactivate_current(sink);
        true
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    fn switch_to(&mut self, id: TargetId, sink: &mut dyn VisualSink) -> Transitions {
        if self.is_active(&id) {
            return Transitions::NONE;
        }

        let transitions = self.deactivate_current(sink);

        tracing::debug!(target_id = %id, "activate");
        self.state.active.set(Some(id.clone()));
        sink.activate(&id);

        transitions | Transitions::ACTIVATE
    }

    fn deactivate_current(&mut self, sink: &mut dyn VisualSink) -> Transitions {
        let Some(id) = self.active() else {
            return Transitions::NONE;
        };

        tracing::debug!(target_id = %id, "deactivate");
        sink.deactivate(&id);
        self.state.active.set(None);

        Transitions::DEACTIVATE
    }
}

impl Default for ActivationTracker {
    fn default() -> Self {
        Self::new(true)
    }
}

// =============================================================================
// TESTS
// =============================================================================
