//! Input Module - Terminal host for a spy
//!
//! Bridges crossterm's event system with the spy's listener registry:
//! - arrow keys, PageUp/PageDown, Home/End and the mouse wheel scroll a
//!   [`FlowDocument`] and fire scroll listeners
//! - terminal resizes update the document viewport and fire resize listeners,
//!   followed by scroll listeners (the viewport may have moved)
//!
//! Horizontal input is ignored.
//!
//! # Example
//!
//! ```ignore
//! use navspy::input::{poll_event, TerminalHost};
//! use std::time::Duration;
//!
//! let mut host = TerminalHost::new().with_reserved_rows(1);
//! let spy = NavSpy::attach(options, spy_host, &mut host)?;
//!
//! loop {
//!     if let Some(event) = poll_event(Duration::from_millis(16))? {
//!         host.route_event(&event, &document);
//!     }
//! }
//! ```

use std::cell::RefCell;
use std::io::stdout;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEventKind,
    MouseEventKind, poll, read,
};
use crossterm::execute;

use crate::document::FlowDocument;
use crate::host::{Disposer, Handler, ListenerRegistry};

// =============================================================================
// SCROLL CONSTANTS
// =============================================================================

/// Scroll amount for arrow keys (rows).
pub const LINE_SCROLL: f64 = 1.0;

/// Scroll amount for one mouse wheel notch (rows).
pub const WHEEL_SCROLL: f64 = 3.0;

/// Page Up/Down scrolls this fraction of the viewport.
pub const PAGE_SCROLL_FACTOR: f64 = 0.9;

// =============================================================================
// SCROLL INTENT
// =============================================================================

/// Vertical scroll requested by an input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollIntent {
    By(f64),
    Pages(f64),
    Top,
    Bottom,
}

impl ScrollIntent {
    /// Apply to a document. Returns `true` if the scroll position changed.
    pub fn apply(self, doc: &FlowDocument) -> bool {
        use crate::host::GeometryProvider;

        let before = doc.scroll_position();
        let after = match self {
            ScrollIntent::By(delta) => doc.scroll_to(before + delta),
            ScrollIntent::Pages(pages) => {
                let page = (doc.viewport_height() * PAGE_SCROLL_FACTOR).floor().max(1.0);
                doc.scroll_to(before + pages * page)
            }
            ScrollIntent::Top => doc.scroll_to(0.0),
            ScrollIntent::Bottom => doc.scroll_to(doc.max_scroll()),
        };
        after != before
    }
}

/// Map a crossterm event to a vertical scroll, if it is one.
pub fn scroll_intent(event: &CrosstermEvent) -> Option<ScrollIntent> {
    match event {
        CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => match key.code {
            KeyCode::Up => Some(ScrollIntent::By(-LINE_SCROLL)),
            KeyCode::Down => Some(ScrollIntent::By(LINE_SCROLL)),
            KeyCode::PageUp => Some(ScrollIntent::Pages(-1.0)),
            KeyCode::PageDown | KeyCode::Char(' ') => Some(ScrollIntent::Pages(1.0)),
            KeyCode::Home => Some(ScrollIntent::Top),
            KeyCode::End => Some(ScrollIntent::Bottom),
            _ => None,
        },
        CrosstermEvent::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(ScrollIntent::By(-WHEEL_SCROLL)),
            MouseEventKind::ScrollDown => Some(ScrollIntent::By(WHEEL_SCROLL)),
            _ => None,
        },
        _ => None,
    }
}

// =============================================================================
// HANDLER LISTS
// =============================================================================

#[derive(Default)]
struct Handlers {
    next_id: usize,
    entries: Vec<(usize, Rc<RefCell<Handler>>)>,
}

impl Handlers {
    fn contains(&self, id: usize) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }
}

type SharedHandlers = Rc<RefCell<Handlers>>;

fn register(list: &SharedHandlers, handler: Handler) -> Disposer {
    let id = {
        let mut list = list.borrow_mut();
        let id = list.next_id;
        list.next_id += 1;
        list.entries.push((id, Rc::new(RefCell::new(handler))));
        id
    };

    let list = Rc::downgrade(list);
    Box::new(move || {
        if let Some(list) = list.upgrade() {
            list.borrow_mut().entries.retain(|(entry, _)| *entry != id);
        }
    })
}

/// Run every handler registered when the notification starts.
///
/// The list is not borrowed while handlers run, so they may notify, register
/// or dispose. A handler disposed mid-round is not called; a handler that is
/// already running is skipped.
fn fire(list: &SharedHandlers) {
    let round: Vec<_> = list
        .borrow()
        .entries
        .iter()
        .map(|(id, handler)| (*id, Rc::clone(handler)))
        .collect();

    for (id, handler) in round {
        if !list.borrow().contains(id) {
            continue;
        }
        let Ok(mut run) = handler.try_borrow_mut() else {
            tracing::warn!(listener = id, "skipping re-entrant listener notification");
            continue;
        };
        (&mut **run)();
    }
}

// =============================================================================
// TERMINAL HOST
// =============================================================================

/// Listener registry fed by terminal input.
#[derive(Default)]
pub struct TerminalHost {
    scroll: SharedHandlers,
    resize: SharedHandlers,
    reserved_columns: u16,
    reserved_rows: u16,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns taken by other UI (e.g. the nav sidebar).
    pub fn with_reserved_columns(mut self, columns: u16) -> Self {
        self.reserved_columns = columns;
        self
    }

    /// Rows taken by other UI (e.g. a status bar).
    pub fn with_reserved_rows(mut self, rows: u16) -> Self {
        self.reserved_rows = rows;
        self
    }

    /// Number of live scroll and resize listeners.
    pub fn listener_count(&self) -> usize {
        self.scroll.borrow().entries.len() + self.resize.borrow().entries.len()
    }

    /// Size the document viewport to a terminal of `columns` x `rows`.
    pub fn fit_viewport(&self, doc: &FlowDocument, columns: u16, rows: u16) {
        let width = columns.saturating_sub(self.reserved_columns).max(1);
        let height = rows.saturating_sub(self.reserved_rows).max(1);
        doc.set_viewport(f32::from(width), f64::from(height));
    }

    /// Route an event to the document and listeners.
    ///
    /// Returns `true` if the event scrolled or resized the document.
    pub fn route_event(&self, event: &CrosstermEvent, doc: &FlowDocument) -> bool {
        if let CrosstermEvent::Resize(columns, rows) = *event {
            self.fit_viewport(doc, columns, rows);
            fire(&self.resize);
            fire(&self.scroll);
            return true;
        }

        match scroll_intent(event) {
            Some(intent) if intent.apply(doc) => {
                fire(&self.scroll);
                true
            }
            _ => false,
        }
    }

    /// Fire scroll listeners without an input event (e.g. after a jump).
    pub fn notify_scroll(&self) {
        fire(&self.scroll);
    }
}

impl ListenerRegistry for TerminalHost {
    fn on_scroll(&mut self, handler: Handler) -> Disposer {
        register(&self.scroll, handler)
    }

    fn on_resize(&mut self, handler: Handler) -> Disposer {
        register(&self.resize, handler)
    }
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event with timeout.
/// Returns None if no event within timeout.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<CrosstermEvent>> {
    if poll(timeout)? {
        Ok(Some(read()?))
    } else {
        Ok(None)
    }
}

/// Enable mouse capture.
pub fn enable_mouse() -> std::io::Result<()> {
    execute!(stdout(), EnableMouseCapture)
}

/// Disable mouse capture.
pub fn disable_mouse() -> std::io::Result<()> {
    execute!(stdout(), DisableMouseCapture)
}

// =============================================================================
// TESTS
// =============================================================================
