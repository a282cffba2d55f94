//! End-to-end spy behaviour against a laid-out document driven by terminal input.

use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use navspy::document::FlowDocument;
use navspy::input::TerminalHost;
use navspy::{
    Envelope, NavSpy, Range, SpyCommand, SpyError, SpyEvent, SpyHost, SpyOptions, TargetId,
    VisualSink,
};

#[derive(Clone, Default)]
struct SharedLog(Rc<RefCell<Vec<SpyEvent>>>);

impl SharedLog {
    fn take(&self) -> Vec<SpyEvent> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl VisualSink for SharedLog {
    fn enter(&mut self) {
        self.0.borrow_mut().enter();
    }

    fn exit(&mut self) {
        self.0.borrow_mut().exit();
    }

    fn activate(&mut self, id: &TargetId) {
        self.0.borrow_mut().activate(id);
    }

    fn deactivate(&mut self, id: &TargetId) {
        self.0.borrow_mut().deactivate(id);
    }
}

fn id(name: &str) -> TargetId {
    TargetId::new(name)
}

fn activate(name: &str) -> SpyEvent {
    SpyEvent::Activate(id(name))
}

fn deactivate(name: &str) -> SpyEvent {
    SpyEvent::Deactivate(id(name))
}

struct Page {
    doc: Rc<FlowDocument>,
    host: TerminalHost,
    log: SharedLog,
    spy: NavSpy,
}

impl Page {
    fn open(viewport: f64, heights: &[(&str, f32)], options: SpyOptions) -> Self {
        let doc = Rc::new(FlowDocument::new(40.0, viewport));
        for (name, height) in heights {
            doc.add_section(name, *height);
        }
        let mut host = TerminalHost::new();
        let log = SharedLog::default();
        let spy = NavSpy::attach(
            options,
            SpyHost::new(doc.clone(), doc.clone(), log.clone()),
            &mut host,
        )
        .expect("attach");
        Self { doc, host, log, spy }
    }

    /// Three 110-row sections: ranges [0,100] [110,210] [220,320].
    fn three(viewport: f64, bottom_out: bool) -> Self {
        Self::open(
            viewport,
            &[("one", 110.0), ("two", 110.0), ("three", 110.0)],
            SpyOptions::default().with_bottom_out(bottom_out),
        )
    }

    fn scroll(&self, position: f64) {
        self.doc.scroll_to(position);
        self.host.notify_scroll();
    }
}

#[test]
fn test_monotonic_scroll_walks_through_targets() {
    let page = Page::three(5.0, false);
    assert_eq!(page.log.take(), vec![SpyEvent::Enter, activate("one")]);
    assert_eq!(page.spy.envelope(), Some(Envelope { min: 0, max: 320 }));

    // 100 sits on the boundary of "one"; 105 falls in the gap
    for position in [50.0, 100.0, 105.0] {
        page.scroll(position);
        assert_eq!(page.spy.active(), Some(id("one")));
    }
    assert!(page.log.take().is_empty());

    page.scroll(150.0);
    assert_eq!(page.log.take(), vec![deactivate("one"), activate("two")]);

    page.scroll(250.0);
    assert_eq!(page.log.take(), vec![deactivate("two"), activate("three")]);

    page.scroll(325.0);
    assert_eq!(page.log.take(), vec![deactivate("three"), SpyEvent::Exit]);
    assert_eq!(page.spy.active(), None);
    assert!(!page.spy.in_bounds());
}

#[test]
fn test_keyboard_scrolling_drives_the_spy() {
    let page = Page::three(20.0, true);
    page.log.take();

    let end = Event::Key(KeyEvent::new(KeyCode::End, KeyModifiers::NONE));
    assert!(page.host.route_event(&end, &page.doc));
    assert_eq!(page.log.take(), vec![deactivate("one"), activate("three")]);

    let home = Event::Key(KeyEvent::new(KeyCode::Home, KeyModifiers::NONE));
    assert!(page.host.route_event(&home, &page.doc));
    assert_eq!(page.log.take(), vec![deactivate("three"), activate("one")]);
}

#[test]
fn test_bottom_out_activates_short_last_section() {
    let heights = [("one", 110.0), ("two", 110.0), ("short", 30.0)];

    // Content 250, viewport 50: scrolling stops at 200, inside "two"
    let page = Page::open(50.0, &heights, SpyOptions::default());
    page.scroll(200.0);
    assert_eq!(page.spy.active(), Some(id("short")));

    let page = Page::open(50.0, &heights, SpyOptions::default().with_bottom_out(false));
    page.scroll(200.0);
    assert_eq!(page.spy.active(), Some(id("two")));
}

#[test]
fn test_hidden_and_dangling_markers_are_not_tracked() {
    let doc = Rc::new(FlowDocument::new(40.0, 5.0));
    doc.add_section("one", 110.0);
    doc.add_section("two", 110.0);
    doc.add_section("three", 110.0);
    doc.add_marker("ghost", "missing");
    doc.set_section_visible("two", false);

    let mut host = TerminalHost::new();
    let spy = NavSpy::attach(
        SpyOptions::default(),
        SpyHost::new(doc.clone(), doc.clone(), ()),
        &mut host,
    )
    .expect("attach");

    let targets = spy.targets();
    let ids: Vec<_> = targets.iter().map(|target| target.id.as_str()).collect();
    assert_eq!(ids, vec!["one", "three"]);
    assert_eq!(targets[1].range, Some(Range::new(110, 210)));
}

#[test]
fn test_refresh_is_idempotent_and_balanced() {
    let mut page = Page::three(5.0, false);
    page.scroll(150.0);
    page.log.take();

    for _ in 0..2 {
        page.spy.refresh().expect("refresh");
        assert_eq!(
            page.log.take(),
            vec![
                deactivate("two"),
                SpyEvent::Exit,
                SpyEvent::Enter,
                activate("two"),
            ]
        );
        assert_eq!(page.spy.targets().len(), 3);
    }
}

#[test]
fn test_refresh_picks_up_hidden_sections() {
    let mut page = Page::three(5.0, false);
    page.scroll(150.0);

    page.doc.set_section_visible("two", false);
    page.spy.dispatch(SpyCommand::Refresh).expect("refresh");

    // "three" moved up into the old slot of "two"
    assert_eq!(page.spy.targets().len(), 2);
    assert_eq!(page.spy.active(), Some(id("three")));
}

#[test]
fn test_resize_remeasures_ranges() {
    let page = Page::three(5.0, false);
    page.doc.set_section_height("one", 210.0);

    assert!(page.host.route_event(&Event::Resize(40, 5), &page.doc));

    let ranges: Vec<_> = page.spy.targets().iter().filter_map(|t| t.range).collect();
    assert_eq!(
        ranges,
        vec![Range::new(0, 200), Range::new(210, 310), Range::new(320, 420)]
    );
    assert_eq!(page.spy.envelope(), Some(Envelope { min: 0, max: 420 }));
}

#[test]
fn test_pause_freezes_until_unpause() {
    let mut page = Page::three(5.0, false);
    page.log.take();

    page.spy.dispatch("pause".parse().expect("command")).expect("pause");
    page.scroll(250.0);
    assert_eq!(page.spy.active(), Some(id("one")));
    assert!(page.log.take().is_empty());

    page.spy.dispatch(SpyCommand::Unpause).expect("unpause");
    assert_eq!(page.spy.active(), Some(id("three")));
    assert_eq!(page.log.take(), vec![deactivate("one"), activate("three")]);
}

#[test]
fn test_unknown_command_is_rejected() {
    let err = "explode".parse::<SpyCommand>().unwrap_err();
    assert!(matches!(err, SpyError::UnknownCommand(ref name) if name == "explode"));
}

#[test]
fn test_options_from_json_shift_ranges() {
    let options = SpyOptions::from_json_str(r#"{"top": 20, "bottom": 0}"#).expect("options");
    let page = Page::open(5.0, &[("one", 110.0), ("two", 110.0)], options);

    let ranges: Vec<_> = page.spy.targets().iter().filter_map(|t| t.range).collect();
    assert_eq!(ranges, vec![Range::new(-20, 90), Range::new(90, 200)]);
}

#[test]
fn test_destroy_detaches_listeners() {
    let page = Page::three(5.0, false);
    let Page { doc, host, log, spy } = page;
    assert_eq!(host.listener_count(), 2);

    spy.destroy();
    assert_eq!(host.listener_count(), 0);

    log.take();
    doc.scroll_to(250.0);
    host.notify_scroll();
    assert!(log.take().is_empty());
}

#[test]
fn test_spies_on_one_page_are_independent() {
    let doc = Rc::new(FlowDocument::new(40.0, 5.0));
    doc.add_section("one", 110.0);
    doc.add_section("two", 110.0);

    let mut host = TerminalHost::new();
    let first_log = SharedLog::default();
    let second_log = SharedLog::default();
    let mut first = NavSpy::attach(
        SpyOptions::default(),
        SpyHost::new(doc.clone(), doc.clone(), first_log.clone()),
        &mut host,
    )
    .expect("attach");
    let second = NavSpy::attach(
        SpyOptions::default().with_top(60),
        SpyHost::new(doc.clone(), doc.clone(), second_log.clone()),
        &mut host,
    )
    .expect("attach");

    first.pause();
    doc.scroll_to(60.0);
    host.notify_scroll();

    assert_eq!(first.active(), Some(id("one")));
    assert_eq!(second.active(), Some(id("two")));
    assert!(!second.is_paused());
}
