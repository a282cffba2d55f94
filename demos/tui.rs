//! TUI Example - Scroll spy in a terminal
//!
//! A sidebar lists the sections of a long document; the link for the section
//! in view is highlighted as you scroll.
//!
//! Keys:
//! - Up/Down, PageUp/PageDown, Home/End, mouse wheel: scroll
//! - 1-9: jump to a section (spy paused during the jump)
//! - p: pause / unpause
//! - h: hide / show the "usage" section, then refresh
//! - r: refresh
//! - q / Esc: quit
//!
//! Run with: cargo run --example tui
//! Set NAVSPY_LOG_PATH (and NAVSPY_LOG=debug) to write the spy's tracing to a file.

use std::cell::Cell;
use std::io::{Write, stdout};
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::{cursor, execute, queue, terminal};
use navspy::document::FlowDocument;
use navspy::input::{TerminalHost, disable_mouse, enable_mouse, poll_event};
use navspy::{GeometryProvider, NavSpy, SpyCommand, SpyHost, SpyOptions};
use spark_signals::effect;
use tracing_subscriber::filter::EnvFilter;

const NAV_WIDTH: u16 = 22;
const STATUS_ROWS: u16 = 1;

const SECTIONS: &[(&str, f32)] = &[
    ("overview", 14.0),
    ("install", 22.0),
    ("usage", 40.0),
    ("options", 18.0),
    ("events", 26.0),
    ("methods", 30.0),
    ("faq", 12.0),
    ("license", 5.0),
];

/// Log to a file when NAVSPY_LOG_PATH is set; the terminal belongs to the UI.
fn init_logging() {
    let Ok(path) = std::env::var("NAVSPY_LOG_PATH") else {
        return;
    };
    let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .with_env_var("NAVSPY_LOG")
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(file)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let (columns, rows) = terminal::size()?;
    let host = TerminalHost::new()
        .with_reserved_columns(NAV_WIDTH)
        .with_reserved_rows(STATUS_ROWS);

    let doc = Rc::new(FlowDocument::new(1.0, 1.0).with_padding(1.0).with_gap(1.0));
    for (id, height) in SECTIONS {
        doc.add_section(id, *height);
    }
    host.fit_viewport(&doc, columns, rows);

    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
    enable_mouse()?;

    let result = run(doc, host);

    let _ = disable_mouse();
    let _ = execute!(stdout(), cursor::Show, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    result
}

fn run(doc: Rc<FlowDocument>, mut host: TerminalHost) -> Result<(), Box<dyn std::error::Error>> {
    let options = SpyOptions::default().with_top(2).with_bottom(2);
    let mut spy = NavSpy::attach(options, SpyHost::new(doc.clone(), doc.clone(), ()), &mut host)?;

    // Redraw whenever the active link changes
    let dirty = Rc::new(Cell::new(true));
    let _redraw = {
        let dirty = dirty.clone();
        let active = spy.active_signal();
        effect(move || {
            let _ = active.get();
            dirty.set(true);
        })
    };

    let mut usage_visible = true;

    loop {
        if dirty.replace(false) {
            draw(&doc, &spy)?;
        }

        let Some(event) = poll_event(Duration::from_millis(50))? else {
            continue;
        };

        if host.route_event(&event, &doc) {
            dirty.set(true);
            continue;
        }

        let Event::Key(key) = event else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
            KeyCode::Char('p') => {
                let command = if spy.is_paused() { "unpause" } else { "pause" };
                spy.dispatch(command.parse::<SpyCommand>()?)?;
            }
            KeyCode::Char('r') => spy.dispatch(SpyCommand::Refresh)?,
            KeyCode::Char('h') => {
                usage_visible = !usage_visible;
                doc.set_section_visible("usage", usage_visible);
                spy.dispatch(SpyCommand::Refresh)?;
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if let Some(target) = spy.targets().get(index) {
                    let was_paused = spy.is_paused();
                    spy.pause();
                    doc.scroll_to_section(target.section.as_str());
                    host.notify_scroll();
                    spy.activate(&target.id);
                    if !was_paused {
                        spy.unpause();
                    }
                }
            }
            _ => continue,
        }
        dirty.set(true);
    }

    spy.destroy();
    Ok(())
}

fn draw(doc: &FlowDocument, spy: &NavSpy) -> std::io::Result<()> {
    let mut out = stdout();
    let viewport = doc.viewport_height() as u16;
    let scroll = doc.scroll_position();
    let active = spy.active();
    let targets = spy.targets();

    queue!(out, terminal::Clear(terminal::ClearType::All))?;

    // Sidebar
    for (index, target) in targets.iter().enumerate() {
        let row = index as u16 + 1;
        if row >= viewport {
            break;
        }
        let is_active = active.as_ref() == Some(&target.id);
        let marker = if is_active { ">" } else { " " };
        queue!(out, cursor::MoveTo(1, row))?;
        if is_active {
            queue!(out, SetAttribute(Attribute::Reverse))?;
        }
        queue!(
            out,
            Print(format!("{marker} {} {:<14}", index + 1, target.id.as_str())),
            SetAttribute(Attribute::Reset)
        )?;
    }

    // Content
    let sections: Vec<_> = doc
        .section_ids()
        .into_iter()
        .filter_map(|id| doc.section_geometry(&id).map(|geometry| (id, geometry)))
        .collect();
    for row in 0..viewport {
        let y = scroll + f64::from(row);
        let line = sections.iter().find_map(|(id, geometry)| {
            if y < geometry.top || y >= geometry.top + geometry.height {
                return None;
            }
            if y - geometry.top < 1.0 {
                Some(format!("## {id}"))
            } else {
                Some(format!("|  {id} line {}", (y - geometry.top) as u32))
            }
        });
        if let Some(line) = line {
            queue!(out, cursor::MoveTo(NAV_WIDTH, row), Print(line))?;
        }
    }

    // Status bar
    let status = format!(
        " scroll {scroll:>4} / {:<4} {} {} | arrows/wheel scroll, 1-9 jump, p pause, h hide usage, r refresh, q quit",
        doc.max_scroll(),
        if spy.in_bounds() { "in " } else { "out" },
        if spy.is_paused() { "PAUSED" } else { "      " },
    );
    queue!(
        out,
        cursor::MoveTo(0, viewport),
        SetAttribute(Attribute::Reverse),
        Print(status),
        SetAttribute(Attribute::Reset)
    )?;

    out.flush()
}
