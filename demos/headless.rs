//! Headless Example - Scroll a laid-out document and watch the spy
//!
//! Demonstrates:
//! - Options loaded from JSON
//! - Enter / exit / activate / deactivate callbacks
//! - Bottom-out on a short last section
//! - Pause during a programmatic jump, then unpause
//! - Refresh after the page changes
//!
//! Run with: cargo run --example headless
//! Set NAVSPY_LOG=debug to see the spy's own tracing.

use std::rc::Rc;

use navspy::document::FlowDocument;
use navspy::input::TerminalHost;
use navspy::{NavSpy, SpyCallbacks, SpyCommand, SpyHost, SpyOptions, TargetId};
use tracing_subscriber::filter::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .with_env_var("NAVSPY_LOG")
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // 40 rows of viewport, a header, five sections and a short footer section
    let doc = Rc::new(FlowDocument::new(80.0, 40.0).with_padding(2.0).with_gap(1.0));
    doc.add_unlinked_section("header", 12.0);
    doc.add_section("install", 60.0);
    doc.add_section("usage", 80.0);
    doc.add_section("options", 45.0);
    doc.add_section("events", 50.0);
    doc.add_section("license", 8.0);

    let options = SpyOptions::from_json_str(r#"{ "top": 12, "bottom": 10, "bottomOut": true }"#)?;
    println!("options: {}", options.to_json_value());

    let sink = SpyCallbacks {
        on_enter: Some(Box::new(|| println!("  > entered spied region"))),
        on_exit: Some(Box::new(|| println!("  < left spied region"))),
        on_activate: Some(Box::new(|id: &TargetId| println!("  + {id}"))),
        on_deactivate: Some(Box::new(|id: &TargetId| println!("  - {id}"))),
    };

    let mut listeners = TerminalHost::new();
    let mut spy = NavSpy::attach(options, SpyHost::new(doc.clone(), doc.clone(), sink), &mut listeners)?;

    println!("ranges:");
    for target in spy.targets() {
        if let Some(range) = target.range {
            println!("  {:<10} [{}, {}]", target.id.as_str(), range.top, range.bottom);
        }
    }
    println!("envelope: {:?}", spy.envelope());

    println!("scrolling down:");
    let mut position = 0.0;
    while position < doc.max_scroll() {
        position = doc.scroll_to(position + 7.0);
        println!(" scroll {position}");
        listeners.notify_scroll();
    }

    println!("jump to top while paused:");
    spy.dispatch("pause".parse::<SpyCommand>()?)?;
    doc.scroll_to(0.0);
    listeners.notify_scroll();
    println!("  active while paused: {:?}", spy.active());
    spy.dispatch(SpyCommand::Unpause)?;

    println!("hide 'usage' and refresh:");
    doc.set_section_visible("usage", false);
    spy.dispatch(SpyCommand::Refresh)?;
    println!("  {} targets, active {:?}", spy.targets().len(), spy.active());

    if let Err(err) = "explode".parse::<SpyCommand>() {
        println!("unknown command: {err}");
    }

    spy.destroy();
    println!("listeners after destroy: {}", listeners.listener_count());
    Ok(())
}
