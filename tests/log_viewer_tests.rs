use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use deckhand::config::Config;
use deckhand::detect::{HostOs, Tool};
use deckhand::tui::app::{App, Mode};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn app_with_log(lines: Option<usize>) -> (App, TempDir) {
    let temp = TempDir::new().expect("tempdir");
    let log_path = temp.path().join("install.log");
    if let Some(n) = lines {
        let content: String = (1..=n).map(|i| format!("line {}\n", i)).collect();
        fs::write(&log_path, content).expect("write log");
    }
    let mut config = Config::default();
    config.log_file = Some(log_path);
    let installed: BTreeMap<Tool, bool> = Tool::all().iter().map(|t| (*t, false)).collect();
    (
        App::with_environment(config, installed, HostOs::Ubuntu),
        temp,
    )
}

#[test]
fn opens_bottom_anchored() {
    let (mut app, _temp) = app_with_log(Some(40));
    app.set_viewport_rows(18);
    app.open_log_viewer();

    assert_eq!(app.mode, Mode::LogViewer);
    assert_eq!(app.log_lines.as_ref().unwrap().len(), 40);
    assert_eq!(app.log_scroll, 22);
}

#[test]
fn home_and_end_jump_between_anchors() {
    let (mut app, _temp) = app_with_log(Some(40));
    app.set_viewport_rows(18);
    app.open_log_viewer();

    app.handle_key(key(KeyCode::Home));
    assert_eq!(app.log_scroll, 0);
    app.handle_key(key(KeyCode::End));
    assert_eq!(app.log_scroll, 22);
}

#[test]
fn line_and_page_scrolling_stay_in_bounds() {
    let (mut app, _temp) = app_with_log(Some(40));
    app.set_viewport_rows(18);
    app.open_log_viewer();

    app.handle_key(key(KeyCode::Down));
    assert_eq!(app.log_scroll, 22); // already at the bottom
    app.handle_key(key(KeyCode::PageUp));
    assert_eq!(app.log_scroll, 4);
    app.handle_key(key(KeyCode::PageUp));
    assert_eq!(app.log_scroll, 0);
    app.handle_key(key(KeyCode::Up));
    assert_eq!(app.log_scroll, 0);
    app.handle_key(key(KeyCode::PageDown));
    assert_eq!(app.log_scroll, 18);
}

#[test]
fn short_log_needs_no_scrolling() {
    let (mut app, _temp) = app_with_log(Some(5));
    app.set_viewport_rows(18);
    app.open_log_viewer();
    assert_eq!(app.log_scroll, 0);
    app.handle_key(key(KeyCode::End));
    assert_eq!(app.log_scroll, 0);
}

#[test]
fn missing_log_is_a_valid_state() {
    let (mut app, _temp) = app_with_log(None);
    app.set_viewport_rows(18);
    app.open_log_viewer();

    assert_eq!(app.mode, Mode::LogViewer);
    assert!(app.log_lines.is_none());
    assert_eq!(app.log_scroll, 0);

    // And the screen dismisses normally.
    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.mode, Mode::Menu);
}

#[test]
fn resize_clamps_an_out_of_range_offset() {
    let (mut app, _temp) = app_with_log(Some(40));
    app.set_viewport_rows(18);
    app.open_log_viewer();
    assert_eq!(app.log_scroll, 22);

    // Taller terminal: the old offset would overshoot the new maximum.
    app.set_viewport_rows(35);
    assert_eq!(app.log_scroll, 5);
}
