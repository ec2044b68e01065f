use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use deckhand::config::Config;
use deckhand::detect::{HostOs, Tool};
use deckhand::queue::QueuePhase;
use deckhand::services::{parse_service_list, scan_sites, UnitState};
use deckhand::tui::app::{App, InputResult, ListKind, Mode};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

const SCAN_OUTPUT: &str = "\
caddy.service  loaded active   running Caddy web server
mysql.service  loaded failed   failed  MySQL Server
redis.service  loaded inactive dead    Redis key-value store
";

fn app_with_list() -> (App, TempDir) {
    let temp = TempDir::new().expect("tempdir");
    let mut config = Config::default();
    config.log_file = Some(temp.path().join("install.log"));
    let installed: BTreeMap<Tool, bool> = Tool::all().iter().map(|t| (*t, false)).collect();
    let mut app = App::with_environment(config, installed, HostOs::Ubuntu);

    app.queue = deckhand::queue::CommandQueue::new(
        vec![deckhand::queue::QueuedCommand::new(
            deckhand::services::SCAN_COMMAND,
            "Scan systemd services",
        )],
        deckhand::queue::QueueSubject::ServiceScan,
    );
    app.mode = Mode::Processing;
    app.queue.start().unwrap();
    let now = chrono::Local::now();
    app.apply_completion(deckhand::exec::CompletionMsg {
        command: deckhand::services::SCAN_COMMAND.to_string(),
        output: SCAN_OUTPUT.to_string(),
        error: None,
        exit_code: 0,
        started_at: now,
        finished_at: now,
    });
    assert_eq!(app.mode, Mode::ListSelection);
    (app, temp)
}

#[test]
fn glyphs_track_unit_state() {
    let items = parse_service_list(SCAN_OUTPUT);
    assert_eq!(items[0].state, UnitState::Active);
    assert_eq!(items[1].state, UnitState::Failed);
    assert_eq!(items[2].state, UnitState::Inactive);
    assert_eq!(items[2].state.glyph(), "○");
}

#[test]
fn selecting_an_item_opens_its_actions() {
    let (mut app, _temp) = app_with_list();
    app.handle_key(key(KeyCode::Down));
    app.handle_key(key(KeyCode::Enter));

    assert_eq!(app.mode, Mode::ListItemActions);
    assert_eq!(app.selected_item.as_ref().unwrap().unit, "mysql.service");
    assert_eq!(app.action_index, 0);
}

#[test]
fn list_movement_clamps_at_the_back_entry() {
    let (mut app, _temp) = app_with_list();
    assert_eq!(app.list_kind, ListKind::Services);
    for _ in 0..10 {
        app.handle_key(key(KeyCode::Down));
    }
    // Three services plus the synthetic back entry.
    assert_eq!(app.list_index, 3);
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.mode, Mode::Menu);
    assert_eq!(app.queue.phase(), QueuePhase::Idle);
}

#[test]
fn restart_verb_builds_a_single_step_queue() {
    let (mut app, _temp) = app_with_list();
    app.handle_key(key(KeyCode::Enter)); // caddy.service
    app.handle_key(key(KeyCode::Down));
    app.handle_key(key(KeyCode::Down));
    app.handle_key(key(KeyCode::Down)); // Restart
    let result = app.handle_key(key(KeyCode::Enter));

    assert_eq!(result, InputResult::StartQueue);
    assert_eq!(app.mode, Mode::Processing);
    let first = app.queue.start().expect("queue staged");
    assert_eq!(first.command, "systemctl restart caddy.service");
    assert_eq!(first.description, "Restart caddy.service");
}

#[test]
fn actions_back_entry_returns_to_the_list() {
    let (mut app, _temp) = app_with_list();
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.mode, Mode::ListItemActions);
    for _ in 0..10 {
        app.handle_key(key(KeyCode::Down));
    }
    assert_eq!(app.action_index, app.action_choice_count() - 1);
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.mode, Mode::ListSelection);
    assert_eq!(app.queue.phase(), QueuePhase::Idle);
}

#[test]
fn sites_are_listed_from_the_caddy_config_dir() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("blog.test.caddy"), "blog.test {\n}\n").unwrap();
    fs::write(temp.path().join("shop.test.caddy"), "shop.test {\n}\n").unwrap();
    fs::write(temp.path().join("README.md"), "not a site").unwrap();

    let sites = scan_sites(temp.path());
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].label, "blog.test");
    assert_eq!(sites[0].unit, "caddy");
    assert_eq!(sites[0].state, UnitState::Active);
}

#[test]
fn empty_sites_dir_yields_an_empty_list() {
    let temp = TempDir::new().unwrap();
    assert!(scan_sites(temp.path()).is_empty());
    // And a directory that does not exist at all behaves the same.
    assert!(scan_sites(&temp.path().join("missing")).is_empty());
}
