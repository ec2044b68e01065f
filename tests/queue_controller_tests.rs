use chrono::Local;
use deckhand::config::Config;
use deckhand::detect::{HostOs, Tool};
use deckhand::exec::CompletionMsg;
use deckhand::queue::{CommandQueue, QueuePhase, QueueSubject, QueuedCommand};
use deckhand::tui::app::{App, ListKind, Mode};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn test_app() -> (App, TempDir) {
    let temp = TempDir::new().expect("tempdir");
    let mut config = Config::default();
    config.log_file = Some(temp.path().join("install.log"));
    let installed: BTreeMap<Tool, bool> = Tool::all().iter().map(|t| (*t, false)).collect();
    (
        App::with_environment(config, installed, HostOs::Ubuntu),
        temp,
    )
}

fn ok_msg(command: &str, output: &str) -> CompletionMsg {
    let now = Local::now();
    CompletionMsg {
        command: command.to_string(),
        output: output.to_string(),
        error: None,
        exit_code: 0,
        started_at: now,
        finished_at: now,
    }
}

fn fail_msg(command: &str, exit_code: i32) -> CompletionMsg {
    let now = Local::now();
    CompletionMsg {
        command: command.to_string(),
        output: "boom".to_string(),
        error: Some(format!("exit status {}", exit_code)),
        exit_code,
        started_at: now,
        finished_at: now,
    }
}

fn steps(n: usize) -> Vec<QueuedCommand> {
    (1..=n)
        .map(|i| QueuedCommand::new(format!("echo step-{}", i), format!("Step {}", i)))
        .collect()
}

#[test]
fn all_success_path_runs_exactly_n_steps_in_order() {
    let (mut app, _temp) = test_app();
    app.queue = CommandQueue::new(steps(3), QueueSubject::None);
    app.mode = Mode::Processing;

    let mut dispatched = vec![app.queue.start().expect("first command")];
    while let Some(next) = app.apply_completion(ok_msg(&dispatched.last().unwrap().command, "")) {
        dispatched.push(next);
    }

    assert_eq!(dispatched.len(), 3);
    let commands: Vec<&str> = dispatched.iter().map(|c| c.command.as_str()).collect();
    assert_eq!(commands, vec!["echo step-1", "echo step-2", "echo step-3"]);
    assert_eq!(app.queue.phase(), QueuePhase::Succeeded);
    assert!(app.queue.is_empty());
    assert_eq!(app.report.iter().filter(|l| l.starts_with("✅")).count(), 3);
}

#[test]
fn failure_at_step_three_of_four_skips_the_rest() {
    let (mut app, _temp) = test_app();
    app.queue = CommandQueue::new(steps(4), QueueSubject::None);
    app.mode = Mode::Processing;

    let first = app.queue.start().unwrap();
    let second = app.apply_completion(ok_msg(&first.command, "")).unwrap();
    let third = app.apply_completion(ok_msg(&second.command, "")).unwrap();
    // Step 3 blows up; step 4 must never be handed out.
    let next = app.apply_completion(fail_msg(&third.command, 2));
    assert!(next.is_none());

    assert_eq!(app.report.iter().filter(|l| l.starts_with("✅")).count(), 2);
    assert_eq!(app.report.iter().filter(|l| l.starts_with("❌")).count(), 1);
    assert_eq!(app.queue.phase(), QueuePhase::Failed);
    assert!(app.queue.is_empty());
    assert_eq!(app.mode, Mode::Processing);
    // The captured output travels with the failure.
    assert!(app.report.iter().any(|l| l.contains("boom")));
}

#[test]
fn every_completion_is_logged_before_state_advances() {
    let (mut app, _temp) = test_app();
    let log_path = app.config.log_file();
    app.queue = CommandQueue::new(steps(2), QueueSubject::None);
    app.mode = Mode::Processing;

    let first = app.queue.start().unwrap();
    app.apply_completion(ok_msg(&first.command, "hello"));

    let content = std::fs::read_to_string(&log_path).expect("log written");
    assert!(content.contains("$ echo step-1"));
    assert!(content.contains("STATUS: SUCCESS"));
    assert!(content.contains("  hello"));
}

#[test]
fn service_scan_success_parses_output_into_a_list() {
    let (mut app, _temp) = test_app();
    app.queue = CommandQueue::new(
        vec![QueuedCommand::new("systemctl list-units", "Scan services")],
        QueueSubject::ServiceScan,
    );
    app.mode = Mode::Processing;
    app.queue.start().unwrap();

    let output = "\
caddy.service  loaded active running Caddy web server
mysql.service  loaded failed failed  MySQL Server
";
    let next = app.apply_completion(ok_msg("systemctl list-units", output));
    assert!(next.is_none());
    assert_eq!(app.mode, Mode::ListSelection);
    assert_eq!(app.list_kind, ListKind::Services);
    assert_eq!(app.list.len(), 2);
    assert_eq!(app.list[0].unit, "caddy.service");
    assert_eq!(app.list_index, 0);
}

#[test]
fn failed_scan_does_not_invoke_the_hook() {
    let (mut app, _temp) = test_app();
    app.queue = CommandQueue::new(
        vec![QueuedCommand::new("systemctl list-units", "Scan services")],
        QueueSubject::ServiceScan,
    );
    app.mode = Mode::Processing;
    app.queue.start().unwrap();

    app.apply_completion(fail_msg("systemctl list-units", 1));
    // No list switch on failure; the report screen shows what happened.
    assert_eq!(app.mode, Mode::Processing);
    assert!(app.list.is_empty());
    assert_eq!(app.queue.phase(), QueuePhase::Failed);
}

#[test]
fn tool_install_success_reprobes_the_flag() {
    let (mut app, _temp) = test_app();
    app.queue = CommandQueue::new(
        vec![QueuedCommand::new("true", "Install Caddy")],
        QueueSubject::ToolInstall(Tool::Caddy),
    );
    app.mode = Mode::Processing;
    app.queue.start().unwrap();

    app.apply_completion(ok_msg("true", ""));
    // The flag now reflects a real probe of this host, whatever it says.
    let expected = deckhand::detect::probe(Tool::Caddy);
    assert_eq!(app.installed.get(&Tool::Caddy).copied(), Some(expected));
}

#[test]
fn probe_is_idempotent_when_nothing_changed() {
    let before = deckhand::detect::probe(Tool::Mysql);
    let after = deckhand::detect::probe(Tool::Mysql);
    assert_eq!(before, after);
}

#[test]
fn report_screen_is_dismissed_back_to_the_menu() {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    let (mut app, _temp) = test_app();
    app.queue = CommandQueue::new(steps(1), QueueSubject::None);
    app.mode = Mode::Processing;
    app.queue.start().unwrap();
    app.apply_completion(fail_msg("echo step-1", 1));

    app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    assert_eq!(app.mode, Mode::Menu);
    assert_eq!(app.queue.phase(), QueuePhase::Idle);
}

#[test]
fn keys_are_ignored_while_a_step_is_outstanding() {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    let (mut app, _temp) = test_app();
    app.queue = CommandQueue::new(steps(2), QueueSubject::None);
    app.mode = Mode::Processing;
    app.queue.start().unwrap();

    // Enter while Running must not dismiss the screen or touch the queue.
    app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    assert_eq!(app.mode, Mode::Processing);
    assert_eq!(app.queue.phase(), QueuePhase::Running(0));
}
