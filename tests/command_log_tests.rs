use chrono::Local;
use deckhand::command_log;
use deckhand::exec::CompletionMsg;
use tempfile::TempDir;

fn msg(command: &str, exit_code: i32, output: &str) -> CompletionMsg {
    let now = Local::now();
    CompletionMsg {
        command: command.to_string(),
        output: output.to_string(),
        error: if exit_code == 0 {
            None
        } else {
            Some(format!("exit status {}", exit_code))
        },
        exit_code,
        started_at: now,
        finished_at: now,
    }
}

#[test]
fn append_then_read_back_preserves_order() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("install.log");

    command_log::append(&path, &msg("apt-get update", 0, "Reading package lists..."));
    command_log::append(&path, &msg("ufw --force enable", 1, "permission denied"));

    let lines = command_log::read_lines(&path).expect("log exists");
    let first = lines
        .iter()
        .position(|l| l.contains("$ apt-get update"))
        .unwrap();
    let second = lines
        .iter()
        .position(|l| l.contains("$ ufw --force enable"))
        .unwrap();
    assert!(first < second);
}

#[test]
fn success_and_failure_use_their_keywords() {
    let ok = command_log::format_entry(&msg("true", 0, ""));
    assert!(ok.contains("STATUS: SUCCESS"));
    assert!(!ok.contains("ERROR:"));

    let bad = command_log::format_entry(&msg("false", 1, "boom"));
    assert!(bad.contains("ERROR: exit status 1"));
    assert!(bad.contains("  boom"));
}

#[test]
fn output_lines_are_indented_under_the_entry() {
    let entry = command_log::format_entry(&msg("ls", 0, "a\nb\n"));
    assert!(entry.contains("\n  a\n  b\n"));
}

#[test]
fn missing_log_reads_as_none() {
    let temp = TempDir::new().unwrap();
    assert!(command_log::read_lines(&temp.path().join("absent.log")).is_none());
}

#[test]
fn write_failure_is_swallowed() {
    // A directory path cannot be appended to; the collaborator must shrug,
    // not panic or error into the caller.
    let temp = TempDir::new().unwrap();
    command_log::append(temp.path(), &msg("true", 0, ""));
}

#[test]
fn parent_directories_are_created_on_demand() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("state/deckhand/install.log");
    command_log::append(&nested, &msg("true", 0, ""));
    assert!(command_log::read_lines(&nested).is_some());
}
