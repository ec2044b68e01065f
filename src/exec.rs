//! Runs one external command off the UI thread and reports back with a message.

use chrono::{DateTime, Local};
use std::process::Command;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

/// Exit code reported when the command could not be started at all.
pub const SPAWN_FAILED_EXIT: i32 = -1;

/// Immutable result record posted back into the event loop once a command
/// finishes. Failures are encoded here, never raised past this boundary.
#[derive(Debug, Clone)]
pub struct CompletionMsg {
    pub command: String,
    /// Combined stdout + stderr.
    pub output: String,
    pub error: Option<String>,
    pub exit_code: i32,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl CompletionMsg {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.error.is_none()
    }

    pub fn duration(&self) -> Duration {
        self.finished_at
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Execute `command` through the host shell on a background thread.
/// Exactly one completion message is sent per call, success or failure.
pub fn spawn(shell: &str, command: &str, tx: Sender<CompletionMsg>) {
    let shell = shell.to_string();
    let command = command.to_string();
    thread::spawn(move || {
        let msg = run_blocking(&shell, &command);
        let _ = tx.send(msg);
    });
}

/// Synchronous body of the runner; separated so tests can call it directly.
pub fn run_blocking(shell: &str, command: &str) -> CompletionMsg {
    let started_at = Local::now();
    let result = Command::new(shell).arg("-lc").arg(command).output();
    let finished_at = Local::now();

    match result {
        Ok(output) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.is_empty() {
                if !combined.is_empty() && !combined.ends_with('\n') {
                    combined.push('\n');
                }
                combined.push_str(&stderr);
            }
            let exit_code = output.status.code().unwrap_or(SPAWN_FAILED_EXIT);
            let error = if output.status.success() {
                None
            } else {
                Some(format!("exit status {}", exit_code))
            };
            CompletionMsg {
                command: command.to_string(),
                output: combined,
                error,
                exit_code,
                started_at,
                finished_at,
            }
        }
        Err(err) => CompletionMsg {
            command: command.to_string(),
            output: String::new(),
            error: Some(format!("failed to start: {}", err)),
            exit_code: SPAWN_FAILED_EXIT,
            started_at,
            finished_at,
        },
    }
}
