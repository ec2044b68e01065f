//! Durable audit trail for executed commands.
//!
//! One text block is appended per completed command. Write failures are logged
//! as warnings and never surface into the UI loop.

use crate::exec::CompletionMsg;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn default_path() -> PathBuf {
    if let Ok(value) = env::var("DECKHAND_COMMAND_LOG") {
        if !value.is_empty() {
            return PathBuf::from(value);
        }
    }
    crate::config::state_dir().join("install.log")
}

/// Append one record. Must be called before the completion is allowed to
/// affect session state, so a crash never loses the audit trail.
pub fn append(path: &Path, msg: &CompletionMsg) {
    if let Err(err) = try_append(path, msg) {
        log::warn!("⚠️ Could not write command log: {:#}", err);
    }
}

fn try_append(path: &Path, msg: &CompletionMsg) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format_entry(msg).as_bytes())?;
    Ok(())
}

pub fn format_entry(msg: &CompletionMsg) -> String {
    let mut entry = format!(
        "[{}] $ {}\n",
        msg.started_at.format("%Y-%m-%d %H:%M:%S"),
        msg.command
    );
    let secs = msg.duration().as_secs_f64();
    if msg.success() {
        entry.push_str(&format!(
            "STATUS: SUCCESS (exit {}, {:.1}s)\n",
            msg.exit_code, secs
        ));
    } else {
        let reason = msg.error.as_deref().unwrap_or("unknown failure");
        entry.push_str(&format!(
            "ERROR: {} (exit {}, {:.1}s)\n",
            reason, msg.exit_code, secs
        ));
    }
    for line in msg.output.lines() {
        entry.push_str("  ");
        entry.push_str(line);
        entry.push('\n');
    }
    entry.push('\n');
    entry
}

/// All log lines in order, or `None` when no log has been written yet.
/// A missing log is a valid state, not an error.
pub fn read_lines(path: &Path) -> Option<Vec<String>> {
    fs::read_to_string(path)
        .ok()
        .map(|content| content.lines().map(str::to_string).collect())
}
