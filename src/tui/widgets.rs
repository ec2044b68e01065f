//! Small presentation helpers shared by the screens.

use crate::services::UnitState;
use ratatui::style::{Color, Modifier, Style};
use std::time::Instant;

pub fn spinner_frame(start: Option<Instant>) -> &'static str {
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let elapsed_ms = start
        .map(|instant| instant.elapsed().as_millis() as usize)
        .unwrap_or(0);
    frames[(elapsed_ms / 100) % frames.len()]
}

pub fn unit_glyph_style(state: UnitState) -> Style {
    match state {
        UnitState::Active => Style::default().fg(Color::Green),
        UnitState::Failed => Style::default().fg(Color::Red),
        UnitState::Inactive => Style::default().fg(Color::DarkGray),
        UnitState::Unknown => Style::default().fg(Color::Yellow),
    }
}

/// Keyword highlighting for the installation log viewer.
pub fn log_line_style(line: &str) -> Style {
    if line.contains("ERROR:") {
        Style::default().fg(Color::Red)
    } else if line.contains("STATUS: SUCCESS") {
        Style::default().fg(Color::Green)
    } else if line.contains("] $ ") {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keywords_pick_distinct_styles() {
        let error = log_line_style("ERROR: exit status 1 (exit 1, 0.2s)");
        let success = log_line_style("STATUS: SUCCESS (exit 0, 1.0s)");
        let command = log_line_style("[2026-08-05 10:00:00] $ ufw --force enable");
        let plain = log_line_style("  Reading package lists...");
        assert_eq!(error.fg, Some(Color::Red));
        assert_eq!(success.fg, Some(Color::Green));
        assert_eq!(command.fg, Some(Color::Cyan));
        assert_eq!(plain.fg, None);
    }
}
