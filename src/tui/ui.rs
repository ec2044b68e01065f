//! Per-mode rendering for the console.

use super::app::{App, Mode};
use super::widgets;
use crate::services::ServiceVerb;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Rows available for scrollable body content at a given terminal height.
/// Kept in lockstep with the layout below (margins, borders, chrome).
pub fn body_rows(total: u16) -> usize {
    total.saturating_sub(10).max(1) as usize
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Body
                Constraint::Length(3), // Status line
            ]
            .as_ref(),
        )
        .split(f.area());

    let title_line = Line::from(vec![
        Span::styled("⚓ Deckhand", Style::default().fg(Color::White)),
        Span::raw(" | "),
        Span::styled(screen_title(app), Style::default().fg(Color::Yellow)),
    ]);
    let title = Block::default().borders(Borders::ALL).title(title_line);
    f.render_widget(title, chunks[0]);

    let body = build_body_lines(app);
    let list = List::new(body.into_iter().map(ListItem::new).collect::<Vec<_>>())
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(list, chunks[1]);

    let status = Paragraph::new(Line::from(vec![
        Span::raw(app.status_message.clone()),
        Span::raw("  "),
        Span::styled(key_hints(app), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[2]);
}

fn screen_title(app: &App) -> String {
    match app.mode {
        Mode::Menu => format!("{:?} menu", app.menu_level),
        Mode::Input => app
            .form
            .as_ref()
            .map(|flow| flow.id.title().to_string())
            .unwrap_or_else(|| "Input".to_string()),
        Mode::Processing => {
            if app.queue.is_running() {
                "Working...".to_string()
            } else {
                "Report".to_string()
            }
        }
        Mode::LogViewer => "Installation log".to_string(),
        Mode::ListSelection => "Select an item".to_string(),
        Mode::ListItemActions => app
            .selected_item
            .as_ref()
            .map(|item| item.label.clone())
            .unwrap_or_else(|| "Actions".to_string()),
    }
}

fn key_hints(app: &App) -> &'static str {
    match app.mode {
        Mode::Menu => "↑/↓ move • Enter select • r re-probe • Esc back • q quit",
        Mode::Input => "Type to edit • ←/→/Home/End move • Enter submit • Esc cancel",
        Mode::Processing => {
            if app.queue.is_running() {
                "Working — please wait"
            } else {
                "↑/↓/PgUp/PgDn/Home/End scroll • Enter/Esc back"
            }
        }
        Mode::LogViewer => "↑/↓/PgUp/PgDn/Home/End scroll • Enter/Esc back",
        Mode::ListSelection => "↑/↓ move • Enter select • Esc back",
        Mode::ListItemActions => "↑/↓ move • Enter run • Esc back",
    }
}

fn build_body_lines(app: &App) -> Vec<Line<'static>> {
    match app.mode {
        Mode::Menu => menu_lines(app),
        Mode::Input => input_lines(app),
        Mode::Processing => processing_lines(app),
        Mode::LogViewer => log_lines(app),
        Mode::ListSelection => list_lines(app),
        Mode::ListItemActions => action_lines(app),
    }
}

fn marker(selected: bool) -> Span<'static> {
    if selected {
        Span::styled("▶ ", Style::default().fg(Color::Cyan))
    } else {
        Span::raw("  ")
    }
}

fn menu_lines(app: &App) -> Vec<Line<'static>> {
    app.menu_choices
        .iter()
        .enumerate()
        .map(|(index, choice)| {
            let style = if index == app.menu_index {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                marker(index == app.menu_index),
                Span::styled(choice.clone(), style),
            ])
        })
        .collect()
}

fn input_lines(app: &App) -> Vec<Line<'static>> {
    let Some(flow) = app.form.as_ref() else {
        return vec![Line::raw("(no active flow)")];
    };
    let step = flow.current_step();
    let mut lines = vec![
        Line::raw(format!(
            "Step {}/{}: {}",
            flow.step_number(),
            flow.id.steps().len(),
            step.prompt
        )),
        Line::raw(""),
    ];

    // Masked fields show the mask glyph, one per character.
    let shown: Vec<char> = if step.mask {
        flow.field.masked().chars().collect()
    } else {
        flow.field.value().chars().collect()
    };
    let cursor = flow.field.cursor();
    let before: String = shown.iter().take(cursor).collect();
    let at: String = shown.get(cursor).map(|c| c.to_string()).unwrap_or_default();
    let after: String = shown.iter().skip(cursor + 1).collect();
    let mut spans = vec![Span::raw("> "), Span::raw(before)];
    if at.is_empty() {
        spans.push(Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)));
    } else {
        spans.push(Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)));
        spans.push(Span::raw(after));
    }
    lines.push(Line::from(spans));

    if let Some(default) = step.default {
        lines.push(Line::styled(
            format!("(empty = {})", default),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(error) = &flow.error {
        lines.push(Line::styled(
            format!("❌ {}", error),
            Style::default().fg(Color::Red),
        ));
    }
    if !flow.fields.is_empty() {
        lines.push(Line::raw(""));
        for (key, value) in &flow.fields {
            let shown = if key.contains("pass") {
                "•".repeat(value.chars().count())
            } else {
                value.clone()
            };
            lines.push(Line::styled(
                format!("  {} = {}", key, shown),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    lines
}

fn processing_lines(app: &App) -> Vec<Line<'static>> {
    if app.queue.is_running() {
        let spinner = widgets::spinner_frame(app.spinner_started);
        let description = app
            .queue
            .current_description()
            .unwrap_or("Working")
            .to_string();
        return vec![
            Line::raw(""),
            Line::from(vec![
                Span::styled(
                    format!("{} ", spinner),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(format!("{}...", description)),
            ]),
        ];
    }
    app.report
        .iter()
        .skip(app.report_scroll)
        .take(app.viewport_rows)
        .map(|line| Line::raw(line.clone()))
        .collect()
}

fn log_lines(app: &App) -> Vec<Line<'static>> {
    let Some(lines) = app.log_lines.as_ref() else {
        // A log that does not exist yet is a valid state, not a failure.
        return vec![
            Line::raw("📭 No installation log yet."),
            Line::raw("It will appear after the first provisioning command runs."),
        ];
    };
    lines
        .iter()
        .enumerate()
        .skip(app.log_scroll)
        .take(app.viewport_rows)
        .map(|(number, line)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>5} ", number + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(line.clone(), widgets::log_line_style(line)),
            ])
        })
        .collect()
}

fn list_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = app
        .list
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Line::from(vec![
                marker(index == app.list_index),
                Span::styled(
                    format!("{} ", item.state.glyph()),
                    widgets::unit_glyph_style(item.state),
                ),
                Span::raw(item.label.clone()),
            ])
        })
        .collect();
    lines.push(Line::from(vec![
        marker(app.list_index == app.list.len()),
        Span::raw("⬅ Back"),
    ]));
    if app.list.is_empty() {
        lines.insert(0, Line::raw("ℹ️ Nothing found."));
    }
    lines
}

fn action_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(item) = app.selected_item.as_ref() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", item.state.glyph()),
                widgets::unit_glyph_style(item.state),
            ),
            Span::raw(item.label.clone()),
        ]));
        lines.push(Line::raw(""));
    }
    for (index, verb) in ServiceVerb::all().iter().enumerate() {
        lines.push(Line::from(vec![
            marker(index == app.action_index),
            Span::raw(verb.label().to_string()),
        ]));
    }
    lines.push(Line::from(vec![
        marker(app.action_index == ServiceVerb::all().len()),
        Span::raw("⬅ Back"),
    ]));
    lines
}
