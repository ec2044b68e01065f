//! Service discovery and control verbs for list-backed screens.

use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Active,
    Failed,
    Inactive,
    Unknown,
}

impl UnitState {
    pub fn glyph(&self) -> &'static str {
        match self {
            UnitState::Active => "●",
            UnitState::Failed => "●",
            UnitState::Inactive => "○",
            UnitState::Unknown => "◌",
        }
    }
}

/// One row of a selectable list screen: identity, last-known state, and the
/// systemd unit its control verbs act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableItem {
    pub label: String,
    pub unit: String,
    pub state: UnitState,
}

pub const SCAN_COMMAND: &str =
    "systemctl list-units --type=service --no-pager --no-legend --plain";

/// Parse `systemctl list-units` output (UNIT LOAD ACTIVE SUB DESCRIPTION).
pub fn parse_service_list(output: &str) -> Vec<SelectableItem> {
    let mut items = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let unit = match parts.next() {
            Some(unit) if unit.ends_with(".service") => unit.to_string(),
            _ => continue,
        };
        let _load = parts.next();
        let active = parts.next().unwrap_or("");
        let _sub = parts.next();
        let description = parts.collect::<Vec<_>>().join(" ");
        let state = match active {
            "active" => UnitState::Active,
            "failed" => UnitState::Failed,
            "inactive" => UnitState::Inactive,
            _ => UnitState::Unknown,
        };
        let label = if description.is_empty() {
            unit.clone()
        } else {
            format!("{} — {}", unit, description)
        };
        items.push(SelectableItem { label, unit, state });
    }
    items
}

/// Provisioned sites, enumerated from the Caddy site-config directory.
/// A site's glyph reflects whether its config is materialized on disk.
pub fn scan_sites(dir: &Path) -> Vec<SelectableItem> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut items = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let Some(domain) = name.strip_suffix(".caddy") else {
            continue;
        };
        let state = match fs::metadata(&path) {
            Ok(meta) if meta.len() > 0 => UnitState::Active,
            _ => UnitState::Unknown,
        };
        items.push(SelectableItem {
            label: domain.to_string(),
            unit: "caddy".to_string(),
            state,
        });
    }
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceVerb {
    Status,
    Start,
    Stop,
    Restart,
}

impl ServiceVerb {
    pub fn all() -> &'static [ServiceVerb] {
        &[
            ServiceVerb::Status,
            ServiceVerb::Start,
            ServiceVerb::Stop,
            ServiceVerb::Restart,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceVerb::Status => "🔎 Show status",
            ServiceVerb::Start => "▶️ Start",
            ServiceVerb::Stop => "⏹️ Stop",
            ServiceVerb::Restart => "🔁 Restart",
        }
    }

    pub fn command(&self, unit: &str) -> String {
        match self {
            ServiceVerb::Status => format!("systemctl status {} --no-pager", unit),
            ServiceVerb::Start => format!("systemctl start {}", unit),
            ServiceVerb::Stop => format!("systemctl stop {}", unit),
            ServiceVerb::Restart => format!("systemctl restart {}", unit),
        }
    }

    pub fn description(&self, unit: &str) -> String {
        match self {
            ServiceVerb::Status => format!("Show status of {}", unit),
            ServiceVerb::Start => format!("Start {}", unit),
            ServiceVerb::Stop => format!("Stop {}", unit),
            ServiceVerb::Restart => format!("Restart {}", unit),
        }
    }
}
