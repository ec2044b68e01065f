//! Client for the local metrics/alerting agent.
//!
//! The agent is a separate long-running process. Its absence is a normal,
//! renderable state, never a fatal error.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentStatus {
    pub health: String,
    #[serde(default)]
    pub load_one: f64,
    #[serde(default)]
    pub memory_used_pct: f64,
    #[serde(default)]
    pub disk_used_pct: f64,
    #[serde(default)]
    pub services: Vec<AgentService>,
    #[serde(default)]
    pub checks: Vec<HttpCheck>,
    #[serde(default)]
    pub alerts: Vec<AgentAlert>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentService {
    pub name: String,
    pub running: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpCheck {
    pub url: String,
    pub status: u16,
    pub ok: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentAlert {
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum AgentReport {
    Running(AgentStatus),
    /// Connection failed; no body was read or parsed.
    NotRunning,
    /// The agent answered but the payload did not decode.
    Malformed(String),
}

pub fn fetch_status(base_url: &str, timeout: Duration) -> AgentReport {
    let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(err) => return AgentReport::Malformed(err.to_string()),
    };
    let url = format!("{}/status", base_url.trim_end_matches('/'));
    let response = match client.get(&url).send() {
        Ok(response) => response,
        Err(_) => return AgentReport::NotRunning,
    };
    if !response.status().is_success() {
        return AgentReport::Malformed(format!("agent returned HTTP {}", response.status()));
    }
    match response.json::<AgentStatus>() {
        Ok(status) => AgentReport::Running(status),
        Err(err) => AgentReport::Malformed(format!("bad agent payload: {}", err)),
    }
}

/// Render the dashboard body. Errors become explanatory lines, not failures.
pub fn report_lines(report: &AgentReport) -> Vec<String> {
    match report {
        AgentReport::NotRunning => vec![
            "❌ Agent not running".to_string(),
            "Start the deckhand-agent service to enable the dashboard.".to_string(),
        ],
        AgentReport::Malformed(reason) => vec![format!("⚠️ Agent reply unusable: {}", reason)],
        AgentReport::Running(status) => {
            let mut lines = Vec::new();
            let health_glyph = if status.health == "ok" { "✅" } else { "⚠️" };
            lines.push(format!("{} Agent health: {}", health_glyph, status.health));
            lines.push(format!(
                "📈 Load {:.2} | Memory {:.0}% | Disk {:.0}%",
                status.load_one, status.memory_used_pct, status.disk_used_pct
            ));
            if !status.services.is_empty() {
                lines.push("Services:".to_string());
                for service in &status.services {
                    let glyph = if service.running { "✅" } else { "❌" };
                    lines.push(format!("  {} {}", glyph, service.name));
                }
            }
            if !status.checks.is_empty() {
                lines.push("HTTP checks:".to_string());
                for check in &status.checks {
                    let glyph = if check.ok { "✅" } else { "❌" };
                    lines.push(format!("  {} {} ({})", glyph, check.url, check.status));
                }
            }
            if status.alerts.is_empty() {
                lines.push("🔕 No active alerts".to_string());
            } else {
                lines.push("Active alerts:".to_string());
                for alert in &status.alerts {
                    lines.push(format!("  🚨 [{}] {}", alert.level, alert.message));
                }
            }
            lines
        }
    }
}
