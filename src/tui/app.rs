//! Session state machine for the operator console.
//!
//! One long-lived `App` record is owned exclusively by the event loop; every
//! transition goes through `handle_key` or `apply_completion`, keyed on the
//! current mode. Background work never touches this state directly.

use super::flows::{field_or, ActiveFlow, FlowId, FlowOutcome};
use crate::agent;
use crate::command_log;
use crate::config::Config;
use crate::detect::{self, HostOs, Tool};
use crate::errors::ProvisionError;
use crate::exec::CompletionMsg;
use crate::provision;
use crate::queue::{CommandQueue, QueueSubject, QueuedCommand, StepDisposition};
use crate::services::{self, SelectableItem, ServiceVerb};
use crossterm::event::{KeyCode, KeyEvent};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Menu,
    Input,
    Processing,
    LogViewer,
    ListSelection,
    ListItemActions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuLevel {
    Root,
    Tools,
    Sites,
    Databases,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Services,
    Sites,
}

/// Result of handling input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Quit,
    /// A queue has been staged; the event loop dispatches its first command.
    StartQueue,
}

/// Application state
pub struct App {
    pub config: Config,
    pub mode: Mode,

    pub menu_level: MenuLevel,
    pub menu_choices: Vec<String>,
    pub menu_index: usize,

    pub form: Option<ActiveFlow>,

    pub queue: CommandQueue,
    pub report: Vec<String>,
    pub report_scroll: usize,

    pub log_lines: Option<Vec<String>>,
    pub log_scroll: usize,

    pub list: Vec<SelectableItem>,
    pub list_index: usize,
    pub list_kind: ListKind,
    pub selected_item: Option<SelectableItem>,
    pub action_index: usize,

    pub installed: BTreeMap<Tool, bool>,
    pub host_os: HostOs,

    pub status_message: String,
    pub spinner_started: Option<Instant>,
    pub viewport_rows: usize,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self::with_environment(config, detect::probe_all(), detect::host_os())
    }

    /// Construct with pre-probed environment facts; the seam tests use to
    /// avoid touching the host.
    pub fn with_environment(
        config: Config,
        installed: BTreeMap<Tool, bool>,
        host_os: HostOs,
    ) -> Self {
        let mut app = Self {
            config,
            mode: Mode::Menu,
            menu_level: MenuLevel::Root,
            menu_choices: Vec::new(),
            menu_index: 0,
            form: None,
            queue: CommandQueue::default(),
            report: Vec::new(),
            report_scroll: 0,
            log_lines: None,
            log_scroll: 0,
            list: Vec::new(),
            list_index: 0,
            list_kind: ListKind::Services,
            selected_item: None,
            action_index: 0,
            installed,
            host_os,
            status_message: "👋 Welcome aboard.".to_string(),
            spinner_started: None,
            viewport_rows: 18,
        };
        app.rebuild_menu_choices();
        app
    }

    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
        self.report_scroll = self
            .report_scroll
            .min(max_scroll(self.report.len(), self.viewport_rows));
        let log_len = self.log_lines.as_ref().map(Vec::len).unwrap_or(0);
        self.log_scroll = self.log_scroll.min(max_scroll(log_len, self.viewport_rows));
    }

    // ------------------------------------------------------------------
    // Menus
    // ------------------------------------------------------------------

    /// Rebuild the visible choices for the current level. The final entry is
    /// always the synthetic back/quit item.
    pub fn rebuild_menu_choices(&mut self) {
        self.menu_choices = match self.menu_level {
            MenuLevel::Root => vec![
                "🧰 Tools & runtimes".to_string(),
                "🌐 Sites".to_string(),
                "🗄️ Databases".to_string(),
                "🔐 Security".to_string(),
                "⚙️ Services".to_string(),
                "👷 Queue workers".to_string(),
                "📊 Dashboard".to_string(),
                "📜 Installation log".to_string(),
                "🚪 Quit".to_string(),
            ],
            MenuLevel::Tools => {
                let mut choices: Vec<String> = Tool::all()
                    .iter()
                    .map(|tool| {
                        let glyph = if self.installed.get(tool).copied().unwrap_or(false) {
                            "✅"
                        } else {
                            "⬇️"
                        };
                        format!("{} {}", glyph, tool.display())
                    })
                    .collect();
                choices.push("⬅ Back".to_string());
                choices
            }
            MenuLevel::Sites => vec![
                "➕ Create site".to_string(),
                "📋 List sites".to_string(),
                "⬅ Back".to_string(),
            ],
            MenuLevel::Databases => vec![
                "➕ Create database & user".to_string(),
                "⬅ Back".to_string(),
            ],
            MenuLevel::Security => vec![
                "🔐 Harden SSH".to_string(),
                "🔑 Generate deploy key".to_string(),
                "🧱 Enable firewall".to_string(),
                "🔓 Allow firewall port".to_string(),
                "🐙 Check GitHub connectivity".to_string(),
                "⬅ Back".to_string(),
            ],
        };
        if self.menu_index >= self.menu_choices.len() {
            self.menu_index = self.menu_choices.len().saturating_sub(1);
        }
    }

    fn enter_submenu(&mut self, level: MenuLevel) {
        self.menu_level = level;
        self.menu_index = 0;
        self.rebuild_menu_choices();
    }

    /// Leaving a submenu restores the parent's choices and deliberately
    /// resets the highlight to the top, not to the entry we came from.
    fn leave_submenu(&mut self) {
        self.menu_level = MenuLevel::Root;
        self.menu_index = 0;
        self.rebuild_menu_choices();
    }

    fn to_menu(&mut self) {
        self.queue.reset();
        self.spinner_started = None;
        self.mode = Mode::Menu;
        self.rebuild_menu_choices();
    }

    // ------------------------------------------------------------------
    // Key handling, keyed by mode
    // ------------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
        match self.mode {
            Mode::Menu => self.handle_menu_key(key),
            Mode::Input => self.handle_input_key(key),
            Mode::Processing => self.handle_processing_key(key),
            Mode::LogViewer => self.handle_log_key(key),
            Mode::ListSelection => self.handle_list_key(key),
            Mode::ListItemActions => self.handle_actions_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_index = self.menu_index.saturating_sub(1);
                InputResult::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.menu_index + 1 < self.menu_choices.len() {
                    self.menu_index += 1;
                }
                InputResult::Continue
            }
            KeyCode::Char('r') => {
                self.refresh_installed();
                InputResult::Continue
            }
            KeyCode::Enter => self.select_menu_entry(),
            KeyCode::Esc => {
                if self.menu_level != MenuLevel::Root {
                    self.leave_submenu();
                }
                InputResult::Continue
            }
            KeyCode::Char('q') => {
                if self.menu_level == MenuLevel::Root {
                    InputResult::Quit
                } else {
                    InputResult::Continue
                }
            }
            _ => InputResult::Continue,
        }
    }

    fn select_menu_entry(&mut self) -> InputResult {
        // The last entry is always back/quit and never reaches a handler.
        if self.menu_index + 1 == self.menu_choices.len() {
            return if self.menu_level == MenuLevel::Root {
                InputResult::Quit
            } else {
                self.leave_submenu();
                InputResult::Continue
            };
        }
        match self.menu_level {
            MenuLevel::Root => self.select_root_entry(),
            MenuLevel::Tools => {
                let tool = Tool::all()[self.menu_index];
                self.start_queue(
                    provision::tool_install(&self.host_os, tool),
                    QueueSubject::ToolInstall(tool),
                )
            }
            MenuLevel::Sites => match self.menu_index {
                0 => self.start_flow(FlowId::CreateSite),
                1 => {
                    self.open_list(
                        services::scan_sites(&self.config.caddy_sites_dir),
                        ListKind::Sites,
                    );
                    InputResult::Continue
                }
                _ => InputResult::Continue,
            },
            MenuLevel::Databases => match self.menu_index {
                0 => self.start_flow(FlowId::CreateDatabase),
                _ => InputResult::Continue,
            },
            MenuLevel::Security => match self.menu_index {
                0 => self.start_queue(provision::harden_ssh(&self.host_os), QueueSubject::None),
                1 => {
                    let (steps, public_key_path) = provision::deploy_key();
                    self.start_queue(Ok(steps), QueueSubject::DeployKey { public_key_path })
                }
                2 => self.start_queue(
                    provision::firewall_enable(&self.host_os),
                    QueueSubject::None,
                ),
                3 => self.start_flow(FlowId::AllowPort),
                4 => {
                    let line = detect::github_connectivity(Duration::from_secs(8));
                    self.show_report(vec![line]);
                    InputResult::Continue
                }
                _ => InputResult::Continue,
            },
        }
    }

    fn select_root_entry(&mut self) -> InputResult {
        match self.menu_index {
            0 => self.enter_submenu(MenuLevel::Tools),
            1 => self.enter_submenu(MenuLevel::Sites),
            2 => self.enter_submenu(MenuLevel::Databases),
            3 => self.enter_submenu(MenuLevel::Security),
            4 => {
                return self.start_queue(
                    Ok(vec![QueuedCommand::new(
                        services::SCAN_COMMAND,
                        "Scan systemd services",
                    )]),
                    QueueSubject::ServiceScan,
                )
            }
            5 => return self.start_flow(FlowId::QueueWorkers),
            6 => {
                let report = agent::fetch_status(
                    &self.config.agent_url,
                    Duration::from_secs(self.config.agent_timeout_secs),
                );
                self.show_report(agent::report_lines(&report));
            }
            7 => self.open_log_viewer(),
            _ => {}
        }
        InputResult::Continue
    }

    fn refresh_installed(&mut self) {
        self.installed = detect::probe_all();
        self.rebuild_menu_choices();
        self.status_message = "🔄 Re-probed installed tools.".to_string();
    }

    // ------------------------------------------------------------------
    // Input flows
    // ------------------------------------------------------------------

    fn start_flow(&mut self, id: FlowId) -> InputResult {
        self.form = Some(ActiveFlow::new(id));
        self.mode = Mode::Input;
        InputResult::Continue
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Esc => {
                // Cancellation discards everything collected so far.
                self.form = None;
                self.mode = Mode::Menu;
                self.status_message = "🚫 Cancelled.".to_string();
                InputResult::Continue
            }
            KeyCode::Enter => {
                let outcome = match self.form.as_mut() {
                    Some(flow) => flow.submit(),
                    None => return InputResult::Continue,
                };
                match outcome {
                    FlowOutcome::Continue => InputResult::Continue,
                    FlowOutcome::Complete => self.finish_flow(),
                }
            }
            _ => {
                if let Some(flow) = self.form.as_mut() {
                    flow.field.handle_key(key);
                    flow.error = None;
                }
                InputResult::Continue
            }
        }
    }

    /// Hand the collected fields to the matching queue builder. The flow id
    /// is the pending-action tag; it is consumed exactly once, here.
    fn finish_flow(&mut self) -> InputResult {
        let flow = match self.form.take() {
            Some(flow) => flow,
            None => return InputResult::Continue,
        };
        let fields = flow.fields;
        match flow.id {
            FlowId::CreateSite => {
                let domain = field_or(&fields, "domain", "").to_string();
                let repo = field_or(&fields, "git_repo", "").to_string();
                let cfg = provision::SiteConfig {
                    name: field_or(&fields, "site_name", "").to_string(),
                    domain: domain.clone(),
                    git_repo: if repo.is_empty() { None } else { Some(repo) },
                    branch: field_or(&fields, "branch", "main").to_string(),
                };
                self.start_queue(
                    provision::create_site(&self.host_os, &cfg),
                    QueueSubject::SiteProvision { domain },
                )
            }
            FlowId::CreateDatabase => {
                let cfg = provision::DatabaseConfig {
                    name: field_or(&fields, "db_name", "").to_string(),
                    user: field_or(&fields, "db_user", "").to_string(),
                    password: field_or(&fields, "db_pass", "").to_string(),
                };
                self.start_queue(
                    provision::create_database(&self.host_os, &cfg),
                    QueueSubject::None,
                )
            }
            FlowId::QueueWorkers => {
                let cfg = provision::WorkerConfig {
                    site: field_or(&fields, "site_name", "").to_string(),
                    connection: field_or(&fields, "connection", "database").to_string(),
                    processes: field_or(&fields, "processes", "1").parse().unwrap_or(1),
                };
                self.start_queue(
                    provision::queue_workers(&self.host_os, &cfg),
                    QueueSubject::None,
                )
            }
            FlowId::AllowPort => {
                let port = field_or(&fields, "port", "0").parse().unwrap_or(0);
                self.start_queue(
                    provision::firewall_allow_port(&self.host_os, port),
                    QueueSubject::None,
                )
            }
        }
    }

    // ------------------------------------------------------------------
    // Queue lifecycle
    // ------------------------------------------------------------------

    /// Stage a queue, or surface the builder error as a single report line
    /// (in which case nothing is ever dispatched).
    fn start_queue(
        &mut self,
        steps: Result<Vec<QueuedCommand>, ProvisionError>,
        subject: QueueSubject,
    ) -> InputResult {
        match steps {
            Ok(steps) => {
                self.queue = CommandQueue::new(steps, subject);
                self.report.clear();
                self.report_scroll = 0;
                self.mode = Mode::Processing;
                self.spinner_started = Some(Instant::now());
                InputResult::StartQueue
            }
            Err(err) => {
                self.show_report(vec![format!("⚠️ {}", err)]);
                InputResult::Continue
            }
        }
    }

    /// React to a runner completion message. The audit log is written before
    /// any state changes. Returns the next command to dispatch, if any.
    pub fn apply_completion(&mut self, msg: CompletionMsg) -> Option<QueuedCommand> {
        command_log::append(&self.config.log_file(), &msg);
        match self.queue.complete_step(&msg, &mut self.report) {
            StepDisposition::Dispatch(next) => Some(next),
            StepDisposition::Finished { success, subject } => {
                self.spinner_started = None;
                if success {
                    self.run_subject_hook(subject, &msg);
                    self.status_message = "✅ Done.".to_string();
                } else {
                    self.status_message = "❌ Stopped on first failure.".to_string();
                }
                None
            }
        }
    }

    fn run_subject_hook(&mut self, subject: QueueSubject, msg: &CompletionMsg) {
        match subject {
            QueueSubject::None => {}
            QueueSubject::ToolInstall(tool) => {
                let usable = detect::probe(tool);
                self.installed.insert(tool, usable);
                let glyph = if usable { "✅" } else { "⚠️" };
                self.report
                    .push(format!("{} {} detected: {}", glyph, tool.display(), usable));
            }
            QueueSubject::DeployKey { public_key_path } => {
                match std::fs::read_to_string(&public_key_path) {
                    Ok(key) => {
                        self.report
                            .push("🔑 Deploy key (add it to your Git host):".to_string());
                        for line in key.lines() {
                            self.report.push(line.to_string());
                        }
                    }
                    Err(err) => self.report.push(format!(
                        "⚠️ Key generated but unreadable at {}: {}",
                        public_key_path.display(),
                        err
                    )),
                }
            }
            QueueSubject::ServiceScan => {
                self.open_list(services::parse_service_list(&msg.output), ListKind::Services);
            }
            QueueSubject::SiteProvision { domain } => {
                self.report.push(format!("🌐 Site {} provisioned.", domain));
            }
        }
    }

    // ------------------------------------------------------------------
    // Report / processing screen
    // ------------------------------------------------------------------

    fn show_report(&mut self, lines: Vec<String>) {
        self.report = lines;
        self.report_scroll = 0;
        self.mode = Mode::Processing;
        self.spinner_started = None;
    }

    fn handle_processing_key(&mut self, key: KeyEvent) -> InputResult {
        // A step is outstanding: keys that could mutate the queue are ignored;
        // only redraw/tick events are serviced while we wait.
        if self.queue.is_running() {
            return InputResult::Continue;
        }
        if apply_scroll_key(
            key.code,
            &mut self.report_scroll,
            self.report.len(),
            self.viewport_rows,
        ) {
            return InputResult::Continue;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => {
                self.to_menu();
                InputResult::Continue
            }
            _ => InputResult::Continue,
        }
    }

    // ------------------------------------------------------------------
    // Log viewer
    // ------------------------------------------------------------------

    pub fn open_log_viewer(&mut self) {
        self.log_lines = command_log::read_lines(&self.config.log_file());
        let len = self.log_lines.as_ref().map(Vec::len).unwrap_or(0);
        // Bottom-anchored: the newest entries are what the operator wants.
        self.log_scroll = max_scroll(len, self.viewport_rows);
        self.mode = Mode::LogViewer;
    }

    fn handle_log_key(&mut self, key: KeyEvent) -> InputResult {
        let len = self.log_lines.as_ref().map(Vec::len).unwrap_or(0);
        if apply_scroll_key(key.code, &mut self.log_scroll, len, self.viewport_rows) {
            return InputResult::Continue;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => {
                self.to_menu();
                InputResult::Continue
            }
            _ => InputResult::Continue,
        }
    }

    // ------------------------------------------------------------------
    // List selection + item actions
    // ------------------------------------------------------------------

    fn open_list(&mut self, items: Vec<SelectableItem>, kind: ListKind) {
        self.list = items;
        self.list_kind = kind;
        self.list_index = 0;
        self.selected_item = None;
        self.queue.reset();
        self.spinner_started = None;
        self.mode = Mode::ListSelection;
    }

    /// Rendered list length including the synthetic back entry.
    pub fn list_choice_count(&self) -> usize {
        self.list.len() + 1
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_index = self.list_index.saturating_sub(1);
                InputResult::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.list_index + 1 < self.list_choice_count() {
                    self.list_index += 1;
                }
                InputResult::Continue
            }
            KeyCode::Enter => {
                if self.list_index == self.list.len() {
                    self.to_menu();
                } else {
                    self.selected_item = Some(self.list[self.list_index].clone());
                    self.action_index = 0;
                    self.mode = Mode::ListItemActions;
                }
                InputResult::Continue
            }
            KeyCode::Esc => {
                self.to_menu();
                InputResult::Continue
            }
            _ => InputResult::Continue,
        }
    }

    /// Rendered action count: the fixed verbs plus the synthetic back entry.
    pub fn action_choice_count(&self) -> usize {
        ServiceVerb::all().len() + 1
    }

    fn handle_actions_key(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.action_index = self.action_index.saturating_sub(1);
                InputResult::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.action_index + 1 < self.action_choice_count() {
                    self.action_index += 1;
                }
                InputResult::Continue
            }
            KeyCode::Enter => {
                if self.action_index == ServiceVerb::all().len() {
                    self.mode = Mode::ListSelection;
                    return InputResult::Continue;
                }
                let unit = match self.selected_item.as_ref() {
                    Some(item) => item.unit.clone(),
                    None => return InputResult::Continue,
                };
                let verb = ServiceVerb::all()[self.action_index];
                self.start_queue(
                    Ok(vec![QueuedCommand::new(
                        verb.command(&unit),
                        verb.description(&unit),
                    )]),
                    QueueSubject::None,
                )
            }
            KeyCode::Esc => {
                self.mode = Mode::ListSelection;
                InputResult::Continue
            }
            _ => InputResult::Continue,
        }
    }
}

pub fn max_scroll(len: usize, viewport: usize) -> usize {
    len.saturating_sub(viewport)
}

/// Shared scroll handling for the report and log screens. Offsets stay within
/// `[0, max_scroll]`. Returns whether the key was a scroll key.
fn apply_scroll_key(code: KeyCode, scroll: &mut usize, len: usize, viewport: usize) -> bool {
    let max = max_scroll(len, viewport);
    match code {
        KeyCode::Up => *scroll = scroll.saturating_sub(1),
        KeyCode::Down => *scroll = (*scroll + 1).min(max),
        KeyCode::PageUp => *scroll = scroll.saturating_sub(viewport),
        KeyCode::PageDown => *scroll = (*scroll + viewport).min(max),
        KeyCode::Home => *scroll = 0,
        KeyCode::End => *scroll = max,
        _ => return false,
    }
    true
}
