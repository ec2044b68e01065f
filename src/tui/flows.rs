//! Named input flows: ordered prompt steps with validation, defaults, and
//! branching, terminating in a queue submission.

use super::input::InputField;
use super::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowId {
    CreateSite,
    CreateDatabase,
    QueueWorkers,
    AllowPort,
}

pub struct FlowStep {
    pub key: &'static str,
    pub prompt: &'static str,
    /// Substituted when the user submits an empty string. Applied after the
    /// step's own emptiness validation, not before.
    pub default: Option<&'static str>,
    /// Masked rendering for secrets; the stored value stays plaintext.
    pub mask: bool,
    pub validate: fn(&str) -> Result<(), String>,
}

const CREATE_SITE_STEPS: &[FlowStep] = &[
    FlowStep {
        key: "site_name",
        prompt: "Site name (directory under /var/www)",
        default: None,
        mask: false,
        validate: validation::site_name,
    },
    FlowStep {
        key: "domain",
        prompt: "Primary domain",
        default: None,
        mask: false,
        validate: validation::domain,
    },
    FlowStep {
        key: "git_repo",
        prompt: "Git repository (leave empty to start a fresh project)",
        default: None,
        mask: false,
        validate: validation::repo_url_optional,
    },
    FlowStep {
        key: "branch",
        prompt: "Branch",
        default: Some("main"),
        mask: false,
        validate: validation::branch_optional,
    },
];

const CREATE_DATABASE_STEPS: &[FlowStep] = &[
    FlowStep {
        key: "db_name",
        prompt: "Database name",
        default: None,
        mask: false,
        validate: validation::db_identifier,
    },
    FlowStep {
        key: "db_user",
        prompt: "Database user",
        default: None,
        mask: false,
        validate: validation::db_identifier,
    },
    FlowStep {
        key: "db_pass",
        prompt: "Password (min 8 characters)",
        default: None,
        mask: true,
        validate: validation::secret,
    },
];

const QUEUE_WORKER_STEPS: &[FlowStep] = &[
    FlowStep {
        key: "site_name",
        prompt: "Site to run workers for",
        default: None,
        mask: false,
        validate: validation::site_name,
    },
    FlowStep {
        key: "connection",
        prompt: "Queue connection",
        default: Some("database"),
        mask: false,
        validate: validation::token_optional,
    },
    FlowStep {
        key: "processes",
        prompt: "Worker processes",
        default: Some("1"),
        mask: false,
        validate: validation::count_optional,
    },
];

const ALLOW_PORT_STEPS: &[FlowStep] = &[FlowStep {
    key: "port",
    prompt: "TCP port to allow",
    default: None,
    mask: false,
    validate: validation::port,
}];

impl FlowId {
    pub fn title(&self) -> &'static str {
        match self {
            FlowId::CreateSite => "Create site",
            FlowId::CreateDatabase => "Create database & user",
            FlowId::QueueWorkers => "Queue workers",
            FlowId::AllowPort => "Allow firewall port",
        }
    }

    pub fn steps(&self) -> &'static [FlowStep] {
        match self {
            FlowId::CreateSite => CREATE_SITE_STEPS,
            FlowId::CreateDatabase => CREATE_DATABASE_STEPS,
            FlowId::QueueWorkers => QUEUE_WORKER_STEPS,
            FlowId::AllowPort => ALLOW_PORT_STEPS,
        }
    }

    /// Which step follows `current`, given what has been collected so far.
    /// `None` terminates the flow and hands the fields to the queue builder.
    fn next_step(&self, current: usize, fields: &[(String, String)]) -> Option<usize> {
        if let FlowId::CreateSite = self {
            // A fresh project has no branch to pick.
            if current == 2 && field_or(fields, "git_repo", "").is_empty() {
                return None;
            }
        }
        let next = current + 1;
        if next < self.steps().len() {
            Some(next)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    Continue,
    Complete,
}

/// In-progress input flow; lives from the opening prompt until submission or
/// cancellation, after which its collected fields are consumed exactly once.
pub struct ActiveFlow {
    pub id: FlowId,
    step: usize,
    pub fields: Vec<(String, String)>,
    pub field: InputField,
    pub error: Option<String>,
}

impl ActiveFlow {
    pub fn new(id: FlowId) -> Self {
        Self {
            id,
            step: 0,
            fields: Vec::new(),
            field: InputField::default(),
            error: None,
        }
    }

    pub fn current_step(&self) -> &'static FlowStep {
        &self.id.steps()[self.step]
    }

    pub fn step_number(&self) -> usize {
        self.step + 1
    }

    /// Validate the current value, then either re-prompt with an error,
    /// advance, or complete the flow.
    pub fn submit(&mut self) -> FlowOutcome {
        let step = self.current_step();
        // Secrets are stored and transmitted exactly as entered; only
        // non-masked fields get whitespace stripped.
        let entered = self.field.value();
        let raw = if step.mask {
            entered
        } else {
            entered.trim().to_string()
        };
        if let Err(message) = (step.validate)(&raw) {
            self.error = Some(message);
            return FlowOutcome::Continue;
        }
        let value = if raw.is_empty() {
            step.default.unwrap_or("").to_string()
        } else {
            raw
        };
        self.fields.push((step.key.to_string(), value));
        self.error = None;

        match self.id.next_step(self.step, &self.fields) {
            Some(next) => {
                self.step = next;
                self.field.clear();
                FlowOutcome::Continue
            }
            None => FlowOutcome::Complete,
        }
    }
}

pub fn field_or<'a>(fields: &'a [(String, String)], key: &str, default: &'a str) -> &'a str {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or(default)
}
