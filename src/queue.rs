//! Ordered command queue: one in-flight step, strict ordering, stop on first
//! failure.

use crate::detect::Tool;
use crate::exec::CompletionMsg;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    pub command: String,
    pub description: String,
}

impl QueuedCommand {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Opaque tag selecting the post-processing hook that runs once, after the
/// final step succeeds. Never consulted on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueSubject {
    None,
    ToolInstall(Tool),
    DeployKey { public_key_path: PathBuf },
    ServiceScan,
    SiteProvision { domain: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePhase {
    Idle,
    Running(usize),
    Succeeded,
    Failed,
}

/// What the event loop should do after observing a completion message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDisposition {
    Dispatch(QueuedCommand),
    Finished {
        success: bool,
        subject: QueueSubject,
    },
}

#[derive(Debug)]
pub struct CommandQueue {
    steps: Vec<QueuedCommand>,
    cursor: usize,
    subject: QueueSubject,
    phase: QueuePhase,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            cursor: 0,
            subject: QueueSubject::None,
            phase: QueuePhase::Idle,
        }
    }
}

impl CommandQueue {
    pub fn new(steps: Vec<QueuedCommand>, subject: QueueSubject) -> Self {
        Self {
            steps,
            cursor: 0,
            subject,
            phase: QueuePhase::Idle,
        }
    }

    pub fn phase(&self) -> QueuePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, QueuePhase::Running(_))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Description of the step currently awaiting its completion message.
    pub fn current_description(&self) -> Option<&str> {
        match self.phase {
            QueuePhase::Running(i) => self.steps.get(i).map(|s| s.description.as_str()),
            _ => None,
        }
    }

    /// Begin the run: returns the first command to dispatch, or `None` for an
    /// empty queue (which never enters `Running`).
    pub fn start(&mut self) -> Option<QueuedCommand> {
        if self.steps.is_empty() {
            return None;
        }
        self.cursor = 0;
        self.phase = QueuePhase::Running(0);
        Some(self.steps[0].clone())
    }

    /// Observe the completion of the in-flight step. Appends outcome lines to
    /// `report` and either hands back the next command or finishes the run.
    /// On failure the remaining steps are discarded, never executed.
    pub fn complete_step(
        &mut self,
        msg: &CompletionMsg,
        report: &mut Vec<String>,
    ) -> StepDisposition {
        let index = match self.phase {
            QueuePhase::Running(i) => i,
            // Completion with nothing outstanding: nothing to advance.
            _ => {
                return StepDisposition::Finished {
                    success: false,
                    subject: self.subject.clone(),
                }
            }
        };
        let description = self
            .steps
            .get(index)
            .map(|s| s.description.clone())
            .unwrap_or_default();

        if msg.success() {
            report.push(format!("✅ {}", description));
            self.cursor = index + 1;
            if self.cursor < self.steps.len() {
                self.phase = QueuePhase::Running(self.cursor);
                return StepDisposition::Dispatch(self.steps[self.cursor].clone());
            }
            self.phase = QueuePhase::Succeeded;
            let subject = self.subject.clone();
            self.steps.clear();
            self.cursor = 0;
            StepDisposition::Finished {
                success: true,
                subject,
            }
        } else {
            let reason = msg.error.as_deref().unwrap_or("unknown failure");
            report.push(format!("❌ {} — {}", description, reason));
            for line in msg.output.lines() {
                report.push(format!("   {}", line));
            }
            self.phase = QueuePhase::Failed;
            let subject = self.subject.clone();
            self.steps.clear();
            self.cursor = 0;
            StepDisposition::Finished {
                success: false,
                subject,
            }
        }
    }

    /// Return to `Idle` once the surrounding screen has been dismissed.
    pub fn reset(&mut self) {
        self.steps.clear();
        self.cursor = 0;
        self.subject = QueueSubject::None;
        self.phase = QueuePhase::Idle;
    }
}
