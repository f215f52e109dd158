//! Drives a machine loaded from a document and renders each step.

use crate::config::{OutputConfig, OutputFormat};
use colored::Colorize;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tinystate_core::{
    Action, ActionRegistry, CoreError, Machine, MachineDefinition, MachineDocument, Outcome,
};

/// Names of the actions fired since the last drain, in call order.
#[derive(Debug, Clone, Default)]
pub struct ActionLog(Arc<Mutex<Vec<String>>>);

impl ActionLog {
    pub fn push(&self, name: &str) {
        self.0.lock().push(name.to_string());
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }

    /// Registry that binds every action name to an entry in this log.
    pub fn registry(&self) -> ActionRegistry {
        let log = self.clone();
        ActionRegistry::new().with_fallback(move |name| {
            let log = log.clone();
            let name = name.to_string();
            Action::new(move || log.push(&name))
        })
    }
}

/// One processed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub event: String,
    pub from: String,
    pub to: String,
    pub transitioned: bool,
    pub actions: Vec<String>,
}

/// A machine instance compiled from a document, with recording actions.
pub struct Runner {
    document: MachineDocument,
    machine: Machine<String, String>,
    log: ActionLog,
}

impl Runner {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let document = MachineDocument::from_path(path)?;
        tracing::debug!("loaded machine document from {}", path.display());
        Self::from_document(document)
    }

    pub fn from_document(document: MachineDocument) -> Result<Self, CoreError> {
        let log = ActionLog::default();
        let definition = document.compile(&log.registry())?;
        Ok(Self {
            document,
            machine: Machine::new(Arc::new(definition)),
            log,
        })
    }

    pub fn document(&self) -> &MachineDocument {
        &self.document
    }

    pub fn definition(&self) -> &MachineDefinition<String, String> {
        self.machine.definition()
    }

    pub fn current(&self) -> &str {
        self.machine.current()
    }

    /// Events accepted in the current state, sorted.
    pub fn accepted_events(&self) -> Vec<&str> {
        let mut events: Vec<&str> = self
            .definition()
            .events_from(self.machine.current())
            .into_iter()
            .map(String::as_str)
            .collect();
        events.sort_unstable();
        events
    }

    /// Processes one event.
    pub fn step(&mut self, event: &str) -> Step {
        let (from, to, transitioned) = match self.machine.dispatch(event) {
            Outcome::Ignored { state } => (state.clone(), state.clone(), false),
            Outcome::Transitioned { from, to } => (from.clone(), to.clone(), true),
        };

        Step {
            event: event.to_string(),
            from,
            to,
            transitioned,
            actions: self.log.drain(),
        }
    }
}

/// Renders a step as one output line.
pub fn render_step(step: &Step, output: &OutputConfig) -> String {
    match output.format {
        OutputFormat::Json => json_line(step),
        OutputFormat::Text => {
            let mut line = if step.transitioned {
                format!(
                    "{}: {} → {}",
                    step.event.cyan(),
                    step.from,
                    step.to.yellow()
                )
            } else {
                format!(
                    "{}: {} (state: {})",
                    step.event.cyan(),
                    "ignored".dimmed(),
                    step.to.yellow()
                )
            };

            if output.show_actions && !step.actions.is_empty() {
                line.push_str(&format!(" [{}]", step.actions.join(", ").green()));
            }
            line
        }
    }
}

/// Serializes `value` as one JSON line, or an `{"error": ...}` object if it
/// cannot be represented.
fn json_line(value: &impl Serialize) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}
