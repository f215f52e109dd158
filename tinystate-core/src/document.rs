//! Serialized machine definitions.
//!
//! Machine documents use a JSON (or YAML) DSL with actions referenced by name:
//!
//! ```json
//! {
//!   "initial": "off",
//!   "states": ["off", {"name": "on", "entry": "lamp_on", "exit": "lamp_off"}],
//!   "transitions": [
//!     {"from": "off", "event": "switch", "to": "on", "action": "click"},
//!     {"from": ["on"], "event": "switch", "to": "off"}
//!   ]
//! }
//! ```
//!
//! Names are bound to callables by an [`ActionRegistry`] when the document
//! is compiled into a [`MachineDefinition`].
//!
//! The same document in YAML:
//!
//! ```yaml
//! initial: "off"
//! states:
//!   - "off"
//!   - {name: "on", entry: lamp_on, exit: lamp_off}
//! transitions:
//!   - {from: "off", event: switch, to: "on", action: click}
//!   - {from: ["on"], event: switch, to: "off"}
//! ```
//!
//! State and event names are strings. YAML reads bare `true`, `false` and
//! numbers as booleans or numbers, so such names must be quoted.

use crate::action::ActionRegistry;
use crate::definition::{MachineDefinition, StateDef, TransitionDef};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A declared state: a bare name, or a name with entry/exit actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    untagged,
    expecting = "a state name (quote numeric or boolean names in YAML) or a map with name, entry and exit"
)]
pub enum StateEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entry: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit: Option<String>,
    },
}

impl StateEntry {
    pub fn name(&self) -> &str {
        match self {
            StateEntry::Name(name) | StateEntry::Detailed { name, .. } => name,
        }
    }

    pub fn entry(&self) -> Option<&str> {
        match self {
            StateEntry::Name(_) => None,
            StateEntry::Detailed { entry, .. } => entry.as_deref(),
        }
    }

    pub fn exit(&self) -> Option<&str> {
        match self {
            StateEntry::Name(_) => None,
            StateEntry::Detailed { exit, .. } => exit.as_deref(),
        }
    }
}

/// A transition in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEntry {
    /// Source state(s). Can be a single state or multiple.
    #[serde(deserialize_with = "deserialize_from_states")]
    pub from: Vec<String>,

    /// Event that triggers this transition.
    pub event: String,

    /// Target state.
    pub to: String,

    /// Optional transition action name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

fn deserialize_from_states<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct FromStatesVisitor;

    impl<'de> Visitor<'de> for FromStatesVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str(
                "a state name or list of state names (quote numeric or boolean names in YAML)",
            )
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut states = Vec::new();
            while let Some(s) = seq.next_element::<String>()? {
                states.push(s);
            }
            Ok(states)
        }
    }

    deserializer.deserialize_any(FromStatesVisitor)
}

/// Machine definition as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineDocument {
    /// Initial state.
    pub initial: String,

    /// All states, in declaration order.
    pub states: Vec<StateEntry>,

    #[serde(default)]
    pub transitions: Vec<TransitionEntry>,

    /// Optional metadata, carried but not interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl MachineDocument {
    pub fn from_json_str(s: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, CoreError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Reads a document from disk. `.yaml` and `.yml` files are parsed as
    /// YAML, everything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        Ok(serde_json::to_value(self)?)
    }

    /// CRC32C of the canonical JSON form, as 8 hex digits.
    pub fn checksum(&self) -> Result<String, CoreError> {
        let json_bytes = serde_json::to_vec(self)?;
        Ok(format!("{:08x}", crc32c::crc32c(&json_bytes)))
    }

    /// Resolves action names and builds a validated definition.
    pub fn compile(
        &self,
        registry: &ActionRegistry,
    ) -> Result<MachineDefinition<String, String>, CoreError> {
        let mut states = Vec::with_capacity(self.states.len());
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(self.states.len());

        for entry in &self.states {
            let mut state = StateDef::new(entry.name().to_string());
            if let Some(name) = entry.entry() {
                state.entry = Some(registry.resolve(name)?);
            }
            if let Some(name) = entry.exit() {
                state.exit = Some(registry.resolve(name)?);
            }
            // Duplicates are reported by MachineDefinition::new
            positions.entry(entry.name()).or_insert(states.len());
            states.push(state);
        }

        for t in &self.transitions {
            if t.from.is_empty() {
                return Err(CoreError::NoSource {
                    event: format!("{:?}", t.event),
                    target: format!("{:?}", t.to),
                });
            }

            let action = t
                .action
                .as_deref()
                .map(|name| registry.resolve(name))
                .transpose()?;

            // Add transition for each source state
            for from in &t.from {
                let position =
                    *positions
                        .get(from.as_str())
                        .ok_or_else(|| CoreError::UnknownSource {
                            state: format!("{:?}", from),
                            event: format!("{:?}", t.event),
                        })?;

                states[position].events.push((
                    t.event.clone(),
                    TransitionDef {
                        target: t.to.clone(),
                        action: action.clone(),
                    },
                ));
            }
        }

        MachineDefinition::new(self.initial.clone(), states)
    }
}
