//! # tinystate-core
//!
//! Finite-state-machine engine for tinystate.
//!
//! This crate provides:
//! - Machine definitions, validated and indexed once at construction
//! - Machine instances that process events with a fixed action order
//! - Named actions and JSON/YAML machine documents
//!
//! ```
//! use std::sync::Arc;
//! use tinystate_core::{Machine, MachineDefinition, StateDef};
//!
//! let definition = MachineDefinition::builder("off")
//!     .state(StateDef::new("off").on("switch", "on"))
//!     .state(StateDef::new("on").on("switch", "off"))
//!     .build()
//!     .unwrap();
//!
//! let mut machine = Machine::new(Arc::new(definition));
//! assert_eq!(*machine.process(&"switch"), "on");
//! assert_eq!(*machine.process(&"unplug"), "on");
//! assert_eq!(*machine.process(&"switch"), "off");
//! ```

pub mod action;
pub mod definition;
pub mod document;
pub mod error;
pub mod machine;
pub mod shared;

pub use action::{Action, ActionRegistry};
pub use definition::{DefinitionBuilder, MachineDefinition, StateDef, TransitionDef};
pub use document::{MachineDocument, StateEntry, TransitionEntry};
pub use error::CoreError;
pub use machine::{Machine, Outcome};
pub use shared::SharedMachine;
