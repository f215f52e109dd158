//! State machine definition types.
//!
//! A definition is assembled from [`StateDef`]s and validated once, when it
//! is built:
//!
//! ```
//! use tinystate_core::{MachineDefinition, StateDef};
//!
//! let definition = MachineDefinition::builder("off")
//!     .state(StateDef::new("off").on("switch", "on"))
//!     .state(StateDef::new("on").on("switch", "off"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(definition.target(&"off", &"switch"), Some(&"on"));
//! ```
//!
//! Building indexes every state by position, so the machine never has to
//! re-check a state name while it runs.

use crate::action::Action;
use crate::error::CoreError;
use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Position of a state in a validated definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct StateId(pub(crate) usize);

/// Reaction to an event within one state.
#[derive(Debug, Clone)]
pub struct TransitionDef<S> {
    /// Target state.
    pub target: S,

    /// Action run before the source state's exit action.
    pub action: Option<Action>,
}

impl<S> TransitionDef<S> {
    pub fn new(target: S) -> Self {
        Self {
            target,
            action: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<Action>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// Declaration of a single state.
#[derive(Debug, Clone)]
pub struct StateDef<S, E> {
    pub id: S,
    pub entry: Option<Action>,
    pub exit: Option<Action>,

    /// Declared transitions in declaration order. Duplicates are rejected
    /// when the definition is built.
    pub events: Vec<(E, TransitionDef<S>)>,
}

impl<S, E> StateDef<S, E> {
    pub fn new(id: S) -> Self {
        Self {
            id,
            entry: None,
            exit: None,
            events: Vec::new(),
        }
    }

    /// Sets the entry action.
    pub fn on_entry(mut self, action: impl Into<Action>) -> Self {
        self.entry = Some(action.into());
        self
    }

    /// Sets the exit action.
    pub fn on_exit(mut self, action: impl Into<Action>) -> Self {
        self.exit = Some(action.into());
        self
    }

    /// Adds a transition without an action.
    pub fn on(self, event: E, target: S) -> Self {
        self.transition(event, TransitionDef::new(target))
    }

    /// Adds a transition whose action runs before exit and entry.
    pub fn on_with(self, event: E, target: S, action: impl Into<Action>) -> Self {
        self.transition(event, TransitionDef::new(target).with_action(action))
    }

    pub fn transition(mut self, event: E, transition: TransitionDef<S>) -> Self {
        self.events.push((event, transition));
        self
    }
}

#[derive(Debug)]
pub(crate) struct Edge {
    pub(crate) target: StateId,
    pub(crate) action: Option<Action>,
}

#[derive(Debug)]
pub(crate) struct StateNode<S, E> {
    pub(crate) id: S,
    pub(crate) entry: Option<Action>,
    pub(crate) exit: Option<Action>,
    pub(crate) events: HashMap<E, Edge>,
}

/// Validated and indexed machine definition.
///
/// Immutable once built. Share it between instances with `Arc`.
#[derive(Debug)]
pub struct MachineDefinition<S, E> {
    /// States indexed by [`StateId`].
    nodes: Vec<StateNode<S, E>>,

    /// State identifier to position.
    index: HashMap<S, StateId>,

    initial: StateId,
}

impl<S, E> MachineDefinition<S, E>
where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash + Debug,
{
    /// Starts a definition with the given initial state.
    pub fn builder(initial: S) -> DefinitionBuilder<S, E> {
        DefinitionBuilder::new(initial)
    }

    /// Validates and indexes a definition.
    ///
    /// Fails if the initial state or any transition target is not declared,
    /// if a state is declared twice, or if a state declares the same event twice.
    pub fn new(
        initial: S,
        states: impl IntoIterator<Item = StateDef<S, E>>,
    ) -> Result<Self, CoreError> {
        let states: Vec<StateDef<S, E>> = states.into_iter().collect();

        // Index states
        let mut index = HashMap::with_capacity(states.len());
        for (position, state) in states.iter().enumerate() {
            if index.insert(state.id.clone(), StateId(position)).is_some() {
                return Err(CoreError::DuplicateState {
                    state: format!("{:?}", state.id),
                });
            }
        }

        let initial = *index
            .get(&initial)
            .ok_or_else(|| CoreError::UnknownInitialState {
                state: format!("{:?}", initial),
            })?;

        // Resolve transitions
        let mut nodes = Vec::with_capacity(states.len());
        for state in states {
            let mut events = HashMap::with_capacity(state.events.len());
            for (event, transition) in state.events {
                let target = *index.get(&transition.target).ok_or_else(|| {
                    CoreError::UnknownTarget {
                        state: format!("{:?}", state.id),
                        event: format!("{:?}", event),
                        target: format!("{:?}", transition.target),
                    }
                })?;

                match events.entry(event) {
                    Entry::Occupied(occupied) => {
                        return Err(CoreError::DuplicateEvent {
                            state: format!("{:?}", state.id),
                            event: format!("{:?}", occupied.key()),
                        });
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(Edge {
                            target,
                            action: transition.action,
                        });
                    }
                }
            }

            nodes.push(StateNode {
                id: state.id,
                entry: state.entry,
                exit: state.exit,
                events,
            });
        }

        tracing::debug!(
            states = nodes.len(),
            initial = ?nodes[initial.0].id,
            "machine definition built"
        );

        Ok(Self {
            nodes,
            index,
            initial,
        })
    }

    /// Returns true if the given state is declared.
    pub fn has_state(&self, state: &S) -> bool {
        self.index.contains_key(state)
    }

    /// Looks up the target of `event` in `state`.
    ///
    /// `None` means the state does not accept the event (or is not declared).
    pub fn target<Q>(&self, state: &S, event: &Q) -> Option<&S>
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.index.get(state)?;
        self.node(*id)
            .events
            .get(event)
            .map(|edge| &self.node(edge.target).id)
    }

    /// Returns all events accepted in the given state.
    pub fn events_from(&self, state: &S) -> Vec<&E> {
        self.index
            .get(state)
            .map(|id| self.node(*id).events.keys().collect())
            .unwrap_or_default()
    }

    /// Total number of declared transitions.
    pub fn transition_count(&self) -> usize {
        self.nodes.iter().map(|node| node.events.len()).sum()
    }
}

impl<S, E> MachineDefinition<S, E> {
    /// Initial state for new instances.
    pub fn initial(&self) -> &S {
        &self.node(self.initial).id
    }

    /// Declared states in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.nodes.iter().map(|node| &node.id)
    }

    /// Number of declared states.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn initial_id(&self) -> StateId {
        self.initial
    }

    pub(crate) fn node(&self, id: StateId) -> &StateNode<S, E> {
        &self.nodes[id.0]
    }
}

/// Fluent assembly of a [`MachineDefinition`].
#[derive(Debug)]
pub struct DefinitionBuilder<S, E> {
    initial: S,
    states: Vec<StateDef<S, E>>,
}

impl<S, E> DefinitionBuilder<S, E>
where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash + Debug,
{
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            states: Vec::new(),
        }
    }

    /// Declares a state.
    pub fn state(mut self, state: StateDef<S, E>) -> Self {
        self.states.push(state);
        self
    }

    /// Declares several states at once.
    pub fn states(mut self, states: impl IntoIterator<Item = StateDef<S, E>>) -> Self {
        self.states.extend(states);
        self
    }

    /// Validates and builds the definition.
    pub fn build(self) -> Result<MachineDefinition<S, E>, CoreError> {
        MachineDefinition::new(self.initial, self.states)
    }
}
