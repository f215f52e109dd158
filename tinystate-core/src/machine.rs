//! Machine instances.

use crate::action;
use crate::definition::{MachineDefinition, StateId};
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a, S> {
    /// The current state does not accept the event. Nothing ran.
    Ignored { state: &'a S },

    /// A transition fired. `from` and `to` may be equal for a self-transition.
    Transitioned { from: &'a S, to: &'a S },
}

impl<'a, S> Outcome<'a, S> {
    /// The current state after the event.
    pub fn state(&self) -> &'a S {
        match self {
            Outcome::Ignored { state } => state,
            Outcome::Transitioned { to, .. } => to,
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, Outcome::Transitioned { .. })
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored { .. })
    }
}

/// A live machine: a shared definition and a current state.
///
/// The current state always names a declared state, since it only ever
/// takes values that were resolved when the definition was built.
#[derive(Debug)]
pub struct Machine<S, E> {
    definition: Arc<MachineDefinition<S, E>>,
    current: StateId,
}

impl<S, E> Clone for Machine<S, E> {
    fn clone(&self) -> Self {
        Self {
            definition: self.definition.clone(),
            current: self.current,
        }
    }
}

impl<S, E> Machine<S, E>
where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash + Debug,
{
    /// Creates an instance in the definition's initial state.
    ///
    /// The initial state's entry action is not run.
    pub fn new(definition: Arc<MachineDefinition<S, E>>) -> Self {
        let current = definition.initial_id();
        Self {
            definition,
            current,
        }
    }

    /// Current state.
    pub fn current(&self) -> &S {
        &self.definition.node(self.current).id
    }

    /// The definition this instance runs.
    pub fn definition(&self) -> &Arc<MachineDefinition<S, E>> {
        &self.definition
    }

    /// Returns true if the current state has a transition for `event`.
    pub fn accepts<Q>(&self, event: &Q) -> bool
    where
        E: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.definition
            .node(self.current)
            .events
            .contains_key(event)
    }

    /// Processes one event and returns the resulting current state.
    ///
    /// See [`dispatch`](Self::dispatch) for the action order.
    pub fn process<Q>(&mut self, event: &Q) -> &S
    where
        E: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.dispatch(event).state()
    }

    /// Processes one event.
    ///
    /// If the current state accepts `event`, runs the transition action,
    /// then the current state's exit action, then the target's entry action,
    /// and only then moves to the target. A self-transition runs all three.
    ///
    /// Otherwise nothing runs and the state is unchanged.
    pub fn dispatch<Q>(&mut self, event: &Q) -> Outcome<'_, S>
    where
        E: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let definition = &*self.definition;
        let from = self.current;
        let source = definition.node(from);

        let Some(edge) = source.events.get(event) else {
            tracing::trace!(state = ?source.id, event = ?event, "event ignored");
            return Outcome::Ignored { state: &source.id };
        };

        let target = definition.node(edge.target);

        action::run(edge.action.as_ref());
        action::run(source.exit.as_ref());
        action::run(target.entry.as_ref());

        self.current = edge.target;

        tracing::debug!(
            from = ?source.id,
            to = ?target.id,
            event = ?event,
            "transition"
        );

        Outcome::Transitioned {
            from: &source.id,
            to: &target.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::StateDef;
    use crate::error::CoreError;
    use parking_lot::Mutex;
    use proptest::prelude::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn record(log: &Log, entry: &str) -> impl Fn() + Send + Sync + 'static {
        let log = log.clone();
        let entry = entry.to_string();
        move || log.lock().push(entry.clone())
    }

    fn switch_definition(log: &Log) -> Arc<MachineDefinition<&'static str, &'static str>> {
        let def = MachineDefinition::builder("off")
            .state(
                StateDef::new("off")
                    .on_entry(record(log, "entry:off"))
                    .on_exit(record(log, "exit:off"))
                    .on_with("switch", "on", record(log, "action:off.switch")),
            )
            .state(
                StateDef::new("on")
                    .on_entry(record(log, "entry:on"))
                    .on_exit(record(log, "exit:on"))
                    .on_with("switch", "off", record(log, "action:on.switch")),
            )
            .build()
            .unwrap();
        Arc::new(def)
    }

    #[test]
    fn test_new_instance_starts_in_initial_state() {
        let log = Log::default();
        let machine = Machine::new(switch_definition(&log));

        assert_eq!(*machine.current(), "off");
        // No synthetic entry for the initial state
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_switch_twice() {
        let log = Log::default();
        let mut machine = Machine::new(switch_definition(&log));

        let states: Vec<&str> = ["switch", "switch"]
            .iter()
            .map(|event| *machine.process(event))
            .collect();

        assert_eq!(states, vec!["on", "off"]);
        assert_eq!(*machine.current(), "off");
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let log = Log::default();
        let mut machine = Machine::new(switch_definition(&log));
        machine.process(&"switch");
        log.lock().clear();

        assert_eq!(*machine.process(&"nonexistent"), "on");
        assert_eq!(*machine.current(), "on");
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_action_order() {
        let log = Log::default();
        let mut machine = Machine::new(switch_definition(&log));

        machine.process(&"switch");

        assert_eq!(
            *log.lock(),
            vec!["action:off.switch", "exit:off", "entry:on"]
        );
    }

    #[test]
    fn test_state_changes_only_after_entry_action_returns() {
        let def = MachineDefinition::builder("off")
            .state(StateDef::new("off").on("switch", "on"))
            .state(StateDef::new("on").on_entry(|| panic!("entry failed")))
            .build()
            .unwrap();
        let mut machine = Machine::new(Arc::new(def));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            machine.process(&"switch");
        }));

        assert!(result.is_err());
        assert_eq!(*machine.current(), "off");
    }

    #[test]
    fn test_self_transition_runs_exit_and_entry() {
        let log = Log::default();
        let def = MachineDefinition::builder("idle")
            .state(
                StateDef::new("idle")
                    .on_entry(record(&log, "entry:idle"))
                    .on_exit(record(&log, "exit:idle"))
                    .on_with("ping", "idle", record(&log, "action:ping")),
            )
            .build()
            .unwrap();
        let mut machine = Machine::new(Arc::new(def));

        assert_eq!(*machine.process(&"ping"), "idle");
        assert_eq!(*machine.process(&"ping"), "idle");

        assert_eq!(
            *log.lock(),
            vec![
                "action:ping",
                "exit:idle",
                "entry:idle",
                "action:ping",
                "exit:idle",
                "entry:idle",
            ]
        );
    }

    #[test]
    fn test_dispatch_outcome() {
        let log = Log::default();
        let mut machine = Machine::new(switch_definition(&log));

        let outcome = machine.dispatch(&"switch");
        assert_eq!(
            outcome,
            Outcome::Transitioned {
                from: &"off",
                to: &"on"
            }
        );
        assert!(outcome.is_transition());

        let outcome = machine.dispatch(&"unplug");
        assert_eq!(outcome, Outcome::Ignored { state: &"on" });
        assert!(outcome.is_ignored());
        assert_eq!(*outcome.state(), "on");
    }

    #[test]
    fn test_self_transition_is_reported_as_transition() {
        let def = MachineDefinition::builder("idle")
            .state(StateDef::new("idle").on("ping", "idle"))
            .build()
            .unwrap();
        let mut machine = Machine::new(Arc::new(def));

        assert!(machine.dispatch(&"ping").is_transition());
    }

    #[test]
    fn test_empty_string_target_is_not_treated_as_missing() {
        let log = Log::default();
        let def = MachineDefinition::builder("start")
            .state(StateDef::new("start").on("blank", ""))
            .state(StateDef::new("").on_entry(record(&log, "entry:blank")))
            .build()
            .unwrap();
        let mut machine = Machine::new(Arc::new(def));

        let outcome = machine.dispatch(&"blank");
        assert!(outcome.is_transition());
        assert_eq!(*outcome.state(), "");
        assert_eq!(*log.lock(), vec!["entry:blank"]);
    }

    #[test]
    fn test_accepts() {
        let log = Log::default();
        let machine = Machine::new(switch_definition(&log));

        assert!(machine.accepts(&"switch"));
        assert!(!machine.accepts(&"unplug"));
    }

    #[test]
    fn test_string_machine_driven_by_str() {
        let def: MachineDefinition<String, String> =
            MachineDefinition::builder("off".to_string())
                .state(StateDef::new("off".to_string()).on("switch".to_string(), "on".to_string()))
                .state(StateDef::new("on".to_string()).on("switch".to_string(), "off".to_string()))
                .build()
                .unwrap();
        let mut machine = Machine::new(Arc::new(def));

        assert_eq!(machine.process("switch"), "on");
        assert_eq!(machine.process("switch"), "off");
    }

    #[test]
    fn test_instances_share_a_definition() {
        let log = Log::default();
        let def = switch_definition(&log);
        let mut a = Machine::new(def.clone());
        let b = Machine::new(def.clone());

        a.process(&"switch");

        assert_eq!(*a.current(), "on");
        assert_eq!(*b.current(), "off");
        assert_eq!(Arc::strong_count(&def), 3);
    }

    #[test]
    fn test_cloned_instance_is_independent() {
        let log = Log::default();
        let mut a = Machine::new(switch_definition(&log));
        let b = a.clone();

        a.process(&"switch");

        assert_eq!(*a.current(), "on");
        assert_eq!(*b.current(), "off");
    }

    #[test]
    fn test_invalid_definition_yields_no_instance() {
        let result = MachineDefinition::builder("off")
            .state(StateDef::new("off").on("switch", "on"))
            .build();

        assert!(matches!(result, Err(CoreError::UnknownTarget { .. })));
    }

    const STATES: [&str; 3] = ["a", "b", "c"];
    const EVENTS: [&str; 4] = ["next", "back", "stay", "noise"];

    /// a --next--> b --next--> c --next--> a, `back` reverses, `stay` loops,
    /// `noise` is never accepted. Every action appends its name to the log.
    fn ring_definition(log: &Log) -> Arc<MachineDefinition<&'static str, &'static str>> {
        let states = STATES.iter().enumerate().map(|(i, &name)| {
            let next = STATES[(i + 1) % STATES.len()];
            let back = STATES[(i + STATES.len() - 1) % STATES.len()];
            StateDef::new(name)
                .on_entry(record(log, &format!("entry:{name}")))
                .on_exit(record(log, &format!("exit:{name}")))
                .on_with("next", next, record(log, &format!("action:{name}.next")))
                .on_with("back", back, record(log, &format!("action:{name}.back")))
                .on_with("stay", name, record(log, &format!("action:{name}.stay")))
        });
        Arc::new(MachineDefinition::new("a", states).unwrap())
    }

    fn run_sequence(events: &[&'static str]) -> (Vec<&'static str>, Vec<String>) {
        let log = Log::default();
        let mut machine = Machine::new(ring_definition(&log));
        let states = events.iter().map(|e| *machine.process(e)).collect();
        let actions = log.lock().clone();
        (states, actions)
    }

    proptest! {
        #[test]
        fn prop_processing_is_deterministic(
            events in prop::collection::vec(prop::sample::select(EVENTS.to_vec()), 0..64)
        ) {
            let first = run_sequence(&events);
            let second = run_sequence(&events);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_unmatched_event_is_noop(
            prefix in prop::collection::vec(prop::sample::select(EVENTS.to_vec()), 0..16)
        ) {
            let log = Log::default();
            let mut machine = Machine::new(ring_definition(&log));
            for event in &prefix {
                machine.process(event);
            }
            let before = *machine.current();
            log.lock().clear();

            let outcome = machine.dispatch(&"noise");
            prop_assert!(outcome.is_ignored());
            prop_assert_eq!(*outcome.state(), before);
            prop_assert_eq!(*machine.current(), before);
            prop_assert!(log.lock().is_empty());
        }

        #[test]
        fn prop_matched_event_runs_three_actions_in_order(
            prefix in prop::collection::vec(prop::sample::select(EVENTS.to_vec()), 0..16),
            event in prop::sample::select(vec!["next", "back", "stay"])
        ) {
            let log = Log::default();
            let mut machine = Machine::new(ring_definition(&log));
            for e in &prefix {
                machine.process(e);
            }
            let from = *machine.current();
            log.lock().clear();

            let to = *machine.process(&event);

            prop_assert_eq!(
                log.lock().clone(),
                vec![
                    format!("action:{from}.{event}"),
                    format!("exit:{from}"),
                    format!("entry:{to}"),
                ]
            );
        }
    }
}
