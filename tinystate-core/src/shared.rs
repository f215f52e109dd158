//! Cross-thread handle to a single machine instance.

use crate::definition::MachineDefinition;
use crate::machine::Machine;
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// A [`Machine`] behind a mutex, for callers that drive one instance from
/// several threads.
///
/// Each call to [`process`](Self::process) holds the lock for the whole
/// event, so actions of two events never interleave.
#[derive(Debug)]
pub struct SharedMachine<S, E> {
    inner: Arc<Mutex<Machine<S, E>>>,
}

impl<S, E> Clone for SharedMachine<S, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S, E> SharedMachine<S, E>
where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash + Debug,
{
    pub fn new(definition: Arc<MachineDefinition<S, E>>) -> Self {
        Self::from_machine(Machine::new(definition))
    }

    pub fn from_machine(machine: Machine<S, E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(machine)),
        }
    }

    /// Processes one event and returns the resulting state.
    pub fn process<Q>(&self, event: &Q) -> S
    where
        E: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.inner.lock().process(event).clone()
    }

    /// Processes one event and reports whether a transition fired.
    pub fn try_process<Q>(&self, event: &Q) -> Option<S>
    where
        E: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let mut machine = self.inner.lock();
        let outcome = machine.dispatch(event);
        if outcome.is_transition() {
            Some(outcome.state().clone())
        } else {
            None
        }
    }

    pub fn current(&self) -> S {
        self.inner.lock().current().clone()
    }

    /// Runs `f` with exclusive access to the underlying machine.
    pub fn with<R>(&self, f: impl FnOnce(&mut Machine<S, E>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
