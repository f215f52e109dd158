//! Side-effecting actions bound to states and transitions.

use crate::error::CoreError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A zero-argument callable invoked for its side effect.
///
/// Actions are reference counted so a definition can be cloned and shared
/// across threads without copying the closures.
#[derive(Clone)]
pub struct Action(Arc<dyn Fn() + Send + Sync>);

impl Action {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invokes the action.
    pub fn call(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

impl<F> From<F> for Action
where
    F: Fn() + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// Invokes an optional action. A missing action is a no-op.
pub(crate) fn run(action: Option<&Action>) {
    if let Some(action) = action {
        action.call();
    }
}

type Fallback = Arc<dyn Fn(&str) -> Action + Send + Sync>;

/// Binds action names used in a [`MachineDocument`](crate::MachineDocument)
/// to callables.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Action>,
    fallback: Option<Fallback>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action under `name`, replacing any previous binding.
    pub fn register(&mut self, name: impl Into<String>, action: impl Into<Action>) -> &mut Self {
        self.actions.insert(name.into(), action.into());
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, action: impl Into<Action>) -> Self {
        self.register(name, action);
        self
    }

    /// Sets a factory used for names that were never registered.
    pub fn with_fallback<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> Action + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(factory));
        self
    }

    /// Returns true if `name` resolves, either directly or through the fallback.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name) || self.fallback.is_some()
    }

    /// Resolves an action name.
    pub fn resolve(&self, name: &str) -> Result<Action, CoreError> {
        if let Some(action) = self.actions.get(name) {
            return Ok(action.clone());
        }
        match &self.fallback {
            Some(factory) => Ok(factory(name)),
            None => Err(CoreError::UnknownAction {
                action: name.to_string(),
            }),
        }
    }

    /// Returns the number of explicitly registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ActionRegistry")
            .field("actions", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_action_call() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let action = Action::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        action.call();
        action.clone().call();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_run_none_is_noop() {
        run(None);
    }

    #[test]
    fn test_registry_resolve() {
        let registry = ActionRegistry::new().with("beep", || {});
        assert!(registry.resolve("beep").is_ok());
        assert!(registry.contains("beep"));
        assert_eq!(registry.len(), 1);

        let err = registry.resolve("boop").unwrap_err();
        assert!(matches!(err, CoreError::UnknownAction { ref action } if action == "boop"));
    }

    #[test]
    fn test_registry_fallback() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = seen.clone();
        let registry = ActionRegistry::new().with_fallback(move |name| {
            let log = log.clone();
            let name = name.to_string();
            Action::new(move || log.lock().push(name.clone()))
        });

        assert!(registry.contains("anything"));
        registry.resolve("first").unwrap().call();
        registry.resolve("second").unwrap().call();
        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_registered_action_wins_over_fallback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let registry = ActionRegistry::new()
            .with("known", move || {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .with_fallback(|_| Action::new(|| panic!("fallback used for a registered name")));

        registry.resolve("known").unwrap().call();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
