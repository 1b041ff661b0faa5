use std::collections::BTreeMap;

use crate::errors::{DispatchError, Error};
use crate::home::AutoHome;

/// An action handler. Returns the text to show the caller, if any.
pub type Handler = fn(&AutoHome) -> Result<Option<String>, Error>;

/// Maps action names to handlers. Names are matched exactly.
pub struct CommandRegistry {
    handlers: BTreeMap<&'static str, Handler>,
}

impl CommandRegistry {
    pub fn new(actions: &[(&'static str, Handler)]) -> Self {
        let mut handlers = BTreeMap::new();

        for &(name, handler) in actions {
            let previous = handlers.insert(name, handler);
            assert!(previous.is_none(), "Action '{name}' is registered twice.");
        }

        Self { handlers }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn resolve(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).copied()
    }

    pub fn dispatch(&self, home: &AutoHome, name: &str) -> Result<Option<String>, DispatchError> {
        let handler = self
            .resolve(name)
            .ok_or_else(|| DispatchError::UnknownAction(name.to_string()))?;

        tracing::info!("Dispatching action {}", name);

        Ok(handler(home)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::home::ACTIONS;

    #[test]
    fn test_registry_resolves_declared_actions() {
        let registry = CommandRegistry::new(ACTIONS);

        for (name, _) in ACTIONS {
            assert!(registry.resolve(name).is_some(), "{name} should resolve");
        }
        assert_eq!(registry.names().count(), ACTIONS.len());
    }

    #[test]
    fn test_registry_matching_is_exact() {
        let registry = CommandRegistry::new(ACTIONS);

        assert!(registry.resolve("gate").is_some());
        assert!(registry.resolve("Gate").is_none());
        assert!(registry.resolve("gate ").is_none());
        assert!(registry.resolve("temperature-csv").is_none());
        assert!(registry.resolve("nonexistent_action").is_none());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_registry_rejects_duplicates() {
        let duplicated: [(&'static str, Handler); 2] = [("gate", AutoHome::gate), ("gate", AutoHome::garage)];

        CommandRegistry::new(&duplicated);
    }
}
