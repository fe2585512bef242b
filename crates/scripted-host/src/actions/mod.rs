/// Action contract and registry
///
/// An action is a named, stateless operation. The descriptor is shared by
/// every invocation; per-call state (raw and coerced arguments, the invoking
/// script) travels in an [`ActionContext`] built fresh for each call.
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use scripted_events::World;
use strum_macros::Display;

use crate::engine::Engine;
use crate::error::ArgumentError;
use crate::script::ScriptScope;

pub mod argument;
pub mod logic;
pub mod map;
pub mod player;
pub mod response;

pub use argument::{ArgValue, Argument, ArgumentType, Arguments, OptionValue};
pub use response::ActionResponse;

/// Classification used to group actions in help output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum ActionSubgroup {
    Health,
    Broadcast,
    Map,
    Variable,
    Logic,
    Debug,
}

/// Per-invocation state handed to [`Action::execute`]
pub struct ActionContext<'a> {
    pub script: &'a mut ScriptScope,
    pub engine: &'a Engine,
    pub raw_arguments: &'a [String],
    pub args: Arguments,
}

impl ActionContext<'_> {
    pub fn world(&self) -> &dyn World {
        self.engine.world()
    }
}

pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn subgroup(&self) -> ActionSubgroup;

    fn description(&self) -> &'static str;

    fn expected_arguments(&self) -> &'static [Argument];

    /// Run the action. Arguments have already been coerced against
    /// [`Action::expected_arguments`]; an `Err` is reported like any other
    /// failed response.
    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<ActionResponse, ArgumentError>;
}

/// Actions by name and alias, case-insensitive
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<Arc<dyn Action>>,
    index: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(player::HealthAction));
        registry.register(Arc::new(player::HintPlayerAction));
        registry.register(Arc::new(player::AdvancedCustomInfoAction));
        registry.register(Arc::new(map::SpawnGrenadeAction));
        registry.register(Arc::new(logic::LocalAction));
        registry.register(Arc::new(logic::LogAction));
        registry.register(Arc::new(logic::StopIfAction));
        registry
    }

    /// Register an action; a later registration replaces an earlier one with
    /// the same name or alias
    pub fn register(&mut self, action: Arc<dyn Action>) {
        for key in std::iter::once(action.name()).chain(action.aliases().iter().copied()) {
            self.index.insert(key.to_ascii_uppercase(), Arc::clone(&action));
        }
        self.actions.retain(|a| a.name() != action.name());
        self.actions.push(action);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.index.get(&name.to_ascii_uppercase()).cloned()
    }

    /// Registered actions ordered by subgroup, then name
    pub fn actions(&self) -> Vec<Arc<dyn Action>> {
        let mut actions = self.actions.clone();
        actions.sort_by(|a, b| (a.subgroup(), a.name()).cmp(&(b.subgroup(), b.name())));
        actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Help text for an action
pub fn action_help(action: &dyn Action) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        argument::usage(action.name(), action.expected_arguments())
    );
    if !action.aliases().is_empty() {
        let _ = writeln!(out, "Aliases: {}", action.aliases().join(", "));
    }
    let _ = writeln!(out, "Group: {}", action.subgroup());
    let _ = writeln!(out, "{}", action.description());
    for argument in action.expected_arguments() {
        let _ = writeln!(out);
        out.push_str(&argument.help());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_alias() {
        let registry = ActionRegistry::with_builtins();
        assert_eq!(registry.get("hp").unwrap().name(), "HP");
        assert_eq!(registry.get("SETHP").unwrap().name(), "HP");
        assert!(registry.get("NOPE").is_none());
    }

    #[test]
    fn test_reregistering_replaces() {
        let mut registry = ActionRegistry::with_builtins();
        let before = registry.len();
        registry.register(Arc::new(logic::LogAction));
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn test_action_help() {
        let registry = ActionRegistry::with_builtins();
        let help = action_help(registry.get("ADVCUSTOMINFO").unwrap().as_ref());
        assert!(help.starts_with("ADVCUSTOMINFO <mode> <players> <targets> [text]"));
        assert!(help.contains("CLEAR"));
    }
}
