use std::sync::Arc;

use scripted_events::World;

use crate::actions::ActionRegistry;
use crate::script::{parse, Executor, Script, ScriptScope};
use crate::variables::{Resolver, VariableRegistry};

/// Registries and the world shared by every script
pub struct Engine {
    actions: ActionRegistry,
    variables: VariableRegistry,
    world: Arc<dyn World>,
}

impl Engine {
    /// Engine with the builtin actions and variables
    pub fn new(world: Arc<dyn World>) -> Self {
        Self::with_registries(
            world,
            ActionRegistry::with_builtins(),
            VariableRegistry::with_builtins(),
        )
    }

    pub fn with_registries(
        world: Arc<dyn World>,
        actions: ActionRegistry,
        variables: VariableRegistry,
    ) -> Self {
        Self {
            actions,
            variables,
            world,
        }
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut ActionRegistry {
        &mut self.actions
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    pub fn world(&self) -> &dyn World {
        self.world.as_ref()
    }

    pub fn resolver<'a>(&'a self, scope: Option<&'a ScriptScope>) -> Resolver<'a> {
        Resolver::new(&self.variables, self.world.as_ref(), scope)
    }

    pub fn parse_script(self: &Arc<Self>, name: &str, source: &str, executor: Executor) -> Script {
        parse::parse(self, name, source, executor)
    }
}
