//! Variable contract and registry
//!
//! A variable is a stateless computed view over the world, or over the
//! invoking script's scoped storage, named by a `{TOKEN}`. Variables are
//! organized in groups for help output; lookups are case-insensitive.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use scripted_events::{Player, PlayerId, World};
use strum_macros::Display;

use crate::actions::argument::{Argument, Arguments};
use crate::error::VariableError;
use crate::script::ScriptScope;

pub mod map;
pub mod player_info;
pub mod players;
pub mod resolver;

pub use resolver::Resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum VariableKind {
    Bool,
    Float,
    Text,
    Players,
}

/// A resolved set of players
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSet {
    ids: Vec<PlayerId>,
    via_argument_variable: bool,
}

impl PlayerSet {
    pub fn new(ids: impl IntoIterator<Item = PlayerId>) -> Self {
        let mut set = Self::default();
        for id in ids {
            if !set.ids.contains(&id) {
                set.ids.push(id);
            }
        }
        set
    }

    pub fn single(id: PlayerId) -> Self {
        Self::new([id])
    }

    /// Mark the set as produced by an argument-taking variable
    pub fn from_argument_variable(mut self) -> Self {
        self.via_argument_variable = true;
        self
    }

    pub fn is_from_argument_variable(&self) -> bool {
        self.via_argument_variable
    }

    pub fn ids(&self) -> &[PlayerId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snapshot the players that are still connected
    pub fn players(&self, world: &dyn World) -> Vec<Player> {
        self.ids.iter().filter_map(|id| world.player(*id)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Bool(bool),
    Float(f64),
    Text(String),
    Players(PlayerSet),
}

impl VariableValue {
    pub fn kind(&self) -> VariableKind {
        match self {
            VariableValue::Bool(_) => VariableKind::Bool,
            VariableValue::Float(_) => VariableKind::Float,
            VariableValue::Text(_) => VariableKind::Text,
            VariableValue::Players(_) => VariableKind::Players,
        }
    }

    /// Textual form used for substitution. Player sets have none.
    pub fn render(&self) -> Option<String> {
        match self {
            VariableValue::Bool(true) => Some("TRUE".to_string()),
            VariableValue::Bool(false) => Some("FALSE".to_string()),
            VariableValue::Float(value) => Some(format!("{}", value)),
            VariableValue::Text(text) => Some(text.clone()),
            VariableValue::Players(_) => None,
        }
    }
}

/// Everything a variable may read while being evaluated
pub struct VariableContext<'a> {
    pub world: &'a dyn World,
    /// The invoking script, if any
    pub source: Option<&'a ScriptScope>,
    /// Coerced `:args` segments
    pub args: &'a Arguments,
}

impl<'a> VariableContext<'a> {
    /// The invoking script; fails for variables evaluated outside of one
    pub fn source(&self, variable: &str) -> Result<&'a ScriptScope, VariableError> {
        self.source.ok_or_else(|| VariableError::MissingSource {
            variable: variable.to_string(),
        })
    }
}

pub trait Variable: Send + Sync {
    /// Token text without braces, e.g. `DECONTAMINATED`
    fn name(&self) -> &'static str;

    /// Negated alias for boolean variables, e.g. `!DECONTAMINATED`
    fn reversed_name(&self) -> Option<&'static str> {
        None
    }

    fn description(&self) -> &'static str;

    fn long_description(&self) -> Option<&'static str> {
        None
    }

    /// Empty for plain variables
    fn expected_arguments(&self) -> &'static [Argument] {
        &[]
    }

    /// Whether evaluation needs the invoking script
    fn needs_source(&self) -> bool {
        false
    }

    fn kind(&self) -> VariableKind;

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError>;
}

pub struct VariableGroup {
    pub name: &'static str,
    pub variables: Vec<Arc<dyn Variable>>,
}

impl VariableGroup {
    pub fn new(name: &'static str, variables: Vec<Arc<dyn Variable>>) -> Self {
        Self { name, variables }
    }
}

/// Global variables, grouped
#[derive(Default)]
pub struct VariableRegistry {
    groups: Vec<VariableGroup>,
    // upper-cased token -> (variable, negated)
    index: HashMap<String, (Arc<dyn Variable>, bool)>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the builtin map, player info and players groups
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_group(map::group());
        registry.register_group(player_info::group());
        registry.register_group(players::group());
        registry
    }

    pub fn register_group(&mut self, group: VariableGroup) {
        for variable in &group.variables {
            self.index.insert(
                variable.name().to_ascii_uppercase(),
                (Arc::clone(variable), false),
            );
            if let Some(reversed) = variable.reversed_name() {
                self.index
                    .insert(reversed.to_ascii_uppercase(), (Arc::clone(variable), true));
            }
        }
        self.groups.push(group);
    }

    /// Look up a token (without braces). The flag is true for reversed names.
    pub fn lookup(&self, token: &str) -> Option<(&dyn Variable, bool)> {
        self.index
            .get(&token.to_ascii_uppercase())
            .map(|(variable, negated)| (variable.as_ref(), *negated))
    }

    pub fn groups(&self) -> &[VariableGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.variables.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Help text for a variable
pub fn variable_help(variable: &dyn Variable) -> String {
    let mut out = String::new();
    let args: Vec<String> = variable
        .expected_arguments()
        .iter()
        .map(|a| a.name.to_string())
        .collect();
    if args.is_empty() {
        let _ = writeln!(out, "{{{}}}", variable.name());
    } else {
        let _ = writeln!(out, "{{{}:{}}}", variable.name(), args.join(":"));
    }
    if let Some(reversed) = variable.reversed_name() {
        let _ = writeln!(out, "Reversed: {{{}}}", reversed);
    }
    let _ = writeln!(out, "Type: {}", variable.kind());
    let _ = writeln!(out, "{}", variable.description());
    if let Some(long) = variable.long_description() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", long);
    }
    for argument in variable.expected_arguments() {
        let _ = writeln!(out);
        out.push_str(&argument.help());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_is_case_insensitive() {
        let registry = VariableRegistry::with_builtins();
        let (variable, negated) = registry.lookup("decontaminated").unwrap();
        assert_eq!(variable.name(), "DECONTAMINATED");
        assert!(!negated);

        let (_, negated) = registry.lookup("!DECONTAMINATED").unwrap();
        assert!(negated);
        assert!(registry.lookup("NOPE").is_none());
    }

    #[test]
    fn test_player_set_dedupes() {
        let set = PlayerSet::new([PlayerId(1), PlayerId(2), PlayerId(1)]);
        assert_eq!(set.len(), 2);
        assert!(!set.is_from_argument_variable());
        assert!(set.from_argument_variable().is_from_argument_variable());
    }

    #[test]
    fn test_render() {
        assert_eq!(VariableValue::Bool(true).render().as_deref(), Some("TRUE"));
        assert_eq!(VariableValue::Float(3.0).render().as_deref(), Some("3"));
        assert_eq!(VariableValue::Float(2.5).render().as_deref(), Some("2.5"));
        assert!(VariableValue::Players(PlayerSet::default()).render().is_none());
    }

    #[test]
    fn test_variable_help_lists_arguments() {
        let registry = VariableRegistry::with_builtins();
        let (generators, _) = registry.lookup("GENERATORS").unwrap();
        let help = variable_help(generators);
        assert!(help.starts_with("{GENERATORS:mode}"));
        assert!(help.contains("ENGAGED"));
    }
}
