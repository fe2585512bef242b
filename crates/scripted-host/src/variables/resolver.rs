//! `{TOKEN}` substitution
//!
//! Text is scanned once, left to right. A token is `{IDENT}` or
//! `{IDENT:arg:arg...}`; arguments may themselves contain braced tokens, which
//! are matched by depth. Substituted output is never rescanned. Unknown
//! tokens and unmatched braces pass through verbatim.

use scripted_events::{PlayerId, World};
use tracing::trace;

use super::{PlayerSet, Variable, VariableContext, VariableRegistry, VariableValue};
use crate::actions::argument::Arguments;
use crate::error::{ArgumentError, VariableError};
use crate::script::{ScopedValue, ScriptScope};

/// Resolves tokens against the global registry and an optional invoking script
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    variables: &'a VariableRegistry,
    world: &'a dyn World,
    scope: Option<&'a ScriptScope>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        variables: &'a VariableRegistry,
        world: &'a dyn World,
        scope: Option<&'a ScriptScope>,
    ) -> Self {
        Self {
            variables,
            world,
            scope,
        }
    }

    pub fn world(&self) -> &'a dyn World {
        self.world
    }

    pub fn scope(&self) -> Option<&'a ScriptScope> {
        self.scope
    }

    /// Replace every recognized token in `text`
    pub fn replace(&self, text: &str) -> Result<String, VariableError> {
        self.replace_counted(text).map(|(out, _)| out)
    }

    /// Like [`Resolver::replace`], also returning how many tokens were replaced
    pub fn replace_counted(&self, text: &str) -> Result<(String, usize), VariableError> {
        if !text.contains('{') {
            return Ok((text.to_string(), 0));
        }

        let mut out = String::with_capacity(text.len());
        let mut replaced = 0;
        let mut rest = text;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let candidate = &rest[open..];

            let resolved = match find_closing(candidate) {
                Some(close) => {
                    let content = &candidate[1..close];
                    self.evaluate(content)
                        .map(|value| value.map(|v| (content, v, close)))
                }
                None => None,
            };

            match resolved {
                Some(Ok((content, value, close))) => {
                    let rendered = value.render().ok_or_else(|| VariableError::UnsupportedType {
                        variable: token_name(content),
                    })?;
                    trace!(target: "scripting", "Replaced {{{}}} with '{}'", content, rendered);
                    out.push_str(&rendered);
                    replaced += 1;
                    rest = &candidate[close + 1..];
                }
                Some(Err(err)) => return Err(err),
                None => {
                    out.push('{');
                    rest = &candidate[1..];
                }
            }
        }

        out.push_str(rest);
        Ok((out, replaced))
    }

    /// Evaluate the inside of a braced token. None if it is not a known variable.
    pub fn evaluate(&self, content: &str) -> Option<Result<VariableValue, VariableError>> {
        let mut parts = split_arguments(content);
        let ident = parts.remove(0);
        if !is_ident(&ident) {
            return None;
        }

        if parts.is_empty() {
            if let Some(scoped) = self.scope.and_then(|scope| scope.variable(&ident)) {
                return Some(Ok(match &scoped.value {
                    ScopedValue::Text(text) => VariableValue::Text(text.clone()),
                    ScopedValue::Players(players) => VariableValue::Players(players.clone()),
                }));
            }
        }

        let (variable, negated) = self.variables.lookup(&ident)?;
        Some(self.evaluate_global(variable, negated, &parts))
    }

    fn evaluate_global(
        &self,
        variable: &dyn Variable,
        negated: bool,
        parts: &[String],
    ) -> Result<VariableValue, VariableError> {
        let name = variable.name();
        let expected = variable.expected_arguments();

        let args = if expected.is_empty() {
            if !parts.is_empty() {
                return Err(VariableError::bad_argument(
                    name,
                    ArgumentError::TooMany {
                        usage: format!("{{{}}}", name),
                        got: parts.len(),
                    },
                ));
            }
            Arguments::empty()
        } else {
            Arguments::coerce(name, expected, parts, self).map_err(|err| match err {
                ArgumentError::Variable(inner) => *inner,
                other => VariableError::bad_argument(name, other),
            })?
        };

        if variable.needs_source() && self.scope.is_none() {
            return Err(VariableError::MissingSource {
                variable: name.to_string(),
            });
        }

        let ctx = VariableContext {
            world: self.world,
            source: self.scope,
            args: &args,
        };
        Ok(match (variable.evaluate(&ctx)?, negated) {
            (VariableValue::Bool(b), true) => VariableValue::Bool(!b),
            (value, _) => value,
        })
    }

    /// Resolve a player-set argument: `*`, a player variable with or without
    /// braces, a player id, or a nickname
    pub fn players(&self, input: &str) -> Result<PlayerSet, ArgumentError> {
        let input = input.trim();
        let not_found = || ArgumentError::NoPlayersFound {
            input: input.to_string(),
        };

        if input == "*" {
            let set = PlayerSet::new(
                self.world
                    .players()
                    .into_iter()
                    .filter(|p| !p.is_npc)
                    .map(|p| p.id),
            );
            return if set.is_empty() { Err(not_found()) } else { Ok(set) };
        }

        let inner = match find_closing(input) {
            Some(close) if close == input.len() - 1 => &input[1..close],
            _ => input,
        };
        let takes_arguments = split_arguments(inner).len() > 1;

        let set = match self.evaluate(inner) {
            Some(Ok(VariableValue::Players(set))) if takes_arguments => set.from_argument_variable(),
            Some(Ok(VariableValue::Players(set))) => set,
            Some(Ok(_)) => return Err(not_found()),
            Some(Err(err)) => return Err(err.into()),
            None => self.players_by_identity(inner),
        };

        if set.is_empty() {
            Err(not_found())
        } else {
            Ok(set)
        }
    }

    fn players_by_identity(&self, input: &str) -> PlayerSet {
        if let Ok(id) = input.parse::<u32>() {
            return PlayerSet::new(self.world.player(PlayerId(id)).map(|p| p.id));
        }
        PlayerSet::new(
            self.world
                .players()
                .into_iter()
                .filter(|p| p.nickname.eq_ignore_ascii_case(input))
                .map(|p| p.id),
        )
    }
}

/// Byte index of the `}` matching the `{` at the start of `text`
fn find_closing(text: &str) -> Option<usize> {
    if !text.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split token content on `:` outside nested braces
pub fn split_arguments(content: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in content.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ':' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn is_ident(ident: &str) -> bool {
    let body = ident.strip_prefix('!').unwrap_or(ident);
    !body.is_empty() && body.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn token_name(content: &str) -> String {
    split_arguments(content)
        .into_iter()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Executor;
    use scripted_events::{Generator, MemoryWorld, Player};

    fn world() -> MemoryWorld {
        let world = MemoryWorld::new();
        world.add_player(Player::new(PlayerId(1), "Alice", "alice@steam"));
        world.add_player(Player::new(PlayerId(2), "Bob", "bob@steam"));
        for id in 0..3 {
            world.add_generator(Generator {
                engaged: true,
                ..Generator::new(id)
            });
        }
        world.add_generator(Generator::new(3));
        world
    }

    #[test]
    fn test_text_without_tokens_is_unchanged() {
        let registry = VariableRegistry::with_builtins();
        let world = world();
        let resolver = Resolver::new(&registry, &world, None);

        for text in ["", "plain text", "a } b", "unmatched { brace", "{not a token}"] {
            let (out, replaced) = resolver.replace_counted(text).unwrap();
            assert_eq!(out, text);
            assert_eq!(replaced, 0);
        }
    }

    #[test]
    fn test_counts_replacements_without_rescanning() {
        let registry = VariableRegistry::with_builtins();
        let world = world();
        let mut scope = ScriptScope::new("test", Executor::Automatic);
        scope.add_variable("{INNER}", "LOCAL", "{PLAYERCOUNT}");
        let resolver = Resolver::new(&registry, &world, Some(&scope));

        let (out, replaced) = resolver
            .replace_counted("{PLAYERCOUNT} players, {ENGAGEDGENERATORS} gens, {INNER}")
            .unwrap();
        assert_eq!(out, "2 players, 3 gens, {PLAYERCOUNT}");
        assert_eq!(replaced, 3);
    }

    #[test]
    fn test_unknown_tokens_stay_verbatim() {
        let registry = VariableRegistry::with_builtins();
        let world = world();
        let resolver = Resolver::new(&registry, &world, None);
        assert_eq!(
            resolver.replace("{UNKNOWN} and {PLAYERCOUNT}").unwrap(),
            "{UNKNOWN} and 2"
        );
    }

    #[test]
    fn test_scoped_variables_shadow_globals() {
        let registry = VariableRegistry::with_builtins();
        let world = world();
        let mut scope = ScriptScope::new("test", Executor::Automatic);
        scope.add_variable("PLAYERCOUNT", "LOCAL", "many");
        let resolver = Resolver::new(&registry, &world, Some(&scope));
        assert_eq!(resolver.replace("{playercount}").unwrap(), "many");
    }

    #[test]
    fn test_argument_variables() {
        let registry = VariableRegistry::with_builtins();
        let world = world();
        let resolver = Resolver::new(&registry, &world, None);

        assert_eq!(resolver.replace("{GENERATORS:ENGAGED}").unwrap(), "3");
        assert_eq!(resolver.replace("{GENERATORS:closed}").unwrap(), "4");

        let err = resolver.replace("{GENERATORS:BOGUS}").unwrap_err();
        assert!(matches!(err, VariableError::BadArgument { .. }));
        assert!(err.to_string().contains("BOGUS"));

        assert!(resolver.replace("{GENERATORS}").is_err());
        assert!(resolver.replace("{PLAYERCOUNT:5}").is_err());
    }

    #[test]
    fn test_reversed_names_negate() {
        let registry = VariableRegistry::with_builtins();
        let world = world();
        world.set_decontaminated(true);
        let resolver = Resolver::new(&registry, &world, None);
        assert_eq!(
            resolver.replace("{DECONTAMINATED} {!DECONTAMINATED}").unwrap(),
            "TRUE FALSE"
        );
    }

    #[test]
    fn test_player_set_cannot_be_interpolated() {
        let registry = VariableRegistry::with_builtins();
        let world = world();
        let mut scope = ScriptScope::new("test", Executor::Automatic);
        scope.add_player_variable("{EVPLAYER}", "Player", PlayerSet::single(PlayerId(1)));
        let resolver = Resolver::new(&registry, &world, Some(&scope));

        let err = resolver.replace("Hello {EVPLAYER}").unwrap_err();
        assert!(matches!(err, VariableError::UnsupportedType { .. }));
        assert!(resolver.replace("Hello {PLAYERS}").is_err());

        assert_eq!(resolver.replace("Hello {GET:{EVPLAYER}:NAME}").unwrap(), "Hello Alice");
    }

    #[test]
    fn test_players_argument_forms() {
        let registry = VariableRegistry::with_builtins();
        let world = world();
        let mut scope = ScriptScope::new("test", Executor::Automatic);
        scope.add_player_variable("EVPLAYER", "Player", PlayerSet::single(PlayerId(2)));
        let resolver = Resolver::new(&registry, &world, Some(&scope));

        assert_eq!(resolver.players("*").unwrap().len(), 2);
        assert_eq!(resolver.players("{EVPLAYER}").unwrap().ids(), &[PlayerId(2)]);
        assert_eq!(resolver.players("EVPLAYER").unwrap().ids(), &[PlayerId(2)]);
        assert_eq!(resolver.players("1").unwrap().ids(), &[PlayerId(1)]);
        assert_eq!(resolver.players("alice").unwrap().ids(), &[PlayerId(1)]);
        assert!(matches!(
            resolver.players("{NOBODY}"),
            Err(ArgumentError::NoPlayersFound { .. })
        ));
    }

    #[test]
    fn test_split_respects_nesting() {
        assert_eq!(
            split_arguments("GET:{GETPLAYERSBYDATA:*:team:red}:NAME"),
            vec!["GET", "{GETPLAYERSBYDATA:*:team:red}", "NAME"]
        );
    }
}
