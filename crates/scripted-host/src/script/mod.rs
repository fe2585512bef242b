/// Scripts: parsed, single-use units of queued action invocations
///
/// A [`Script`] owns an ordered queue of invocations, the flags from its
/// header, and a [`ScriptScope`] holding variables visible only to it. The
/// queue is consumed exactly once by [`Script::execute`].
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use scripted_events::PlayerId;
use tracing::{debug, error, warn};

use crate::actions::{Action, ActionContext, ActionResponse, Arguments};
use crate::engine::Engine;
use crate::error::{MessageKind, ScriptError};
use crate::variables::PlayerSet;

pub mod parse;

/// Who asked for a script to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Executor {
    /// Server console
    Console,
    /// A player running it through a command
    Player(PlayerId),
    /// An event or custom event
    Automatic,
}

impl Executor {
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Executor::Player(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScopedValue {
    Text(String),
    Players(PlayerSet),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopedVariable {
    pub name: String,
    /// Context the variable was bound from, e.g. the payload field name
    pub discriminator: String,
    pub value: ScopedValue,
}

/// Script-local state: name, executor and scoped variables
#[derive(Debug, Clone)]
pub struct ScriptScope {
    name: String,
    executor: Executor,
    variables: HashMap<String, ScopedVariable>,
}

impl ScriptScope {
    pub fn new(name: impl Into<String>, executor: Executor) -> Self {
        Self {
            name: name.into(),
            executor,
            variables: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executor(&self) -> Executor {
        self.executor
    }

    /// Store or overwrite a text variable. `token` may include braces.
    pub fn add_variable(&mut self, token: &str, discriminator: &str, value: impl Into<String>) {
        self.insert(token, discriminator, ScopedValue::Text(value.into()));
    }

    /// Store or overwrite a player-set variable
    pub fn add_player_variable(&mut self, token: &str, discriminator: &str, players: PlayerSet) {
        self.insert(token, discriminator, ScopedValue::Players(players));
    }

    fn insert(&mut self, token: &str, discriminator: &str, value: ScopedValue) {
        let name = normalize_token(token);
        debug!(target: "scripting", "[{}] Scoped variable {{{}}} set ({})", self.name, name, discriminator);
        self.variables.insert(
            name.clone(),
            ScopedVariable {
                name,
                discriminator: discriminator.to_string(),
                value,
            },
        );
    }

    pub fn variable(&self, token: &str) -> Option<&ScopedVariable> {
        self.variables.get(&normalize_token(token))
    }

    pub fn variables(&self) -> impl Iterator<Item = &ScopedVariable> {
        self.variables.values()
    }

    pub fn clear(&mut self) {
        self.variables.clear();
    }
}

/// `{evPlayer}` -> `EVPLAYER`
fn normalize_token(token: &str) -> String {
    let token = token.trim();
    let token = token
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(token);
    token.to_ascii_uppercase()
}

/// Script header directive, e.g. `!-- EVENT Left`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub key: String,
    pub arguments: Vec<String>,
}

/// One queued action call
#[derive(Clone)]
pub struct ActionInvocation {
    pub action: Arc<dyn Action>,
    pub raw_arguments: Vec<String>,
    /// 1-based source line
    pub line: usize,
}

impl fmt::Debug for ActionInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInvocation")
            .field("action", &self.action.name())
            .field("raw_arguments", &self.raw_arguments)
            .field("line", &self.line)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub line: usize,
    pub action: &'static str,
    pub response: ActionResponse,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub script: String,
    pub outcomes: Vec<ActionOutcome>,
    /// Stopped early by a halting action
    pub halted: bool,
    /// Stopped early because an action faulted
    pub aborted: bool,
}

impl ExecutionReport {
    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|o| !o.response.is_success())
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failures().next().is_none()
    }
}

pub struct Script {
    scope: ScriptScope,
    queue: VecDeque<ActionInvocation>,
    flags: Vec<Flag>,
    executed: bool,
    engine: Arc<Engine>,
}

impl Script {
    /// Empty script. A player executor is exposed as `{SENDER}`.
    pub fn new(name: impl Into<String>, executor: Executor, engine: Arc<Engine>) -> Self {
        let mut scope = ScriptScope::new(name, executor);
        if let Executor::Player(id) = executor {
            scope.add_player_variable("SENDER", "Executor", PlayerSet::single(id));
        }
        Self {
            scope,
            queue: VecDeque::new(),
            flags: Vec::new(),
            executed: false,
            engine,
        }
    }

    pub fn name(&self) -> &str {
        self.scope.name()
    }

    pub fn scope(&self) -> &ScriptScope {
        &self.scope
    }

    pub fn push_action(&mut self, invocation: ActionInvocation) {
        self.queue.push_back(invocation);
    }

    pub fn push_flag(&mut self, flag: Flag) {
        self.flags.push(flag);
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// First flag named `key`, case-insensitive
    pub fn has_flag(&self, key: &str) -> Option<&Flag> {
        self.flags.iter().find(|flag| flag.key.eq_ignore_ascii_case(key))
    }

    pub fn flags_named<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Flag> + 'a {
        self.flags
            .iter()
            .filter(move |flag| flag.key.eq_ignore_ascii_case(key))
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn add_variable(&mut self, token: &str, discriminator: &str, value: impl Into<String>) {
        self.scope.add_variable(token, discriminator, value);
    }

    pub fn add_player_variable(&mut self, token: &str, discriminator: &str, players: PlayerSet) {
        self.scope.add_player_variable(token, discriminator, players);
    }

    /// Run the queue front to back. A failed response is recorded and the next
    /// action runs; a halting response or a panicking action ends the run.
    pub fn execute(&mut self) -> Result<ExecutionReport, ScriptError> {
        if self.executed {
            return Err(ScriptError::AlreadyExecuted(self.scope.name().to_string()));
        }
        self.executed = true;

        let engine = Arc::clone(&self.engine);
        let mut report = ExecutionReport {
            script: self.scope.name().to_string(),
            ..Default::default()
        };

        debug!(target: "scripting", "Executing script {} ({} actions)", self.scope.name(), self.queue.len());

        while let Some(invocation) = self.queue.pop_front() {
            let action = Arc::clone(&invocation.action);
            let coerced = Arguments::coerce(
                action.name(),
                action.expected_arguments(),
                &invocation.raw_arguments,
                &engine.resolver(Some(&self.scope)),
            );

            let response = match coerced {
                Err(err) => ActionResponse::from(err),
                Ok(args) => {
                    let outcome = {
                        let mut ctx = ActionContext {
                            script: &mut self.scope,
                            engine: &engine,
                            raw_arguments: &invocation.raw_arguments,
                            args,
                        };
                        catch_unwind(AssertUnwindSafe(|| action.execute(&mut ctx)))
                    };
                    match outcome {
                        Ok(Ok(response)) => response,
                        Ok(Err(err)) => ActionResponse::from(err),
                        Err(panic) => {
                            error!(
                                target: "scripting",
                                "[{}] {} on line {} panicked: {}; skipping the rest of the script",
                                self.scope.name(),
                                action.name(),
                                invocation.line,
                                panic_message(&*panic)
                            );
                            report.aborted = true;
                            ActionResponse::failure(
                                MessageKind::UnknownError,
                                [format!("{} panicked", action.name())],
                            )
                        }
                    }
                }
            };

            if !response.is_success() && !report.aborted {
                warn!(
                    target: "scripting",
                    "[{}] {} on line {} failed: {}",
                    self.scope.name(),
                    action.name(),
                    invocation.line,
                    response
                );
            }

            let halts = response.halts();
            report.outcomes.push(ActionOutcome {
                line: invocation.line,
                action: action.name(),
                response,
            });

            if report.aborted || halts {
                report.halted = halts;
                self.queue.clear();
                break;
            }
        }

        Ok(report)
    }

    /// Release scoped state
    pub fn dispose(mut self) {
        self.queue.clear();
        self.scope.clear();
        debug!(target: "scripting", "Disposed script {}", self.scope.name());
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("name", &self.scope.name())
            .field("queued", &self.queue.len())
            .field("flags", &self.flags)
            .field("executed", &self.executed)
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionSubgroup, Argument};
    use crate::error::ArgumentError;
    use scripted_events::{MemoryWorld, Player};

    struct PanicAction;

    impl Action for PanicAction {
        fn name(&self) -> &'static str {
            "PANIC"
        }

        fn subgroup(&self) -> ActionSubgroup {
            ActionSubgroup::Debug
        }

        fn description(&self) -> &'static str {
            "Always panics"
        }

        fn expected_arguments(&self) -> &'static [Argument] {
            &[]
        }

        fn execute(&self, _ctx: &mut ActionContext<'_>) -> Result<ActionResponse, ArgumentError> {
            panic!("boom")
        }
    }

    fn engine() -> Arc<Engine> {
        let world = Arc::new(MemoryWorld::new());
        world.add_player(Player::new(PlayerId(1), "Alice", "alice@steam"));
        let mut engine = Engine::new(world);
        engine.actions_mut().register(Arc::new(PanicAction));
        Arc::new(engine)
    }

    fn script(source: &str) -> Script {
        parse::parse(&engine(), "test", source, Executor::Automatic)
    }

    #[test]
    fn test_second_execute_is_rejected() {
        let mut script = script("LOG hello");
        let report = script.execute().unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(
            script.execute().unwrap_err(),
            ScriptError::AlreadyExecuted("test".to_string())
        );
    }

    #[test]
    fn test_failed_action_does_not_stop_queue() {
        let mut script = script("HP *\nLOCAL X done");
        let report = script.execute().unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].response.kind(), MessageKind::InvalidUsage);
        assert!(report.outcomes[1].response.is_success());
        assert!(script.scope().variable("X").is_some());
        assert!(!report.is_success());
    }

    #[test]
    fn test_panicking_action_aborts_script() {
        let mut script = script("PANIC\nLOCAL X done");
        let report = script.execute().unwrap();

        assert!(report.aborted);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].response.kind(), MessageKind::UnknownError);
        assert!(script.scope().variable("X").is_none());
    }

    #[test]
    fn test_stopif_halts() {
        let mut script = script("STOPIF 1 = 1\nLOCAL X done");
        let report = script.execute().unwrap();
        assert!(report.halted);
        assert!(script.scope().variable("X").is_none());
    }

    #[test]
    fn test_local_is_visible_to_later_actions() {
        let mut script = script("LOCAL {AMOUNT} 40 + 10\nHP 1 {AMOUNT}");
        let report = script.execute().unwrap();
        assert!(report.is_success(), "{:?}", report);
        assert_eq!(script.scope().variable("amount").map(|v| &v.value), Some(&ScopedValue::Text("40 + 10".to_string())));
    }

    #[test]
    fn test_local_overwrites_player_variable() {
        let mut script = script("LOCAL {EVPLAYER} hello\nLOG {EVPLAYER}");
        script.add_player_variable("EVPLAYER", "EVENT", PlayerSet::single(PlayerId(1)));

        let report = script.execute().unwrap();
        assert!(report.is_success(), "{:?}", report);
        assert_eq!(
            script.scope().variable("EVPLAYER").map(|v| &v.value),
            Some(&ScopedValue::Text("hello".to_string()))
        );
    }

    #[test]
    fn test_has_flag_ignores_case() {
        let script = script("!-- Event Joined\n!-- EVENT Left\nLOG hi");
        let flag = script.has_flag("event").unwrap();
        assert_eq!(flag.arguments, vec!["Joined".to_string()]);
        assert!(script.has_flag("DISABLE").is_none());
    }

    #[test]
    fn test_player_executor_gets_sender() {
        let script = Script::new("test", Executor::Player(PlayerId(1)), engine());
        let sender = script.scope().variable("{SENDER}").unwrap();
        assert_eq!(sender.value, ScopedValue::Players(PlayerSet::single(PlayerId(1))));
    }
}
