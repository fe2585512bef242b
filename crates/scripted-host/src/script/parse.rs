// Script source parsing
//
// One directive per line:
//   # comment / // comment
//   !-- FLAG arg arg
//   ACTION arg arg
// Unknown actions are skipped with a warning so the rest of the script still
// loads.

use std::sync::Arc;

use tracing::warn;

use super::{ActionInvocation, Executor, Flag, Script};
use crate::engine::Engine;

const FLAG_PREFIX: &str = "!--";

pub fn parse(engine: &Arc<Engine>, name: &str, source: &str, executor: Executor) -> Script {
    let mut script = Script::new(name, executor, Arc::clone(engine));

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        if let Some(rest) = line.strip_prefix(FLAG_PREFIX) {
            let mut parts = rest.split_whitespace();
            match parts.next() {
                Some(key) => script.push_flag(Flag {
                    key: key.to_ascii_uppercase(),
                    arguments: parts.map(str::to_string).collect(),
                }),
                None => warn!(target: "scripting", "{}:{}: empty flag", name, line_number),
            }
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };
        match engine.actions().get(keyword) {
            Some(action) => script.push_action(ActionInvocation {
                action,
                raw_arguments: parts.map(str::to_string).collect(),
                line: line_number,
            }),
            None => warn!(
                target: "scripting",
                "{}:{}: unknown action '{}', skipping",
                name,
                line_number,
                keyword
            ),
        }
    }

    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use scripted_events::MemoryWorld;

    fn engine() -> Arc<Engine> {
        Arc::new(Engine::new(Arc::new(MemoryWorld::new())))
    }

    #[test]
    fn test_parse_flags_and_actions() {
        let source = "\
# greet players
!-- EVENT Joined Spawned
!-- customevent Boss

// heal them
HP {EVPLAYER} 100
HINTPLAYER {EVPLAYER} 5 Welcome!
";
        let script = parse(&engine(), "greet", source, Executor::Automatic);

        assert_eq!(script.name(), "greet");
        assert_eq!(script.queued(), 2);
        let event = script.has_flag("event").unwrap();
        assert_eq!(event.arguments, vec!["Joined", "Spawned"]);
        assert_eq!(script.has_flag("CUSTOMEVENT").unwrap().arguments, vec!["Boss"]);
        assert!(script.has_flag("DISABLE").is_none());
    }

    #[test]
    fn test_unknown_actions_are_skipped() {
        let script = parse(&engine(), "s", "FLY 100\nLOG ok", Executor::Console);
        assert_eq!(script.queued(), 1);
    }
}
