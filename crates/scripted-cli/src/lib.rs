//! Text rendering for the `scripted` command line

use std::fmt::Write as _;

use scripted_host::actions::action_help;
use scripted_host::binding::{CUSTOM_EVENT_FLAG, EVENT_FLAG};
use scripted_host::catalog::DISABLE_FLAG;
use scripted_host::variables::variable_help;
use scripted_host::{Engine, Script};

/// Every action and variable, one per line
pub fn help_index(engine: &Engine) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Actions:");
    for action in engine.actions().actions() {
        let _ = writeln!(out, "  {:<16} {}", action.name(), action.description());
    }

    for group in engine.variables().groups() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Variables ({}):", group.name);
        for variable in &group.variables {
            let token = format!("{{{}}}", variable.name());
            let _ = writeln!(out, "  {:<20} {}", token, variable.description());
        }
    }

    out
}

/// Help for one action (by name or alias) or variable (with or without
/// braces)
pub fn help_topic(engine: &Engine, topic: &str) -> Option<String> {
    let topic = topic.trim();
    if let Some(action) = engine.actions().get(topic) {
        return Some(action_help(action.as_ref()));
    }

    let token = topic
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(topic);
    engine
        .variables()
        .lookup(token)
        .map(|(variable, _)| variable_help(variable))
}

/// `name  EVENT Joined, Left  CUSTOMEVENT Boom  (disabled)`
pub fn describe_script(script: &Script) -> String {
    let mut out = script.name().to_string();

    for key in [EVENT_FLAG, CUSTOM_EVENT_FLAG] {
        let names: Vec<&str> = script
            .flags_named(key)
            .flat_map(|flag| flag.arguments.iter().map(String::as_str))
            .collect();
        if !names.is_empty() {
            let _ = write!(out, "  {} {}", key, names.join(", "));
        }
    }

    if script.has_flag(DISABLE_FLAG).is_some() {
        out.push_str("  (disabled)");
    }
    out
}
