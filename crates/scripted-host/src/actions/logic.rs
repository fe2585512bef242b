// Script-flow and variable actions

use tracing::info;

use super::{Action, ActionContext, ActionResponse, ActionSubgroup, Argument, ArgumentType};
use crate::error::ArgumentError;

/// `LOCAL <name> <value>`
pub struct LocalAction;

impl Action for LocalAction {
    fn name(&self) -> &'static str {
        "LOCAL"
    }

    fn subgroup(&self) -> ActionSubgroup {
        ActionSubgroup::Variable
    }

    fn description(&self) -> &'static str {
        "Stores text in a variable visible only to this script."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[
            Argument::required("name", ArgumentType::Name, "Variable name, with or without braces."),
            Argument::required("value", ArgumentType::Message, "The value. Variables are substituted now."),
        ];
        ARGS
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<ActionResponse, ArgumentError> {
        let name = ctx.args.text(0)?.to_string();
        let value = ctx.args.text(1)?.to_string();
        ctx.script.add_variable(&name, "LOCAL", value);
        Ok(ActionResponse::success())
    }
}

/// `LOG <message>`
pub struct LogAction;

impl Action for LogAction {
    fn name(&self) -> &'static str {
        "LOG"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["PRINT"]
    }

    fn subgroup(&self) -> ActionSubgroup {
        ActionSubgroup::Debug
    }

    fn description(&self) -> &'static str {
        "Writes a message to the server log."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[Argument::required(
            "message",
            ArgumentType::Message,
            "The message. Variables are allowed.",
        )];
        ARGS
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<ActionResponse, ArgumentError> {
        info!(target: "scripting", "[{}] {}", ctx.script.name(), ctx.args.text(0)?);
        Ok(ActionResponse::success())
    }
}

/// `STOPIF <condition>`
pub struct StopIfAction;

impl Action for StopIfAction {
    fn name(&self) -> &'static str {
        "STOPIF"
    }

    fn subgroup(&self) -> ActionSubgroup {
        ActionSubgroup::Logic
    }

    fn description(&self) -> &'static str {
        "Stops the script when the condition is true."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[Argument::required(
            "condition",
            ArgumentType::Condition,
            "The condition to check.",
        )];
        ARGS
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<ActionResponse, ArgumentError> {
        if ctx.args.bool(0)? {
            Ok(ActionResponse::halt())
        } else {
            Ok(ActionResponse::success())
        }
    }
}
