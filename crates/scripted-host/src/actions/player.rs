// Actions that act on players

use tracing::debug;

use super::{Action, ActionContext, ActionResponse, ActionSubgroup, Argument, ArgumentType, OptionValue};
use crate::error::ArgumentError;

/// `HP <players> <health>`
pub struct HealthAction;

impl Action for HealthAction {
    fn name(&self) -> &'static str {
        "HP"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["SETHP"]
    }

    fn subgroup(&self) -> ActionSubgroup {
        ActionSubgroup::Health
    }

    fn description(&self) -> &'static str {
        "Sets the health of every player in the set."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[
            Argument::required("players", ArgumentType::Players, "The players to affect."),
            Argument::required("health", ArgumentType::Math, "The new health. Math is allowed."),
        ];
        ARGS
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<ActionResponse, ArgumentError> {
        let health = ctx.args.float(1)?;
        if health < 0.0 {
            return Err(ArgumentError::LessThanZero {
                argument: "health",
                value: health,
            });
        }

        for id in ctx.args.players(0)?.ids() {
            if !ctx.world().set_health(*id, health as f32) {
                debug!(target: "scripting", "HP: player {} is no longer connected", id);
            }
        }
        Ok(ActionResponse::success())
    }
}

/// `HINTPLAYER <players> <duration> <message>`
pub struct HintPlayerAction;

impl Action for HintPlayerAction {
    fn name(&self) -> &'static str {
        "HINTPLAYER"
    }

    fn subgroup(&self) -> ActionSubgroup {
        ActionSubgroup::Broadcast
    }

    fn description(&self) -> &'static str {
        "Shows a hint to every player in the set."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[
            Argument::required("players", ArgumentType::Players, "The players to show the hint to."),
            Argument::required("duration", ArgumentType::Float, "Seconds the hint stays on screen."),
            Argument::required("message", ArgumentType::Message, "The hint text. Variables are allowed."),
        ];
        ARGS
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<ActionResponse, ArgumentError> {
        let duration = ctx.args.float(1)?;
        if duration < 0.0 {
            return Err(ArgumentError::LessThanZero {
                argument: "duration",
                value: duration,
            });
        }
        let message = ctx.args.text(2)?;

        for id in ctx.args.players(0)?.ids() {
            ctx.world().show_hint(*id, message, duration as f32);
        }
        Ok(ActionResponse::success())
    }
}

/// `ADVCUSTOMINFO SET|CLEAR <players> <targets> [text]`
pub struct AdvancedCustomInfoAction;

const CUSTOM_INFO_MODES: &[OptionValue] = &[
    OptionValue::new("SET", "Show the text above the players, to the targets only."),
    OptionValue::new("CLEAR", "Remove text previously set for the targets."),
];

impl Action for AdvancedCustomInfoAction {
    fn name(&self) -> &'static str {
        "ADVCUSTOMINFO"
    }

    fn subgroup(&self) -> ActionSubgroup {
        ActionSubgroup::Broadcast
    }

    fn description(&self) -> &'static str {
        "Sets or clears custom info on players, visible only to a set of target players."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[
            Argument::required("mode", ArgumentType::Options(CUSTOM_INFO_MODES), "Set or clear."),
            Argument::required("players", ArgumentType::Players, "Players whose info changes."),
            Argument::required("targets", ArgumentType::Players, "Players who see the info."),
            Argument::optional("text", ArgumentType::Message, "The info text. Required for SET."),
        ];
        ARGS
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<ActionResponse, ArgumentError> {
        let info = match ctx.args.option(0)? {
            "SET" => match ctx.args.text(3) {
                Ok(text) => Some(text.to_string()),
                Err(_) => {
                    return Err(ArgumentError::Missing {
                        usage: "ADVCUSTOMINFO SET <players> <targets> <text>".to_string(),
                        got: ctx.raw_arguments.len(),
                    })
                }
            },
            _ => None,
        };

        let players = ctx.args.players(1)?;
        let targets = ctx.args.players(2)?;
        for player in players.ids() {
            for viewer in targets.ids() {
                ctx.world().set_custom_info_for(*player, *viewer, info.clone());
            }
        }
        Ok(ActionResponse::success())
    }
}
