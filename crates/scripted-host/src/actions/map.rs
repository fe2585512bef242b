use scripted_events::Position;

use super::{Action, ActionContext, ActionResponse, ActionSubgroup, Argument, ArgumentType};
use crate::error::ArgumentError;

const DEFAULT_FUSE: f64 = 3.0;

/// `SPAWNGRENADE <x> <y> <z> [fuse]`
pub struct SpawnGrenadeAction;

impl Action for SpawnGrenadeAction {
    fn name(&self) -> &'static str {
        "SPAWNGRENADE"
    }

    fn subgroup(&self) -> ActionSubgroup {
        ActionSubgroup::Map
    }

    fn description(&self) -> &'static str {
        "Spawns a live grenade at a position."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[
            Argument::required("x", ArgumentType::Float, "X position."),
            Argument::required("y", ArgumentType::Float, "Y position."),
            Argument::required("z", ArgumentType::Float, "Z position."),
            Argument::optional("fuse", ArgumentType::Float, "Seconds until detonation. Default: 3."),
        ];
        ARGS
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<ActionResponse, ArgumentError> {
        let position = Position::new(
            ctx.args.float(0)? as f32,
            ctx.args.float(1)? as f32,
            ctx.args.float(2)? as f32,
        );
        let fuse = ctx.args.float(3).unwrap_or(DEFAULT_FUSE);
        if fuse < 0.0 {
            return Err(ArgumentError::LessThanZero {
                argument: "fuse",
                value: fuse,
            });
        }

        let owner = ctx.script.executor().player();
        ctx.world().spawn_grenade(position, fuse as f32, owner);
        Ok(ActionResponse::success())
    }
}
