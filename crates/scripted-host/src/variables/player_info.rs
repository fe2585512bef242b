// Player information variables
// {GET:...} is the accessor that turns a player set into text; the others
// produce or serialize sets.

use std::sync::Arc;

use scripted_events::Player;

use super::{PlayerSet, Variable, VariableContext, VariableGroup, VariableKind, VariableValue};
use crate::actions::argument::{Argument, ArgumentType, OptionValue};
use crate::error::VariableError;

pub fn group() -> VariableGroup {
    VariableGroup::new(
        "Player Info",
        vec![
            Arc::new(GetPlayerInfo),
            Arc::new(CommandVariable),
            Arc::new(PlayersByData),
        ],
    )
}

const SELECTORS: &[OptionValue] = &[
    OptionValue::new("NAME", "Display name (nickname if none is set)."),
    OptionValue::new("NICKNAME", "Account nickname."),
    OptionValue::new("USERID", "User id, e.g. 7656...@steam."),
    OptionValue::new("ID", "Server player id."),
    OptionValue::new("ROLE", "Current role."),
    OptionValue::new("TEAM", "Current team."),
    OptionValue::new("ZONE", "Zone the player is in."),
    OptionValue::new("ROOM", "Room the player is in."),
    OptionValue::new("HP", "Current health."),
    OptionValue::new("GROUP", "Permission group, or NONE."),
    OptionValue::new("CUSTOMINFO", "Custom info, or NONE."),
    OptionValue::new("KILLS", "Kills this round."),
    OptionValue::new("GOD", "Whether god mode is on."),
    OptionValue::new("CUFFED", "Whether the player is cuffed."),
    OptionValue::new("COUNT", "How many players are in the set."),
];

fn bool_text(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

fn select(player: &Player, selector: &str) -> String {
    match selector {
        "NAME" => player.display_name().to_string(),
        "NICKNAME" => player.nickname.clone(),
        "USERID" => player.user_id.clone(),
        "ID" => player.id.to_string(),
        "ROLE" => player.role.to_string(),
        "TEAM" => player.team().to_string(),
        "ZONE" => player.zone().to_string(),
        "ROOM" => player.room.to_string(),
        "HP" => format!("{}", player.health),
        "GROUP" => player.group.clone().unwrap_or_else(|| "NONE".to_string()),
        "CUSTOMINFO" => player.custom_info.clone().unwrap_or_else(|| "NONE".to_string()),
        "KILLS" => player.kills.to_string(),
        "GOD" => bool_text(player.is_god),
        "CUFFED" => bool_text(player.is_cuffed),
        _ => String::new(),
    }
}

/// `{GET:players:selector}`
pub struct GetPlayerInfo;

impl Variable for GetPlayerInfo {
    fn name(&self) -> &'static str {
        "GET"
    }

    fn description(&self) -> &'static str {
        "Reads one piece of information from a set of players."
    }

    fn long_description(&self) -> Option<&'static str> {
        Some(
            "Player variables cannot be written into text directly; use this to show them. \
With more than one player the values are joined with \", \". \
Example: {GET:{EVPLAYER}:ROLE} or {GET:*:COUNT}.",
        )
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[
            Argument::required("players", ArgumentType::Players, "The players to read."),
            Argument::required("selector", ArgumentType::Options(SELECTORS), "What to read."),
        ];
        ARGS
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Text
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        let players = ctx
            .args
            .players(0)
            .map_err(|err| VariableError::bad_argument(self.name(), err))?;
        let selector = ctx
            .args
            .option(1)
            .map_err(|err| VariableError::bad_argument(self.name(), err))?;

        if selector == "COUNT" {
            return Ok(VariableValue::Float(players.len() as f64));
        }

        let values: Vec<String> = players
            .players(ctx.world)
            .iter()
            .map(|player| select(player, selector))
            .collect();
        Ok(VariableValue::Text(values.join(", ")))
    }
}

/// `{CMDVAR:players}`
pub struct CommandVariable;

impl Variable for CommandVariable {
    fn name(&self) -> &'static str {
        "CMDVAR"
    }

    fn description(&self) -> &'static str {
        "Player ids joined with '.', for passing players to server commands."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[Argument::required(
            "players",
            ArgumentType::Players,
            "A player variable. Sets produced by other argument variables are not accepted.",
        )];
        ARGS
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Text
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        let players = ctx
            .args
            .players(0)
            .map_err(|err| VariableError::bad_argument(self.name(), err))?;
        if players.is_from_argument_variable() {
            return Err(VariableError::UnsupportedArgumentVariable {
                variable: self.name().to_string(),
            });
        }

        let ids: Vec<String> = players.ids().iter().map(|id| id.to_string()).collect();
        Ok(VariableValue::Text(ids.join(".")))
    }
}

/// `{GETPLAYERSBYDATA:players:key:value}`
pub struct PlayersByData;

impl Variable for PlayersByData {
    fn name(&self) -> &'static str {
        "GETPLAYERSBYDATA"
    }

    fn description(&self) -> &'static str {
        "Players from a set whose session data has the given value."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[
            Argument::required("players", ArgumentType::Players, "The players to filter."),
            Argument::required("key", ArgumentType::Text, "Session data key."),
            Argument::required("value", ArgumentType::Text, "Value to match."),
        ];
        ARGS
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Players
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        let bad = |err| VariableError::bad_argument(self.name(), err);
        let players = ctx.args.players(0).map_err(bad)?;
        let key = ctx.args.text(1).map_err(bad)?;
        let value = ctx.args.text(2).map_err(bad)?;

        let matching = players
            .players(ctx.world)
            .into_iter()
            .filter(|p| p.session_vars.get(key).map(String::as_str) == Some(value))
            .map(|p| p.id);
        Ok(VariableValue::Players(PlayerSet::new(matching)))
    }
}
