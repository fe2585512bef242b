// Commands that drive the simulated host
// One command per line: a verb followed by whitespace-separated arguments.

use std::str::FromStr;
use std::time::Duration;

use scripted_events::{DamageType, DoorType, EventKind, LeadingTeam, PlayerId, RoleType, SpawnReason};

#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Round lifecycle: binds event scripts
    Waiting,
    Start,
    End(LeadingTeam),
    /// Round lifecycle: unbinds event scripts
    Restart,
    Join {
        id: PlayerId,
        nickname: String,
        user_id: String,
    },
    Leave(PlayerId),
    Role {
        id: PlayerId,
        role: RoleType,
        reason: SpawnReason,
    },
    Hurt {
        id: PlayerId,
        amount: f32,
        damage_type: DamageType,
        attacker: Option<PlayerId>,
    },
    Door {
        id: PlayerId,
        door: DoorType,
    },
    Generator {
        id: PlayerId,
        generator: u32,
    },
    Decontaminate,
    Custom(String),
    /// Run a script by name; with a player id the player is the executor
    Run {
        script: String,
        sender: Option<PlayerId>,
    },
    Disable {
        event: EventKind,
        user_id: Option<String>,
    },
    Enable(EventKind),
    Sleep(Duration),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid {what} '{value}'")]
    InvalidValue { what: &'static str, value: String },
}

fn parse_value<T: FromStr>(what: &'static str, value: &str) -> Result<T, CommandParseError> {
    value.parse().map_err(|_| CommandParseError::InvalidValue {
        what,
        value: value.to_string(),
    })
}

fn player_id(value: &str) -> Result<PlayerId, CommandParseError> {
    parse_value::<u32>("player id", value).map(PlayerId)
}

impl FromStr for HostCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(CommandParseError::Empty)?;
        let args: Vec<&str> = parts.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("waiting", []) => HostCommand::Waiting,
            ("start", []) => HostCommand::Start,
            ("end", [team]) => HostCommand::End(parse_value("leading team", team)?),
            ("end", _) => return Err(CommandParseError::Usage("end <leading team>")),
            ("restart", []) => HostCommand::Restart,
            ("join", [id, nickname, user_id]) => HostCommand::Join {
                id: player_id(id)?,
                nickname: nickname.to_string(),
                user_id: user_id.to_string(),
            },
            ("join", _) => return Err(CommandParseError::Usage("join <id> <nickname> <user id>")),
            ("leave", [id]) => HostCommand::Leave(player_id(id)?),
            ("leave", _) => return Err(CommandParseError::Usage("leave <id>")),
            ("role", [id, role, rest @ ..]) if rest.len() <= 1 => HostCommand::Role {
                id: player_id(id)?,
                role: parse_value("role", role)?,
                reason: match rest.first() {
                    Some(reason) => parse_value("spawn reason", reason)?,
                    None => SpawnReason::ForceClass,
                },
            },
            ("role", _) => return Err(CommandParseError::Usage("role <id> <role> [reason]")),
            ("hurt", [id, amount, rest @ ..]) if rest.len() <= 2 => HostCommand::Hurt {
                id: player_id(id)?,
                amount: parse_value("amount", amount)?,
                damage_type: match rest.first() {
                    Some(kind) => parse_value("damage type", kind)?,
                    None => DamageType::Unknown,
                },
                attacker: rest.get(1).map(|a| player_id(a)).transpose()?,
            },
            ("hurt", _) => {
                return Err(CommandParseError::Usage(
                    "hurt <id> <amount> [damage type] [attacker id]",
                ))
            }
            ("door", [id, door]) => HostCommand::Door {
                id: player_id(id)?,
                door: parse_value("door", door)?,
            },
            ("door", _) => return Err(CommandParseError::Usage("door <id> <door>")),
            ("generator", [id, generator]) => HostCommand::Generator {
                id: player_id(id)?,
                generator: parse_value("generator", generator)?,
            },
            ("generator", _) => return Err(CommandParseError::Usage("generator <id> <generator>")),
            ("decontaminate", []) => HostCommand::Decontaminate,
            ("custom", [name]) => HostCommand::Custom(name.to_string()),
            ("custom", _) => return Err(CommandParseError::Usage("custom <name>")),
            ("run", [script]) => HostCommand::Run {
                script: script.to_string(),
                sender: None,
            },
            ("run", [script, sender]) => HostCommand::Run {
                script: script.to_string(),
                sender: Some(player_id(sender)?),
            },
            ("run", _) => return Err(CommandParseError::Usage("run <script> [player id]")),
            ("disable", [event, rest @ ..]) if rest.len() <= 1 => HostCommand::Disable {
                event: parse_value("event", event)?,
                user_id: rest.first().map(|u| u.to_string()),
            },
            ("disable", _) => return Err(CommandParseError::Usage("disable <event> [user id]")),
            ("enable", [event]) => HostCommand::Enable(parse_value("event", event)?),
            ("enable", _) => return Err(CommandParseError::Usage("enable <event>")),
            ("sleep", [ms]) => HostCommand::Sleep(Duration::from_millis(parse_value("milliseconds", ms)?)),
            ("sleep", _) => return Err(CommandParseError::Usage("sleep <milliseconds>")),
            ("waiting" | "start" | "restart" | "decontaminate", _) => {
                return Err(CommandParseError::Usage("this command takes no arguments"))
            }
            (other, _) => return Err(CommandParseError::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("waiting".parse::<HostCommand>(), Ok(HostCommand::Waiting));
        assert_eq!(
            "JOIN 3 Alice alice@steam".parse::<HostCommand>(),
            Ok(HostCommand::Join {
                id: PlayerId(3),
                nickname: "Alice".to_string(),
                user_id: "alice@steam".to_string(),
            })
        );
        assert_eq!(
            "role 3 scientist".parse::<HostCommand>(),
            Ok(HostCommand::Role {
                id: PlayerId(3),
                role: RoleType::Scientist,
                reason: SpawnReason::ForceClass,
            })
        );
        assert_eq!(
            "hurt 3 25.5 firearm 4".parse::<HostCommand>(),
            Ok(HostCommand::Hurt {
                id: PlayerId(3),
                amount: 25.5,
                damage_type: DamageType::Firearm,
                attacker: Some(PlayerId(4)),
            })
        );
        assert_eq!(
            "disable InteractingDoor bob@steam".parse::<HostCommand>(),
            Ok(HostCommand::Disable {
                event: EventKind::InteractingDoor,
                user_id: Some("bob@steam".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<HostCommand>(), Err(CommandParseError::Empty));
        assert!(matches!(
            "explode".parse::<HostCommand>(),
            Err(CommandParseError::UnknownCommand(_))
        ));
        assert!(matches!(
            "leave".parse::<HostCommand>(),
            Err(CommandParseError::Usage(_))
        ));
        assert!(matches!(
            "door 1 Basement".parse::<HostCommand>(),
            Err(CommandParseError::InvalidValue { what: "door", .. })
        ));
        // Event names are case-sensitive
        assert!("enable left".parse::<HostCommand>().is_err());
    }
}
