//! Per-event projection tables
//!
//! Each event kind lists, in order, the payload fields scripts can read and how
//! to pull each one out of the payload. The binding layer turns every
//! projected value into an `{EV<NAME>}` scoped variable.

use crate::args::{EventArgs, EventKind};
use crate::player::PlayerId;

/// A payload field reduced to one of the shapes scripts understand
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Player(PlayerId),
    /// Enum-like value rendered by its symbolic name
    Symbol(&'static str),
    Bool(bool),
    Text(String),
}

pub type Extractor = fn(&EventArgs) -> Option<PayloadValue>;

#[derive(Clone, Copy)]
pub struct Projection {
    /// Field name, upper-cased into the variable token
    pub name: &'static str,
    pub extract: Extractor,
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection").field("name", &self.name).finish()
    }
}

const fn field(name: &'static str, extract: Extractor) -> Projection {
    Projection { name, extract }
}

const ACTING_PLAYER: Projection = field("Player", |ev| ev.player().map(PayloadValue::Player));
const IS_ALLOWED: Projection = field("IsAllowed", |ev| ev.is_allowed().map(PayloadValue::Bool));

static NONE: &[Projection] = &[];

static JOINED: &[Projection] = &[ACTING_PLAYER];

static LEFT: &[Projection] = &[ACTING_PLAYER];

static CHANGING_ROLE: &[Projection] = &[
    ACTING_PLAYER,
    field("NewRole", |ev| match ev {
        EventArgs::ChangingRole(ev) => Some(PayloadValue::Symbol(ev.new_role.into())),
        _ => None,
    }),
    field("Reason", |ev| match ev {
        EventArgs::ChangingRole(ev) => Some(PayloadValue::Symbol(ev.reason.into())),
        _ => None,
    }),
    IS_ALLOWED,
];

static SPAWNED: &[Projection] = &[
    ACTING_PLAYER,
    field("OldRole", |ev| match ev {
        EventArgs::Spawned(ev) => Some(PayloadValue::Symbol(ev.old_role.into())),
        _ => None,
    }),
];

static HURTING: &[Projection] = &[
    ACTING_PLAYER,
    field("Attacker", |ev| match ev {
        EventArgs::Hurting(ev) => ev.attacker.map(PayloadValue::Player),
        _ => None,
    }),
    field("Amount", |ev| match ev {
        EventArgs::Hurting(ev) => Some(PayloadValue::Text(ev.amount.to_string())),
        _ => None,
    }),
    field("DamageType", |ev| match ev {
        EventArgs::Hurting(ev) => Some(PayloadValue::Symbol(ev.damage_type.into())),
        _ => None,
    }),
    IS_ALLOWED,
];

static DIED: &[Projection] = &[
    ACTING_PLAYER,
    field("Attacker", |ev| match ev {
        EventArgs::Died(ev) => ev.attacker.map(PayloadValue::Player),
        _ => None,
    }),
    field("DamageType", |ev| match ev {
        EventArgs::Died(ev) => Some(PayloadValue::Symbol(ev.damage_type.into())),
        _ => None,
    }),
];

static INTERACTING_DOOR: &[Projection] = &[
    ACTING_PLAYER,
    field("Door", |ev| match ev {
        EventArgs::InteractingDoor(ev) => Some(PayloadValue::Symbol(ev.door.into())),
        _ => None,
    }),
    IS_ALLOWED,
];

static ACTIVATING_GENERATOR: &[Projection] = &[
    ACTING_PLAYER,
    field("Generator", |ev| match ev {
        EventArgs::ActivatingGenerator(ev) => Some(PayloadValue::Text(ev.generator.to_string())),
        _ => None,
    }),
    IS_ALLOWED,
];

static ROUND_ENDED: &[Projection] = &[field("LeadingTeam", |ev| match ev {
    EventArgs::RoundEnded(ev) => Some(PayloadValue::Symbol(ev.leading_team.into())),
    _ => None,
})];

static DECONTAMINATING: &[Projection] = &[IS_ALLOWED];

/// Ordered projections for an event kind. Payload-less kinds project nothing.
pub fn projections(kind: EventKind) -> &'static [Projection] {
    match kind {
        EventKind::Joined => JOINED,
        EventKind::Left => LEFT,
        EventKind::ChangingRole => CHANGING_ROLE,
        EventKind::Spawned => SPAWNED,
        EventKind::Hurting => HURTING,
        EventKind::Died => DIED,
        EventKind::InteractingDoor => INTERACTING_DOOR,
        EventKind::ActivatingGenerator => ACTIVATING_GENERATOR,
        EventKind::RoundEnded => ROUND_ENDED,
        EventKind::Decontaminating => DECONTAMINATING,
        EventKind::WaitingForPlayers | EventKind::RoundStarted | EventKind::RestartingRound => {
            NONE
        }
    }
}

/// Apply the projection table for `args`, skipping fields with no value
pub fn project(args: &EventArgs) -> Vec<(&'static str, PayloadValue)> {
    projections(args.kind())
        .iter()
        .filter_map(|p| (p.extract)(args).map(|value| (p.name, value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{ChangingRoleEventArgs, HurtingEventArgs};
    use crate::types::{DamageType, RoleType, SpawnReason};

    #[test]
    fn test_changing_role_projection_order() {
        let ev = EventArgs::ChangingRole(ChangingRoleEventArgs {
            player: PlayerId(3),
            new_role: RoleType::Scientist,
            reason: SpawnReason::ForceClass,
            is_allowed: true,
        });

        let projected = project(&ev);
        let names: Vec<_> = projected.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["Player", "NewRole", "Reason", "IsAllowed"]);
        assert_eq!(projected[1].1, PayloadValue::Symbol("Scientist"));
        assert_eq!(projected[3].1, PayloadValue::Bool(true));
    }

    #[test]
    fn test_missing_attacker_is_skipped() {
        let ev = EventArgs::Hurting(HurtingEventArgs {
            player: PlayerId(1),
            attacker: None,
            amount: 12.5,
            damage_type: DamageType::Falldown,
            is_allowed: true,
        });

        let projected = project(&ev);
        assert!(projected.iter().all(|(name, _)| *name != "Attacker"));
        assert!(projected.contains(&("Amount", PayloadValue::Text("12.5".to_string()))));
    }

    #[test]
    fn test_bare_events_project_nothing() {
        assert!(projections(EventKind::RoundStarted).is_empty());
        assert!(projections(EventKind::WaitingForPlayers).is_empty());
    }
}
