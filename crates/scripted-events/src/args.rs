use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::player::PlayerId;
use crate::types::{DamageType, DoorType, LeadingTeam, RoleType, SpawnReason};

/// Every event the host can raise, named the way scripts refer to them
/// (`!-- EVENT Left`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum EventKind {
    // Server
    WaitingForPlayers,
    RoundStarted,
    RoundEnded,
    RestartingRound,
    // Player
    Joined,
    Left,
    ChangingRole,
    Spawned,
    Hurting,
    Died,
    InteractingDoor,
    ActivatingGenerator,
    // Map
    Decontaminating,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone)]
pub struct JoinedEventArgs {
    pub player: PlayerId,
}

#[derive(Debug, Clone)]
pub struct LeftEventArgs {
    pub player: PlayerId,
}

/// Raised before the role is applied, so the world still holds the old role
#[derive(Debug, Clone)]
pub struct ChangingRoleEventArgs {
    pub player: PlayerId,
    pub new_role: RoleType,
    pub reason: SpawnReason,
    pub is_allowed: bool,
}

#[derive(Debug, Clone)]
pub struct SpawnedEventArgs {
    pub player: PlayerId,
    pub old_role: RoleType,
}

#[derive(Debug, Clone)]
pub struct HurtingEventArgs {
    pub player: PlayerId,
    pub attacker: Option<PlayerId>,
    pub amount: f32,
    pub damage_type: DamageType,
    pub is_allowed: bool,
}

#[derive(Debug, Clone)]
pub struct DiedEventArgs {
    pub player: PlayerId,
    pub attacker: Option<PlayerId>,
    pub damage_type: DamageType,
}

#[derive(Debug, Clone)]
pub struct InteractingDoorEventArgs {
    pub player: PlayerId,
    pub door: DoorType,
    pub is_allowed: bool,
}

#[derive(Debug, Clone)]
pub struct ActivatingGeneratorEventArgs {
    pub player: PlayerId,
    pub generator: u32,
    pub is_allowed: bool,
}

#[derive(Debug, Clone)]
pub struct RoundEndedEventArgs {
    pub leading_team: LeadingTeam,
}

#[derive(Debug, Clone)]
pub struct DecontaminatingEventArgs {
    pub is_allowed: bool,
}

/// Typed payload of a host event
#[derive(Debug, Clone)]
pub enum EventArgs {
    Joined(JoinedEventArgs),
    Left(LeftEventArgs),
    ChangingRole(ChangingRoleEventArgs),
    Spawned(SpawnedEventArgs),
    Hurting(HurtingEventArgs),
    Died(DiedEventArgs),
    InteractingDoor(InteractingDoorEventArgs),
    ActivatingGenerator(ActivatingGeneratorEventArgs),
    RoundEnded(RoundEndedEventArgs),
    Decontaminating(DecontaminatingEventArgs),
}

impl EventArgs {
    pub fn kind(&self) -> EventKind {
        match self {
            EventArgs::Joined(_) => EventKind::Joined,
            EventArgs::Left(_) => EventKind::Left,
            EventArgs::ChangingRole(_) => EventKind::ChangingRole,
            EventArgs::Spawned(_) => EventKind::Spawned,
            EventArgs::Hurting(_) => EventKind::Hurting,
            EventArgs::Died(_) => EventKind::Died,
            EventArgs::InteractingDoor(_) => EventKind::InteractingDoor,
            EventArgs::ActivatingGenerator(_) => EventKind::ActivatingGenerator,
            EventArgs::RoundEnded(_) => EventKind::RoundEnded,
            EventArgs::Decontaminating(_) => EventKind::Decontaminating,
        }
    }

    /// The acting player, for player-scoped events
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            EventArgs::Joined(ev) => Some(ev.player),
            EventArgs::Left(ev) => Some(ev.player),
            EventArgs::ChangingRole(ev) => Some(ev.player),
            EventArgs::Spawned(ev) => Some(ev.player),
            EventArgs::Hurting(ev) => Some(ev.player),
            EventArgs::Died(ev) => Some(ev.player),
            EventArgs::InteractingDoor(ev) => Some(ev.player),
            EventArgs::ActivatingGenerator(ev) => Some(ev.player),
            EventArgs::RoundEnded(_) | EventArgs::Decontaminating(_) => None,
        }
    }

    /// `Some(allowed)` when the host lets handlers veto this event
    pub fn is_allowed(&self) -> Option<bool> {
        match self {
            EventArgs::ChangingRole(ev) => Some(ev.is_allowed),
            EventArgs::Hurting(ev) => Some(ev.is_allowed),
            EventArgs::InteractingDoor(ev) => Some(ev.is_allowed),
            EventArgs::ActivatingGenerator(ev) => Some(ev.is_allowed),
            EventArgs::Decontaminating(ev) => Some(ev.is_allowed),
            _ => None,
        }
    }

    pub fn is_deniable(&self) -> bool {
        self.is_allowed().is_some()
    }

    /// Veto the event. Returns false if this event cannot be denied.
    pub fn deny(&mut self) -> bool {
        let flag = match self {
            EventArgs::ChangingRole(ev) => &mut ev.is_allowed,
            EventArgs::Hurting(ev) => &mut ev.is_allowed,
            EventArgs::InteractingDoor(ev) => &mut ev.is_allowed,
            EventArgs::ActivatingGenerator(ev) => &mut ev.is_allowed,
            EventArgs::Decontaminating(ev) => &mut ev.is_allowed,
            _ => return false,
        };
        *flag = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::ChangingRole.name(), "ChangingRole");
        assert_eq!("Left".parse::<EventKind>().ok(), Some(EventKind::Left));
        assert!("left".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_deny_only_deniable_events() {
        let mut door = EventArgs::InteractingDoor(InteractingDoorEventArgs {
            player: PlayerId(1),
            door: DoorType::GateA,
            is_allowed: true,
        });
        assert!(door.is_deniable());
        assert!(door.deny());
        assert_eq!(door.is_allowed(), Some(false));

        let mut left = EventArgs::Left(LeftEventArgs { player: PlayerId(1) });
        assert!(!left.is_deniable());
        assert!(!left.deny());
    }
}
