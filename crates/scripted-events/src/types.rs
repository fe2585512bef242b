use strum_macros::{Display, EnumString, IntoStaticStr, VariantNames};

/// Role a player is currently playing as
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, VariantNames,
)]
#[strum(ascii_case_insensitive)]
pub enum RoleType {
    None,
    ClassD,
    Scientist,
    FacilityGuard,
    NtfPrivate,
    NtfSergeant,
    NtfCaptain,
    ChaosConscript,
    ChaosRifleman,
    Scp049,
    Scp079,
    Scp096,
    Scp106,
    Scp173,
    Scp939,
    Spectator,
    Tutorial,
    Overwatch,
}

impl RoleType {
    /// Team this role fights for
    pub fn team(self) -> Team {
        match self {
            RoleType::ClassD => Team::ClassD,
            RoleType::Scientist => Team::Scientists,
            RoleType::FacilityGuard
            | RoleType::NtfPrivate
            | RoleType::NtfSergeant
            | RoleType::NtfCaptain => Team::FoundationForces,
            RoleType::ChaosConscript | RoleType::ChaosRifleman => Team::ChaosInsurgency,
            RoleType::Scp049
            | RoleType::Scp079
            | RoleType::Scp096
            | RoleType::Scp106
            | RoleType::Scp173
            | RoleType::Scp939 => Team::SCPs,
            RoleType::Tutorial => Team::OtherAlive,
            RoleType::None | RoleType::Spectator | RoleType::Overwatch => Team::Dead,
        }
    }

    /// Room a freshly spawned player of this role appears in
    pub fn spawn_room(self) -> RoomType {
        match self {
            RoleType::ClassD => RoomType::LczClassDSpawn,
            RoleType::Scientist => RoomType::Lcz914,
            RoleType::FacilityGuard => RoomType::EzGateA,
            RoleType::NtfPrivate
            | RoleType::NtfSergeant
            | RoleType::NtfCaptain
            | RoleType::ChaosConscript
            | RoleType::ChaosRifleman
            | RoleType::Tutorial => RoomType::Surface,
            RoleType::Scp049 | RoleType::Scp096 | RoleType::Scp106 | RoleType::Scp939 => {
                RoomType::HczArmory
            }
            RoleType::Scp079 => RoomType::Hcz079,
            RoleType::Scp173 => RoomType::Hcz106,
            RoleType::None | RoleType::Spectator | RoleType::Overwatch => RoomType::Unknown,
        }
    }

    pub fn is_alive(self) -> bool {
        self.team() != Team::Dead
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum Team {
    SCPs,
    FoundationForces,
    ChaosInsurgency,
    Scientists,
    ClassD,
    Dead,
    OtherAlive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum ZoneType {
    Unspecified,
    LightContainment,
    HeavyContainment,
    Entrance,
    Surface,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, VariantNames,
)]
#[strum(ascii_case_insensitive)]
pub enum RoomType {
    Unknown,
    LczClassDSpawn,
    LczArmory,
    Lcz914,
    LczCafe,
    HczArmory,
    Hcz079,
    Hcz106,
    EzGateA,
    EzGateB,
    EzIntercom,
    Surface,
}

impl RoomType {
    pub fn zone(self) -> ZoneType {
        match self {
            RoomType::LczClassDSpawn | RoomType::LczArmory | RoomType::Lcz914 | RoomType::LczCafe => {
                ZoneType::LightContainment
            }
            RoomType::HczArmory | RoomType::Hcz079 | RoomType::Hcz106 => ZoneType::HeavyContainment,
            RoomType::EzGateA | RoomType::EzGateB | RoomType::EzIntercom => ZoneType::Entrance,
            RoomType::Surface => ZoneType::Surface,
            RoomType::Unknown => ZoneType::Unspecified,
        }
    }
}

/// Named doors scripts can refer to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, VariantNames,
)]
#[strum(ascii_case_insensitive)]
pub enum DoorType {
    GateA,
    GateB,
    Scp914Gate,
    LczArmory,
    HczArmory,
    Intercom,
    Scp079First,
    CheckpointLczA,
    SurfaceGate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum DamageType {
    Unknown,
    Falldown,
    Firearm,
    Explosion,
    Tesla,
    Scp,
    Warhead,
    Decontamination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum SpawnReason {
    None,
    RoundStart,
    LateJoin,
    Respawn,
    Died,
    Escaped,
    ForceClass,
    Revived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum LeadingTeam {
    FacilityForces,
    ChaosInsurgency,
    Anomalies,
    Draw,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_team_mapping() {
        assert_eq!(RoleType::ClassD.team(), Team::ClassD);
        assert_eq!(RoleType::NtfCaptain.team(), Team::FoundationForces);
        assert_eq!(RoleType::Scp173.team(), Team::SCPs);
        assert!(!RoleType::Spectator.is_alive());
    }

    #[test]
    fn test_symbols_parse_case_insensitively() {
        assert_eq!(DoorType::from_str("gatea").ok(), Some(DoorType::GateA));
        assert_eq!(RoleType::from_str("CLASSD").ok(), Some(RoleType::ClassD));
        assert_eq!(RoleType::Scientist.to_string(), "Scientist");
    }

    #[test]
    fn test_room_zone_mapping() {
        assert_eq!(RoomType::Lcz914.zone(), ZoneType::LightContainment);
        assert_eq!(RoleType::Scp079.spawn_room().zone(), ZoneType::HeavyContainment);
    }
}
