use std::collections::HashMap;
use std::fmt;

use crate::types::{RoleType, RoomType, Team, ZoneType};

/// Server-assigned player number, stable for the lifetime of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Snapshot of a player at the time it was read from the world
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub display_nickname: Option<String>,
    pub user_id: String,
    pub role: RoleType,
    pub room: RoomType,
    pub health: f32,
    pub position: Position,
    /// Dummy players spawned by plugins; never exposed to event variables
    pub is_npc: bool,
    pub is_god: bool,
    pub is_cuffed: bool,
    pub custom_info: Option<String>,
    pub group: Option<String>,
    pub kills: u32,
    /// Free-form per-player data written by other plugins
    pub session_vars: HashMap<String, String>,
}

impl Player {
    pub fn new(id: PlayerId, nickname: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            display_nickname: None,
            user_id: user_id.into(),
            role: RoleType::None,
            room: RoomType::Unknown,
            health: 0.0,
            position: Position::default(),
            is_npc: false,
            is_god: false,
            is_cuffed: false,
            custom_info: None,
            group: None,
            kills: 0,
            session_vars: HashMap::new(),
        }
    }

    pub fn team(&self) -> Team {
        self.role.team()
    }

    pub fn zone(&self) -> ZoneType {
        self.room.zone()
    }

    /// Display nickname if set, otherwise the nickname
    pub fn display_name(&self) -> &str {
        self.display_nickname.as_deref().unwrap_or(&self.nickname)
    }
}
