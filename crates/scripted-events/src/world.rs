// Facility state as seen by scripts
// Read access for variables, a few mutations for actions. `MemoryWorld` backs
// the simulated server and the tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::player::{Player, PlayerId, Position};
use crate::types::{DoorType, RoleType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generator {
    pub id: u32,
    pub engaged: bool,
    pub activating: bool,
    pub unlocked: bool,
    pub open: bool,
}

impl Generator {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            engaged: false,
            activating: false,
            unlocked: false,
            open: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Door {
    pub door_type: DoorType,
    pub open: bool,
}

/// A hint shown on a player's screen
#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    pub player: PlayerId,
    pub text: String,
    pub duration: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grenade {
    pub position: Position,
    pub fuse_time: f32,
    pub owner: Option<PlayerId>,
}

/// Host world accessed by actions and variables
pub trait World: Send + Sync {
    fn players(&self) -> Vec<Player>;

    fn player(&self, id: PlayerId) -> Option<Player>;

    /// Returns false if the player is not connected
    fn set_health(&self, id: PlayerId, health: f32) -> bool;

    /// Custom info shown to every observer; None clears it
    fn set_custom_info(&self, id: PlayerId, info: Option<String>) -> bool;

    /// Custom info about `target` shown only to `viewer`; None clears it
    fn set_custom_info_for(&self, target: PlayerId, viewer: PlayerId, info: Option<String>) -> bool;

    fn show_hint(&self, id: PlayerId, text: &str, duration: f32) -> bool;

    fn generators(&self) -> Vec<Generator>;

    fn is_decontaminated(&self) -> bool;

    fn scp914_active(&self) -> bool;

    fn door(&self, door: DoorType) -> Option<Door>;

    fn spawn_grenade(&self, position: Position, fuse_time: f32, owner: Option<PlayerId>);
}

#[derive(Debug, Default)]
struct WorldState {
    players: Vec<Player>,
    generators: Vec<Generator>,
    doors: HashMap<DoorType, bool>,
    decontaminated: bool,
    scp914_active: bool,
    hints: Vec<Hint>,
    grenades: Vec<Grenade>,
    // (target, viewer) -> info
    target_infos: HashMap<(PlayerId, PlayerId), String>,
}

/// In-memory world
#[derive(Debug, Default)]
pub struct MemoryWorld {
    state: Mutex<WorldState>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_player<R>(&self, id: PlayerId, f: impl FnOnce(&mut Player) -> R) -> Option<R> {
        self.state().players.iter_mut().find(|p| p.id == id).map(f)
    }

    /// Insert or replace a player
    pub fn add_player(&self, player: Player) {
        let mut state = self.state();
        state.players.retain(|p| p.id != player.id);
        debug!(target: "events", "World: player {} ({}) added", player.id, player.nickname);
        state.players.push(player);
    }

    pub fn add_npc(&self, mut player: Player) {
        player.is_npc = true;
        self.add_player(player);
    }

    pub fn remove_player(&self, id: PlayerId) -> Option<Player> {
        let mut state = self.state();
        let index = state.players.iter().position(|p| p.id == id)?;
        state.target_infos.retain(|(target, viewer), _| *target != id && *viewer != id);
        Some(state.players.remove(index))
    }

    /// Apply a role change, moving the player to the role's spawn room
    pub fn set_role(&self, id: PlayerId, role: RoleType) -> bool {
        self.with_player(id, |player| {
            player.role = role;
            player.room = role.spawn_room();
            player.health = if role.is_alive() { 100.0 } else { 0.0 };
        })
        .is_some()
    }

    pub fn set_decontaminated(&self, decontaminated: bool) {
        self.state().decontaminated = decontaminated;
    }

    pub fn set_scp914_active(&self, active: bool) {
        self.state().scp914_active = active;
    }

    pub fn add_generator(&self, generator: Generator) {
        let mut state = self.state();
        state.generators.retain(|g| g.id != generator.id);
        state.generators.push(generator);
    }

    pub fn set_door(&self, door: DoorType, open: bool) {
        self.state().doors.insert(door, open);
    }

    pub fn set_session_var(&self, id: PlayerId, key: impl Into<String>, value: impl Into<String>) -> bool {
        let (key, value) = (key.into(), value.into());
        self.with_player(id, |player| {
            player.session_vars.insert(key, value);
        })
        .is_some()
    }

    /// Every hint shown so far, oldest first
    pub fn hints(&self) -> Vec<Hint> {
        self.state().hints.clone()
    }

    pub fn grenades(&self) -> Vec<Grenade> {
        self.state().grenades.clone()
    }

    /// Per-viewer custom info currently set about `target`
    pub fn target_infos(&self, target: PlayerId) -> HashMap<PlayerId, String> {
        self.state()
            .target_infos
            .iter()
            .filter(|((t, _), _)| *t == target)
            .map(|((_, viewer), info)| (*viewer, info.clone()))
            .collect()
    }
}

impl World for MemoryWorld {
    fn players(&self) -> Vec<Player> {
        self.state().players.clone()
    }

    fn player(&self, id: PlayerId) -> Option<Player> {
        self.state().players.iter().find(|p| p.id == id).cloned()
    }

    fn set_health(&self, id: PlayerId, health: f32) -> bool {
        self.with_player(id, |player| player.health = health).is_some()
    }

    fn set_custom_info(&self, id: PlayerId, info: Option<String>) -> bool {
        self.with_player(id, |player| player.custom_info = info).is_some()
    }

    fn set_custom_info_for(&self, target: PlayerId, viewer: PlayerId, info: Option<String>) -> bool {
        let mut state = self.state();
        let connected = |id: PlayerId| state.players.iter().any(|p| p.id == id);
        if !connected(target) || !connected(viewer) {
            return false;
        }

        match info {
            Some(info) => {
                state.target_infos.insert((target, viewer), info);
            }
            None => {
                state.target_infos.remove(&(target, viewer));
            }
        }
        true
    }

    fn show_hint(&self, id: PlayerId, text: &str, duration: f32) -> bool {
        let mut state = self.state();
        if !state.players.iter().any(|p| p.id == id) {
            return false;
        }
        state.hints.push(Hint {
            player: id,
            text: text.to_string(),
            duration,
        });
        true
    }

    fn generators(&self) -> Vec<Generator> {
        self.state().generators.clone()
    }

    fn is_decontaminated(&self) -> bool {
        self.state().decontaminated
    }

    fn scp914_active(&self) -> bool {
        self.state().scp914_active
    }

    fn door(&self, door: DoorType) -> Option<Door> {
        self.state().doors.get(&door).map(|open| Door {
            door_type: door,
            open: *open,
        })
    }

    fn spawn_grenade(&self, position: Position, fuse_time: f32, owner: Option<PlayerId>) {
        debug!(target: "events", "World: grenade spawned at {:?}", position);
        self.state().grenades.push(Grenade {
            position,
            fuse_time,
            owner,
        });
    }
}
