//! Host-side event system and world model for scripted
//!
//! This crate describes everything the scripting engine consumes from the game
//! server: the event sources it can subscribe to, the payloads those events
//! carry, the players and map state scripts read and mutate, and the rule gate
//! that can veto player events. The engine never reaches past these types.
pub mod args;
pub mod player;
pub mod projection;
pub mod rules;
pub mod source;
pub mod types;
pub mod world;

pub use args::{
    ActivatingGeneratorEventArgs, ChangingRoleEventArgs, DecontaminatingEventArgs,
    DiedEventArgs, EventArgs, EventKind, HurtingEventArgs, InteractingDoorEventArgs,
    JoinedEventArgs, LeftEventArgs, RoundEndedEventArgs, SpawnedEventArgs,
};
pub use player::{Player, PlayerId, Position};
pub use projection::{PayloadValue, Projection, projections};
pub use rules::{DisableRule, DisableRuleGate, DisabledEvents};
pub use source::{
    EventCallback, EventHub, EventSourceDescriptor, EventSourceRegistry, PayloadShape,
    SubscribeError,
};
pub use types::{
    DamageType, DoorType, LeadingTeam, RoleType, RoomType, SpawnReason, Team, ZoneType,
};
pub use world::{Door, Generator, Grenade, Hint, MemoryWorld, World};
