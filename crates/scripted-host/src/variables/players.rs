use std::sync::Arc;

use super::{PlayerSet, Variable, VariableContext, VariableGroup, VariableKind, VariableValue};
use crate::error::VariableError;

pub fn group() -> VariableGroup {
    VariableGroup::new("Players", vec![Arc::new(AllPlayers), Arc::new(PlayerCount)])
}

/// `{PLAYERS}`; NPCs are not players
pub struct AllPlayers;

impl Variable for AllPlayers {
    fn name(&self) -> &'static str {
        "PLAYERS"
    }

    fn description(&self) -> &'static str {
        "Every connected player."
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Players
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        let ids = ctx
            .world
            .players()
            .into_iter()
            .filter(|p| !p.is_npc)
            .map(|p| p.id);
        Ok(VariableValue::Players(PlayerSet::new(ids)))
    }
}

pub struct PlayerCount;

impl Variable for PlayerCount {
    fn name(&self) -> &'static str {
        "PLAYERCOUNT"
    }

    fn description(&self) -> &'static str {
        "The number of connected players."
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Float
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        let count = ctx.world.players().iter().filter(|p| !p.is_npc).count();
        Ok(VariableValue::Float(count as f64))
    }
}

#[cfg(test)]
mod tests {
    use crate::variables::{Resolver, VariableRegistry};
    use scripted_events::{MemoryWorld, Player, PlayerId};

    #[test]
    fn test_npcs_are_not_counted() {
        let registry = VariableRegistry::with_builtins();
        let world = MemoryWorld::new();
        world.add_player(Player::new(PlayerId(1), "Alice", "alice@steam"));
        world.add_npc(Player::new(PlayerId(2), "Dummy", "npc"));
        let resolver = Resolver::new(&registry, &world, None);

        assert_eq!(resolver.replace("{PLAYERCOUNT}").unwrap(), "1");
        assert_eq!(resolver.replace("{GET:{PLAYERS}:COUNT}").unwrap(), "1");
    }
}
