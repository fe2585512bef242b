// Per-player event disable rules
// Other components (admin commands, config) can block an event for everyone or
// for a single user id; dispatch consults the gate before running scripts.

use std::sync::{PoisonError, RwLock};

use crate::args::EventKind;
use crate::player::Player;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisableRule {
    pub event: EventKind,
    /// None blocks the event for every player
    pub user_id: Option<String>,
}

impl DisableRule {
    pub fn matches(&self, event: EventKind, player: &Player) -> bool {
        self.event == event
            && self
                .user_id
                .as_deref()
                .map_or(true, |user_id| user_id == player.user_id)
    }
}

/// Answers whether an event is disabled for a player
pub trait DisableRuleGate: Send + Sync {
    /// The matching rule, if any
    fn player_disable_event(&self, event: EventKind, player: &Player) -> Option<DisableRule>;
}

/// Mutable in-memory rule set
#[derive(Debug, Default)]
pub struct DisabledEvents {
    rules: RwLock<Vec<DisableRule>>,
}

impl DisabledEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: impl IntoIterator<Item = DisableRule>) -> Self {
        Self {
            rules: RwLock::new(rules.into_iter().collect()),
        }
    }

    pub fn add(&self, rule: DisableRule) {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        if !rules.contains(&rule) {
            rules.push(rule);
        }
    }

    /// Remove every rule for `event`; returns how many were dropped
    pub fn clear(&self, event: EventKind) -> usize {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let before = rules.len();
        rules.retain(|rule| rule.event != event);
        before - rules.len()
    }

    pub fn len(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DisableRuleGate for DisabledEvents {
    fn player_disable_event(&self, event: EventKind, player: &Player) -> Option<DisableRule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|rule| rule.matches(event, player))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;

    #[test]
    fn test_rule_scoped_to_user() {
        let gate = DisabledEvents::with_rules([DisableRule {
            event: EventKind::Hurting,
            user_id: Some("alice@steam".to_string()),
        }]);
        let alice = Player::new(PlayerId(1), "Alice", "alice@steam");
        let bob = Player::new(PlayerId(2), "Bob", "bob@steam");

        assert!(gate.player_disable_event(EventKind::Hurting, &alice).is_some());
        assert!(gate.player_disable_event(EventKind::Hurting, &bob).is_none());
        assert!(gate.player_disable_event(EventKind::Died, &alice).is_none());
    }

    #[test]
    fn test_global_rule_and_clear() {
        let gate = DisabledEvents::new();
        gate.add(DisableRule {
            event: EventKind::Joined,
            user_id: None,
        });
        gate.add(DisableRule {
            event: EventKind::Joined,
            user_id: None,
        });
        assert_eq!(gate.len(), 1);

        let anyone = Player::new(PlayerId(9), "Anyone", "anyone@steam");
        assert!(gate.player_disable_event(EventKind::Joined, &anyone).is_some());

        assert_eq!(gate.clear(EventKind::Joined), 1);
        assert!(gate.is_empty());
    }
}
