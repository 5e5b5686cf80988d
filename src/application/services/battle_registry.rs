//! In-flight battle sessions, one per character
//!
//! The registry is plain data. `BattleServiceImpl` wraps it in a lock and keeps
//! every critical section free of `.await`.

use std::collections::HashMap;

use crate::domain::aggregates::BattleSession;
use crate::domain::entities::{InventoryItem, Stars};
use crate::domain::value_objects::{BattleId, CharacterId};

/// What a won battle produced once it has been written back
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Settlement {
    pub stars: Stars,
    pub reward: Option<InventoryItem>,
}

/// A registered session plus the bookkeeping that makes its settlement
/// happen at most once
#[derive(Debug)]
pub struct ActiveBattle {
    pub session: BattleSession,
    /// Stars already persisted for this session
    pub recorded_stars: Option<Stars>,
    pub settlement: Option<Settlement>,
    /// A caller is currently writing the settlement
    pub settling: bool,
}

impl ActiveBattle {
    pub fn new(session: BattleSession) -> Self {
        Self {
            session,
            recorded_stars: None,
            settlement: None,
            settling: false,
        }
    }

    pub fn battle_id(&self) -> BattleId {
        self.session.id()
    }
}

#[derive(Debug, Default)]
pub struct BattleRegistry {
    battles: HashMap<CharacterId, ActiveBattle>,
}

impl BattleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, returning the one it replaced
    pub fn insert(&mut self, session: BattleSession) -> Option<ActiveBattle> {
        self.battles
            .insert(session.character_id(), ActiveBattle::new(session))
    }

    pub fn get(&self, character_id: CharacterId) -> Option<&ActiveBattle> {
        self.battles.get(&character_id)
    }

    pub fn get_mut(&mut self, character_id: CharacterId) -> Option<&mut ActiveBattle> {
        self.battles.get_mut(&character_id)
    }

    /// The entry for `character_id`, only if it still holds battle `battle_id`
    pub fn get_battle_mut(
        &mut self,
        character_id: CharacterId,
        battle_id: BattleId,
    ) -> Option<&mut ActiveBattle> {
        self.battles
            .get_mut(&character_id)
            .filter(|entry| entry.battle_id() == battle_id)
    }

    pub fn remove(&mut self, character_id: CharacterId) -> Option<ActiveBattle> {
        self.battles.remove(&character_id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.battles.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AnswerOption, Question};
    use crate::domain::value_objects::{TopicId, UserId};

    fn session(character_id: CharacterId) -> BattleSession {
        let topic_id = TopicId::new();
        let question =
            Question::new(topic_id, "2 + 2?").with_answer(AnswerOption::new("4", true));
        BattleSession::new(UserId::new(), character_id, topic_id, vec![question], 3).unwrap()
    }

    #[test]
    fn test_insert_replaces_previous_session() {
        let character_id = CharacterId::new();
        let mut registry = BattleRegistry::new();

        let first = session(character_id);
        let first_id = first.id();
        assert!(registry.insert(first).is_none());

        let replaced = registry.insert(session(character_id)).unwrap();
        assert_eq!(replaced.battle_id(), first_id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_battle_mut_ignores_replaced_battle() {
        let character_id = CharacterId::new();
        let mut registry = BattleRegistry::new();

        let first = session(character_id);
        let first_id = first.id();
        registry.insert(first);
        registry.insert(session(character_id));

        assert!(registry.get_battle_mut(character_id, first_id).is_none());
    }

    #[test]
    fn test_remove_discards_session() {
        let character_id = CharacterId::new();
        let mut registry = BattleRegistry::new();
        registry.insert(session(character_id));

        assert!(registry.remove(character_id).is_some());
        assert!(registry.get(character_id).is_none());
        assert!(registry.is_empty());
    }
}
