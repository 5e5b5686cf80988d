//! Repository ports - Interfaces for the record store and catalog
//!
//! These traits define the contracts that infrastructure repositories must implement.
//! Application services depend on these traits, not concrete implementations.
//! Mutations that touch more than one relation are single methods so the
//! store can run them in one transaction.

use async_trait::async_trait;

use crate::domain::entities::{
    Character, Dungeon, EquipChange, InventoryItem, Item, ItemSlot, Loadout, Question, Race, Stars,
    Topic, TopicProgress, UserProgress,
};
use crate::domain::errors::EngineError;
use crate::domain::value_objects::{
    CharacterId, DungeonId, EquippedItemId, ItemId, RaceId, TopicId, UserId,
};

/// Repository operation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepoError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A uniqueness constraint rejected the write, or a concurrent writer won
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

impl From<RepoError> for EngineError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(message) => EngineError::StoreConflict(message),
            RepoError::NotFound { entity_type, id } => EngineError::NotFound {
                entity: entity_type,
                id,
            },
            other => EngineError::Store(other.to_string()),
        }
    }
}

// =============================================================================
// Catalog Port (read-only)
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepositoryPort: Send + Sync {
    async fn list_items(&self) -> Result<Vec<Item>, RepoError>;

    /// All races, ordered by id
    async fn list_races(&self) -> Result<Vec<Race>, RepoError>;

    async fn get_dungeon(&self, id: DungeonId) -> Result<Option<Dungeon>, RepoError>;

    /// Dungeons of a race, ordered by minimum level
    async fn list_dungeons_by_race(&self, race_id: RaceId) -> Result<Vec<Dungeon>, RepoError>;

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, RepoError>;

    /// Topics of a dungeon, ordered by position
    async fn list_topics(&self, dungeon_id: DungeonId) -> Result<Vec<Topic>, RepoError>;
}

// =============================================================================
// Question Supply Port
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionSupplyPort: Send + Sync {
    /// Questions of a topic in play order, each with its options in order
    async fn questions_for_topic(&self, topic_id: TopicId) -> Result<Vec<Question>, RepoError>;
}

// =============================================================================
// Character Repository Port
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepositoryPort: Send + Sync {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError>;

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Character>, RepoError>;

    /// Insert a character; `Conflict` if the user already has one of that race
    async fn create(&self, character: &Character) -> Result<(), RepoError>;
}

// =============================================================================
// Equipment Repository Port
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EquipmentRepositoryPort: Send + Sync {
    /// Equipped set and inventory of a character, read together
    async fn load(&self, character_id: CharacterId) -> Result<Loadout, RepoError>;

    /// Atomically move one inventory instance of `item_id` into `slot`,
    /// returning any previous occupant to the inventory.
    ///
    /// `Ok(None)` when the character has no unequipped instance of the item.
    async fn equip(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        slot: ItemSlot,
    ) -> Result<Option<EquipChange>, RepoError>;

    /// Atomically move an equipped item back to the inventory.
    ///
    /// `Ok(None)` when no such equipped item exists for the character.
    async fn unequip(
        &self,
        character_id: CharacterId,
        equipped_item_id: EquippedItemId,
    ) -> Result<Option<InventoryItem>, RepoError>;

    async fn add_to_inventory(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
    ) -> Result<InventoryItem, RepoError>;
}

// =============================================================================
// Progress Repository Port
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepositoryPort: Send + Sync {
    /// Return the (user, dungeon) record, creating it if absent. Safe to race:
    /// concurrent callers all observe the same single record.
    async fn get_or_create_user_progress(
        &self,
        user_id: UserId,
        dungeon_id: DungeonId,
    ) -> Result<UserProgress, RepoError>;

    async fn list_topic_progress(
        &self,
        user_id: UserId,
        topic_ids: &[TopicId],
    ) -> Result<Vec<TopicProgress>, RepoError>;

    async fn list_all_topic_progress(&self, user_id: UserId)
        -> Result<Vec<TopicProgress>, RepoError>;

    /// Insert or overwrite the completed record of (user, topic)
    async fn upsert_topic_completion(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        stars: Stars,
    ) -> Result<TopicProgress, RepoError>;
}
