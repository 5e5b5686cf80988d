//! Engine error taxonomy
//!
//! Every failure the engine can report has its own variant so the host can
//! present a specific message. `kind()` exposes a flat discriminant for
//! callers that only need to branch (HTTP status mapping, retry decisions).

use serde::Serialize;

use crate::domain::entities::ItemSlot;
use crate::domain::value_objects::{
    CharacterId, DungeonId, EquippedItemId, ItemId, RaceId, TopicId, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid equipment slot: {0:?}")]
    InvalidSlot(String),

    #[error("Item {item_id} is not in the inventory of character {character_id}")]
    ItemNotOwned {
        character_id: CharacterId,
        item_id: ItemId,
    },

    #[error("Item {item_id} belongs in the {expected} slot, not {requested}")]
    SlotMismatch {
        item_id: ItemId,
        expected: ItemSlot,
        requested: ItemSlot,
    },

    #[error("Equipped item {equipped_item_id} not found for character {character_id}")]
    NotEquipped {
        character_id: CharacterId,
        equipped_item_id: EquippedItemId,
    },

    #[error("Battle session has already ended")]
    SessionTerminal,

    #[error("Topic {topic_id} has no questions")]
    EmptyEncounter { topic_id: TopicId },

    #[error("Store conflict: {0}")]
    StoreConflict(String),

    #[error("Malformed bonus payload on item {item_id}: {reason}")]
    MalformedBonusPayload { item_id: ItemId, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Topic {topic_id} is locked")]
    TopicLocked { topic_id: TopicId },

    #[error("Character level {level} is below the required level {required}")]
    LevelTooLow { level: u32, required: u32 },

    #[error("Dungeon {dungeon_id} belongs to race {required}, not {actual}")]
    RaceMismatch {
        dungeon_id: DungeonId,
        required: RaceId,
        actual: RaceId,
    },

    #[error("User {user_id} already has a character of race {race_id}")]
    RaceAlreadyTaken { user_id: UserId, race_id: RaceId },

    #[error("Character {0} has no battle in progress")]
    NoActiveBattle(CharacterId),

    #[error("Answer is not an option of the current question")]
    UnknownAnswer,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(String),
}

/// Flat discriminant of [`EngineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidSlot,
    ItemNotOwned,
    SlotMismatch,
    NotEquipped,
    SessionTerminal,
    EmptyEncounter,
    StoreConflict,
    MalformedBonusPayload,
    NotFound,
    TopicLocked,
    LevelTooLow,
    RaceMismatch,
    RaceAlreadyTaken,
    NoActiveBattle,
    UnknownAnswer,
    InvalidRequest,
    Store,
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSlot(_) => ErrorKind::InvalidSlot,
            Self::ItemNotOwned { .. } => ErrorKind::ItemNotOwned,
            Self::SlotMismatch { .. } => ErrorKind::SlotMismatch,
            Self::NotEquipped { .. } => ErrorKind::NotEquipped,
            Self::SessionTerminal => ErrorKind::SessionTerminal,
            Self::EmptyEncounter { .. } => ErrorKind::EmptyEncounter,
            Self::StoreConflict(_) => ErrorKind::StoreConflict,
            Self::MalformedBonusPayload { .. } => ErrorKind::MalformedBonusPayload,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TopicLocked { .. } => ErrorKind::TopicLocked,
            Self::LevelTooLow { .. } => ErrorKind::LevelTooLow,
            Self::RaceMismatch { .. } => ErrorKind::RaceMismatch,
            Self::RaceAlreadyTaken { .. } => ErrorKind::RaceAlreadyTaken,
            Self::NoActiveBattle(_) => ErrorKind::NoActiveBattle,
            Self::UnknownAnswer => ErrorKind::UnknownAnswer,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Only a lost uniqueness race is worth retrying; the engine never retries
    /// on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreConflict(_))
    }
}
