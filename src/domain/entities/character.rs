//! Character entity - A player's avatar, bound to one race

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CharacterId, RaceId, UserId};

/// A playable race (the class-like archetype a character belongs to)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub name: String,
    /// Short role label shown on the selection screen
    pub role: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
impl Race {
    pub fn new(id: RaceId, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: role.into(),
            icon: None,
            color: None,
            description: String::new(),
        }
    }
}

/// A user's character.
///
/// Effective attributes are not stored; they are derived from the equipped set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub user_id: UserId,
    pub race_id: RaceId,
    pub level: u32,
    pub created_at: DateTime<Utc>,
}

impl Character {
    pub const STARTING_LEVEL: u32 = 1;

    pub fn new(user_id: UserId, race_id: RaceId) -> Self {
        Self {
            id: CharacterId::new(),
            user_id,
            race_id,
            level: Self::STARTING_LEVEL,
            created_at: Utc::now(),
        }
    }

    #[cfg(test)]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}
