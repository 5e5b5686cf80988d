//! Dungeon and Topic entities - Ordered encounters grouped by race affinity

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{DungeonId, RaceId, TopicId};

/// A themed collection of topics, gated by race and minimum level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dungeon {
    pub id: DungeonId,
    pub race_id: RaceId,
    pub name: String,
    pub description: String,
    pub min_level: u32,
}

impl Dungeon {
    #[cfg(test)]
    pub fn new(race_id: RaceId, name: impl Into<String>, min_level: u32) -> Self {
        Self {
            id: DungeonId::new(),
            race_id,
            name: name.into(),
            description: String::new(),
            min_level,
        }
    }

    pub fn admits_level(&self, level: u32) -> bool {
        level >= self.min_level
    }
}

/// The opponent a topic is presented as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    pub image: Option<String>,
    pub question_count: u32,
}

/// One battle encounter within a dungeon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub dungeon_id: DungeonId,
    pub name: String,
    pub description: String,
    /// Ordinal within the dungeon; topics are played in ascending order
    pub position: u32,
    pub enemy: Enemy,
}

#[cfg(test)]
impl Topic {
    pub fn new(dungeon_id: DungeonId, name: impl Into<String>, position: u32, enemy: Enemy) -> Self {
        Self {
            id: TopicId::new(),
            dungeon_id,
            name: name.into(),
            description: String::new(),
            position,
            enemy,
        }
    }
}
