//! Progress entities - Persisted completion records and derived topic status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dungeon::Topic;
use crate::domain::value_objects::{DungeonId, TopicId, TopicProgressId, UserId, UserProgressId};

/// Rating of a won topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Stars {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Stars {
    /// The one star formula: a clean run earns three, a single slip two,
    /// anything worse one.
    pub fn from_error_count(error_count: u32) -> Self {
        match error_count {
            0 => Self::Three,
            1 => Self::Two,
            _ => Self::One,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> u8 {
        stars.value()
    }
}

impl TryFrom<u8> for Stars {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(format!("star rating out of range: {}", other)),
        }
    }
}

/// Completion record for one (user, topic) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub id: TopicProgressId,
    pub user_id: UserId,
    pub topic_id: TopicId,
    pub completed: bool,
    pub stars: Stars,
    pub updated_at: DateTime<Utc>,
}

impl TopicProgress {
    pub fn completed(user_id: UserId, topic_id: TopicId, stars: Stars) -> Self {
        Self {
            id: TopicProgressId::new(),
            user_id,
            topic_id,
            completed: true,
            stars,
            updated_at: Utc::now(),
        }
    }

    /// Stars only count once the topic is completed
    pub fn earned_stars(&self) -> u32 {
        if self.completed {
            u32::from(self.stars.value())
        } else {
            0
        }
    }
}

/// Marker that a user has entered a dungeon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub id: UserProgressId,
    pub user_id: UserId,
    pub dungeon_id: DungeonId,
    pub created_at: DateTime<Utc>,
}

impl UserProgress {
    pub fn new(user_id: UserId, dungeon_id: DungeonId) -> Self {
        Self {
            id: UserProgressId::new(),
            user_id,
            dungeon_id,
            created_at: Utc::now(),
        }
    }
}

/// Derived (never stored) availability of a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    Locked,
    Active,
    Completed,
}

impl TopicStatus {
    /// Active topics can be fought, completed ones replayed
    pub fn is_playable(&self) -> bool {
        !matches!(self, Self::Locked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicWithStatus {
    pub topic: Topic,
    pub status: TopicStatus,
    /// Stars of the stored record, if the topic was ever won
    pub stars: Option<Stars>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_formula() {
        assert_eq!(Stars::from_error_count(0), Stars::Three);
        assert_eq!(Stars::from_error_count(1), Stars::Two);
        assert_eq!(Stars::from_error_count(2), Stars::One);
        assert_eq!(Stars::from_error_count(5), Stars::One);
    }

    #[test]
    fn test_stars_serialize_as_numbers() {
        assert_eq!(serde_json::to_string(&Stars::Two).unwrap(), "2");
        assert_eq!(serde_json::from_str::<Stars>("3").unwrap(), Stars::Three);
        assert!(serde_json::from_str::<Stars>("4").is_err());
    }

    #[test]
    fn test_uncompleted_record_earns_nothing() {
        let mut progress = TopicProgress::completed(UserId::new(), TopicId::new(), Stars::Three);
        assert_eq!(progress.earned_stars(), 3);
        progress.completed = false;
        assert_eq!(progress.earned_stars(), 0);
    }
}
