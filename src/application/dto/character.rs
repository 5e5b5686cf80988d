use serde::{Deserialize, Serialize};

use crate::application::services::FirstCharacter;
use crate::domain::entities::{Character, Dungeon, Race, UserProgress};

// ============================================================================
// Requests
// ============================================================================

/// Request to create a character of a race
#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequestDto {
    pub race_id: u32,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RaceResponseDto {
    pub id: u32,
    pub name: String,
    pub role: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: String,
}

impl From<Race> for RaceResponseDto {
    fn from(race: Race) -> Self {
        Self {
            id: race.id.value(),
            name: race.name,
            role: race.role,
            icon: race.icon,
            color: race.color,
            description: race.description,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DungeonResponseDto {
    pub id: String,
    pub race_id: u32,
    pub name: String,
    pub description: String,
    pub min_level: u32,
}

impl From<Dungeon> for DungeonResponseDto {
    fn from(dungeon: Dungeon) -> Self {
        Self {
            id: dungeon.id.to_string(),
            race_id: dungeon.race_id.value(),
            name: dungeon.name,
            description: dungeon.description,
            min_level: dungeon.min_level,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterResponseDto {
    pub id: String,
    pub user_id: String,
    pub race_id: u32,
    pub level: u32,
    pub created_at: String,
}

impl From<Character> for CharacterResponseDto {
    fn from(character: Character) -> Self {
        Self {
            id: character.id.to_string(),
            user_id: character.user_id.to_string(),
            race_id: character.race_id.value(),
            level: character.level,
            created_at: character.created_at.to_rfc3339(),
        }
    }
}

/// Created character, plus the dungeon entry made when it was the user's first
#[derive(Debug, Clone, Serialize)]
pub struct CharacterCreatedResponseDto {
    pub character: CharacterResponseDto,
    pub first_dungeon_entry: Option<UserProgress>,
}

impl From<Character> for CharacterCreatedResponseDto {
    fn from(character: Character) -> Self {
        Self {
            character: character.into(),
            first_dungeon_entry: None,
        }
    }
}

impl From<FirstCharacter> for CharacterCreatedResponseDto {
    fn from(first: FirstCharacter) -> Self {
        Self {
            character: first.character.into(),
            first_dungeon_entry: first.entry,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FirstAccessResponseDto {
    pub first_access: bool,
}
