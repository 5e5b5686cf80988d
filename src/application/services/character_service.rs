//! Character Service - Races, dungeon listings and character creation
//!
//! A user may own one character per race. The store's unique key decides
//! races between concurrent creations; the loser sees `RaceAlreadyTaken`.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::application::ports::outbound::{
    CatalogRepositoryPort, CharacterRepositoryPort, RepoError,
};
use crate::application::services::progression_service::ProgressionService;
use crate::domain::entities::{Character, Dungeon, Race, UserProgress};
use crate::domain::errors::EngineError;
use crate::domain::value_objects::{CharacterId, RaceId, UserId};

/// A freshly created first character and the dungeon entry made for it
#[derive(Debug, Clone, Serialize)]
pub struct FirstCharacter {
    pub character: Character,
    /// Entry into the race's lowest-level dungeon, if the race has one
    pub entry: Option<UserProgress>,
}

#[async_trait]
pub trait CharacterService: Send + Sync {
    async fn list_races(&self) -> Result<Vec<Race>, EngineError>;

    /// Dungeons of a race ordered by minimum level
    async fn list_dungeons_for_race(&self, race_id: RaceId) -> Result<Vec<Dungeon>, EngineError>;

    async fn get_character(&self, id: CharacterId) -> Result<Character, EngineError>;

    async fn list_characters(&self, user_id: UserId) -> Result<Vec<Character>, EngineError>;

    async fn create_character(
        &self,
        user_id: UserId,
        race_id: RaceId,
    ) -> Result<Character, EngineError>;

    /// Create a character and enter the first dungeon of its race
    async fn create_first_character(
        &self,
        user_id: UserId,
        race_id: RaceId,
    ) -> Result<FirstCharacter, EngineError>;

    /// True while the user owns no character yet
    async fn is_first_access(&self, user_id: UserId) -> Result<bool, EngineError>;
}

#[derive(Clone)]
pub struct CharacterServiceImpl {
    characters: Arc<dyn CharacterRepositoryPort>,
    catalog: Arc<dyn CatalogRepositoryPort>,
    progression: Arc<dyn ProgressionService>,
}

impl CharacterServiceImpl {
    pub fn new(
        characters: Arc<dyn CharacterRepositoryPort>,
        catalog: Arc<dyn CatalogRepositoryPort>,
        progression: Arc<dyn ProgressionService>,
    ) -> Self {
        Self {
            characters,
            catalog,
            progression,
        }
    }
}

#[async_trait]
impl CharacterService for CharacterServiceImpl {
    #[instrument(skip(self))]
    async fn list_races(&self) -> Result<Vec<Race>, EngineError> {
        Ok(self.catalog.list_races().await?)
    }

    #[instrument(skip(self))]
    async fn list_dungeons_for_race(&self, race_id: RaceId) -> Result<Vec<Dungeon>, EngineError> {
        Ok(self.catalog.list_dungeons_by_race(race_id).await?)
    }

    #[instrument(skip(self))]
    async fn get_character(&self, id: CharacterId) -> Result<Character, EngineError> {
        self.characters
            .get(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Character", id))
    }

    #[instrument(skip(self))]
    async fn list_characters(&self, user_id: UserId) -> Result<Vec<Character>, EngineError> {
        Ok(self.characters.list_by_user(user_id).await?)
    }

    #[instrument(skip(self))]
    async fn create_character(
        &self,
        user_id: UserId,
        race_id: RaceId,
    ) -> Result<Character, EngineError> {
        let races = self.catalog.list_races().await?;
        if !races.iter().any(|r| r.id == race_id) {
            return Err(EngineError::not_found("Race", race_id));
        }

        let character = Character::new(user_id, race_id);
        match self.characters.create(&character).await {
            Ok(()) => {}
            Err(RepoError::Conflict(reason)) => {
                debug!(user_id = %user_id, race_id = %race_id, reason = %reason, "Race already taken");
                return Err(EngineError::RaceAlreadyTaken { user_id, race_id });
            }
            Err(other) => return Err(other.into()),
        }

        info!(user_id = %user_id, race_id = %race_id, character_id = %character.id, "Created character");
        Ok(character)
    }

    #[instrument(skip(self))]
    async fn create_first_character(
        &self,
        user_id: UserId,
        race_id: RaceId,
    ) -> Result<FirstCharacter, EngineError> {
        let character = self.create_character(user_id, race_id).await?;

        let first_dungeon = self
            .list_dungeons_for_race(race_id)
            .await?
            .into_iter()
            .next();
        let entry = match first_dungeon {
            Some(dungeon) => Some(
                self.progression
                    .ensure_dungeon_entry(user_id, dungeon.id)
                    .await?,
            ),
            None => {
                debug!(race_id = %race_id, "Race has no dungeons to enter");
                None
            }
        };

        Ok(FirstCharacter { character, entry })
    }

    #[instrument(skip(self))]
    async fn is_first_access(&self, user_id: UserId) -> Result<bool, EngineError> {
        Ok(self.characters.list_by_user(user_id).await?.is_empty())
    }
}
