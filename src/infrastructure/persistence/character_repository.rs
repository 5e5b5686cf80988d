//! Character repository implementation for SQLite

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::rows::{get, map_db_error, parse_id, to_u32};
use crate::application::ports::outbound::{CharacterRepositoryPort, RepoError};
use crate::domain::entities::Character;
use crate::domain::value_objects::{CharacterId, RaceId, UserId};

const COLUMNS: &str = "id, user_id, race_id, level, created_at";

/// Repository for Character operations
#[derive(Clone)]
pub struct SqliteCharacterRepository {
    pool: SqlitePool,
}

impl SqliteCharacterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn character_from_row(row: &SqliteRow) -> Result<Character, RepoError> {
    let race_id: i64 = get(row, "race_id")?;
    let level: i64 = get(row, "level")?;
    Ok(Character {
        id: parse_id(row, "id")?,
        user_id: parse_id(row, "user_id")?,
        race_id: RaceId::new(to_u32(race_id, "race_id")?),
        level: to_u32(level, "level")?,
        created_at: get(row, "created_at")?,
    })
}

#[async_trait]
impl CharacterRepositoryPort for SqliteCharacterRepository {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM characters WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("get_character"))?;
        row.as_ref().map(character_from_row).transpose()
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Character>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM characters WHERE user_id = ? ORDER BY created_at, race_id"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("list_characters"))?;
        rows.iter().map(character_from_row).collect()
    }

    async fn create(&self, character: &Character) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO characters (id, user_id, race_id, level, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(character.id.to_string())
        .bind(character.user_id.to_string())
        .bind(i64::from(character.race_id.value()))
        .bind(i64::from(character.level))
        .bind(character.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error("create_character"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::testing::seeded;

    #[tokio::test]
    async fn test_create_and_read_back() {
        let (repo, _) = seeded().await;
        let characters = repo.characters();
        let character = Character::new(UserId::new(), RaceId::new(2)).with_level(3);
        characters.create(&character).await.unwrap();

        let stored = characters.get(character.id).await.unwrap().unwrap();
        assert_eq!(stored.id, character.id);
        assert_eq!(stored.race_id, RaceId::new(2));
        assert_eq!(stored.level, 3);

        let listed = characters.list_by_user(character.user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_second_character_of_same_race_conflicts() {
        let (repo, _) = seeded().await;
        let characters = repo.characters();
        let user_id = UserId::new();

        characters
            .create(&Character::new(user_id, RaceId::new(1)))
            .await
            .unwrap();
        let err = characters
            .create(&Character::new(user_id, RaceId::new(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));

        characters
            .create(&Character::new(user_id, RaceId::new(2)))
            .await
            .unwrap();
        assert_eq!(characters.list_by_user(user_id).await.unwrap().len(), 2);
    }
}
