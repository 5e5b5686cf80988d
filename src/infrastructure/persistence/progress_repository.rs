//! Dungeon entry and topic completion records for SQLite
//!
//! Both tables carry a unique (user, target) key and are written with
//! `ON CONFLICT` upserts, so concurrent writers converge on one row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Sqlite};

use super::rows::{get, map_db_error, parse_id, parse_stars};
use crate::application::ports::outbound::{ProgressRepositoryPort, RepoError};
use crate::domain::entities::{Stars, TopicProgress, UserProgress};
use crate::domain::value_objects::{
    DungeonId, TopicId, TopicProgressId, UserId, UserProgressId,
};

const TOPIC_COLUMNS: &str = "id, user_id, topic_id, completed, stars, updated_at";

#[derive(Clone)]
pub struct SqliteProgressRepository {
    pool: SqlitePool,
}

impl SqliteProgressRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn topic_progress_from_row(row: &SqliteRow) -> Result<TopicProgress, RepoError> {
    let stars: i64 = get(row, "stars")?;
    Ok(TopicProgress {
        id: parse_id(row, "id")?,
        user_id: parse_id(row, "user_id")?,
        topic_id: parse_id(row, "topic_id")?,
        completed: get(row, "completed")?,
        stars: parse_stars(stars)?,
        updated_at: get(row, "updated_at")?,
    })
}

#[async_trait]
impl ProgressRepositoryPort for SqliteProgressRepository {
    async fn get_or_create_user_progress(
        &self,
        user_id: UserId,
        dungeon_id: DungeonId,
    ) -> Result<UserProgress, RepoError> {
        let map_err = map_db_error("get_or_create_user_progress");

        sqlx::query(
            "INSERT INTO user_progress (id, user_id, dungeon_id, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, dungeon_id) DO NOTHING",
        )
        .bind(UserProgressId::new().to_string())
        .bind(user_id.to_string())
        .bind(dungeon_id.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(&map_err)?;

        let row = sqlx::query(
            "SELECT id, user_id, dungeon_id, created_at FROM user_progress
             WHERE user_id = ? AND dungeon_id = ?",
        )
        .bind(user_id.to_string())
        .bind(dungeon_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(&map_err)?;

        Ok(UserProgress {
            id: parse_id(&row, "id")?,
            user_id: parse_id(&row, "user_id")?,
            dungeon_id: parse_id(&row, "dungeon_id")?,
            created_at: get(&row, "created_at")?,
        })
    }

    async fn list_topic_progress(
        &self,
        user_id: UserId,
        topic_ids: &[TopicId],
    ) -> Result<Vec<TopicProgress>, RepoError> {
        if topic_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {TOPIC_COLUMNS} FROM topic_progress WHERE user_id = "
        ));
        builder.push_bind(user_id.to_string());
        builder.push(" AND topic_id IN (");
        let mut separated = builder.separated(", ");
        for topic_id in topic_ids {
            separated.push_bind(topic_id.to_string());
        }
        separated.push_unseparated(")");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("list_topic_progress"))?;
        rows.iter().map(topic_progress_from_row).collect()
    }

    async fn list_all_topic_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<TopicProgress>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topic_progress WHERE user_id = ? ORDER BY updated_at"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("list_all_topic_progress"))?;
        rows.iter().map(topic_progress_from_row).collect()
    }

    async fn upsert_topic_completion(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        stars: Stars,
    ) -> Result<TopicProgress, RepoError> {
        let row = sqlx::query(&format!(
            "INSERT INTO topic_progress (id, user_id, topic_id, completed, stars, updated_at)
             VALUES (?, ?, ?, 1, ?, ?)
             ON CONFLICT(user_id, topic_id) DO UPDATE SET
                 completed = 1, stars = excluded.stars, updated_at = excluded.updated_at
             RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(TopicProgressId::new().to_string())
        .bind(user_id.to_string())
        .bind(topic_id.to_string())
        .bind(i64::from(stars.value()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("upsert_topic_completion"))?;
        topic_progress_from_row(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::testing::seeded;

    #[tokio::test]
    async fn test_dungeon_entry_is_idempotent() {
        let (repo, seed) = seeded().await;
        let progress = repo.progress();
        let user_id = UserId::new();
        let dungeon_id = seed.dungeons[0].id;

        let first = progress
            .get_or_create_user_progress(user_id, dungeon_id)
            .await
            .unwrap();
        let second = progress
            .get_or_create_user_progress(user_id, dungeon_id)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_concurrent_dungeon_entry_yields_one_record() {
        let (repo, seed) = seeded().await;
        let user_id = UserId::new();
        let dungeon_id = seed.dungeons[0].id;

        let a = repo.progress();
        let b = repo.progress();
        let (first, second) = tokio::join!(
            a.get_or_create_user_progress(user_id, dungeon_id),
            b.get_or_create_user_progress(user_id, dungeon_id),
        );

        assert_eq!(first.unwrap().id, second.unwrap().id);
    }

    #[tokio::test]
    async fn test_completion_upsert_keeps_one_row_last_write_wins() {
        let (repo, seed) = seeded().await;
        let progress = repo.progress();
        let user_id = UserId::new();
        let topic_id = seed.dungeons[0].topics[0].id;

        let first = progress
            .upsert_topic_completion(user_id, topic_id, Stars::Three)
            .await
            .unwrap();
        let second = progress
            .upsert_topic_completion(user_id, topic_id, Stars::One)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.completed);
        assert_eq!(second.stars, Stars::One);

        let all = progress.list_all_topic_progress(user_id).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_list_topic_progress_filters_by_topic() {
        let (repo, seed) = seeded().await;
        let progress = repo.progress();
        let user_id = UserId::new();
        let topics: Vec<TopicId> = seed.dungeons[0].topics.iter().map(|t| t.id).collect();

        progress
            .upsert_topic_completion(user_id, topics[0], Stars::Two)
            .await
            .unwrap();
        progress
            .upsert_topic_completion(UserId::new(), topics[1], Stars::Three)
            .await
            .unwrap();

        let listed = progress.list_topic_progress(user_id, &topics).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].topic_id, topics[0]);

        assert!(progress.list_topic_progress(user_id, &[]).await.unwrap().is_empty());
    }
}
