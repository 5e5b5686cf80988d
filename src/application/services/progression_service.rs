//! Progression Service - Topic status, dungeon entry and star bookkeeping
//!
//! Statuses are never stored. Every read re-derives them from the persisted
//! completion records, so a caller can ask as often as it likes.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::application::ports::outbound::{CatalogRepositoryPort, ProgressRepositoryPort};
use crate::domain::entities::{Stars, Topic, TopicStatus, TopicWithStatus, UserProgress};
use crate::domain::errors::EngineError;
use crate::domain::services::derive_topic_statuses;
use crate::domain::value_objects::{DungeonId, TopicId, UserId};

#[async_trait]
pub trait ProgressionService: Send + Sync {
    /// Topics of a dungeon in position order, each with its derived status
    async fn dungeon_topics(
        &self,
        dungeon_id: DungeonId,
        user_id: UserId,
    ) -> Result<Vec<TopicWithStatus>, EngineError>;

    /// Status of a single topic within its dungeon
    async fn topic_status(&self, topic: &Topic, user_id: UserId)
        -> Result<TopicStatus, EngineError>;

    /// Idempotently create the (user, dungeon) progress record
    async fn ensure_dungeon_entry(
        &self,
        user_id: UserId,
        dungeon_id: DungeonId,
    ) -> Result<UserProgress, EngineError>;

    /// Persist a won topic and return the stars it earned
    async fn record_completion(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        error_count: u32,
    ) -> Result<Stars, EngineError>;

    async fn total_stars(&self, user_id: UserId) -> Result<u32, EngineError>;

    async fn dungeon_stars(&self, user_id: UserId, dungeon_id: DungeonId)
        -> Result<u32, EngineError>;
}

#[derive(Clone)]
pub struct ProgressionServiceImpl {
    progress: Arc<dyn ProgressRepositoryPort>,
    catalog: Arc<dyn CatalogRepositoryPort>,
}

impl ProgressionServiceImpl {
    pub fn new(
        progress: Arc<dyn ProgressRepositoryPort>,
        catalog: Arc<dyn CatalogRepositoryPort>,
    ) -> Self {
        Self { progress, catalog }
    }
}

#[async_trait]
impl ProgressionService for ProgressionServiceImpl {
    #[instrument(skip(self))]
    async fn dungeon_topics(
        &self,
        dungeon_id: DungeonId,
        user_id: UserId,
    ) -> Result<Vec<TopicWithStatus>, EngineError> {
        let topics = self.catalog.list_topics(dungeon_id).await?;
        if topics.is_empty() {
            debug!(dungeon_id = %dungeon_id, "Dungeon has no topics");
            return Ok(Vec::new());
        }

        let topic_ids: Vec<TopicId> = topics.iter().map(|t| t.id).collect();
        let progress = self.progress.list_topic_progress(user_id, &topic_ids).await?;

        Ok(derive_topic_statuses(&topics, &progress))
    }

    #[instrument(skip(self, topic), fields(topic_id = %topic.id))]
    async fn topic_status(
        &self,
        topic: &Topic,
        user_id: UserId,
    ) -> Result<TopicStatus, EngineError> {
        self.dungeon_topics(topic.dungeon_id, user_id)
            .await?
            .into_iter()
            .find(|t| t.topic.id == topic.id)
            .map(|t| t.status)
            .ok_or_else(|| EngineError::not_found("Topic", topic.id))
    }

    #[instrument(skip(self))]
    async fn ensure_dungeon_entry(
        &self,
        user_id: UserId,
        dungeon_id: DungeonId,
    ) -> Result<UserProgress, EngineError> {
        if self.catalog.get_dungeon(dungeon_id).await?.is_none() {
            return Err(EngineError::not_found("Dungeon", dungeon_id));
        }

        let entry = self
            .progress
            .get_or_create_user_progress(user_id, dungeon_id)
            .await?;
        debug!(user_id = %user_id, dungeon_id = %dungeon_id, progress_id = %entry.id, "Dungeon entry ensured");
        Ok(entry)
    }

    #[instrument(skip(self))]
    async fn record_completion(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        error_count: u32,
    ) -> Result<Stars, EngineError> {
        let stars = Stars::from_error_count(error_count);
        let record = self
            .progress
            .upsert_topic_completion(user_id, topic_id, stars)
            .await?;

        info!(
            user_id = %user_id,
            topic_id = %topic_id,
            error_count,
            stars = record.earned_stars(),
            "Recorded topic completion"
        );
        Ok(stars)
    }

    #[instrument(skip(self))]
    async fn total_stars(&self, user_id: UserId) -> Result<u32, EngineError> {
        let records = self.progress.list_all_topic_progress(user_id).await?;
        Ok(records.iter().map(|p| p.earned_stars()).sum())
    }

    #[instrument(skip(self))]
    async fn dungeon_stars(
        &self,
        user_id: UserId,
        dungeon_id: DungeonId,
    ) -> Result<u32, EngineError> {
        let topics = self.catalog.list_topics(dungeon_id).await?;
        if topics.is_empty() {
            return Ok(0);
        }
        let topic_ids: Vec<TopicId> = topics.iter().map(|t| t.id).collect();
        let records = self.progress.list_topic_progress(user_id, &topic_ids).await?;
        Ok(records.iter().map(|p| p.earned_stars()).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::{
        MockCatalogRepositoryPort, MockProgressRepositoryPort,
    };
    use crate::domain::entities::{Dungeon, Enemy, TopicProgress};
    use crate::domain::value_objects::RaceId;
    use mockall::predicate::*;

    fn enemy() -> Enemy {
        Enemy {
            name: "Slime".to_string(),
            image: None,
            question_count: 3,
        }
    }

    fn dungeon_with_topics(count: u32) -> (DungeonId, Vec<Topic>) {
        let dungeon_id = DungeonId::new();
        let topics = (1..=count)
            .map(|position| Topic::new(dungeon_id, format!("Topic {position}"), position, enemy()))
            .collect();
        (dungeon_id, topics)
    }

    #[tokio::test]
    async fn test_dungeon_topics_marks_first_open_topic_active() {
        let user_id = UserId::new();
        let (dungeon_id, topics) = dungeon_with_topics(3);
        let first = topics[0].id;

        let mut catalog = MockCatalogRepositoryPort::new();
        catalog
            .expect_list_topics()
            .with(eq(dungeon_id))
            .returning(move |_| Ok(topics.clone()));
        let mut progress = MockProgressRepositoryPort::new();
        progress
            .expect_list_topic_progress()
            .returning(move |user, _| Ok(vec![TopicProgress::completed(user, first, Stars::Three)]));

        let derived = ProgressionServiceImpl::new(Arc::new(progress), Arc::new(catalog))
            .dungeon_topics(dungeon_id, user_id)
            .await
            .unwrap();

        let statuses: Vec<TopicStatus> = derived.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![TopicStatus::Completed, TopicStatus::Active, TopicStatus::Locked]
        );
    }

    #[tokio::test]
    async fn test_empty_dungeon_skips_progress_lookup() {
        let mut catalog = MockCatalogRepositoryPort::new();
        catalog.expect_list_topics().returning(|_| Ok(vec![]));
        let mut progress = MockProgressRepositoryPort::new();
        progress.expect_list_topic_progress().never();

        let derived = ProgressionServiceImpl::new(Arc::new(progress), Arc::new(catalog))
            .dungeon_topics(DungeonId::new(), UserId::new())
            .await
            .unwrap();

        assert!(derived.is_empty());
    }

    #[tokio::test]
    async fn test_record_completion_star_formula() {
        let user_id = UserId::new();
        let topic_id = TopicId::new();

        let mut progress = MockProgressRepositoryPort::new();
        progress
            .expect_upsert_topic_completion()
            .times(3)
            .returning(|user, topic, stars| Ok(TopicProgress::completed(user, topic, stars)));
        let service =
            ProgressionServiceImpl::new(Arc::new(progress), Arc::new(MockCatalogRepositoryPort::new()));

        assert_eq!(service.record_completion(user_id, topic_id, 0).await.unwrap(), Stars::Three);
        assert_eq!(service.record_completion(user_id, topic_id, 1).await.unwrap(), Stars::Two);
        assert_eq!(service.record_completion(user_id, topic_id, 5).await.unwrap(), Stars::One);
    }

    #[tokio::test]
    async fn test_ensure_dungeon_entry_requires_known_dungeon() {
        let mut catalog = MockCatalogRepositoryPort::new();
        catalog.expect_get_dungeon().returning(|_| Ok(None));
        let mut progress = MockProgressRepositoryPort::new();
        progress.expect_get_or_create_user_progress().never();

        let err = ProgressionServiceImpl::new(Arc::new(progress), Arc::new(catalog))
            .ensure_dungeon_entry(UserId::new(), DungeonId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::NotFound { entity: "Dungeon", .. }));
    }

    #[tokio::test]
    async fn test_ensure_dungeon_entry_returns_store_record() {
        let user_id = UserId::new();
        let dungeon = Dungeon::new(RaceId::new(1), "Caverns", 1);
        let dungeon_id = dungeon.id;
        let existing = UserProgress::new(user_id, dungeon_id);
        let expected = existing.clone();

        let mut catalog = MockCatalogRepositoryPort::new();
        catalog
            .expect_get_dungeon()
            .returning(move |_| Ok(Some(dungeon.clone())));
        let mut progress = MockProgressRepositoryPort::new();
        progress
            .expect_get_or_create_user_progress()
            .with(eq(user_id), eq(dungeon_id))
            .times(2)
            .returning(move |_, _| Ok(existing.clone()));

        let service = ProgressionServiceImpl::new(Arc::new(progress), Arc::new(catalog));
        let first = service.ensure_dungeon_entry(user_id, dungeon_id).await.unwrap();
        let second = service.ensure_dungeon_entry(user_id, dungeon_id).await.unwrap();

        assert_eq!(first, expected);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_total_stars_ignores_uncompleted_records() {
        let user_id = UserId::new();
        let mut unfinished = TopicProgress::completed(user_id, TopicId::new(), Stars::Three);
        unfinished.completed = false;
        let records = vec![
            TopicProgress::completed(user_id, TopicId::new(), Stars::Two),
            TopicProgress::completed(user_id, TopicId::new(), Stars::Three),
            unfinished,
        ];

        let mut progress = MockProgressRepositoryPort::new();
        progress
            .expect_list_all_topic_progress()
            .returning(move |_| Ok(records.clone()));

        let total = ProgressionServiceImpl::new(
            Arc::new(progress),
            Arc::new(MockCatalogRepositoryPort::new()),
        )
        .total_stars(user_id)
        .await
        .unwrap();

        assert_eq!(total, 5);
    }
}
