//! Battle Service - Runs battle sessions against the catalog and record store
//!
//! Sessions live in an in-process registry keyed by character. The session
//! itself decides wins and losses; this service gates who may start one,
//! seeds it, and writes a win back exactly once (stars, then reward).

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::{
    CatalogRepositoryPort, CharacterRepositoryPort, EquipmentRepositoryPort, QuestionSupplyPort,
    RewardIssuerPort,
};
use crate::application::services::battle_registry::{ActiveBattle, BattleRegistry, Settlement};
use crate::application::services::progression_service::ProgressionService;
use crate::domain::aggregates::{AnswerResolution, BattleSession, BattleSnapshot, BattleState};
use crate::domain::errors::EngineError;
use crate::domain::services::aggregate;
use crate::domain::value_objects::{AnswerId, BattleId, BattleSettings, CharacterId, TopicId};

/// A player's answer, either already graded by the host or as a chosen option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Graded(bool),
    Choice(AnswerId),
}

/// Outcome of one submitted answer
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReport {
    pub resolution: AnswerResolution,
    pub battle: BattleSnapshot,
    /// How long the host should show the answered question before the next one
    pub reveal_delay_ms: u64,
    /// Present once a won battle has been written back
    pub settlement: Option<Settlement>,
}

#[async_trait]
pub trait BattleService: Send + Sync {
    /// Start a battle on a topic, replacing any battle the character had open
    async fn start_battle(
        &self,
        character_id: CharacterId,
        topic_id: TopicId,
    ) -> Result<BattleSnapshot, EngineError>;

    async fn current_battle(&self, character_id: CharacterId)
        -> Result<BattleSnapshot, EngineError>;

    async fn submit_answer(
        &self,
        character_id: CharacterId,
        answer: Answer,
    ) -> Result<AnswerReport, EngineError>;

    /// Write back a won battle whose settlement failed earlier. Returns the
    /// existing settlement if it already succeeded, `None` if the battle was
    /// not won.
    async fn settle_battle(&self, character_id: CharacterId)
        -> Result<Option<Settlement>, EngineError>;

    /// Discard the character's battle without persisting anything
    async fn close_battle(&self, character_id: CharacterId) -> Result<(), EngineError>;
}

pub struct BattleServiceImpl {
    catalog: Arc<dyn CatalogRepositoryPort>,
    questions: Arc<dyn QuestionSupplyPort>,
    characters: Arc<dyn CharacterRepositoryPort>,
    equipment: Arc<dyn EquipmentRepositoryPort>,
    progression: Arc<dyn ProgressionService>,
    rewards: Arc<dyn RewardIssuerPort>,
    settings: BattleSettings,
    registry: RwLock<BattleRegistry>,
}

impl BattleServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn CatalogRepositoryPort>,
        questions: Arc<dyn QuestionSupplyPort>,
        characters: Arc<dyn CharacterRepositoryPort>,
        equipment: Arc<dyn EquipmentRepositoryPort>,
        progression: Arc<dyn ProgressionService>,
        rewards: Arc<dyn RewardIssuerPort>,
        settings: BattleSettings,
    ) -> Self {
        Self {
            catalog,
            questions,
            characters,
            equipment,
            progression,
            rewards,
            settings,
            registry: RwLock::new(BattleRegistry::new()),
        }
    }

    /// Apply `f` to the registry entry if it still holds `battle_id`
    async fn update_entry(
        &self,
        character_id: CharacterId,
        battle_id: BattleId,
        f: impl FnOnce(&mut ActiveBattle) + Send,
    ) {
        let mut registry = self.registry.write().await;
        match registry.get_battle_mut(character_id, battle_id) {
            Some(entry) => f(entry),
            None => debug!(
                character_id = %character_id,
                battle_id = %battle_id,
                "Battle replaced or closed during settlement"
            ),
        }
    }

    async fn settle(&self, character_id: CharacterId) -> Result<Option<Settlement>, EngineError> {
        let (battle_id, user_id, topic_id, error_count, recorded_stars) = {
            let mut registry = self.registry.write().await;
            let entry = registry
                .get_mut(character_id)
                .ok_or(EngineError::NoActiveBattle(character_id))?;

            if entry.session.state() != BattleState::Won {
                return Ok(None);
            }
            if let Some(settlement) = &entry.settlement {
                return Ok(Some(settlement.clone()));
            }
            if entry.settling {
                return Err(EngineError::StoreConflict(
                    "battle settlement already in progress".to_string(),
                ));
            }
            entry.settling = true;

            let session = &entry.session;
            (
                session.id(),
                session.user_id(),
                session.topic_id(),
                session.error_count(),
                entry.recorded_stars,
            )
        };

        let stars = match recorded_stars {
            Some(stars) => stars,
            None => match self
                .progression
                .record_completion(user_id, topic_id, error_count)
                .await
            {
                Ok(stars) => {
                    self.update_entry(character_id, battle_id, |entry| {
                        entry.recorded_stars = Some(stars)
                    })
                    .await;
                    stars
                }
                Err(err) => {
                    self.update_entry(character_id, battle_id, |entry| entry.settling = false)
                        .await;
                    return Err(err);
                }
            },
        };

        let reward = match self.rewards.issue_reward(character_id).await {
            Ok(reward) => reward,
            Err(err) => {
                warn!(character_id = %character_id, error = %err, "Reward issuance failed");
                self.update_entry(character_id, battle_id, |entry| entry.settling = false)
                    .await;
                return Err(err.into());
            }
        };

        let settlement = Settlement { stars, reward };
        let stored = settlement.clone();
        self.update_entry(character_id, battle_id, move |entry| {
            entry.settlement = Some(stored);
            entry.settling = false;
        })
        .await;

        info!(
            character_id = %character_id,
            topic_id = %topic_id,
            stars = settlement.stars.value(),
            rewarded = settlement.reward.is_some(),
            "Battle settled"
        );
        Ok(Some(settlement))
    }
}

#[async_trait]
impl BattleService for BattleServiceImpl {
    #[instrument(skip(self))]
    async fn start_battle(
        &self,
        character_id: CharacterId,
        topic_id: TopicId,
    ) -> Result<BattleSnapshot, EngineError> {
        let character = self
            .characters
            .get(character_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Character", character_id))?;
        let topic = self
            .catalog
            .get_topic(topic_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Topic", topic_id))?;
        let dungeon = self
            .catalog
            .get_dungeon(topic.dungeon_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Dungeon", topic.dungeon_id))?;

        if dungeon.race_id != character.race_id {
            return Err(EngineError::RaceMismatch {
                dungeon_id: dungeon.id,
                required: dungeon.race_id,
                actual: character.race_id,
            });
        }
        if !dungeon.admits_level(character.level) {
            return Err(EngineError::LevelTooLow {
                level: character.level,
                required: dungeon.min_level,
            });
        }

        let status = self
            .progression
            .topic_status(&topic, character.user_id)
            .await?;
        if !status.is_playable() {
            return Err(EngineError::TopicLocked { topic_id });
        }

        self.progression
            .ensure_dungeon_entry(character.user_id, dungeon.id)
            .await?;

        let questions = self.questions.questions_for_topic(topic_id).await?;
        let loadout = self.equipment.load(character_id).await?;
        let total_life = self.settings.starting_life(&aggregate(&loadout.equipped));

        let session = BattleSession::new(
            character.user_id,
            character_id,
            topic_id,
            questions,
            total_life,
        )?;
        let snapshot = session.snapshot();

        let replaced = self.registry.write().await.insert(session);
        if let Some(previous) = replaced {
            if previous.session.state() == BattleState::Won && previous.settlement.is_none() {
                warn!(
                    character_id = %character_id,
                    battle_id = %previous.battle_id(),
                    "Discarding won battle that was never settled"
                );
            } else {
                debug!(
                    character_id = %character_id,
                    battle_id = %previous.battle_id(),
                    "Discarded previous battle"
                );
            }
        }

        info!(
            character_id = %character_id,
            topic_id = %topic_id,
            battle_id = %snapshot.battle_id,
            questions = snapshot.question_count,
            total_life,
            "Battle started"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn current_battle(
        &self,
        character_id: CharacterId,
    ) -> Result<BattleSnapshot, EngineError> {
        let registry = self.registry.read().await;
        registry
            .get(character_id)
            .map(|entry| entry.session.snapshot())
            .ok_or(EngineError::NoActiveBattle(character_id))
    }

    #[instrument(skip(self))]
    async fn submit_answer(
        &self,
        character_id: CharacterId,
        answer: Answer,
    ) -> Result<AnswerReport, EngineError> {
        let (resolution, battle) = {
            let mut registry = self.registry.write().await;
            let entry = registry
                .get_mut(character_id)
                .ok_or(EngineError::NoActiveBattle(character_id))?;

            let resolution = match answer {
                Answer::Graded(is_correct) => entry.session.submit_answer(is_correct)?,
                Answer::Choice(answer_id) => entry.session.submit_choice(answer_id)?,
            };
            (resolution, entry.session.snapshot())
        };

        let settlement = match resolution.state {
            BattleState::InProgress => {
                debug!(
                    character_id = %character_id,
                    correct = resolution.correct,
                    enemy_life = battle.enemy_life,
                    player_life = battle.player_life,
                    "Answer resolved"
                );
                None
            }
            BattleState::Lost => {
                info!(
                    character_id = %character_id,
                    topic_id = %battle.topic_id,
                    "Battle lost"
                );
                None
            }
            BattleState::Won => {
                info!(
                    character_id = %character_id,
                    topic_id = %battle.topic_id,
                    error_count = battle.error_count,
                    "Battle won"
                );
                self.settle(character_id).await?
            }
        };

        Ok(AnswerReport {
            resolution,
            battle,
            reveal_delay_ms: self.settings.answer_reveal_delay_ms,
            settlement,
        })
    }

    #[instrument(skip(self))]
    async fn settle_battle(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<Settlement>, EngineError> {
        self.settle(character_id).await
    }

    #[instrument(skip(self))]
    async fn close_battle(&self, character_id: CharacterId) -> Result<(), EngineError> {
        let removed = self
            .registry
            .write()
            .await
            .remove(character_id)
            .ok_or(EngineError::NoActiveBattle(character_id))?;

        if removed.session.state() == BattleState::Won && removed.settlement.is_none() {
            warn!(
                character_id = %character_id,
                battle_id = %removed.battle_id(),
                "Closed won battle that was never settled"
            );
        } else {
            debug!(
                character_id = %character_id,
                battle_id = %removed.battle_id(),
                state = ?removed.session.state(),
                "Battle closed"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::{
        MockCatalogRepositoryPort, MockCharacterRepositoryPort, MockEquipmentRepositoryPort,
        MockProgressRepositoryPort, MockQuestionSupplyPort, MockRewardIssuerPort, RepoError,
    };
    use crate::application::services::progression_service::ProgressionServiceImpl;
    use crate::domain::entities::{
        AnswerOption, Character, Dungeon, Enemy, InventoryItem, Item, ItemSlot, Loadout, Question,
        Stars, Topic, TopicProgress, UserProgress,
    };
    use crate::domain::errors::ErrorKind;
    use crate::domain::value_objects::{RaceId, UserId};
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A character, a dungeon with `topic_count` topics and mocks answering
    /// every read the battle flow makes. Tests add write expectations.
    struct Fixture {
        character: Character,
        topics: Vec<Topic>,
        questions: Vec<Question>,
        catalog: MockCatalogRepositoryPort,
        characters: MockCharacterRepositoryPort,
        question_supply: MockQuestionSupplyPort,
        equipment: MockEquipmentRepositoryPort,
        progress: MockProgressRepositoryPort,
        rewards: MockRewardIssuerPort,
    }

    impl Fixture {
        fn new(level: u32, min_level: u32, topic_count: u32, question_count: usize) -> Self {
            let character = Character::new(UserId::new(), RaceId::new(1)).with_level(level);
            let dungeon = Dungeon::new(RaceId::new(1), "Caverns", min_level);
            let topics: Vec<Topic> = (1..=topic_count)
                .map(|position| {
                    Topic::new(
                        dungeon.id,
                        format!("Topic {position}"),
                        position,
                        Enemy {
                            name: "Slime".to_string(),
                            image: None,
                            question_count: question_count as u32,
                        },
                    )
                })
                .collect();
            let questions: Vec<Question> = (0..question_count)
                .map(|i| {
                    Question::new(topics[0].id, format!("Question {i}"))
                        .with_answer(AnswerOption::new("right", true))
                        .with_answer(AnswerOption::new("wrong", false))
                })
                .collect();

            let mut catalog = MockCatalogRepositoryPort::new();
            let by_id = topics.clone();
            catalog
                .expect_get_topic()
                .returning(move |id| Ok(by_id.iter().find(|t| t.id == id).cloned()));
            let listed = topics.clone();
            catalog
                .expect_list_topics()
                .returning(move |_| Ok(listed.clone()));
            catalog
                .expect_get_dungeon()
                .returning(move |_| Ok(Some(dungeon.clone())));

            let mut characters = MockCharacterRepositoryPort::new();
            let stored = character.clone();
            characters
                .expect_get()
                .returning(move |_| Ok(Some(stored.clone())));

            let mut question_supply = MockQuestionSupplyPort::new();
            let supplied = questions.clone();
            question_supply
                .expect_questions_for_topic()
                .returning(move |_| Ok(supplied.clone()));

            let mut equipment = MockEquipmentRepositoryPort::new();
            equipment
                .expect_load()
                .returning(|_| Ok(Loadout::default()));

            let mut progress = MockProgressRepositoryPort::new();
            progress
                .expect_list_topic_progress()
                .returning(|_, _| Ok(vec![]));
            progress
                .expect_get_or_create_user_progress()
                .returning(|user, dungeon| Ok(UserProgress::new(user, dungeon)));

            Self {
                character,
                topics,
                questions,
                catalog,
                characters,
                question_supply,
                equipment,
                progress,
                rewards: MockRewardIssuerPort::new(),
            }
        }

        fn build(self, settings: BattleSettings) -> BattleServiceImpl {
            let catalog: Arc<dyn CatalogRepositoryPort> = Arc::new(self.catalog);
            let progression = Arc::new(ProgressionServiceImpl::new(
                Arc::new(self.progress),
                catalog.clone(),
            ));
            BattleServiceImpl::new(
                catalog,
                Arc::new(self.question_supply),
                Arc::new(self.characters),
                Arc::new(self.equipment),
                progression,
                Arc::new(self.rewards),
                settings,
            )
        }
    }

    fn amulet(character_id: CharacterId) -> InventoryItem {
        InventoryItem::new(character_id, Item::new("Amulet", ItemSlot::Necklace))
    }

    #[tokio::test]
    async fn test_three_correct_answers_win_with_three_stars() {
        let mut fixture = Fixture::new(1, 1, 1, 3);
        let character_id = fixture.character.id;
        let topic_id = fixture.topics[0].id;

        fixture
            .progress
            .expect_upsert_topic_completion()
            .withf(|_, _, stars| *stars == Stars::Three)
            .times(1)
            .returning(|user, topic, stars| Ok(TopicProgress::completed(user, topic, stars)));
        let reward = amulet(character_id);
        fixture
            .rewards
            .expect_issue_reward()
            .times(1)
            .returning(move |_| Ok(Some(reward.clone())));

        let service = fixture.build(BattleSettings::default());
        let started = service.start_battle(character_id, topic_id).await.unwrap();
        assert_eq!(started.enemy_life, 3);
        assert_eq!(started.player_life, 5);

        let mut last = None;
        for _ in 0..3 {
            last = Some(
                service
                    .submit_answer(character_id, Answer::Graded(true))
                    .await
                    .unwrap(),
            );
        }
        let report = last.unwrap();

        assert_eq!(report.battle.state, BattleState::Won);
        assert_eq!(report.battle.error_count, 0);
        assert_eq!(report.reveal_delay_ms, 1000);
        let settlement = report.settlement.unwrap();
        assert_eq!(settlement.stars, Stars::Three);
        assert!(settlement.reward.is_some());

        // Settling again returns the stored result without touching the store
        let again = service.settle_battle(character_id).await.unwrap().unwrap();
        assert_eq!(again.stars, Stars::Three);
    }

    #[tokio::test]
    async fn test_loss_records_nothing_and_session_is_terminal() {
        let mut fixture = Fixture::new(1, 1, 1, 3);
        let character_id = fixture.character.id;
        let topic_id = fixture.topics[0].id;
        fixture.progress.expect_upsert_topic_completion().never();
        fixture.rewards.expect_issue_reward().never();

        let service = fixture.build(BattleSettings {
            total_life: 2,
            ..BattleSettings::default()
        });
        service.start_battle(character_id, topic_id).await.unwrap();

        service
            .submit_answer(character_id, Answer::Graded(false))
            .await
            .unwrap();
        let report = service
            .submit_answer(character_id, Answer::Graded(false))
            .await
            .unwrap();
        assert_eq!(report.battle.state, BattleState::Lost);
        assert!(report.settlement.is_none());

        let err = service
            .submit_answer(character_id, Answer::Graded(true))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::SessionTerminal);

        let after = service.current_battle(character_id).await.unwrap();
        assert_eq!(after.enemy_life, 3);
        assert_eq!(after.player_life, 0);
        assert_eq!(service.settle_battle(character_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_choice_answers_are_graded_against_current_question() {
        let mut fixture = Fixture::new(1, 1, 1, 2);
        let character_id = fixture.character.id;
        let topic_id = fixture.topics[0].id;
        let wrong = fixture.questions[0].answers[1].id;
        fixture.progress.expect_upsert_topic_completion().never();

        let service = fixture.build(BattleSettings::default());
        service.start_battle(character_id, topic_id).await.unwrap();

        let report = service
            .submit_answer(character_id, Answer::Choice(wrong))
            .await
            .unwrap();
        assert!(!report.resolution.correct);
        assert_eq!(report.resolution.advanced_to, Some(1));

        let err = service
            .submit_answer(character_id, Answer::Choice(AnswerId::new()))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownAnswer);
    }

    #[tokio::test]
    async fn test_locked_topic_cannot_be_started() {
        let fixture = Fixture::new(1, 1, 2, 3);
        let character_id = fixture.character.id;
        let second = fixture.topics[1].id;

        let service = fixture.build(BattleSettings::default());
        let err = service.start_battle(character_id, second).await.unwrap_err();

        assert_eq!(err, EngineError::TopicLocked { topic_id: second });
        assert!(service.current_battle(character_id).await.is_err());
    }

    #[tokio::test]
    async fn test_level_gate() {
        let fixture = Fixture::new(2, 5, 1, 3);
        let character_id = fixture.character.id;
        let topic_id = fixture.topics[0].id;

        let err = fixture
            .build(BattleSettings::default())
            .start_battle(character_id, topic_id)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            EngineError::LevelTooLow {
                level: 2,
                required: 5
            }
        );
    }

    #[tokio::test]
    async fn test_dungeon_of_another_race_cannot_be_started() {
        let mut fixture = Fixture::new(1, 1, 1, 3);
        let topic_id = fixture.topics[0].id;
        let dwarf = Character::new(fixture.character.user_id, RaceId::new(2));
        let dwarf_id = dwarf.id;

        let mut characters = MockCharacterRepositoryPort::new();
        characters
            .expect_get()
            .with(eq(dwarf_id))
            .returning(move |_| Ok(Some(dwarf.clone())));
        fixture.characters = characters;
        fixture.progress.checkpoint();
        fixture.progress.expect_get_or_create_user_progress().never();

        let service = fixture.build(BattleSettings::default());
        let err = service.start_battle(dwarf_id, topic_id).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RaceMismatch);
        assert!(matches!(
            err,
            EngineError::RaceMismatch { required, actual, .. }
                if required == RaceId::new(1) && actual == RaceId::new(2)
        ));
        assert_eq!(
            service.current_battle(dwarf_id).await.unwrap_err(),
            EngineError::NoActiveBattle(dwarf_id)
        );
    }

    #[tokio::test]
    async fn test_empty_topic_is_rejected() {
        let fixture = Fixture::new(1, 1, 1, 0);
        let character_id = fixture.character.id;
        let topic_id = fixture.topics[0].id;

        let err = fixture
            .build(BattleSettings::default())
            .start_battle(character_id, topic_id)
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::EmptyEncounter { topic_id });
    }

    #[tokio::test]
    async fn test_answer_without_battle() {
        let fixture = Fixture::new(1, 1, 1, 3);
        let character_id = fixture.character.id;

        let err = fixture
            .build(BattleSettings::default())
            .submit_answer(character_id, Answer::Graded(true))
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::NoActiveBattle(character_id));
    }

    #[tokio::test]
    async fn test_failed_reward_is_retried_without_recording_twice() {
        let mut fixture = Fixture::new(1, 1, 1, 1);
        let character_id = fixture.character.id;
        let topic_id = fixture.topics[0].id;

        fixture
            .progress
            .expect_upsert_topic_completion()
            .times(1)
            .returning(|user, topic, stars| Ok(TopicProgress::completed(user, topic, stars)));
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        fixture
            .rewards
            .expect_issue_reward()
            .times(2)
            .returning(move |id| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(RepoError::Conflict("inventory".to_string()))
                } else {
                    Ok(Some(amulet(id)))
                }
            });

        let service = fixture.build(BattleSettings::default());
        service.start_battle(character_id, topic_id).await.unwrap();

        let err = service
            .submit_answer(character_id, Answer::Graded(true))
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let settlement = service.settle_battle(character_id).await.unwrap().unwrap();
        assert_eq!(settlement.stars, Stars::Three);
        assert!(settlement.reward.is_some());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_close_and_restart() {
        let fixture = Fixture::new(1, 1, 1, 3);
        let character_id = fixture.character.id;
        let topic_id = fixture.topics[0].id;

        let service = fixture.build(BattleSettings::default());
        let first = service.start_battle(character_id, topic_id).await.unwrap();
        service
            .submit_answer(character_id, Answer::Graded(false))
            .await
            .unwrap();

        let second = service.start_battle(character_id, topic_id).await.unwrap();
        assert_ne!(first.battle_id, second.battle_id);
        assert_eq!(second.error_count, 0);

        service.close_battle(character_id).await.unwrap();
        assert_eq!(
            service.current_battle(character_id).await.unwrap_err(),
            EngineError::NoActiveBattle(character_id)
        );
        assert!(service.close_battle(character_id).await.is_err());
    }
}
