//! SQLite catalog: races, items, dungeons, topics and their questions
//!
//! The catalog is read-only for the engine. It is filled by [`SqliteCatalogRepository::import`]
//! from a JSON seed, which is where unknown slot names are rejected.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::{debug, info, instrument};

use super::rows::{get, item_from_row, map_db_error, parse_id, to_u32, ITEM_COLUMNS};
use crate::application::ports::outbound::{CatalogRepositoryPort, QuestionSupplyPort, RepoError};
use crate::domain::entities::{
    AnswerOption, Dungeon, Enemy, Item, ItemSlot, Question, Race, Topic,
};
use crate::domain::errors::EngineError;
use crate::domain::value_objects::{DungeonId, ItemId, QuestionId, RaceId, TopicId};

// ============================================================================
// Seed format
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub races: Vec<Race>,
    #[serde(default)]
    pub items: Vec<ItemSeed>,
    #[serde(default)]
    pub dungeons: Vec<DungeonSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ItemSeed {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub slot: String,
    /// Attribute deltas; an object is stored as JSON text, a string verbatim
    #[serde(default)]
    pub bonus: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct DungeonSeed {
    pub id: DungeonId,
    pub race_id: RaceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_min_level")]
    pub min_level: u32,
    #[serde(default)]
    pub topics: Vec<TopicSeed>,
}

#[derive(Debug, Deserialize)]
pub struct TopicSeed {
    pub id: TopicId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub position: u32,
    pub enemy_name: String,
    #[serde(default)]
    pub enemy_image: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionSeed>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionSeed {
    pub id: QuestionId,
    pub text: String,
    pub answers: Vec<AnswerOption>,
}

fn default_min_level() -> u32 {
    1
}

impl CatalogSeed {
    pub fn from_json(raw: &str) -> Result<Self, RepoError> {
        serde_json::from_str(raw).map_err(RepoError::serialization)
    }
}

impl ItemSeed {
    fn bonus_text(&self) -> String {
        match &self.bonus {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Repository
// ============================================================================

#[derive(Clone)]
pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert a whole seed in one transaction. Re-importing the same seed is a no-op.
    #[instrument(skip(self, seed))]
    pub async fn import(&self, seed: &CatalogSeed) -> Result<(), EngineError> {
        // Reject bad slots before writing anything
        let slots = seed
            .items
            .iter()
            .map(|item| ItemSlot::from_str(&item.slot))
            .collect::<Result<Vec<_>, _>>()?;

        let map_err = map_db_error("import_catalog");
        let mut tx = self.pool.begin().await.map_err(&map_err)?;

        for race in &seed.races {
            sqlx::query(
                "INSERT INTO races (id, name, role, icon, color, description) VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, role = excluded.role,
                 icon = excluded.icon, color = excluded.color, description = excluded.description",
            )
            .bind(i64::from(race.id.value()))
            .bind(&race.name)
            .bind(&race.role)
            .bind(&race.icon)
            .bind(&race.color)
            .bind(&race.description)
            .execute(&mut *tx)
            .await
            .map_err(&map_err)?;
        }

        for (item, slot) in seed.items.iter().zip(slots) {
            sqlx::query(
                "INSERT INTO items (id, name, description, icon, slot, bonus) VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, description = excluded.description,
                 icon = excluded.icon, slot = excluded.slot, bonus = excluded.bonus",
            )
            .bind(item.id.to_string())
            .bind(&item.name)
            .bind(&item.description)
            .bind(&item.icon)
            .bind(slot.as_str())
            .bind(item.bonus_text())
            .execute(&mut *tx)
            .await
            .map_err(&map_err)?;
        }

        for dungeon in &seed.dungeons {
            sqlx::query(
                "INSERT INTO dungeons (id, race_id, name, description, min_level) VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET race_id = excluded.race_id, name = excluded.name,
                 description = excluded.description, min_level = excluded.min_level",
            )
            .bind(dungeon.id.to_string())
            .bind(i64::from(dungeon.race_id.value()))
            .bind(&dungeon.name)
            .bind(&dungeon.description)
            .bind(i64::from(dungeon.min_level))
            .execute(&mut *tx)
            .await
            .map_err(&map_err)?;

            for topic in &dungeon.topics {
                sqlx::query(
                    "INSERT INTO topics (id, dungeon_id, name, description, position, enemy_name, enemy_image, question_count)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(id) DO UPDATE SET dungeon_id = excluded.dungeon_id, name = excluded.name,
                     description = excluded.description, position = excluded.position,
                     enemy_name = excluded.enemy_name, enemy_image = excluded.enemy_image,
                     question_count = excluded.question_count",
                )
                .bind(topic.id.to_string())
                .bind(dungeon.id.to_string())
                .bind(&topic.name)
                .bind(&topic.description)
                .bind(i64::from(topic.position))
                .bind(&topic.enemy_name)
                .bind(&topic.enemy_image)
                .bind(topic.questions.len() as i64)
                .execute(&mut *tx)
                .await
                .map_err(&map_err)?;

                for (q_pos, question) in topic.questions.iter().enumerate() {
                    sqlx::query(
                        "INSERT INTO questions (id, topic_id, position, text) VALUES (?, ?, ?, ?)
                         ON CONFLICT(id) DO UPDATE SET topic_id = excluded.topic_id,
                         position = excluded.position, text = excluded.text",
                    )
                    .bind(question.id.to_string())
                    .bind(topic.id.to_string())
                    .bind(q_pos as i64)
                    .bind(&question.text)
                    .execute(&mut *tx)
                    .await
                    .map_err(&map_err)?;

                    for (a_pos, answer) in question.answers.iter().enumerate() {
                        sqlx::query(
                            "INSERT INTO answers (id, question_id, position, text, is_correct) VALUES (?, ?, ?, ?, ?)
                             ON CONFLICT(id) DO UPDATE SET question_id = excluded.question_id,
                             position = excluded.position, text = excluded.text,
                             is_correct = excluded.is_correct",
                        )
                        .bind(answer.id.to_string())
                        .bind(question.id.to_string())
                        .bind(a_pos as i64)
                        .bind(&answer.text)
                        .bind(answer.is_correct)
                        .execute(&mut *tx)
                        .await
                        .map_err(&map_err)?;
                    }
                }
            }
        }

        tx.commit().await.map_err(&map_err)?;
        info!(
            races = seed.races.len(),
            items = seed.items.len(),
            dungeons = seed.dungeons.len(),
            "Catalog imported"
        );
        Ok(())
    }
}

fn race_from_row(row: &SqliteRow) -> Result<Race, RepoError> {
    let id: i64 = get(row, "id")?;
    Ok(Race {
        id: RaceId::new(to_u32(id, "id")?),
        name: get(row, "name")?,
        role: get(row, "role")?,
        icon: get(row, "icon")?,
        color: get(row, "color")?,
        description: get(row, "description")?,
    })
}

fn dungeon_from_row(row: &SqliteRow) -> Result<Dungeon, RepoError> {
    let race_id: i64 = get(row, "race_id")?;
    let min_level: i64 = get(row, "min_level")?;
    Ok(Dungeon {
        id: parse_id(row, "id")?,
        race_id: RaceId::new(to_u32(race_id, "race_id")?),
        name: get(row, "name")?,
        description: get(row, "description")?,
        min_level: to_u32(min_level, "min_level")?,
    })
}

fn topic_from_row(row: &SqliteRow) -> Result<Topic, RepoError> {
    let position: i64 = get(row, "position")?;
    let question_count: i64 = get(row, "question_count")?;
    Ok(Topic {
        id: parse_id(row, "id")?,
        dungeon_id: parse_id(row, "dungeon_id")?,
        name: get(row, "name")?,
        description: get(row, "description")?,
        position: to_u32(position, "position")?,
        enemy: Enemy {
            name: get(row, "enemy_name")?,
            image: get(row, "enemy_image")?,
            question_count: to_u32(question_count, "question_count")?,
        },
    })
}

const DUNGEON_COLUMNS: &str = "id, race_id, name, description, min_level";
const TOPIC_COLUMNS: &str =
    "id, dungeon_id, name, description, position, enemy_name, enemy_image, question_count";

#[async_trait]
impl CatalogRepositoryPort for SqliteCatalogRepository {
    async fn list_items(&self) -> Result<Vec<Item>, RepoError> {
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items i ORDER BY i.name"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("list_items"))?;
        rows.iter().map(item_from_row).collect()
    }

    async fn list_races(&self) -> Result<Vec<Race>, RepoError> {
        let rows = sqlx::query("SELECT id, name, role, icon, color, description FROM races ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("list_races"))?;
        rows.iter().map(race_from_row).collect()
    }

    async fn get_dungeon(&self, id: DungeonId) -> Result<Option<Dungeon>, RepoError> {
        let row = sqlx::query(&format!("SELECT {DUNGEON_COLUMNS} FROM dungeons WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("get_dungeon"))?;
        row.as_ref().map(dungeon_from_row).transpose()
    }

    async fn list_dungeons_by_race(&self, race_id: RaceId) -> Result<Vec<Dungeon>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {DUNGEON_COLUMNS} FROM dungeons WHERE race_id = ? ORDER BY min_level, name"
        ))
        .bind(i64::from(race_id.value()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("list_dungeons_by_race"))?;
        rows.iter().map(dungeon_from_row).collect()
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, RepoError> {
        let row = sqlx::query(&format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("get_topic"))?;
        row.as_ref().map(topic_from_row).transpose()
    }

    async fn list_topics(&self, dungeon_id: DungeonId) -> Result<Vec<Topic>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE dungeon_id = ? ORDER BY position"
        ))
        .bind(dungeon_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("list_topics"))?;
        rows.iter().map(topic_from_row).collect()
    }
}

#[async_trait]
impl QuestionSupplyPort for SqliteCatalogRepository {
    async fn questions_for_topic(&self, topic_id: TopicId) -> Result<Vec<Question>, RepoError> {
        let question_rows =
            sqlx::query("SELECT id, text FROM questions WHERE topic_id = ? ORDER BY position")
                .bind(topic_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error("questions_for_topic"))?;

        let mut questions = Vec::with_capacity(question_rows.len());
        let mut index: HashMap<QuestionId, usize> = HashMap::new();
        for row in &question_rows {
            let id: QuestionId = parse_id(row, "id")?;
            index.insert(id, questions.len());
            questions.push(Question {
                id,
                topic_id,
                text: get(row, "text")?,
                answers: Vec::new(),
            });
        }

        let answer_rows = sqlx::query(
            "SELECT a.id, a.question_id, a.text, a.is_correct FROM answers a
             JOIN questions q ON q.id = a.question_id
             WHERE q.topic_id = ? ORDER BY q.position, a.position",
        )
        .bind(topic_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("questions_for_topic"))?;

        for row in &answer_rows {
            let question_id: QuestionId = parse_id(row, "question_id")?;
            let Some(&slot) = index.get(&question_id) else {
                continue;
            };
            questions[slot].answers.push(AnswerOption {
                id: parse_id(row, "id")?,
                text: get(row, "text")?,
                is_correct: get(row, "is_correct")?,
            });
        }

        debug!(topic_id = %topic_id, count = questions.len(), "Loaded questions");
        Ok(questions)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infrastructure::persistence::SqliteRepository;

    /// Two races, three items (one with a corrupt bonus) and one dungeon with
    /// three topics of two questions each
    pub(crate) fn sample_seed() -> CatalogSeed {
        let raw = serde_json::json!({
            "races": [
                { "id": 1, "name": "Elf", "role": "Archer", "color": "#2e7d32" },
                { "id": 2, "name": "Dwarf", "role": "Warrior" }
            ],
            "items": [
                { "id": ItemId::new(), "name": "Iron Helm", "slot": "head", "bonus": { "armor": 2 } },
                { "id": ItemId::new(), "name": "Steel Helm", "slot": "head", "bonus": { "armor": 3, "health": 1 } },
                { "id": ItemId::new(), "name": "Cursed Ring", "slot": "necklace", "bonus": "{not json" }
            ],
            "dungeons": [
                {
                    "id": DungeonId::new(), "race_id": 1, "name": "Whispering Woods", "min_level": 1,
                    "topics": (1..=3).map(|position| serde_json::json!({
                        "id": TopicId::new(),
                        "name": format!("Topic {position}"),
                        "position": position,
                        "enemy_name": "Goblin",
                        "questions": (0..2).map(|q| serde_json::json!({
                            "id": QuestionId::new(),
                            "text": format!("Question {q}"),
                            "answers": [
                                { "id": crate::domain::value_objects::AnswerId::new(), "text": "right", "is_correct": true },
                                { "id": crate::domain::value_objects::AnswerId::new(), "text": "wrong", "is_correct": false }
                            ]
                        })).collect::<Vec<_>>()
                    })).collect::<Vec<_>>()
                },
                { "id": DungeonId::new(), "race_id": 1, "name": "Deep Roots", "min_level": 5 }
            ]
        });
        serde_json::from_value(raw).unwrap()
    }

    #[tokio::test]
    async fn test_import_and_read_back() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let catalog = repo.catalog();
        let seed = sample_seed();
        catalog.import(&seed).await.unwrap();

        let races = catalog.list_races().await.unwrap();
        assert_eq!(races.len(), 2);
        assert_eq!(races[0].name, "Elf");

        let dungeons = catalog.list_dungeons_by_race(RaceId::new(1)).await.unwrap();
        assert_eq!(dungeons.len(), 2);
        assert!(dungeons[0].min_level <= dungeons[1].min_level);

        let topics = catalog.list_topics(seed.dungeons[0].id).await.unwrap();
        let positions: Vec<u32> = topics.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(topics[0].enemy.question_count, 2);

        let questions = catalog.questions_for_topic(topics[0].id).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "Question 0");
        assert_eq!(questions[0].answers.len(), 2);
        assert!(questions[0].answers[0].is_correct);

        let items = catalog.list_items().await.unwrap();
        let by_id = |id: ItemId| items.iter().find(|item| item.id == id).unwrap();

        let helm = by_id(seed.items[0].id);
        assert_eq!(helm.slot, ItemSlot::Head);
        assert_eq!(helm.bonus_delta().unwrap().armor, 2);

        let cursed = by_id(seed.items[2].id);
        assert!(cursed.bonus_delta().is_err());
    }

    #[tokio::test]
    async fn test_dungeons_are_listed_lowest_level_first() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let seed = CatalogSeed::from_json(&format!(
            r#"{{"races":[{{"id":1,"name":"Elf","role":"Archer"}}],
                "dungeons":[
                    {{"id":"{}","race_id":1,"name":"Summit","min_level":9}},
                    {{"id":"{}","race_id":1,"name":"Foothills","min_level":1}}
                ]}}"#,
            DungeonId::new(),
            DungeonId::new()
        ))
        .unwrap();
        repo.catalog().import(&seed).await.unwrap();

        let names: Vec<String> = repo
            .catalog()
            .list_dungeons_by_race(RaceId::new(1))
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Foothills", "Summit"]);
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let seed = sample_seed();
        repo.catalog().import(&seed).await.unwrap();
        repo.catalog().import(&seed).await.unwrap();

        assert_eq!(repo.catalog().list_items().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_slot_is_rejected_before_writing() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let seed = CatalogSeed::from_json(&format!(
            r#"{{"races":[{{"id":1,"name":"Elf","role":"Archer"}}],
                "items":[{{"id":"{}","name":"Wings","slot":"back"}}]}}"#,
            ItemId::new()
        ))
        .unwrap();

        let err = repo.catalog().import(&seed).await.unwrap_err();

        assert_eq!(err, EngineError::InvalidSlot("back".to_string()));
        assert!(repo.catalog().list_races().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bundled_catalog_imports() {
        let seed = CatalogSeed::from_json(include_str!("../../../catalog/catalog.json")).unwrap();
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.catalog().import(&seed).await.unwrap();

        let races = repo.catalog().list_races().await.unwrap();
        assert_eq!(races.len(), seed.races.len());
        for item in repo.catalog().list_items().await.unwrap() {
            assert!(item.bonus_delta().is_ok(), "{} has a bad bonus", item.name);
        }
        for race in races {
            let dungeons = repo.catalog().list_dungeons_by_race(race.id).await.unwrap();
            assert!(
                dungeons.windows(2).all(|w| w[0].min_level <= w[1].min_level),
                "dungeons of {} out of level order",
                race.name
            );
        }
    }

    #[tokio::test]
    async fn test_missing_rows_read_as_none() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        assert!(repo.catalog().get_dungeon(DungeonId::new()).await.unwrap().is_none());
        assert!(repo.catalog().get_topic(TopicId::new()).await.unwrap().is_none());
        assert!(repo
            .catalog()
            .questions_for_topic(TopicId::new())
            .await
            .unwrap()
            .is_empty());
    }
}
