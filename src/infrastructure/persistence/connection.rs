//! SQLite pool setup and schema

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Every uniqueness rule the engine relies on lives here as a constraint,
/// so concurrent writers are serialized by the database rather than by
/// in-process locks.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS races (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        role TEXT NOT NULL,
        icon TEXT,
        color TEXT,
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        icon TEXT,
        slot TEXT NOT NULL,
        bonus TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS dungeons (
        id TEXT PRIMARY KEY,
        race_id INTEGER NOT NULL REFERENCES races(id),
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        min_level INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS topics (
        id TEXT PRIMARY KEY,
        dungeon_id TEXT NOT NULL REFERENCES dungeons(id),
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        position INTEGER NOT NULL,
        enemy_name TEXT NOT NULL,
        enemy_image TEXT,
        question_count INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS questions (
        id TEXT PRIMARY KEY,
        topic_id TEXT NOT NULL REFERENCES topics(id),
        position INTEGER NOT NULL,
        text TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS answers (
        id TEXT PRIMARY KEY,
        question_id TEXT NOT NULL REFERENCES questions(id),
        position INTEGER NOT NULL,
        text TEXT NOT NULL,
        is_correct INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS characters (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        race_id INTEGER NOT NULL REFERENCES races(id),
        level INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (user_id, race_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory_items (
        id TEXT PRIMARY KEY,
        character_id TEXT NOT NULL REFERENCES characters(id),
        item_id TEXT NOT NULL REFERENCES items(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_inventory_character ON inventory_items (character_id)",
    r#"
    CREATE TABLE IF NOT EXISTS equipped_items (
        id TEXT PRIMARY KEY,
        character_id TEXT NOT NULL REFERENCES characters(id),
        slot TEXT NOT NULL,
        item_id TEXT NOT NULL REFERENCES items(id),
        UNIQUE (character_id, slot)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_progress (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        dungeon_id TEXT NOT NULL REFERENCES dungeons(id),
        created_at TEXT NOT NULL,
        UNIQUE (user_id, dungeon_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS topic_progress (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        topic_id TEXT NOT NULL REFERENCES topics(id),
        completed INTEGER NOT NULL DEFAULT 0,
        stars INTEGER NOT NULL CHECK (stars BETWEEN 1 AND 3),
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, topic_id)
    )
    "#,
];

/// Open a pool for `url`, creating the database file when the URL allows it
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Private in-memory database. One connection, because every new
/// connection to `sqlite::memory:` would see its own empty database.
#[cfg(test)]
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

pub async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
