//! SQLite persistence adapters
//!
//! One pool shared by a repository per port. Every multi-row mutation runs
//! in its own transaction; uniqueness is enforced by the schema.

mod catalog_repository;
mod character_repository;
mod connection;
mod equipment_repository;
mod progress_repository;
mod rows;

pub use catalog_repository::{CatalogSeed, SqliteCatalogRepository};
pub use character_repository::SqliteCharacterRepository;
pub use equipment_repository::SqliteEquipmentRepository;
pub use progress_repository::SqliteProgressRepository;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

/// Combined repository providing access to all domain repositories
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = connection::connect(url)
            .await
            .with_context(|| format!("Failed to open database {url}"))?;
        Self::with_pool(pool).await
    }

    /// A private, empty database that disappears with the pool
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = connection::connect_in_memory()
            .await
            .context("Failed to open in-memory database")?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        connection::initialize_schema(&pool)
            .await
            .context("Failed to initialize schema")?;
        Ok(Self { pool })
    }

    pub fn catalog(&self) -> SqliteCatalogRepository {
        SqliteCatalogRepository::new(self.pool.clone())
    }

    pub fn characters(&self) -> SqliteCharacterRepository {
        SqliteCharacterRepository::new(self.pool.clone())
    }

    pub fn equipment(&self) -> SqliteEquipmentRepository {
        SqliteEquipmentRepository::new(self.pool.clone())
    }

    pub fn progress(&self) -> SqliteProgressRepository {
        SqliteProgressRepository::new(self.pool.clone())
    }
}
