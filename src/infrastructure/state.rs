//! Shared application state

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::application::ports::outbound::{
    CatalogRepositoryPort, CharacterRepositoryPort, EquipmentRepositoryPort,
    ProgressRepositoryPort, QuestionSupplyPort, RewardIssuerPort,
};
use crate::application::services::{
    BattleServiceImpl, CharacterServiceImpl, EquipmentServiceImpl, ProgressionService,
    ProgressionServiceImpl,
};
use crate::domain::value_objects::BattleSettings;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::{CatalogSeed, SqliteRepository};
use crate::infrastructure::rewards::CatalogRewardIssuer;

/// Shared application state
pub struct AppState {
    pub character_service: CharacterServiceImpl,
    pub equipment_service: EquipmentServiceImpl,
    pub progression_service: Arc<ProgressionServiceImpl>,
    /// Owns the registry of battles in progress
    pub battle_service: BattleServiceImpl,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let repository = SqliteRepository::new(&config.database_url).await?;

        if let Some(path) = &config.catalog_path {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read catalog {path}"))?;
            let seed = CatalogSeed::from_json(&raw)
                .with_context(|| format!("Failed to parse catalog {path}"))?;
            repository
                .catalog()
                .import(&seed)
                .await
                .with_context(|| format!("Failed to import catalog {path}"))?;
            tracing::info!(
                path = %path,
                races = seed.races.len(),
                items = seed.items.len(),
                dungeons = seed.dungeons.len(),
                "Catalog imported"
            );
        }

        Ok(Self::from_repository(&repository, config.battle.clone()))
    }

    /// Wire every service onto one store
    pub fn from_repository(repository: &SqliteRepository, settings: BattleSettings) -> Self {
        let catalog = Arc::new(repository.catalog());
        let catalog_port: Arc<dyn CatalogRepositoryPort> = catalog.clone();
        let questions: Arc<dyn QuestionSupplyPort> = catalog;
        let characters: Arc<dyn CharacterRepositoryPort> = Arc::new(repository.characters());
        let equipment: Arc<dyn EquipmentRepositoryPort> = Arc::new(repository.equipment());
        let progress: Arc<dyn ProgressRepositoryPort> = Arc::new(repository.progress());
        let rewards: Arc<dyn RewardIssuerPort> = Arc::new(CatalogRewardIssuer::new(
            catalog_port.clone(),
            equipment.clone(),
        ));

        let progression_service = Arc::new(ProgressionServiceImpl::new(
            progress,
            catalog_port.clone(),
        ));
        let progression: Arc<dyn ProgressionService> = progression_service.clone();

        let character_service = CharacterServiceImpl::new(
            characters.clone(),
            catalog_port.clone(),
            progression.clone(),
        );
        let equipment_service = EquipmentServiceImpl::new(equipment.clone(), characters.clone());
        let battle_service = BattleServiceImpl::new(
            catalog_port,
            questions,
            characters,
            equipment,
            progression,
            rewards,
            settings,
        );

        Self {
            character_service,
            equipment_service,
            progression_service,
            battle_service,
        }
    }
}
