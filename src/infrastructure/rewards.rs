//! Reward issuer - Grants a random catalog item after a won battle

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::ports::outbound::{
    CatalogRepositoryPort, EquipmentRepositoryPort, RepoError, RewardIssuerPort,
};
use crate::domain::entities::InventoryItem;
use crate::domain::value_objects::CharacterId;

pub struct CatalogRewardIssuer {
    catalog: Arc<dyn CatalogRepositoryPort>,
    equipment: Arc<dyn EquipmentRepositoryPort>,
}

impl CatalogRewardIssuer {
    pub fn new(
        catalog: Arc<dyn CatalogRepositoryPort>,
        equipment: Arc<dyn EquipmentRepositoryPort>,
    ) -> Self {
        Self { catalog, equipment }
    }
}

#[async_trait]
impl RewardIssuerPort for CatalogRewardIssuer {
    async fn issue_reward(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<InventoryItem>, RepoError> {
        let items = self.catalog.list_items().await?;
        let Some(item_id) = items.choose(&mut rand::thread_rng()).map(|item| item.id) else {
            debug!(character_id = %character_id, "Catalog is empty, no reward issued");
            return Ok(None);
        };

        let granted = self.equipment.add_to_inventory(character_id, item_id).await?;
        info!(
            character_id = %character_id,
            item = %granted.item.name,
            "Issued battle reward"
        );
        Ok(Some(granted))
    }
}
