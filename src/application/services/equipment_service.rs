//! Equipment Service - Moves items between a character's inventory and equipped set
//!
//! The one-item-per-slot rule is checked here before touching the store and
//! enforced again by the store itself, which runs every move in a single
//! transaction over a unique `(character, slot)` key.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::application::ports::outbound::{CharacterRepositoryPort, EquipmentRepositoryPort};
use crate::domain::entities::{Character, EquippedItem, InventoryItem, ItemSlot, Loadout};
use crate::domain::errors::EngineError;
use crate::domain::services::aggregate;
use crate::domain::value_objects::{AttributeSet, CharacterId, EquippedItemId, ItemId};

/// Everything the character screen needs, read in one go
#[derive(Debug, Clone, Serialize)]
pub struct CharacterSheet {
    pub character: Character,
    pub equipped: Vec<EquippedItem>,
    pub inventory: Vec<InventoryItem>,
    pub attributes: AttributeSet,
}

#[async_trait]
pub trait EquipmentService: Send + Sync {
    /// Equip an inventory item into `slot`, returning the new loadout
    async fn equip(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        slot: ItemSlot,
    ) -> Result<Loadout, EngineError>;

    /// Return an equipped item to the inventory
    async fn unequip(
        &self,
        character_id: CharacterId,
        equipped_item_id: EquippedItemId,
    ) -> Result<Loadout, EngineError>;

    async fn loadout(&self, character_id: CharacterId) -> Result<Loadout, EngineError>;

    /// Effective attributes from the currently equipped set
    async fn attributes(&self, character_id: CharacterId) -> Result<AttributeSet, EngineError>;

    async fn character_sheet(&self, character_id: CharacterId)
        -> Result<CharacterSheet, EngineError>;
}

#[derive(Clone)]
pub struct EquipmentServiceImpl {
    equipment: Arc<dyn EquipmentRepositoryPort>,
    characters: Arc<dyn CharacterRepositoryPort>,
}

impl EquipmentServiceImpl {
    pub fn new(
        equipment: Arc<dyn EquipmentRepositoryPort>,
        characters: Arc<dyn CharacterRepositoryPort>,
    ) -> Self {
        Self {
            equipment,
            characters,
        }
    }

    async fn require_character(&self, character_id: CharacterId) -> Result<Character, EngineError> {
        self.characters
            .get(character_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Character", character_id))
    }
}

#[async_trait]
impl EquipmentService for EquipmentServiceImpl {
    #[instrument(skip(self))]
    async fn equip(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        slot: ItemSlot,
    ) -> Result<Loadout, EngineError> {
        let loadout = self.equipment.load(character_id).await?;

        let owned = loadout
            .inventory
            .iter()
            .find(|entry| entry.item_id() == item_id)
            .ok_or(EngineError::ItemNotOwned {
                character_id,
                item_id,
            })?;

        if owned.item.slot != slot {
            return Err(EngineError::SlotMismatch {
                item_id,
                expected: owned.item.slot,
                requested: slot,
            });
        }

        // The inventory may have changed since the read above
        let change = self
            .equipment
            .equip(character_id, item_id, slot)
            .await?
            .ok_or(EngineError::ItemNotOwned {
                character_id,
                item_id,
            })?;

        match &change.displaced {
            Some(previous) => info!(
                character_id = %character_id,
                slot = %slot,
                equipped = %item_id,
                returned = %previous.item_id(),
                "Replaced equipped item"
            ),
            None => info!(character_id = %character_id, slot = %slot, equipped = %item_id, "Equipped item"),
        }

        Ok(self.equipment.load(character_id).await?)
    }

    #[instrument(skip(self))]
    async fn unequip(
        &self,
        character_id: CharacterId,
        equipped_item_id: EquippedItemId,
    ) -> Result<Loadout, EngineError> {
        let returned = self
            .equipment
            .unequip(character_id, equipped_item_id)
            .await?
            .ok_or(EngineError::NotEquipped {
                character_id,
                equipped_item_id,
            })?;

        info!(
            character_id = %character_id,
            item_id = %returned.item_id(),
            "Returned item to inventory"
        );
        Ok(self.equipment.load(character_id).await?)
    }

    #[instrument(skip(self))]
    async fn loadout(&self, character_id: CharacterId) -> Result<Loadout, EngineError> {
        debug!(character_id = %character_id, "Loading equipment");
        Ok(self.equipment.load(character_id).await?)
    }

    #[instrument(skip(self))]
    async fn attributes(&self, character_id: CharacterId) -> Result<AttributeSet, EngineError> {
        self.require_character(character_id).await?;
        let loadout = self.equipment.load(character_id).await?;
        Ok(aggregate(&loadout.equipped))
    }

    #[instrument(skip(self))]
    async fn character_sheet(
        &self,
        character_id: CharacterId,
    ) -> Result<CharacterSheet, EngineError> {
        let character = self.require_character(character_id).await?;
        let loadout = self.equipment.load(character_id).await?;
        let attributes = aggregate(&loadout.equipped);

        Ok(CharacterSheet {
            character,
            equipped: loadout.equipped,
            inventory: loadout.inventory,
            attributes,
        })
    }
}
