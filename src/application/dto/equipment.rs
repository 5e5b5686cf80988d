use serde::{Deserialize, Serialize};

use crate::application::services::CharacterSheet;
use crate::domain::entities::{EquippedItem, InventoryItem, Item, Loadout};
use crate::domain::value_objects::AttributeSet;

/// Request to equip an owned item.
///
/// The slot stays a string here; it is parsed into `ItemSlot` at the handler
/// so unknown values surface as `InvalidSlot`.
#[derive(Debug, Deserialize)]
pub struct EquipRequestDto {
    pub item_id: String,
    pub slot: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemResponseDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub slot: String,
    /// Decoded bonus, `None` when the stored payload is malformed
    pub bonus: Option<AttributeSet>,
}

impl From<Item> for ItemResponseDto {
    fn from(item: Item) -> Self {
        let bonus = item.bonus_delta().ok();
        Self {
            id: item.id.to_string(),
            name: item.name,
            description: item.description,
            icon: item.icon,
            slot: item.slot.to_string(),
            bonus,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EquippedItemResponseDto {
    pub id: String,
    pub slot: String,
    pub item: ItemResponseDto,
}

impl From<EquippedItem> for EquippedItemResponseDto {
    fn from(entry: EquippedItem) -> Self {
        Self {
            id: entry.id.to_string(),
            slot: entry.slot.to_string(),
            item: entry.item.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryItemResponseDto {
    pub id: String,
    pub item: ItemResponseDto,
}

impl From<InventoryItem> for InventoryItemResponseDto {
    fn from(entry: InventoryItem) -> Self {
        Self {
            id: entry.id.to_string(),
            item: entry.item.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadoutResponseDto {
    pub equipped: Vec<EquippedItemResponseDto>,
    pub inventory: Vec<InventoryItemResponseDto>,
}

impl From<Loadout> for LoadoutResponseDto {
    fn from(loadout: Loadout) -> Self {
        Self {
            equipped: loadout.equipped.into_iter().map(Into::into).collect(),
            inventory: loadout.inventory.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterSheetResponseDto {
    pub character_id: String,
    pub race_id: u32,
    pub level: u32,
    pub attributes: AttributeSet,
    pub equipped: Vec<EquippedItemResponseDto>,
    pub inventory: Vec<InventoryItemResponseDto>,
}

impl From<CharacterSheet> for CharacterSheetResponseDto {
    fn from(sheet: CharacterSheet) -> Self {
        Self {
            character_id: sheet.character.id.to_string(),
            race_id: sheet.character.race_id.value(),
            level: sheet.character.level,
            attributes: sheet.attributes,
            equipped: sheet.equipped.into_iter().map(Into::into).collect(),
            inventory: sheet.inventory.into_iter().map(Into::into).collect(),
        }
    }
}
