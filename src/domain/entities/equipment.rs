//! Equipment entities - Where a character's items currently live
//!
//! Every item instance a character owns is either equipped (occupying the
//! slot it was made for) or sitting in the inventory, never both.

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemSlot};
use crate::domain::value_objects::{CharacterId, EquippedItemId, InventoryItemId, ItemId};

/// An item occupying one of a character's equipment slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedItem {
    pub id: EquippedItemId,
    pub character_id: CharacterId,
    pub slot: ItemSlot,
    pub item: Item,
}

impl EquippedItem {
    #[cfg(test)]
    pub fn new(character_id: CharacterId, item: Item) -> Self {
        Self {
            id: EquippedItemId::new(),
            character_id,
            slot: item.slot,
            item,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item.id
    }
}

/// An owned item that is not equipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub character_id: CharacterId,
    pub item: Item,
}

impl InventoryItem {
    #[cfg(test)]
    pub fn new(character_id: CharacterId, item: Item) -> Self {
        Self {
            id: InventoryItemId::new(),
            character_id,
            item,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item.id
    }
}

/// Result of an equip: the new occupant plus whoever it displaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipChange {
    pub equipped: EquippedItem,
    pub displaced: Option<InventoryItem>,
}

/// Snapshot of both item locations for one character
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Loadout {
    pub equipped: Vec<EquippedItem>,
    pub inventory: Vec<InventoryItem>,
}

#[cfg(test)]
impl Loadout {
    pub fn in_slot(&self, slot: ItemSlot) -> Option<&EquippedItem> {
        self.equipped.iter().find(|e| e.slot == slot)
    }

    /// All owned item ids, sorted
    pub fn owned_item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self
            .equipped
            .iter()
            .map(EquippedItem::item_id)
            .chain(self.inventory.iter().map(InventoryItem::item_id))
            .collect();
        ids.sort();
        ids
    }

    /// True when no slot holds two items
    pub fn has_exclusive_slots(&self) -> bool {
        ItemSlot::ALL
            .iter()
            .all(|slot| self.equipped.iter().filter(|e| e.slot == *slot).count() <= 1)
    }
}
