//! Equipped and inventory item storage for SQLite
//!
//! Equip and unequip each run as one transaction that moves a row between
//! `inventory_items` and `equipped_items`, so an item is never visible in
//! both tables or in neither. `UNIQUE (character_id, slot)` rejects a second
//! occupant if two writers race for the same slot.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::Row;
use tracing::debug;

use super::rows::{item_from_row, map_db_error, parse_id, ITEM_COLUMNS};
use crate::application::ports::outbound::{EquipmentRepositoryPort, RepoError};
use crate::domain::entities::{EquipChange, EquippedItem, InventoryItem, Item, ItemSlot, Loadout};
use crate::domain::value_objects::{
    CharacterId, EquippedItemId, InventoryItemId, ItemId,
};

#[derive(Clone)]
pub struct SqliteEquipmentRepository {
    pool: SqlitePool,
}

impl SqliteEquipmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn fetch_item(conn: &mut SqliteConnection, item_id: ItemId) -> Result<Item, RepoError> {
    let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items i WHERE i.id = ?"))
        .bind(item_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_error("fetch_item"))?
        .ok_or_else(|| RepoError::not_found("Item", item_id))?;
    item_from_row(&row)
}

async fn insert_inventory(
    conn: &mut SqliteConnection,
    character_id: CharacterId,
    item_id: ItemId,
) -> Result<InventoryItemId, RepoError> {
    let id = InventoryItemId::new();
    sqlx::query("INSERT INTO inventory_items (id, character_id, item_id) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind(character_id.to_string())
        .bind(item_id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(map_db_error("insert_inventory"))?;
    Ok(id)
}

#[async_trait]
impl EquipmentRepositoryPort for SqliteEquipmentRepository {
    async fn load(&self, character_id: CharacterId) -> Result<Loadout, RepoError> {
        let map_err = map_db_error("load_equipment");
        // Both tables are read inside one transaction so they agree
        let mut tx = self.pool.begin().await.map_err(&map_err)?;

        let equipped_rows = sqlx::query(&format!(
            "SELECT e.id AS entry_id, e.slot AS entry_slot, {ITEM_COLUMNS}
             FROM equipped_items e JOIN items i ON i.id = e.item_id
             WHERE e.character_id = ?"
        ))
        .bind(character_id.to_string())
        .fetch_all(&mut *tx)
        .await
        .map_err(&map_err)?;

        let inventory_rows = sqlx::query(&format!(
            "SELECT v.id AS entry_id, {ITEM_COLUMNS}
             FROM inventory_items v JOIN items i ON i.id = v.item_id
             WHERE v.character_id = ? ORDER BY i.name, v.id"
        ))
        .bind(character_id.to_string())
        .fetch_all(&mut *tx)
        .await
        .map_err(&map_err)?;

        tx.commit().await.map_err(&map_err)?;

        let mut equipped = equipped_rows
            .iter()
            .map(|row| -> Result<EquippedItem, RepoError> {
                let slot: String = row
                    .try_get("entry_slot")
                    .map_err(|e| RepoError::serialization(e.to_string()))?;
                Ok(EquippedItem {
                    id: parse_id(row, "entry_id")?,
                    character_id,
                    slot: slot.parse().map_err(RepoError::serialization)?,
                    item: item_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        equipped.sort_by_key(|entry| entry.slot);

        let inventory = inventory_rows
            .iter()
            .map(|row| -> Result<InventoryItem, RepoError> {
                Ok(InventoryItem {
                    id: parse_id(row, "entry_id")?,
                    character_id,
                    item: item_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Loadout {
            equipped,
            inventory,
        })
    }

    async fn equip(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        slot: ItemSlot,
    ) -> Result<Option<EquipChange>, RepoError> {
        let map_err = map_db_error("equip");
        let mut tx = self.pool.begin().await.map_err(&map_err)?;

        let owned = sqlx::query(
            "SELECT id FROM inventory_items WHERE character_id = ? AND item_id = ? ORDER BY id LIMIT 1",
        )
        .bind(character_id.to_string())
        .bind(item_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(&map_err)?;
        let Some(owned) = owned else {
            // Dropping the transaction rolls it back
            return Ok(None);
        };
        let inventory_id: InventoryItemId = parse_id(&owned, "id")?;

        let occupant = sqlx::query(
            "SELECT id, item_id FROM equipped_items WHERE character_id = ? AND slot = ?",
        )
        .bind(character_id.to_string())
        .bind(slot.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(&map_err)?;

        let displaced = match occupant {
            Some(row) => {
                let occupant_id: EquippedItemId = parse_id(&row, "id")?;
                let occupant_item: ItemId = parse_id(&row, "item_id")?;
                sqlx::query("DELETE FROM equipped_items WHERE id = ?")
                    .bind(occupant_id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(&map_err)?;
                let returned_id = insert_inventory(&mut tx, character_id, occupant_item).await?;
                let item = fetch_item(&mut tx, occupant_item).await?;
                Some(InventoryItem {
                    id: returned_id,
                    character_id,
                    item,
                })
            }
            None => None,
        };

        sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(inventory_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(&map_err)?;

        let equipped_id = EquippedItemId::new();
        sqlx::query(
            "INSERT INTO equipped_items (id, character_id, slot, item_id) VALUES (?, ?, ?, ?)",
        )
        .bind(equipped_id.to_string())
        .bind(character_id.to_string())
        .bind(slot.as_str())
        .bind(item_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(&map_err)?;

        let item = fetch_item(&mut tx, item_id).await?;
        tx.commit().await.map_err(&map_err)?;

        debug!(
            character_id = %character_id,
            slot = %slot,
            item_id = %item_id,
            displaced = displaced.is_some(),
            "Equip committed"
        );
        Ok(Some(EquipChange {
            equipped: EquippedItem {
                id: equipped_id,
                character_id,
                slot,
                item,
            },
            displaced,
        }))
    }

    async fn unequip(
        &self,
        character_id: CharacterId,
        equipped_item_id: EquippedItemId,
    ) -> Result<Option<InventoryItem>, RepoError> {
        let map_err = map_db_error("unequip");
        let mut tx = self.pool.begin().await.map_err(&map_err)?;

        let row = sqlx::query("SELECT item_id FROM equipped_items WHERE id = ? AND character_id = ?")
            .bind(equipped_item_id.to_string())
            .bind(character_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(&map_err)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let item_id: ItemId = parse_id(&row, "item_id")?;

        sqlx::query("DELETE FROM equipped_items WHERE id = ?")
            .bind(equipped_item_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(&map_err)?;
        let inventory_id = insert_inventory(&mut tx, character_id, item_id).await?;
        let item = fetch_item(&mut tx, item_id).await?;

        tx.commit().await.map_err(&map_err)?;

        Ok(Some(InventoryItem {
            id: inventory_id,
            character_id,
            item,
        }))
    }

    async fn add_to_inventory(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
    ) -> Result<InventoryItem, RepoError> {
        let map_err = map_db_error("add_to_inventory");
        let mut tx = self.pool.begin().await.map_err(&map_err)?;

        let item = fetch_item(&mut tx, item_id).await?;
        let id = insert_inventory(&mut tx, character_id, item_id).await?;

        tx.commit().await.map_err(&map_err)?;
        Ok(InventoryItem {
            id,
            character_id,
            item,
        })
    }
}
