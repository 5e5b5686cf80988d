//! Row decoding and error mapping shared by the SQLite repositories

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::application::ports::outbound::RepoError;
use crate::domain::entities::{BonusPayload, Item, ItemSlot, Stars};

/// SQLite result codes for a lock held by another writer (BUSY, LOCKED,
/// BUSY_SNAPSHOT). Losing that race is a conflict the caller may retry.
const BUSY_CODES: &[&str] = &["5", "6", "517"];

/// Map a sqlx error, classifying uniqueness violations and lock contention
/// as `Conflict`
pub fn map_db_error(operation: &'static str) -> impl Fn(sqlx::Error) -> RepoError {
    move |err| {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return RepoError::Conflict(db.message().to_string());
            }
            if db.code().is_some_and(|code| BUSY_CODES.contains(&&*code)) {
                return RepoError::Conflict(format!("{operation}: {}", db.message()));
            }
        }
        RepoError::database(operation, err)
    }
}

pub fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, RepoError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| RepoError::serialization(format!("column {column}: {e}")))
}

/// Parse an id stored as text
pub fn parse_id<T>(row: &SqliteRow, column: &str) -> Result<T, RepoError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = get(row, column)?;
    raw.parse()
        .map_err(|e| RepoError::serialization(format!("column {column} ({raw}): {e}")))
}

pub fn to_u32(value: i64, column: &str) -> Result<u32, RepoError> {
    u32::try_from(value).map_err(|_| RepoError::serialization(format!("column {column}: {value}")))
}

pub fn parse_stars(value: i64) -> Result<Stars, RepoError> {
    u8::try_from(value)
        .ok()
        .and_then(|v| Stars::try_from(v).ok())
        .ok_or_else(|| RepoError::serialization(format!("invalid star count {value}")))
}

/// Decode an item from columns named `item_id`, `item_name`, `item_description`,
/// `item_icon`, `item_slot` and `item_bonus`
pub fn item_from_row(row: &SqliteRow) -> Result<Item, RepoError> {
    let slot_raw: String = get(row, "item_slot")?;
    let slot = ItemSlot::from_str(&slot_raw).map_err(RepoError::serialization)?;

    Ok(Item {
        id: parse_id(row, "item_id")?,
        name: get(row, "item_name")?,
        description: get(row, "item_description")?,
        icon: get(row, "item_icon")?,
        slot,
        bonus: BonusPayload::new(get::<String>(row, "item_bonus")?),
    })
}

/// Column list matching [`item_from_row`] for a table aliased `i`
pub const ITEM_COLUMNS: &str = "i.id AS item_id, i.name AS item_name, \
     i.description AS item_description, i.icon AS item_icon, \
     i.slot AS item_slot, i.bonus AS item_bonus";
