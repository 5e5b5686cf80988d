//! Item entity - Immutable catalog equipment and its attribute bonus

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::EngineError;
use crate::domain::value_objects::{AttributeSet, ItemId};

/// Equipment slots a character can fill, one item each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSlot {
    Head,
    Necklace,
    Chest,
    Weapon,
    Legs,
    Boots,
}

impl ItemSlot {
    pub const ALL: [ItemSlot; 6] = [
        ItemSlot::Head,
        ItemSlot::Necklace,
        ItemSlot::Chest,
        ItemSlot::Weapon,
        ItemSlot::Legs,
        ItemSlot::Boots,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Necklace => "necklace",
            Self::Chest => "chest",
            Self::Weapon => "weapon",
            Self::Legs => "legs",
            Self::Boots => "boots",
        }
    }
}

impl std::fmt::Display for ItemSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemSlot {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head" => Ok(Self::Head),
            "necklace" => Ok(Self::Necklace),
            "chest" => Ok(Self::Chest),
            "weapon" => Ok(Self::Weapon),
            "legs" => Ok(Self::Legs),
            "boots" => Ok(Self::Boots),
            other => Err(EngineError::InvalidSlot(other.to_string())),
        }
    }
}

/// Raw bonus payload exactly as the catalog stores it.
///
/// Decoding is deferred to aggregation time so one corrupt entry only costs
/// that item's contribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BonusPayload(String);

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BonusFields {
    #[serde(default)]
    health: i32,
    #[serde(default)]
    armor: i32,
    #[serde(default)]
    damage: i32,
    #[serde(default)]
    strength: i32,
    #[serde(default)]
    luck: i32,
}

impl BonusPayload {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[cfg(test)]
    pub fn from_attributes(attributes: &AttributeSet) -> Self {
        let raw = serde_json::json!({
            "health": attributes.health,
            "armor": attributes.armor,
            "damage": attributes.damage,
            "strength": attributes.strength,
            "luck": attributes.luck,
        });
        Self(raw.to_string())
    }

    /// Decode into an attribute delta.
    ///
    /// A blank payload is an item without bonuses. Anything else must be a
    /// JSON object over the five attribute names with integer values.
    pub fn decode(&self) -> Result<AttributeSet, String> {
        if self.0.trim().is_empty() {
            return Ok(AttributeSet::zero());
        }

        let fields: BonusFields = serde_json::from_str(&self.0).map_err(|e| e.to_string())?;
        Ok(AttributeSet {
            health: fields.health,
            armor: fields.armor,
            damage: fields.damage,
            strength: fields.strength,
            luck: fields.luck,
        })
    }
}

/// A catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    /// Path or URL of the item icon
    pub icon: Option<String>,
    pub slot: ItemSlot,
    pub bonus: BonusPayload,
}

impl Item {
    pub fn bonus_delta(&self) -> Result<AttributeSet, EngineError> {
        self.bonus
            .decode()
            .map_err(|reason| EngineError::MalformedBonusPayload {
                item_id: self.id,
                reason,
            })
    }
}

#[cfg(test)]
impl Item {
    pub fn new(name: impl Into<String>, slot: ItemSlot) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            description: String::new(),
            icon: None,
            slot,
            bonus: BonusPayload::default(),
        }
    }

    pub fn with_bonus(mut self, bonus: BonusPayload) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn with_attributes(self, attributes: AttributeSet) -> Self {
        self.with_bonus(BonusPayload::from_attributes(&attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    #[test]
    fn test_slot_parsing() {
        for slot in ItemSlot::ALL {
            assert_eq!(slot.as_str().parse::<ItemSlot>().unwrap(), slot);
        }
        let err = "ring".parse::<ItemSlot>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSlot);
    }

    #[test]
    fn test_decode_partial_payload() {
        let payload = BonusPayload::new(r#"{"health": 4, "luck": -2}"#);
        let delta = payload.decode().unwrap();
        assert_eq!(delta.health, 4);
        assert_eq!(delta.luck, -2);
        assert_eq!(delta.armor, 0);
    }

    #[test]
    fn test_blank_payload_is_no_bonus() {
        assert!(BonusPayload::new("  ").decode().unwrap().is_zero());
    }

    #[test]
    fn test_malformed_payloads_are_rejected() {
        assert!(BonusPayload::new("{health: 4").decode().is_err());
        assert!(BonusPayload::new(r#"{"mana": 3}"#).decode().is_err());
        assert!(BonusPayload::new(r#"{"armor": "lots"}"#).decode().is_err());
        assert!(BonusPayload::new("[1, 2]").decode().is_err());
    }

    #[test]
    fn test_bonus_delta_reports_item() {
        let item = Item::new("Cracked Helm", ItemSlot::Head).with_bonus(BonusPayload::new("oops"));
        match item.bonus_delta() {
            Err(EngineError::MalformedBonusPayload { item_id, .. }) => assert_eq!(item_id, item.id),
            other => panic!("expected malformed payload, got {:?}", other),
        }
    }
}
