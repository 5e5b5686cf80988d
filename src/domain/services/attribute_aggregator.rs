//! Attribute aggregation - Equipped items to effective attribute totals

use tracing::warn;

use crate::domain::entities::EquippedItem;
use crate::domain::errors::EngineError;
use crate::domain::value_objects::AttributeSet;

/// Sum the bonus deltas of every equipped item.
///
/// Pure and order-independent: the same equipped set always yields the same
/// totals, so callers recompute on every read instead of maintaining totals
/// incrementally. An item whose payload cannot be decoded contributes nothing
/// and is logged; the remaining items still count.
pub fn aggregate(equipped: &[EquippedItem]) -> AttributeSet {
    equipped
        .iter()
        .map(|entry| match entry.item.bonus_delta() {
            Ok(delta) => delta,
            Err(EngineError::MalformedBonusPayload { item_id, reason }) => {
                warn!(
                    item_id = %item_id,
                    character_id = %entry.character_id,
                    reason = %reason,
                    "Skipping malformed bonus payload"
                );
                AttributeSet::zero()
            }
            Err(other) => {
                warn!(item_id = %entry.item.id, error = %other, "Skipping unreadable bonus");
                AttributeSet::zero()
            }
        })
        .sum()
}
