//! Reward port - Hook invoked once per won battle

use async_trait::async_trait;

use super::RepoError;
use crate::domain::entities::InventoryItem;
use crate::domain::value_objects::CharacterId;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardIssuerPort: Send + Sync {
    /// Grant an item to the character's inventory. `Ok(None)` when there is
    /// nothing to grant.
    async fn issue_reward(&self, character_id: CharacterId)
        -> Result<Option<InventoryItem>, RepoError>;
}
