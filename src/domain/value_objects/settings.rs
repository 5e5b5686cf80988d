//! Battle settings value object
//!
//! Settings are deserialized from configuration, so they carry serde derives
//! and per-field defaults.

use serde::{Deserialize, Serialize};

use super::AttributeSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BattleSettings {
    /// Player life at the start of every battle
    pub total_life: u32,
    /// Add the character's aggregated health to `total_life`
    pub health_adds_life: bool,
    /// How long the host should keep an answered question visible before
    /// showing the next one. The engine itself never waits.
    pub answer_reveal_delay_ms: u64,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            total_life: 5,
            health_adds_life: false,
            answer_reveal_delay_ms: 1000,
        }
    }
}

impl BattleSettings {
    /// Starting life for a character with the given attribute totals, never below one
    pub fn starting_life(&self, attributes: &AttributeSet) -> u32 {
        let base = i64::from(self.total_life);
        let life = if self.health_adds_life {
            base + i64::from(attributes.health)
        } else {
            base
        };
        life.clamp(1, i64::from(u32::MAX)) as u32
    }
}
