//! Application services - Use case implementations
//!
//! Each service is a trait plus an `Impl` holding its ports as
//! `Arc<dyn Port>`, so the HTTP layer and tests can swap implementations.

pub mod battle_registry;
pub mod battle_service;
pub mod character_service;
pub mod equipment_service;
pub mod progression_service;

pub use battle_registry::Settlement;
pub use battle_service::{Answer, AnswerReport, BattleService, BattleServiceImpl};
pub use character_service::{CharacterService, CharacterServiceImpl, FirstCharacter};
pub use equipment_service::{CharacterSheet, EquipmentService, EquipmentServiceImpl};
pub use progression_service::{ProgressionService, ProgressionServiceImpl};
