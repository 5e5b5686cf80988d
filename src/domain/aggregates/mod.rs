//! Aggregates - Cluster of domain objects treated as a single unit

pub mod battle_session;

pub use battle_session::{AnswerResolution, BattleSession, BattleSnapshot, BattleState};
