//! Domain layer - Core game rules with no I/O
//!
//! This layer contains:
//! - Entities: Item, Character, Dungeon, Topic, Question, progress records
//! - Value Objects: typed ids, AttributeSet
//! - Aggregates: the BattleSession state machine
//! - Domain Services: attribute aggregation, topic status derivation
//! - Errors: the engine error taxonomy

pub mod aggregates;
pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;
