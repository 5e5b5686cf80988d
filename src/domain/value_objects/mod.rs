//! Value objects - Immutable objects defined by their attributes

mod attributes;
mod ids;
mod settings;

#[cfg(test)]
pub use attributes::Attribute;
pub use attributes::AttributeSet;
pub use ids::*;
pub use settings::BattleSettings;
