//! Domain entities - Core business objects with identity

mod character;
mod dungeon;
mod equipment;
mod item;
mod progress;
mod question;

pub use character::{Character, Race};
pub use dungeon::{Dungeon, Enemy, Topic};
pub use equipment::{EquipChange, EquippedItem, InventoryItem, Loadout};
pub use item::{BonusPayload, Item, ItemSlot};
pub use progress::{Stars, TopicProgress, TopicStatus, TopicWithStatus, UserProgress};
pub use question::{AnswerOption, Question};
