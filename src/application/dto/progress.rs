use serde::Serialize;

use crate::domain::entities::TopicWithStatus;

#[derive(Debug, Clone, Serialize)]
pub struct DungeonTopicsResponseDto {
    pub dungeon_id: String,
    /// Stars earned across the dungeon's topics
    pub stars: u32,
    pub topics: Vec<TopicWithStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StarsResponseDto {
    pub total_stars: u32,
}
