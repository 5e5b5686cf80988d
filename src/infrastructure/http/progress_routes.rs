//! Dungeon progress and star API routes

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::{engine_error, parse_id, ApiError};
use crate::application::dto::{DungeonTopicsResponseDto, StarsResponseDto};
use crate::application::services::ProgressionService;
use crate::domain::entities::UserProgress;
use crate::domain::value_objects::{DungeonId, UserId};
use crate::infrastructure::state::AppState;

fn user_and_dungeon(user_id: &str, dungeon_id: &str) -> Result<(UserId, DungeonId), ApiError> {
    Ok((parse_id(user_id, "User")?, parse_id(dungeon_id, "Dungeon")?))
}

/// Topics of a dungeon with their locked/active/completed status
pub async fn dungeon_topics(
    State(state): State<Arc<AppState>>,
    Path((user_id, dungeon_id)): Path<(String, String)>,
) -> Result<Json<DungeonTopicsResponseDto>, ApiError> {
    let (user_id, dungeon_id) = user_and_dungeon(&user_id, &dungeon_id)?;
    let progression = &state.progression_service;

    let topics = progression
        .dungeon_topics(dungeon_id, user_id)
        .await
        .map_err(engine_error)?;
    let stars = progression
        .dungeon_stars(user_id, dungeon_id)
        .await
        .map_err(engine_error)?;

    Ok(Json(DungeonTopicsResponseDto {
        dungeon_id: dungeon_id.to_string(),
        stars,
        topics,
    }))
}

/// Record that the user has entered a dungeon; repeated calls return the
/// same record
pub async fn enter_dungeon(
    State(state): State<Arc<AppState>>,
    Path((user_id, dungeon_id)): Path<(String, String)>,
) -> Result<Json<UserProgress>, ApiError> {
    let (user_id, dungeon_id) = user_and_dungeon(&user_id, &dungeon_id)?;

    let entry = state
        .progression_service
        .ensure_dungeon_entry(user_id, dungeon_id)
        .await
        .map_err(engine_error)?;

    Ok(Json(entry))
}

pub async fn total_stars(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<StarsResponseDto>, ApiError> {
    let user_id: UserId = parse_id(&user_id, "User")?;

    let total_stars = state
        .progression_service
        .total_stars(user_id)
        .await
        .map_err(engine_error)?;

    Ok(Json(StarsResponseDto { total_stars }))
}
