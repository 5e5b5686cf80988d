//! Race, dungeon listing and character API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{engine_error, parse_id, ApiError, JsonBody};
use crate::application::dto::{
    CharacterCreatedResponseDto, CharacterResponseDto, CreateCharacterRequestDto,
    DungeonResponseDto, FirstAccessResponseDto, RaceResponseDto,
};
use crate::application::services::CharacterService;
use crate::domain::value_objects::{CharacterId, RaceId, UserId};
use crate::infrastructure::state::AppState;

/// List all playable races
pub async fn list_races(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RaceResponseDto>>, ApiError> {
    let races = state
        .character_service
        .list_races()
        .await
        .map_err(engine_error)?;

    Ok(Json(races.into_iter().map(RaceResponseDto::from).collect()))
}

/// List a race's dungeons, lowest level first
pub async fn list_race_dungeons(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<String>,
) -> Result<Json<Vec<DungeonResponseDto>>, ApiError> {
    let race_id: RaceId = parse_id(&race_id, "Race")?;

    let dungeons = state
        .character_service
        .list_dungeons_for_race(race_id)
        .await
        .map_err(engine_error)?;

    Ok(Json(dungeons.into_iter().map(DungeonResponseDto::from).collect()))
}

pub async fn list_characters(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CharacterResponseDto>>, ApiError> {
    let user_id: UserId = parse_id(&user_id, "User")?;

    let characters = state
        .character_service
        .list_characters(user_id)
        .await
        .map_err(engine_error)?;

    Ok(Json(characters.into_iter().map(CharacterResponseDto::from).collect()))
}

/// Create a character. The user's first character also enters the first
/// dungeon of its race.
pub async fn create_character(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    JsonBody(req): JsonBody<CreateCharacterRequestDto>,
) -> Result<(StatusCode, Json<CharacterCreatedResponseDto>), ApiError> {
    let user_id: UserId = parse_id(&user_id, "User")?;
    let race_id = RaceId::new(req.race_id);
    let service = &state.character_service;

    let first = service.is_first_access(user_id).await.map_err(engine_error)?;
    let created = if first {
        service
            .create_first_character(user_id, race_id)
            .await
            .map(CharacterCreatedResponseDto::from)
    } else {
        service
            .create_character(user_id, race_id)
            .await
            .map(CharacterCreatedResponseDto::from)
    }
    .map_err(engine_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn first_access(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<FirstAccessResponseDto>, ApiError> {
    let user_id: UserId = parse_id(&user_id, "User")?;

    let first_access = state
        .character_service
        .is_first_access(user_id)
        .await
        .map_err(engine_error)?;

    Ok(Json(FirstAccessResponseDto { first_access }))
}

pub async fn get_character(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CharacterResponseDto>, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;

    let character = state
        .character_service
        .get_character(id)
        .await
        .map_err(engine_error)?;

    Ok(Json(CharacterResponseDto::from(character)))
}
