//! Battle API routes
//!
//! At most one battle per character. Starting a new one discards the old.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{engine_error, parse_id, ApiError, JsonBody};
use crate::application::dto::{AnswerRequestDto, StartBattleRequestDto};
use crate::application::services::{AnswerReport, BattleService, Settlement};
use crate::domain::aggregates::BattleSnapshot;
use crate::domain::value_objects::{CharacterId, TopicId};
use crate::infrastructure::state::AppState;

pub async fn start_battle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<StartBattleRequestDto>,
) -> Result<(StatusCode, Json<BattleSnapshot>), ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;
    let topic_id: TopicId = parse_id(&req.topic_id, "Topic")?;

    let snapshot = state
        .battle_service
        .start_battle(id, topic_id)
        .await
        .map_err(engine_error)?;

    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn current_battle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BattleSnapshot>, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;

    let snapshot = state
        .battle_service
        .current_battle(id)
        .await
        .map_err(engine_error)?;

    Ok(Json(snapshot))
}

/// Submit an answer to the current question
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<AnswerRequestDto>,
) -> Result<Json<AnswerReport>, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;

    let report = state
        .battle_service
        .submit_answer(id, req.into())
        .await
        .map_err(engine_error)?;

    Ok(Json(report))
}

/// Retry writing back a won battle. `null` when the battle was not won.
pub async fn settle_battle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Option<Settlement>>, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;

    let settlement = state
        .battle_service
        .settle_battle(id)
        .await
        .map_err(engine_error)?;

    Ok(Json(settlement))
}

pub async fn close_battle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;

    state
        .battle_service
        .close_battle(id)
        .await
        .map_err(engine_error)?;

    Ok(StatusCode::NO_CONTENT)
}
