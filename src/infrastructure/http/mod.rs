//! HTTP REST API routes

mod battle_routes;
mod character_routes;
mod equipment_routes;
mod progress_routes;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use std::sync::Arc;

use crate::application::dto::ErrorResponseDto;
use crate::domain::errors::{EngineError, ErrorKind};
use crate::infrastructure::state::AppState;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponseDto>);

/// Map an engine error onto a status code and its JSON body
pub fn engine_error(err: EngineError) -> ApiError {
    let status = match err.kind() {
        ErrorKind::NotFound
        | ErrorKind::ItemNotOwned
        | ErrorKind::NotEquipped
        | ErrorKind::NoActiveBattle => StatusCode::NOT_FOUND,
        ErrorKind::SessionTerminal | ErrorKind::StoreConflict | ErrorKind::RaceAlreadyTaken => {
            StatusCode::CONFLICT
        }
        ErrorKind::TopicLocked | ErrorKind::LevelTooLow | ErrorKind::RaceMismatch => {
            StatusCode::FORBIDDEN
        }
        ErrorKind::InvalidSlot
        | ErrorKind::SlotMismatch
        | ErrorKind::UnknownAnswer
        | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::EmptyEncounter | ErrorKind::MalformedBonusPayload => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }
    (status, Json(ErrorResponseDto::from(&err)))
}

/// Parse an id taken from the path or body. An id that does not parse names
/// no entity, so it is reported as not found.
pub fn parse_id<T: FromStr>(raw: &str, entity: &'static str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| engine_error(EngineError::not_found(entity, raw)))
}

/// JSON request body. A body that is missing, not JSON or of the wrong shape
/// is rejected with the same error body as every other failure.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection: JsonRejection| {
                engine_error(EngineError::InvalidRequest(rejection.body_text()))
            })
    }
}

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Catalog
        .route("/api/races", get(character_routes::list_races))
        .route(
            "/api/races/{race_id}/dungeons",
            get(character_routes::list_race_dungeons),
        )
        // Characters
        .route(
            "/api/users/{user_id}/characters",
            get(character_routes::list_characters).post(character_routes::create_character),
        )
        .route(
            "/api/users/{user_id}/first-access",
            get(character_routes::first_access),
        )
        .route("/api/characters/{id}", get(character_routes::get_character))
        // Equipment
        .route("/api/characters/{id}/sheet", get(equipment_routes::get_sheet))
        .route(
            "/api/characters/{id}/attributes",
            get(equipment_routes::get_attributes),
        )
        .route(
            "/api/characters/{id}/equipment",
            get(equipment_routes::get_loadout).post(equipment_routes::equip_item),
        )
        .route(
            "/api/characters/{id}/equipment/{equipped_id}",
            delete(equipment_routes::unequip_item),
        )
        // Progress
        .route(
            "/api/users/{user_id}/dungeons/{dungeon_id}/topics",
            get(progress_routes::dungeon_topics),
        )
        .route(
            "/api/users/{user_id}/dungeons/{dungeon_id}/entry",
            post(progress_routes::enter_dungeon),
        )
        .route("/api/users/{user_id}/stars", get(progress_routes::total_stars))
        // Battle
        .route(
            "/api/characters/{id}/battle",
            get(battle_routes::current_battle)
                .post(battle_routes::start_battle)
                .delete(battle_routes::close_battle),
        )
        .route(
            "/api/characters/{id}/battle/answers",
            post(battle_routes::submit_answer),
        )
        .route(
            "/api/characters/{id}/battle/settlement",
            post(battle_routes::settle_battle),
        )
}
