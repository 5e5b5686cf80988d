//! Equipment and character sheet API routes

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::{engine_error, parse_id, ApiError, JsonBody};
use crate::application::dto::{CharacterSheetResponseDto, EquipRequestDto, LoadoutResponseDto};
use crate::application::services::EquipmentService;
use crate::domain::entities::ItemSlot;
use crate::domain::value_objects::{AttributeSet, CharacterId, EquippedItemId, ItemId};
use crate::infrastructure::state::AppState;

/// Character with its effective attributes, equipped set and inventory
pub async fn get_sheet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CharacterSheetResponseDto>, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;

    let sheet = state
        .equipment_service
        .character_sheet(id)
        .await
        .map_err(engine_error)?;

    Ok(Json(CharacterSheetResponseDto::from(sheet)))
}

/// Effective attributes from the equipped set
pub async fn get_attributes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AttributeSet>, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;

    let attributes = state
        .equipment_service
        .attributes(id)
        .await
        .map_err(engine_error)?;

    Ok(Json(attributes))
}

pub async fn get_loadout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LoadoutResponseDto>, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;

    let loadout = state
        .equipment_service
        .loadout(id)
        .await
        .map_err(engine_error)?;

    Ok(Json(LoadoutResponseDto::from(loadout)))
}

/// Equip an owned item, displacing whatever occupied the slot
pub async fn equip_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<EquipRequestDto>,
) -> Result<Json<LoadoutResponseDto>, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;
    let slot: ItemSlot = req.slot.parse().map_err(engine_error)?;
    let item_id: ItemId = parse_id(&req.item_id, "Item")?;

    let loadout = state
        .equipment_service
        .equip(id, item_id, slot)
        .await
        .map_err(engine_error)?;

    Ok(Json(LoadoutResponseDto::from(loadout)))
}

pub async fn unequip_item(
    State(state): State<Arc<AppState>>,
    Path((id, equipped_id)): Path<(String, String)>,
) -> Result<Json<LoadoutResponseDto>, ApiError> {
    let id: CharacterId = parse_id(&id, "Character")?;
    let equipped_id: EquippedItemId = parse_id(&equipped_id, "EquippedItem")?;

    let loadout = state
        .equipment_service
        .unequip(id, equipped_id)
        .await
        .map_err(engine_error)?;

    Ok(Json(LoadoutResponseDto::from(loadout)))
}
