//! Mapping administration and sensor state handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use ekey_core::{MappingError, MappingSummary, MappingTable};

use crate::auth::Authorized;
use crate::error::ApiError;
use crate::sensors::EntityState;
use crate::state::AppState;

/// GET /api/mapping - Summary of the installed mapping
#[utoipa::path(
    get,
    path = "/api/mapping",
    tag = "Admin",
    responses(
        (status = 200, description = "Installed mapping", body = MappingSummary),
        (status = 401, description = "Token configured but no Bearer header sent"),
        (status = 403, description = "Wrong token")
    )
)]
pub async fn get_mapping_handler(
    _auth: Authorized,
    State(state): State<AppState>,
) -> Json<MappingSummary> {
    Json(state.bridge.mapping().await.summary())
}

/// PUT /api/mapping - Install a new mapping export
///
/// The body is the JSON export of the ekey user and device lists. It is
/// validated completely before the swap; on error the installed table stays.
#[utoipa::path(
    put,
    path = "/api/mapping",
    tag = "Admin",
    request_body(
        content_type = "application/json",
        description = "Mapping export: {\"system\", \"users\": [{\"userId\", \"userName\"}], \"devices\": [{\"deviceId\", \"deviceName\"}]}"
    ),
    responses(
        (status = 200, description = "Mapping installed", body = MappingSummary),
        (status = 400, description = "Invalid export (INVALID_JSON, INVALID_MAPPING_STRUCTURE, MISSING_REQUIRED_FIELDS)"),
        (status = 401, description = "Token configured but no Bearer header sent"),
        (status = 403, description = "Wrong token")
    )
)]
pub async fn put_mapping_handler(
    _auth: Authorized,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MappingSummary>, ApiError> {
    let value = serde_json::from_slice(&body).map_err(MappingError::from)?;
    let mapping = MappingTable::from_value(value)?;
    Ok(Json(state.bridge.replace_mapping(mapping).await))
}

/// DELETE /api/mapping - Clear the mapping
///
/// Ids are published raw afterwards and all sensors are removed.
#[utoipa::path(
    delete,
    path = "/api/mapping",
    tag = "Admin",
    responses(
        (status = 200, description = "Mapping cleared", body = MappingSummary),
        (status = 401, description = "Token configured but no Bearer header sent"),
        (status = 403, description = "Wrong token")
    )
)]
pub async fn delete_mapping_handler(
    _auth: Authorized,
    State(state): State<AppState>,
) -> Json<MappingSummary> {
    Json(state.bridge.replace_mapping(MappingTable::empty()).await)
}

/// GET /api/states - Every sensor of every mapped user
#[utoipa::path(
    get,
    path = "/api/states",
    tag = "Admin",
    responses(
        (status = 200, description = "All entity states", body = [EntityState]),
        (status = 401, description = "Token configured but no Bearer header sent"),
        (status = 403, description = "Wrong token")
    )
)]
pub async fn list_states_handler(
    _auth: Authorized,
    State(state): State<AppState>,
) -> Json<Vec<EntityState>> {
    Json(state.hub.sensors().states())
}

/// GET /api/states/{entity_id} - One sensor
#[utoipa::path(
    get,
    path = "/api/states/{entity_id}",
    tag = "Admin",
    params(
        ("entity_id" = String, Path, description = "Entity id, e.g. sensor.mandi_last_result")
    ),
    responses(
        (status = 200, description = "Entity state", body = EntityState),
        (status = 404, description = "No such entity"),
        (status = 401, description = "Token configured but no Bearer header sent"),
        (status = 403, description = "Wrong token")
    )
)]
pub async fn get_state_handler(
    _auth: Authorized,
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<EntityState>, ApiError> {
    state
        .hub
        .sensors()
        .state(&entity_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Entity '{entity_id}' does not exist")))
}
