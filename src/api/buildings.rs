//! Building endpoints.
//!
//! Deleting a building also deletes the hotspots anchored to its model path.
//! The two statements are not transactional: a crash in between can leave
//! orphaned hotspots (best-effort cascade).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Building, CreateBuildingRequest, UpdateBuildingRequest};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ApiError, MessageResponse};

/// List all buildings
///
/// GET /api/buildings
pub async fn list_buildings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Building>>, ApiError> {
    let buildings: Vec<Building> =
        sqlx::query_as("SELECT * FROM buildings ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(buildings))
}

/// Add a building (admin only)
///
/// POST /api/buildings
pub async fn create_building(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<CreateBuildingRequest>,
) -> Result<(StatusCode, Json<Building>), ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::bad_request("Building name is required"));
    }
    if req.description.is_empty() {
        return Err(ApiError::bad_request("Building description is required"));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO buildings (id, name, description, model_path, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.model_path)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let building: Building = sqlx::query_as("SELECT * FROM buildings WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(name = %building.name, "Building created");
    Ok((StatusCode::CREATED, Json(building)))
}

/// Update a building (admin only)
///
/// PUT /api/buildings/:id
pub async fn update_building(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateBuildingRequest>,
) -> Result<Json<Building>, ApiError> {
    let existing: Option<Building> = sqlx::query_as("SELECT * FROM buildings WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Building not found"));
    }

    sqlx::query(
        r#"
        UPDATE buildings SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            model_path = COALESCE(?, model_path),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.model_path)
    .bind(Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    let building: Building = sqlx::query_as("SELECT * FROM buildings WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(building))
}

/// Delete a building and its hotspots (admin only)
///
/// DELETE /api/buildings/:id
pub async fn delete_building(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let building: Option<Building> = sqlx::query_as("SELECT * FROM buildings WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    let building = building.ok_or_else(|| ApiError::not_found("Building not found"))?;

    sqlx::query("DELETE FROM buildings WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    // Cascade: remove hotspots anchored to this building's model path
    if let Some(model_path) = &building.model_path {
        let removed = sqlx::query("DELETE FROM hotspots WHERE building_model = ?")
            .bind(model_path)
            .execute(&state.db)
            .await?;
        tracing::info!(
            name = %building.name,
            hotspots = removed.rows_affected(),
            "Building deleted with hotspot cascade"
        );
    } else {
        tracing::info!(name = %building.name, "Building deleted");
    }

    Ok(Json(MessageResponse::new("Building deleted successfully")))
}
