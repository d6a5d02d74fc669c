//! Hotspot endpoints.
//!
//! Hotspots are keyed by the owning building's model path (a plain string,
//! not a row reference). Positions require all three coordinates; presence is
//! checked by definedness, so zero is a valid coordinate.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    CreateHotspotRequest, Hotspot, HotspotResponse, Position, PositionInput, UpdateHotspotRequest,
};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ApiError, MessageResponse};

/// Require all three coordinates to be present.
fn validate_position(position: &PositionInput) -> Result<Position, ApiError> {
    match (position.x, position.y, position.z) {
        (Some(x), Some(y), Some(z)) => Ok(Position { x, y, z }),
        _ => Err(ApiError::bad_request("Invalid position data")),
    }
}

/// List hotspots for a building's model path
///
/// GET /api/hotspots/building/:model_path
pub async fn list_hotspots(
    State(state): State<Arc<AppState>>,
    Path(model_path): Path<String>,
) -> Result<Json<Vec<HotspotResponse>>, ApiError> {
    let hotspots: Vec<Hotspot> =
        sqlx::query_as("SELECT * FROM hotspots WHERE building_model = ? ORDER BY created_at ASC")
            .bind(&model_path)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(hotspots.into_iter().map(HotspotResponse::from).collect()))
}

/// Add a hotspot (admin only)
///
/// POST /api/hotspots
pub async fn create_hotspot(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<CreateHotspotRequest>,
) -> Result<(StatusCode, Json<HotspotResponse>), ApiError> {
    let building_model = match req.building_model {
        Some(ref m) if !m.is_empty() => m.clone(),
        _ => return Err(ApiError::bad_request("Invalid hotspot data")),
    };
    let position = match req.position {
        Some(ref p) => validate_position(p)?,
        None => return Err(ApiError::bad_request("Invalid hotspot data")),
    };

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO hotspots (id, building_model, x, y, z, content, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&building_model)
    .bind(position.x)
    .bind(position.y)
    .bind(position.z)
    .bind(&req.content)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let hotspot: Hotspot = sqlx::query_as("SELECT * FROM hotspots WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(building_model = %building_model, "Hotspot created");
    Ok((StatusCode::CREATED, Json(HotspotResponse::from(hotspot))))
}

/// Update a hotspot (admin only)
///
/// PUT /api/hotspots/:id
pub async fn update_hotspot(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateHotspotRequest>,
) -> Result<Json<HotspotResponse>, ApiError> {
    let existing: Option<Hotspot> = sqlx::query_as("SELECT * FROM hotspots WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Hotspot not found"));
    }

    let position = match req.position {
        Some(ref p) => Some(validate_position(p)?),
        None => None,
    };

    sqlx::query(
        r#"
        UPDATE hotspots SET
            x = COALESCE(?, x),
            y = COALESCE(?, y),
            z = COALESCE(?, z),
            content = COALESCE(?, content)
        WHERE id = ?
        "#,
    )
    .bind(position.map(|p| p.x))
    .bind(position.map(|p| p.y))
    .bind(position.map(|p| p.z))
    .bind(&req.content)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let hotspot: Hotspot = sqlx::query_as("SELECT * FROM hotspots WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(HotspotResponse::from(hotspot)))
}

/// Delete a hotspot (admin only)
///
/// DELETE /api/hotspots/:id
pub async fn delete_hotspot(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM hotspots WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Hotspot not found"));
    }

    Ok(Json(MessageResponse::new("Hotspot deleted successfully")))
}

/// Delete all hotspots for a building's model path (admin only)
///
/// DELETE /api/hotspots/building/:model_path
pub async fn delete_building_hotspots(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(model_path): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = sqlx::query("DELETE FROM hotspots WHERE building_model = ?")
        .bind(&model_path)
        .execute(&state.db)
        .await?;

    tracing::info!(
        building_model = %model_path,
        hotspots = removed.rows_affected(),
        "Hotspots deleted for model"
    );
    Ok(Json(MessageResponse::new(
        "All hotspots deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_a_valid_coordinate() {
        let input = PositionInput {
            x: Some(0.0),
            y: Some(0.0),
            z: Some(0.0),
        };
        let position = validate_position(&input).unwrap();
        assert_eq!(position.x, 0.0);
        assert_eq!(position.y, 0.0);
        assert_eq!(position.z, 0.0);
    }

    #[test]
    fn test_missing_coordinate_is_rejected() {
        let input = PositionInput {
            x: Some(1.0),
            y: None,
            z: Some(3.0),
        };
        assert!(validate_position(&input).is_err());
    }

    #[test]
    fn test_negative_coordinates_are_valid() {
        let input = PositionInput {
            x: Some(-12.5),
            y: Some(4.0),
            z: Some(-0.25),
        };
        assert!(validate_position(&input).is_ok());
    }
}
