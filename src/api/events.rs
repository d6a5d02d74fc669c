//! Event endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{CreateEventRequest, Event};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ApiError, MessageResponse};
use super::validation::validate_event_date;

/// List all events
///
/// GET /api/events
pub async fn list_events(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Event>>, ApiError> {
    let events: Vec<Event> = sqlx::query_as("SELECT * FROM events ORDER BY date ASC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(events))
}

/// Add an event (admin only)
///
/// POST /api/events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::bad_request("Event name is required"));
    }
    validate_event_date(&req.date).map_err(ApiError::bad_request)?;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO events (id, name, date, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&req.name)
        .bind(&req.date)
        .bind(&now)
        .execute(&state.db)
        .await?;

    let event: Event = sqlx::query_as("SELECT * FROM events WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(name = %event.name, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

/// Delete an event (admin only)
///
/// DELETE /api/events/:id
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Event not found"));
    }

    Ok(Json(MessageResponse::new("Event deleted successfully")))
}
