//! User profile endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::db::{UpdateUserRequest, User, UserResponse};
use crate::AppState;

use super::auth::hash_password;
use super::error::{ApiError, MessageResponse};
use super::validation::validate_password;

/// Get a user profile
///
/// GET /api/user/:email
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(UserResponse::from(user)))
}

/// Partially update a user profile
///
/// PUT /api/user/:email
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let password_hash = match &req.password {
        Some(password) => {
            validate_password(password).map_err(ApiError::bad_request)?;
            Some(hash_password(password).map_err(|e| {
                tracing::error!("Failed to hash password: {}", e);
                ApiError::internal()
            })?)
        }
        None => None,
    };

    sqlx::query(
        r#"
        UPDATE users SET
            full_name = COALESCE(?, full_name),
            password_hash = COALESCE(?, password_hash),
            remember_me = COALESCE(?, remember_me),
            updated_at = ?
        WHERE email = ?
        "#,
    )
    .bind(&req.full_name)
    .bind(&password_hash)
    .bind(req.remember_me)
    .bind(Utc::now().to_rfc3339())
    .bind(&email)
    .execute(&state.db)
    .await?;

    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully",
        "user": UserResponse::from(user),
    })))
}

/// Delete a user
///
/// DELETE /api/user/:email
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM users WHERE email = ?")
        .bind(&email)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(email = %email, "User deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
