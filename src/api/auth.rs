//! Authentication and authorization.
//!
//! Three pieces live here: the credential hasher (Argon2), the session token
//! codec (HS256 JWTs carrying id/email/role, valid for one hour), and the
//! access guard (bearer-token middleware plus an admin extractor). The
//! register/login handlers and the startup admin bootstrap sit on top.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{LoginRequest, LoginResponse, RegisterRequest, Role, User, UserResponse};
use crate::AppState;

use super::error::{ApiError, MessageResponse};
use super::validation::{validate_email, validate_password};

/// Session tokens are valid for exactly one hour from issuance.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random signing secret (32 bytes, hex-encoded)
pub fn generate_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Identity and role payload embedded in a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp), one hour after `iat`
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &User, issued_at: i64) -> Self {
        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Sign claims into a self-contained session token.
pub fn issue_token(secret: &str, claims: &Claims) -> anyhow::Result<String> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verify a session token's signature and expiry.
///
/// Zero leeway: a token is rejected from the first second past its embedded
/// expiry.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    Ok(data.claims)
}

/// Extract a bearer token from the Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Authentication middleware.
///
/// Absent token or failed verification both reject with 401; the client is
/// never told which. On success the decoded claims are attached to the
/// request extensions for downstream handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?
        .to_string();

    let claims = verify_token(&state.jwt_secret, &token)
        .map_err(|_| ApiError::unauthorized("Invalid token"))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extractor that gates a handler on the admin role.
///
/// Runs after `auth_middleware`, so the claims are already verified; a
/// non-admin role rejects with 403.
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

        match claims.role {
            Role::Admin => Ok(AdminUser(claims)),
            Role::User => Err(ApiError::forbidden("Admin access required")),
        }
    }
}

/// Register a new user
///
/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    validate_email(&req.email).map_err(ApiError::bad_request)?;
    validate_password(&req.password).map_err(ApiError::bad_request)?;

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal()
    })?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, full_name, password_hash, role, remember_me, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.email)
    .bind(&req.full_name)
    .bind(&password_hash)
    .bind(req.role.unwrap_or_default())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        // The unique index catches concurrent registrations the pre-check missed
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::bad_request("User already exists")
        } else {
            tracing::error!("Failed to create user: {}", e);
            ApiError::internal()
        }
    })?;

    tracing::info!(email = %req.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// Log in with email and password
///
/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;

    // Unknown email and wrong password are indistinguishable to the client
    let mut user = user.ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::bad_request("Invalid credentials"));
    }

    let remember_me = req.remember_me.unwrap_or(false);
    sqlx::query("UPDATE users SET remember_me = ?, updated_at = ? WHERE id = ?")
        .bind(remember_me)
        .bind(Utc::now().to_rfc3339())
        .bind(&user.id)
        .execute(&state.db)
        .await?;
    user.remember_me = remember_me;

    let claims = Claims::new(&user, Utc::now().timestamp());
    let token = issue_token(&state.jwt_secret, &claims).map_err(|e| {
        tracing::error!("Failed to issue token: {}", e);
        ApiError::internal()
    })?;

    tracing::info!(email = %user.email, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: UserResponse::from(user),
    }))
}

/// Ensure the default administrator account exists.
///
/// Runs once at startup; creating the account when absent and leaving an
/// existing one untouched makes repeated runs converge on exactly one admin
/// row for the configured email.
pub async fn ensure_admin_user(
    pool: &crate::DbPool,
    admin_email: &str,
    admin_password: &str,
) -> anyhow::Result<()> {
    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(admin_email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        tracing::info!(email = %admin_email, "Admin user already exists");
        return Ok(());
    }

    let password_hash = hash_password(admin_password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, full_name, password_hash, role, remember_me, created_at, updated_at)
        VALUES (?, ?, 'Admin', ?, 'admin', 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(admin_email)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    tracing::info!(email = %admin_email, "Default admin created");
    Ok(())
}
