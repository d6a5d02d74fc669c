pub mod auth;
mod buildings;
mod error;
mod events;
mod hotspots;
mod users;
mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::AppState;

use error::ApiError;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Everything else requires a valid bearer token; admin-only handlers
    // additionally take the AdminUser extractor
    let protected_routes = Router::new()
        .route(
            "/user/:email",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/buildings",
            get(buildings::list_buildings).post(buildings::create_building),
        )
        .route(
            "/buildings/:id",
            put(buildings::update_building).delete(buildings::delete_building),
        )
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", delete(events::delete_event))
        .route("/hotspots", post(hotspots::create_hotspot))
        .route(
            "/hotspots/:id",
            put(hotspots::update_hotspot).delete(hotspots::delete_hotspot),
        )
        .route(
            "/hotspots/building/:model_path",
            get(hotspots::list_hotspots).delete(hotspots::delete_building_hotspots),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", public_routes.merge(protected_routes))
        .fallback(endpoint_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.server.cors_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn endpoint_not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use chrono::Utc;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "e2e-test-secret";

    async fn test_app() -> (Router, Arc<AppState>) {
        let pool = db::test_pool().await;
        auth::ensure_admin_user(&pool, "admin@campus.edu", "admin123")
            .await
            .unwrap();
        let state = Arc::new(AppState::new(
            Config::default(),
            TEST_SECRET.to_string(),
            pool,
        ));
        (create_router(state.clone()), state)
    }

    fn request(
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_login_profile_and_role_gate() {
        let (app, state) = test_app().await;

        // Register
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/register",
                None,
                Some(serde_json::json!({ "email": "a@b.com", "password": "pw" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Duplicate registration: one stored user, 400 on the second attempt
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/register",
                None,
                Some(serde_json::json!({ "email": "a@b.com", "password": "other" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = 'a@b.com'")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(count.0, 1);

        // Login and read the profile
        let token = login(&app, "a@b.com", "pw").await;
        let response = app
            .clone()
            .oneshot(request("GET", "/api/user/a@b.com", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let profile = body_json(response).await;
        assert_eq!(profile["email"], "a@b.com");
        assert_eq!(profile["role"], "user");

        // No token: 401 before anything else runs
        let response = app
            .clone()
            .oneshot(request("GET", "/api/user/a@b.com", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Authenticated but not admin: 403
        let building = serde_json::json!({ "name": "Library", "description": "Main library" });
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/buildings",
                Some(&token),
                Some(building.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Admin: 201
        let admin_token = login(&app, "admin@campus.edu", "admin123").await;
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/buildings",
                Some(&admin_token),
                Some(building),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (app, _state) = test_app().await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/login",
                None,
                Some(serde_json::json!({ "email": "admin@campus.edu", "password": "wrong" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/login",
                None,
                Some(serde_json::json!({ "email": "nobody@campus.edu", "password": "pw" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let (app, state) = test_app().await;

        let user: crate::db::User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind("admin@campus.edu")
            .fetch_one(&state.db)
            .await
            .unwrap();

        // Issued 61 minutes ago, expired one minute ago
        let issued_at = Utc::now().timestamp() - auth::TOKEN_TTL_SECS - 60;
        let claims = auth::Claims::new(&user, issued_at);
        let stale = auth::issue_token(TEST_SECRET, &claims).unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", "/api/buildings", Some(&stale), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let (app, state) = test_app().await;

        let user: crate::db::User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind("admin@campus.edu")
            .fetch_one(&state.db)
            .await
            .unwrap();

        let claims = auth::Claims::new(&user, Utc::now().timestamp());
        let forged = auth::issue_token("some-other-secret", &claims).unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", "/api/buildings", Some(&forged), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_building_delete_cascades_hotspots() {
        let (app, state) = test_app().await;
        let admin_token = login(&app, "admin@campus.edu", "admin123").await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/buildings",
                Some(&admin_token),
                Some(serde_json::json!({
                    "name": "Library",
                    "description": "Main library",
                    "modelPath": "models/library.glb",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let building_id = body_json(response).await["id"].as_str().unwrap().to_string();

        for i in 0..3 {
            let response = app
                .clone()
                .oneshot(request(
                    "POST",
                    "/api/hotspots",
                    Some(&admin_token),
                    Some(serde_json::json!({
                        "buildingModel": "models/library.glb",
                        "position": { "x": i as f64, "y": 0.0, "z": 1.5 },
                        "content": "entrance",
                    })),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        // A hotspot on a different model must survive the cascade
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/hotspots",
                Some(&admin_token),
                Some(serde_json::json!({
                    "buildingModel": "models/gym.glb",
                    "position": { "x": 1.0, "y": 2.0, "z": 3.0 },
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("/api/buildings/{}", building_id),
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM hotspots WHERE building_model = ?")
                .bind("models/library.glb")
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(count.0, 0);

        let survivors: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM hotspots WHERE building_model = ?")
                .bind("models/gym.glb")
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(survivors.0, 1);
    }

    #[tokio::test]
    async fn test_hotspot_position_must_be_complete() {
        let (app, _state) = test_app().await;
        let admin_token = login(&app, "admin@campus.edu", "admin123").await;

        // Missing z coordinate
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/hotspots",
                Some(&admin_token),
                Some(serde_json::json!({
                    "buildingModel": "models/library.glb",
                    "position": { "x": 1.0, "y": 2.0 },
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // All-zero position is valid
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/hotspots",
                Some(&admin_token),
                Some(serde_json::json!({
                    "buildingModel": "models/library.glb",
                    "position": { "x": 0.0, "y": 0.0, "z": 0.0 },
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_profile_update_rehashes_password() {
        let (app, _state) = test_app().await;

        app.clone()
            .oneshot(request(
                "POST",
                "/api/register",
                None,
                Some(serde_json::json!({ "email": "a@b.com", "password": "old-pw" })),
            ))
            .await
            .unwrap();
        let token = login(&app, "a@b.com", "old-pw").await;

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                "/api/user/a@b.com",
                Some(&token),
                Some(serde_json::json!({ "password": "new-pw", "fullName": "Ada" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Old password no longer works, new one does
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/login",
                None,
                Some(serde_json::json!({ "email": "a@b.com", "password": "old-pw" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let _ = login(&app, "a@b.com", "new-pw").await;
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404_message() {
        let (app, _state) = test_app().await;

        let response = app
            .clone()
            .oneshot(request("GET", "/api/does-not-exist", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Endpoint not found");
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _state) = test_app().await;

        let response = app
            .clone()
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
