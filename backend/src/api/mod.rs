use axum::routing::{delete, get, post};
use axum::{middleware, Json, Router};
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::auth::TokenKeys;
use crate::config::AppConfig;
use crate::db::Database;

pub mod currency;
pub mod error;
pub mod extract;
pub mod favorites;
pub mod inquiries;
pub mod properties;
pub mod users;
pub mod waves;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenKeys,
}

impl AppState {
    /// Does not touch the store; the pool is opened by the first request
    /// that needs it.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: Database::new(config.database_url.as_str(), config.db_pool_size),
            tokens: TokenKeys::new(&config.jwt_secret, Duration::hours(config.token_ttl_hours)),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/user", get(users::current_user))
        .route("/user/points", get(users::points))
        .route("/properties", get(properties::list).post(properties::create))
        .route("/properties/featured", get(properties::featured))
        .route(
            "/properties/:identifier",
            get(properties::detail).put(properties::update),
        )
        .route("/search-history", get(properties::history))
        .route("/currency-rates", get(currency::list))
        .route("/currency-rates/convert", get(currency::convert))
        .route("/favorites", get(favorites::list).post(favorites::add))
        .route("/favorites/:property_id", delete(favorites::remove))
        .route("/inquiries", post(inquiries::create))
        .route("/waves", get(waves::list));

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            extract::resolve_user,
        ))
        .with_state(state)
}
