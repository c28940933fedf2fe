use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{ApiError, Required};
use super::extract::{AuthUser, JsonBody};
use super::AppState;
use crate::auth::{hash_password, verify_login};
use crate::db::StoreError;
use crate::models::{new_id, CustomerPoints, NewUser, Role, User};
use crate::repo;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Runs CPU-heavy work such as bcrypt without holding a store connection.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f)
        .await
        .map_err(StoreError::from)?)
}

/// Self-registration may ask for any role; anything above a plain user is
/// logged so operators can spot it.
fn requested_role(role: Option<Role>) -> Role {
    let role = role.unwrap_or_default();
    if role != Role::User {
        log::warn!("Registration requested elevated role {}", role);
    }
    role
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut required = Required::new();
    let username = required.take("username", body.username);
    let email = required.take("email", body.email);
    let password = required.take("password", body.password);
    required.finish()?;

    let (username, email) = (username.trim().to_owned(), email.trim().to_owned());
    let role = requested_role(body.role);

    let (taken_username, taken_email) = (username.clone(), email.clone());
    let taken = state
        .db
        .run(move |conn| {
            Ok::<_, ApiError>(repo::users::username_or_email_taken(
                conn,
                &taken_username,
                &taken_email,
            )?)
        })
        .await?;
    if taken {
        return Err(ApiError::Conflict("User already exists"));
    }

    // Hashing stays off the pooled connection; a racing duplicate still
    // trips the unique indexes and maps to 409.
    let hash = blocking(move || hash_password(&password)).await??;
    let user = state
        .db
        .run(move |conn| {
            let id = new_id();
            Ok::<_, ApiError>(repo::users::create(
                conn,
                &NewUser {
                    id: &id,
                    username: &username,
                    email: &email,
                    password: &hash,
                    role,
                    first_name: body.first_name.as_deref(),
                    last_name: body.last_name.as_deref(),
                    phone: body.phone.as_deref(),
                    allowed_languages: vec!["en".to_owned()],
                },
            )?)
        })
        .await?;

    log::info!("Registered user {} ({})", user.username, user.id);
    let token = state.tokens.issue(&user.id)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut required = Required::new();
    let email = required.take("email", body.email);
    let password = required.take("password", body.password);
    required.finish()?;

    let user = state
        .db
        .run(move |conn| Ok::<_, ApiError>(repo::users::find_by_email(conn, email.trim())?))
        .await?;
    // Unknown email and wrong password must look the same, timing included.
    let user = blocking(move || {
        let valid = verify_login(&password, user.as_ref().map(|u| u.password.as_str()));
        user.filter(|_| valid)
    })
    .await?
    .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

    let token = state.tokens.issue(&user.id)?;
    Ok(Json(AuthResponse { user, token }))
}

/// Tokens are stateless; the client simply forgets its token.
pub async fn logout() -> Json<Value> {
    Json(json!({"message": "Logged out successfully"}))
}

pub async fn current_user(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

pub async fn points(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CustomerPoints>, ApiError> {
    let points = state
        .db
        .run(move |conn| {
            Ok::<_, ApiError>(
                repo::activity::points_of(conn, &user.id)?
                    .unwrap_or_else(|| CustomerPoints::empty(&user.id)),
            )
        })
        .await?;
    Ok(Json(points))
}
