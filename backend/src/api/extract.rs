use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::error::ApiError;
use super::AppState;
use crate::db::StoreError;
use crate::models::User;
use crate::repo;

/// The user behind a valid bearer token, attached by [`resolve_user`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Rejects the request with 401 unless a user was resolved.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| AuthUser(current.0.clone()))
            .ok_or(ApiError::Unauthorized("Unauthorized"))
    }
}

/// `axum::Json` with failures rendered as our 400 body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Query` with failures rendered as our 400 body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Attaches the token's user to the request when possible. Missing,
/// invalid or dangling tokens leave the request anonymous; only handlers
/// that demand [`AuthUser`] turn that into a 401.
pub async fn resolve_user(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let user_id = bearer_token(request.headers()).and_then(|token| state.tokens.resolve(token));
    if let Some(user_id) = user_id {
        let lookup = state
            .db
            .run(move |conn| repo::users::find_by_id(conn, &user_id).map_err(StoreError::from))
            .await;
        match lookup {
            Ok(Some(user)) => {
                log::debug!("Authenticated user: {}", user.id);
                request.extensions_mut().insert(CurrentUser(user));
            }
            Ok(None) => log::debug!("Token refers to a user that no longer exists"),
            Err(err) => log::warn!("Could not resolve token user: {}", err),
        }
    }
    next.run(request).await
}
