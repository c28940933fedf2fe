use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use diesel::Connection;
use serde::Deserialize;

use super::error::{ApiError, Required};
use super::extract::{AuthUser, JsonBody};
use super::AppState;
use crate::models::{Favorite, PropertyWithAgent};
use crate::repo;
use crate::repo::activity::Activity;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub property_id: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<PropertyWithAgent>>, ApiError> {
    let properties = state
        .db
        .run(move |conn| Ok::<_, ApiError>(repo::favorites::properties_of(conn, &user.id)?))
        .await?;
    Ok(Json(properties))
}

/// Saves the listing and credits the favorite in one transaction.
pub async fn add(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    let mut required = Required::new();
    let property_id = required.take("propertyId", body.property_id);
    required.finish()?;

    let favorite = state
        .db
        .run(move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                if !repo::properties::exists(conn, &property_id)? {
                    return Err(ApiError::NotFound("Property not found"));
                }
                if repo::favorites::exists(conn, &user.id, &property_id)? {
                    return Err(ApiError::Conflict("Property already in favorites"));
                }
                let favorite = repo::favorites::add(conn, &user.id, &property_id)?;
                repo::activity::record(
                    conn,
                    &user.id,
                    &Activity::FavoriteAdded {
                        property_id: &property_id,
                    },
                )?;
                Ok(favorite)
            })
        })
        .await?;
    log::debug!("User {} favorited {}", favorite.user_id, favorite.property_id);
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(property_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .db
        .run(move |conn| Ok::<_, ApiError>(repo::favorites::remove(conn, &user.id, &property_id)?))
        .await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Favorite not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
