use axum::extract::State;
use axum::Json;

use super::error::ApiError;
use super::AppState;
use crate::models::WaveUsage;
use crate::repo;

/// Active waves with how many listings each holds and has room for.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<WaveUsage>>, ApiError> {
    let waves = state
        .db
        .run(|conn| Ok::<_, ApiError>(repo::waves::active_with_usage(conn)?))
        .await?;
    Ok(Json(waves))
}
