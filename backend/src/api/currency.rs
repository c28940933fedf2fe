use axum::extract::State;
use axum::Json;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, Required};
use super::extract::QueryParams;
use super::AppState;
use crate::models::CurrencyRate;
use crate::repo;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CurrencyRate>>, ApiError> {
    let rates = state
        .db
        .run(|conn| Ok::<_, ApiError>(repo::currency::active(conn)?))
        .await?;
    Ok(Json(rates))
}

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub rate: BigDecimal,
    pub amount: BigDecimal,
    pub converted: BigDecimal,
}

pub async fn convert(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ConvertParams>,
) -> Result<Json<Conversion>, ApiError> {
    let mut required = Required::new();
    let from = required.take("from", params.from);
    let to = required.take("to", params.to);
    let amount = required.take("amount", params.amount);
    required.finish()?;

    let amount: BigDecimal = amount
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid amount: {amount}")))?;
    if amount < BigDecimal::zero() {
        return Err(ApiError::BadRequest("amount must not be negative".into()));
    }
    let (from, to) = (from.trim().to_uppercase(), to.trim().to_uppercase());

    let (from, to, rate) = state
        .db
        .run(move |conn| {
            let rate = repo::currency::conversion_rate(conn, &from, &to)?;
            Ok::<_, ApiError>((from, to, rate))
        })
        .await?;
    let rate = rate.ok_or(ApiError::NotFound("Exchange rate not found"))?;
    let converted = (&amount * &rate).round(4);
    Ok(Json(Conversion {
        from,
        to,
        rate,
        amount,
        converted,
    }))
}
