use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use diesel::Connection;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, Required};
use super::extract::{AuthUser, JsonBody, QueryParams};
use super::AppState;
use crate::models::{
    new_id, Language, ListingType, NewProperty, PropertyChanges, PropertyStatus, PropertyType,
    PropertyWithAgent, SearchHistory,
};
use crate::repo;
use crate::search::{ListingParams, ListingQuery, Pagination};

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub properties: Vec<PropertyWithAgent>,
    pub pagination: Pagination,
}

pub async fn list(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    QueryParams(params): QueryParams<ListingParams>,
) -> Result<Json<ListingResponse>, ApiError> {
    let query = ListingQuery::try_from(params).map_err(ApiError::BadRequest)?;
    let (page, limit) = (query.page, query.limit);
    let filter = query.filter.clone();

    let (properties, total) = state
        .db
        .run(move |conn| Ok::<_, ApiError>(repo::properties::search(conn, &query)?))
        .await?;

    if let Some(AuthUser(user)) = user.filter(|_| !filter.is_empty()) {
        let recorded = state
            .db
            .run(move |conn| {
                repo::search_history::record(conn, &user.id, &filter, total).map_err(ApiError::from)
            })
            .await;
        if let Err(err) = recorded {
            log::warn!("Failed to record search history: {}", err);
        }
    }

    Ok(Json(ListingResponse {
        properties,
        pagination: Pagination::new(page, limit, total),
    }))
}

pub async fn featured(
    State(state): State<AppState>,
) -> Result<Json<Vec<PropertyWithAgent>>, ApiError> {
    let properties = state
        .db
        .run(|conn| Ok::<_, ApiError>(repo::properties::featured(conn)?))
        .await?;
    Ok(Json(properties))
}

/// Detail by id or slug. Counts the view, but answers with the row as it
/// was read.
pub async fn detail(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<PropertyWithAgent>, ApiError> {
    let property = state
        .db
        .run(move |conn| {
            let property = repo::properties::find_by_identifier(conn, &identifier)?
                .ok_or(ApiError::NotFound("Property not found"))?;
            if let Err(err) = repo::properties::increment_views(conn, &property.id) {
                log::warn!("Failed to count view of {}: {}", property.id, err);
            }
            Ok::<_, ApiError>(repo::properties::with_agent(conn, property)?)
        })
        .await?;
    Ok(Json(property))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub listing_type: Option<String>,
    pub price: Option<BigDecimal>,
    pub currency: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<i32>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub language: Option<Language>,
    pub contact_phone: Option<String>,
    pub wave_id: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

fn parse_kind<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid value for {name}: {value}")))
}

fn non_negative(name: &str, value: Option<i32>) -> Result<(), ApiError> {
    match value {
        Some(v) if v < 0 => Err(ApiError::BadRequest(format!("{name} must not be negative"))),
        _ => Ok(()),
    }
}

impl CreatePropertyRequest {
    fn into_new_property(self, agent_id: &str) -> Result<NewProperty, ApiError> {
        let mut required = Required::new();
        let title = required.take("title", self.title);
        let property_type = required.take("type", self.property_type);
        let listing_type = required.take("listingType", self.listing_type);
        let price = required.take("price", self.price);
        let address = required.take("address", self.address);
        let city = required.take("city", self.city);
        let country = required.take("country", self.country);
        required.finish()?;

        let property_type: PropertyType = parse_kind("type", &property_type)?;
        let listing_type: ListingType = parse_kind("listingType", &listing_type)?;
        if price < BigDecimal::zero() {
            return Err(ApiError::BadRequest("price must not be negative".into()));
        }
        non_negative("bedrooms", self.bedrooms)?;
        non_negative("bathrooms", self.bathrooms)?;
        non_negative("area", self.area)?;

        let id = new_id();
        let slug = repo::properties::slug_for(&title, &id);
        Ok(NewProperty {
            id,
            title: title.trim().to_owned(),
            description: self.description.unwrap_or_default(),
            property_type,
            listing_type,
            price,
            currency: self
                .currency
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "USD".to_owned()),
            bedrooms: self.bedrooms.unwrap_or_default(),
            bathrooms: self.bathrooms.unwrap_or_default(),
            area: self.area,
            address,
            city: city.trim().to_owned(),
            country: country.trim().to_owned(),
            latitude: self.latitude,
            longitude: self.longitude,
            images: self.images,
            amenities: self.amenities,
            features: self.features,
            status: PropertyStatus::Active,
            language: self.language.unwrap_or_default(),
            agent_id: Some(agent_id.to_owned()),
            contact_phone: self.contact_phone,
            wave_id: self.wave_id.filter(|w| !w.trim().is_empty()),
            is_featured: self.is_featured,
            slug: Some(slug),
        })
    }
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<PropertyWithAgent>), ApiError> {
    let new_property = body.into_new_property(&user.id)?;
    let property = state
        .db
        .run(move |conn| {
            let created = conn.transaction::<_, ApiError, _>(|conn| {
                if let Some(wave_id) = new_property.wave_id.as_deref() {
                    check_wave_capacity(conn, &user.id, wave_id)?;
                }
                Ok(repo::properties::create(conn, &new_property)?)
            })?;
            Ok::<_, ApiError>(repo::properties::with_agent(conn, created)?)
        })
        .await?;
    log::info!("Listed property {} ({:?})", property.property.id, property.property.slug);
    Ok((StatusCode::CREATED, Json(property)))
}

/// The wave must be live, granted to the agent, and not yet full. The wave
/// row stays locked until the surrounding transaction ends so two agents
/// cannot take the last slot together.
fn check_wave_capacity(
    conn: &mut diesel::PgConnection,
    agent_id: &str,
    wave_id: &str,
) -> Result<(), ApiError> {
    let wave = repo::waves::find_for_update(conn, wave_id)?
        .filter(|wave| wave.is_active)
        .ok_or_else(|| ApiError::BadRequest("Wave is not available".into()))?;
    if !repo::waves::has_permission(conn, agent_id, wave_id, Utc::now())? {
        return Err(ApiError::BadRequest("No active permission for this wave".into()));
    }
    if repo::properties::count_with_wave(conn, wave_id)? >= i64::from(wave.max_properties) {
        return Err(ApiError::Conflict("Wave has no remaining capacity"));
    }
    Ok(())
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    JsonBody(changes): JsonBody<PropertyChanges>,
) -> Result<Json<PropertyWithAgent>, ApiError> {
    if changes.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }
    if changes.price.as_ref().is_some_and(|p| *p < BigDecimal::zero()) {
        return Err(ApiError::BadRequest("price must not be negative".into()));
    }
    non_negative("bedrooms", changes.bedrooms)?;
    non_negative("bathrooms", changes.bathrooms)?;
    non_negative("area", changes.area)?;

    let property = state
        .db
        .run(move |conn| {
            let existing = repo::properties::find(conn, &id)?
                .ok_or(ApiError::NotFound("Property not found"))?;
            if existing.agent_id.as_deref() != Some(user.id.as_str()) {
                return Err(ApiError::Unauthorized("Not authorized to modify this property"));
            }
            let updated = repo::properties::update(conn, &id, &changes)?;
            Ok(repo::properties::with_agent(conn, updated)?)
        })
        .await?;
    log::info!("Updated property {}", property.property.id);
    Ok(Json(property))
}

pub async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SearchHistory>>, ApiError> {
    let entries = state
        .db
        .run(move |conn| Ok::<_, ApiError>(repo::search_history::recent(conn, &user.id)?))
        .await?;
    Ok(Json(entries))
}
