use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{
    currency_rates, customer_activity, customer_points, customer_wave_permissions, favorites,
    inquiries, properties, search_history, users, waves,
};

mod kinds;

pub use kinds::{
    ActivityType, InquiryStatus, Language, Level, ListingType, PropertyStatus, PropertyType, Role,
};

/// Fresh application-side identifier; rows never rely on store sequences.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users, check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub wave_balance: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub allowed_languages: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub allowed_languages: Vec<String>,
}

/// Public identity of a listing's agent.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users, check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = properties, check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: BigDecimal,
    pub currency: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: Option<i32>,
    pub address: String,
    pub city: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub features: Vec<String>,
    pub status: PropertyStatus,
    pub language: Language,
    pub agent_id: Option<String>,
    pub contact_phone: Option<String>,
    pub wave_id: Option<String>,
    pub views: i32,
    pub is_featured: bool,
    pub slug: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A property row as the API returns it: the listing plus its agent, if any.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyWithAgent {
    #[serde(flatten)]
    pub property: Property,
    pub agent: Option<Agent>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = properties)]
pub struct NewProperty {
    pub id: String,
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: BigDecimal,
    pub currency: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: Option<i32>,
    pub address: String,
    pub city: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub features: Vec<String>,
    pub status: PropertyStatus,
    pub language: Language,
    pub agent_id: Option<String>,
    pub contact_phone: Option<String>,
    pub wave_id: Option<String>,
    pub is_featured: bool,
    pub slug: Option<String>,
}

/// Partial listing update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, AsChangeset, Deserialize)]
#[diesel(table_name = properties)]
#[serde(rename_all = "camelCase")]
pub struct PropertyChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub currency: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<i32>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub status: Option<PropertyStatus>,
    pub images: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub contact_phone: Option<String>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = inquiries, check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: String,
    pub property_id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = inquiries)]
pub struct NewInquiry<'a> {
    pub id: &'a str,
    pub property_id: &'a str,
    pub user_id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub message: &'a str,
    pub status: InquiryStatus,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = favorites, check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: String,
    pub user_id: String,
    pub property_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = favorites)]
pub struct NewFavorite<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub property_id: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = search_history, check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct SearchHistory {
    pub id: String,
    pub user_id: String,
    pub query: Option<String>,
    pub filters: serde_json::Value,
    pub results_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = search_history)]
pub struct NewSearchHistory<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub query: Option<&'a str>,
    pub filters: serde_json::Value,
    pub results_count: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customer_activity)]
pub struct NewCustomerActivity<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub activity_type: ActivityType,
    pub target_id: Option<&'a str>,
    pub metadata: serde_json::Value,
    pub points: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = customer_points, check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct CustomerPoints {
    pub user_id: String,
    pub total_points: i32,
    pub lifetime_points: i32,
    pub level: Level,
    pub updated_at: DateTime<Utc>,
}

impl CustomerPoints {
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            total_points: 0,
            lifetime_points: 0,
            level: Level::Bronze,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = waves, check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Wave {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub max_properties: i32,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = waves)]
pub struct NewWave<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub max_properties: i32,
    pub is_active: bool,
    pub created_by: Option<&'a str>,
}

/// A wave with its current usage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveUsage {
    #[serde(flatten)]
    pub wave: Wave,
    pub property_count: i64,
    pub remaining: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customer_wave_permissions)]
pub struct NewWavePermission<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub wave_id: &'a str,
    pub granted_by: Option<&'a str>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = currency_rates, check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: BigDecimal,
    pub set_by: Option<String>,
    pub effective_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = currency_rates)]
pub struct NewCurrencyRate<'a> {
    pub id: &'a str,
    pub from_currency: &'a str,
    pub to_currency: &'a str,
    pub rate: BigDecimal,
    pub set_by: Option<&'a str>,
    pub effective_date: DateTime<Utc>,
    pub is_active: bool,
}
