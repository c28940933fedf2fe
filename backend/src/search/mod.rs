//! Listing search: turns query-string parameters into a composed predicate
//! set, a sort order and a pagination window over `properties`.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{ListingType, PropertyStatus, PropertyType};
use crate::schema::properties;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 12;
pub const MAX_LIMIT: i64 = 100;

/// Raw `GET /api/properties` parameters, exactly as they arrive.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub listing_type: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

/// Predicates ANDed onto `status = active`. `None` contributes nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<BigDecimal>,
    /// Minimum number of bedrooms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<i32>,
    /// Minimum number of bathrooms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListingFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl Sort {
    fn from_params(sort_by: Option<&str>, order: Option<&str>) -> Self {
        match sort_by {
            Some("price") if order.is_some_and(|o| o.eq_ignore_ascii_case("desc")) => {
                Self::PriceDesc
            }
            Some("price") => Self::PriceAsc,
            _ => Self::Newest,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub page: i64,
    pub limit: i64,
    pub filter: ListingFilter,
    pub sort: Sort,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            filter: ListingFilter::default(),
            sort: Sort::default(),
        }
    }
}

impl ListingQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl TryFrom<ListingParams> for ListingQuery {
    type Error = String;

    fn try_from(params: ListingParams) -> Result<Self, Self::Error> {
        let page = parse::<i64>("page", params.page)?
            .unwrap_or(DEFAULT_PAGE)
            .max(1);
        let limit = match parse::<i64>("limit", params.limit)? {
            Some(limit) if limit < 1 => return Err("limit must be at least 1".into()),
            Some(limit) => limit.min(MAX_LIMIT),
            None => DEFAULT_LIMIT,
        };
        if (page - 1).checked_mul(limit).is_none() {
            return Err("page out of range".into());
        }
        let filter = ListingFilter {
            property_type: parse("type", params.property_type)?,
            country: present(params.country),
            city: present(params.city),
            min_price: parse("minPrice", params.min_price)?,
            max_price: parse("maxPrice", params.max_price)?,
            bedrooms: parse("bedrooms", params.bedrooms)?,
            bathrooms: parse("bathrooms", params.bathrooms)?,
            listing_type: parse("listingType", params.listing_type)?,
            search: present(params.search),
        };
        let sort = Sort::from_params(params.sort_by.as_deref(), params.order.as_deref());
        Ok(Self {
            page,
            limit,
            filter,
            sort,
        })
    }
}

/// Blank values count as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, String> {
    present(value)
        .map(|v| v.parse::<T>().map_err(|_| format!("invalid value for {name}: {v}")))
        .transpose()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total_count: i64) -> Self {
        let total_pages = (total_count + limit - 1) / limit;
        Self {
            current_page: page,
            total_pages,
            total_count,
            has_more: page < total_pages,
        }
    }
}

/// Active listings narrowed by every supplied filter.
pub fn filtered(filter: &ListingFilter) -> properties::BoxedQuery<'static, Pg> {
    let mut query = properties::table
        .filter(properties::status.eq(PropertyStatus::Active))
        .into_boxed();

    if let Some(kind) = filter.property_type {
        query = query.filter(properties::property_type.eq(kind));
    }
    if let Some(country) = &filter.country {
        query = query.filter(properties::country.eq(country.clone()));
    }
    if let Some(city) = &filter.city {
        query = query.filter(properties::city.eq(city.clone()));
    }
    if let Some(min) = &filter.min_price {
        query = query.filter(properties::price.ge(min.clone()));
    }
    if let Some(max) = &filter.max_price {
        query = query.filter(properties::price.le(max.clone()));
    }
    if let Some(bedrooms) = filter.bedrooms {
        query = query.filter(properties::bedrooms.ge(bedrooms));
    }
    if let Some(bathrooms) = filter.bathrooms {
        query = query.filter(properties::bathrooms.ge(bathrooms));
    }
    if let Some(listing_type) = filter.listing_type {
        query = query.filter(properties::listing_type.eq(listing_type));
    }
    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", escape_like(term));
        query = query.filter(
            properties::title
                .ilike(pattern.clone())
                .or(properties::description.ilike(pattern.clone()))
                .or(properties::address.ilike(pattern)),
        );
    }
    query
}

pub fn sorted(
    query: properties::BoxedQuery<'static, Pg>,
    sort: Sort,
) -> properties::BoxedQuery<'static, Pg> {
    match sort {
        Sort::Newest => query.order((properties::created_at.desc(), properties::id.asc())),
        Sort::PriceAsc => query.order((properties::price.asc(), properties::id.asc())),
        Sort::PriceDesc => query.order((properties::price.desc(), properties::id.asc())),
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
