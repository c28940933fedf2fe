use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing failed: {0}")]
    Hash(#[from] pwhash::error::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::MissingFields(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(err) if err.is_unique_violation() => StatusCode::CONFLICT,
            Self::Store(StoreError::Diesel(diesel::result::Error::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            Self::Store(_) | Self::Token(_) | Self::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Store(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::MissingFields(required) => json!({
                "message": self.to_string(),
                "required": required,
            }),
            Self::Store(_) if status == StatusCode::CONFLICT => {
                json!({"message": "Resource already exists"})
            }
            Self::Store(_) if status == StatusCode::NOT_FOUND => json!({"message": "Not found"}),
            Self::Store(_) | Self::Token(_) | Self::Hash(_) => {
                log::error!("Request failed: {}", self);
                json!({"message": "Internal server error"})
            }
            _ => json!({"message": self.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

/// Collects the names of required fields that are absent or blank.
#[derive(Debug, Default)]
pub struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yields the value, or records `name` as missing and yields a
    /// placeholder that `finish` guarantees is never used.
    pub fn take<T: IsBlank + Default>(&mut self, name: &'static str, value: Option<T>) -> T {
        match value {
            Some(value) if !value.is_blank() => value,
            _ => {
                self.missing.push(name);
                T::default()
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::MissingFields(self.missing))
        }
    }
}

pub trait IsBlank {
    fn is_blank(&self) -> bool;
}

impl IsBlank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl IsBlank for bigdecimal::BigDecimal {
    fn is_blank(&self) -> bool {
        false
    }
}
