use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::Connection;
use serde::Deserialize;

use super::error::{ApiError, Required};
use super::extract::{AuthUser, JsonBody};
use super::AppState;
use crate::models::{new_id, Inquiry, InquiryStatus, NewInquiry};
use crate::repo;
use crate::repo::activity::Activity;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryRequest {
    pub property_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<InquiryRequest>,
) -> Result<(StatusCode, Json<Inquiry>), ApiError> {
    let mut required = Required::new();
    let property_id = required.take("propertyId", body.property_id);
    let name = required.take("name", body.name);
    let email = required.take("email", body.email);
    let message = required.take("message", body.message);
    required.finish()?;
    let phone = body.phone.filter(|p| !p.trim().is_empty());

    let inquiry = state
        .db
        .run(move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                if !repo::properties::exists(conn, &property_id)? {
                    return Err(ApiError::NotFound("Property not found"));
                }
                let id = new_id();
                let inquiry = repo::inquiries::create(
                    conn,
                    &NewInquiry {
                        id: &id,
                        property_id: &property_id,
                        user_id: &user.id,
                        name: name.trim(),
                        email: email.trim(),
                        phone: phone.as_deref(),
                        message: &message,
                        status: InquiryStatus::Pending,
                    },
                )?;
                repo::activity::record(
                    conn,
                    &user.id,
                    &Activity::InquirySent {
                        property_id: &property_id,
                        inquiry_id: &inquiry.id,
                    },
                )?;
                Ok(inquiry)
            })
        })
        .await?;
    log::info!("Inquiry {} sent for {}", inquiry.id, inquiry.property_id);
    Ok((StatusCode::CREATED, Json(inquiry)))
}
