use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;

use crate::models::{new_id, ActivityType, CustomerPoints, Level, NewCustomerActivity};
use crate::schema::{customer_activity, customer_points};

pub const FAVORITE_POINTS: i32 = 5;
pub const INQUIRY_POINTS: i32 = 10;

/// Point-earning customer actions. Serialized as the activity's metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity<'a> {
    #[serde(rename_all = "camelCase")]
    FavoriteAdded { property_id: &'a str },
    #[serde(rename_all = "camelCase")]
    InquirySent {
        property_id: &'a str,
        inquiry_id: &'a str,
    },
}

impl Activity<'_> {
    pub fn activity_type(&self) -> ActivityType {
        match self {
            Self::FavoriteAdded { .. } => ActivityType::FavoriteAdded,
            Self::InquirySent { .. } => ActivityType::InquirySent,
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            Self::FavoriteAdded { property_id } | Self::InquirySent { property_id, .. } => {
                property_id
            }
        }
    }

    pub fn points(&self) -> i32 {
        match self {
            Self::FavoriteAdded { .. } => FAVORITE_POINTS,
            Self::InquirySent { .. } => INQUIRY_POINTS,
        }
    }
}

/// Logs the activity and credits its points. Lifetime points only ever
/// grow; the level follows them.
pub fn record(
    conn: &mut PgConnection,
    user_id: &str,
    activity: &Activity<'_>,
) -> QueryResult<CustomerPoints> {
    let points = activity.points();
    let metadata = serde_json::to_value(activity)
        .map_err(|err| diesel::result::Error::SerializationError(Box::new(err)))?;
    let id = new_id();
    diesel::insert_into(customer_activity::table)
        .values(&NewCustomerActivity {
            id: &id,
            user_id,
            activity_type: activity.activity_type(),
            target_id: Some(activity.target_id()),
            metadata,
            points,
        })
        .execute(conn)?;

    let now = Utc::now();
    let lifetime: i32 = diesel::insert_into(customer_points::table)
        .values((
            customer_points::user_id.eq(user_id),
            customer_points::total_points.eq(points),
            customer_points::lifetime_points.eq(points),
            customer_points::level.eq(Level::for_lifetime_points(points)),
            customer_points::updated_at.eq(now),
        ))
        .on_conflict(customer_points::user_id)
        .do_update()
        .set((
            customer_points::total_points.eq(customer_points::total_points + points),
            customer_points::lifetime_points.eq(customer_points::lifetime_points + points),
            customer_points::updated_at.eq(now),
        ))
        .returning(customer_points::lifetime_points)
        .get_result(conn)?;

    diesel::update(customer_points::table.find(user_id))
        .set(customer_points::level.eq(Level::for_lifetime_points(lifetime)))
        .returning(CustomerPoints::as_returning())
        .get_result(conn)
}

pub fn points_of(conn: &mut PgConnection, user_id: &str) -> QueryResult<Option<CustomerPoints>> {
    customer_points::table
        .find(user_id)
        .select(CustomerPoints::as_select())
        .first(conn)
        .optional()
}
