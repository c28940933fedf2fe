use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{new_id, Favorite, NewFavorite, Property, PropertyWithAgent};
use crate::repo::properties::attach_agents;
use crate::schema::{favorites, properties};

pub fn exists(conn: &mut PgConnection, user_id: &str, property_id: &str) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        favorites::table
            .filter(favorites::user_id.eq(user_id))
            .filter(favorites::property_id.eq(property_id)),
    ))
    .get_result(conn)
}

pub fn add(conn: &mut PgConnection, user_id: &str, property_id: &str) -> QueryResult<Favorite> {
    let id = new_id();
    diesel::insert_into(favorites::table)
        .values(&NewFavorite {
            id: &id,
            user_id,
            property_id,
        })
        .returning(Favorite::as_returning())
        .get_result(conn)
}

/// Returns the number of rows removed (0 or 1).
pub fn remove(conn: &mut PgConnection, user_id: &str, property_id: &str) -> QueryResult<usize> {
    diesel::delete(
        favorites::table
            .filter(favorites::user_id.eq(user_id))
            .filter(favorites::property_id.eq(property_id)),
    )
    .execute(conn)
}

/// The user's favorited listings, most recently favorited first.
pub fn properties_of(
    conn: &mut PgConnection,
    user_id: &str,
) -> QueryResult<Vec<PropertyWithAgent>> {
    let rows = favorites::table
        .inner_join(properties::table)
        .filter(favorites::user_id.eq(user_id))
        .order(favorites::created_at.desc())
        .select(Property::as_select())
        .load(conn)?;
    attach_agents(conn, rows)
}
