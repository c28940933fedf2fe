use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{new_id, NewSearchHistory, SearchHistory};
use crate::schema::search_history;
use crate::search::ListingFilter;

pub const RECENT_LIMIT: i64 = 20;

pub fn record(
    conn: &mut PgConnection,
    user_id: &str,
    filter: &ListingFilter,
    results_count: i64,
) -> QueryResult<()> {
    let filters = serde_json::to_value(filter)
        .map_err(|err| diesel::result::Error::SerializationError(Box::new(err)))?;
    let id = new_id();
    diesel::insert_into(search_history::table)
        .values(&NewSearchHistory {
            id: &id,
            user_id,
            query: filter.search.as_deref(),
            filters,
            results_count: i32::try_from(results_count).unwrap_or(i32::MAX),
        })
        .execute(conn)?;
    Ok(())
}

pub fn recent(conn: &mut PgConnection, user_id: &str) -> QueryResult<Vec<SearchHistory>> {
    search_history::table
        .filter(search_history::user_id.eq(user_id))
        .order(search_history::created_at.desc())
        .limit(RECENT_LIMIT)
        .select(SearchHistory::as_select())
        .load(conn)
}
