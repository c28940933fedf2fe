use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{
    Agent, NewProperty, Property, PropertyChanges, PropertyStatus, PropertyWithAgent,
};
use crate::schema::{properties, users};
use crate::search::{self, ListingQuery};

pub const FEATURED_LIMIT: i64 = 6;

/// One page of active listings plus the total count under the same filters.
pub fn search(
    conn: &mut PgConnection,
    query: &ListingQuery,
) -> QueryResult<(Vec<PropertyWithAgent>, i64)> {
    let total: i64 = search::filtered(&query.filter).count().get_result(conn)?;
    let rows = search::sorted(search::filtered(&query.filter), query.sort)
        .select(Property::as_select())
        .limit(query.limit)
        .offset(query.offset())
        .load(conn)?;
    log::debug!(
        "Listing page {} ({} of {} rows)",
        query.page,
        rows.len(),
        total
    );
    Ok((attach_agents(conn, rows)?, total))
}

pub fn featured(conn: &mut PgConnection) -> QueryResult<Vec<PropertyWithAgent>> {
    let rows = properties::table
        .filter(properties::status.eq(PropertyStatus::Active))
        .filter(properties::is_featured.eq(true))
        .order(properties::created_at.desc())
        .limit(FEATURED_LIMIT)
        .select(Property::as_select())
        .load(conn)?;
    attach_agents(conn, rows)
}

pub fn find(conn: &mut PgConnection, id: &str) -> QueryResult<Option<Property>> {
    properties::table
        .find(id)
        .select(Property::as_select())
        .first(conn)
        .optional()
}

/// Looks a listing up by primary id first, then by slug.
pub fn find_by_identifier(
    conn: &mut PgConnection,
    identifier: &str,
) -> QueryResult<Option<Property>> {
    if let Some(property) = find(conn, identifier)? {
        return Ok(Some(property));
    }
    properties::table
        .filter(properties::slug.eq(identifier))
        .select(Property::as_select())
        .first(conn)
        .optional()
}

pub fn exists(conn: &mut PgConnection, id: &str) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(properties::table.find(id))).get_result(conn)
}

/// Evaluated by the store as `views = views + 1`, so concurrent viewers
/// never overwrite each other.
pub fn increment_views(conn: &mut PgConnection, id: &str) -> QueryResult<usize> {
    diesel::update(properties::table.find(id))
        .set(properties::views.eq(properties::views + 1))
        .execute(conn)
}

pub fn create(conn: &mut PgConnection, new_property: &NewProperty) -> QueryResult<Property> {
    diesel::insert_into(properties::table)
        .values(new_property)
        .returning(Property::as_returning())
        .get_result(conn)
}

pub fn update(
    conn: &mut PgConnection,
    id: &str,
    changes: &PropertyChanges,
) -> QueryResult<Property> {
    diesel::update(properties::table.find(id))
        .set((changes, properties::updated_at.eq(Utc::now())))
        .returning(Property::as_returning())
        .get_result(conn)
}

pub fn count_with_wave(conn: &mut PgConnection, wave_id: &str) -> QueryResult<i64> {
    properties::table
        .filter(properties::wave_id.eq(wave_id))
        .count()
        .get_result(conn)
}

pub fn with_agent(conn: &mut PgConnection, property: Property) -> QueryResult<PropertyWithAgent> {
    let mut rows = attach_agents(conn, vec![property])?;
    Ok(rows.remove(0))
}

/// Left-join semantics: a listing without (or with a vanished) agent gets
/// `agent: None`.
pub fn attach_agents(
    conn: &mut PgConnection,
    rows: Vec<Property>,
) -> QueryResult<Vec<PropertyWithAgent>> {
    let mut agent_ids: Vec<&str> = rows.iter().filter_map(|p| p.agent_id.as_deref()).collect();
    agent_ids.sort_unstable();
    agent_ids.dedup();
    let agents: HashMap<String, Agent> = if agent_ids.is_empty() {
        HashMap::new()
    } else {
        users::table
            .filter(users::id.eq_any(agent_ids))
            .select(Agent::as_select())
            .load(conn)?
            .into_iter()
            .map(|agent| (agent.id.clone(), agent))
            .collect()
    };
    Ok(rows
        .into_iter()
        .map(|property| {
            let agent = property
                .agent_id
                .as_ref()
                .and_then(|id| agents.get(id))
                .cloned();
            PropertyWithAgent { property, agent }
        })
        .collect())
}

/// URL slug from the title, made unique by the id prefix.
pub fn slug_for(title: &str, id: &str) -> String {
    let mut slug = String::with_capacity(title.len() + 9);
    for word in title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&word.to_ascii_lowercase());
    }
    let suffix: String = id.chars().filter(|c| *c != '-').take(8).collect();
    if slug.is_empty() {
        suffix
    } else {
        format!("{slug}-{suffix}")
    }
}
