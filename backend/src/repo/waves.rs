use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{NewWave, NewWavePermission, Wave, WaveUsage};
use crate::schema::{customer_wave_permissions as permissions, properties, waves};

pub fn create(conn: &mut PgConnection, new_wave: &NewWave<'_>) -> QueryResult<Wave> {
    diesel::insert_into(waves::table)
        .values(new_wave)
        .returning(Wave::as_returning())
        .get_result(conn)
}

/// Locks the wave row until the surrounding transaction ends.
pub fn find_for_update(conn: &mut PgConnection, id: &str) -> QueryResult<Option<Wave>> {
    waves::table
        .find(id)
        .select(Wave::as_select())
        .for_update()
        .first(conn)
        .optional()
}

pub fn grant_permission(
    conn: &mut PgConnection,
    permission: &NewWavePermission<'_>,
) -> QueryResult<usize> {
    diesel::insert_into(permissions::table)
        .values(permission)
        .execute(conn)
}

/// Active, not yet expired grant of `wave_id` to `user_id`.
/// A grant without `expires_at` is permanent.
pub fn has_permission(
    conn: &mut PgConnection,
    user_id: &str,
    wave_id: &str,
    now: DateTime<Utc>,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        permissions::table
            .filter(permissions::user_id.eq(user_id))
            .filter(permissions::wave_id.eq(wave_id))
            .filter(permissions::is_active.eq(true))
            .filter(
                permissions::expires_at
                    .is_null()
                    .or(permissions::expires_at.gt(now)),
            ),
    ))
    .get_result(conn)
}

pub fn active_with_usage(conn: &mut PgConnection) -> QueryResult<Vec<WaveUsage>> {
    let active = waves::table
        .filter(waves::is_active.eq(true))
        .order(waves::created_at.desc())
        .select(Wave::as_select())
        .load(conn)?;
    let counts: HashMap<String, i64> = properties::table
        .filter(properties::wave_id.is_not_null())
        .group_by(properties::wave_id)
        .select((properties::wave_id, diesel::dsl::count_star()))
        .load::<(Option<String>, i64)>(conn)?
        .into_iter()
        .filter_map(|(id, count)| id.map(|id| (id, count)))
        .collect();
    Ok(active
        .into_iter()
        .map(|wave| {
            let property_count = counts.get(&wave.id).copied().unwrap_or_default();
            let remaining = (i64::from(wave.max_properties) - property_count).max(0);
            WaveUsage {
                wave,
                property_count,
                remaining,
            }
        })
        .collect())
}
