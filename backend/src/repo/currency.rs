use bigdecimal::{BigDecimal, One, Zero};
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{CurrencyRate, NewCurrencyRate};
use crate::schema::currency_rates;

pub fn create(conn: &mut PgConnection, rate: &NewCurrencyRate<'_>) -> QueryResult<CurrencyRate> {
    diesel::insert_into(currency_rates::table)
        .values(rate)
        .returning(CurrencyRate::as_returning())
        .get_result(conn)
}

/// All active rates, most recent effective date first.
pub fn active(conn: &mut PgConnection) -> QueryResult<Vec<CurrencyRate>> {
    currency_rates::table
        .filter(currency_rates::is_active.eq(true))
        .order((
            currency_rates::effective_date.desc(),
            currency_rates::created_at.desc(),
        ))
        .select(CurrencyRate::as_select())
        .load(conn)
}

pub fn latest(conn: &mut PgConnection, from: &str, to: &str) -> QueryResult<Option<CurrencyRate>> {
    currency_rates::table
        .filter(currency_rates::is_active.eq(true))
        .filter(currency_rates::from_currency.eq(from))
        .filter(currency_rates::to_currency.eq(to))
        .order((
            currency_rates::effective_date.desc(),
            currency_rates::created_at.desc(),
        ))
        .select(CurrencyRate::as_select())
        .first(conn)
        .optional()
}

/// Multiplier turning an amount in `from` into `to`, falling back to the
/// inverse of the opposite pair.
pub fn conversion_rate(
    conn: &mut PgConnection,
    from: &str,
    to: &str,
) -> QueryResult<Option<BigDecimal>> {
    if from.eq_ignore_ascii_case(to) {
        return Ok(Some(BigDecimal::one()));
    }
    if let Some(direct) = latest(conn, from, to)? {
        return Ok(Some(direct.rate));
    }
    Ok(latest(conn, to, from)?
        .map(|inverse| inverse.rate)
        .filter(|rate| !rate.is_zero())
        .map(|rate| BigDecimal::one() / rate))
}
