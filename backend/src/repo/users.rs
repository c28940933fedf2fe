use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{NewUser, User};
use crate::schema::users::dsl;

pub fn create(conn: &mut PgConnection, new_user: &NewUser<'_>) -> QueryResult<User> {
    diesel::insert_into(dsl::users)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)
}

pub fn find_by_id(conn: &mut PgConnection, id: &str) -> QueryResult<Option<User>> {
    dsl::users
        .find(id)
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn find_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<Option<User>> {
    dsl::users
        .filter(dsl::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn username_or_email_taken(
    conn: &mut PgConnection,
    username: &str,
    email: &str,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        dsl::users.filter(dsl::username.eq(username).or(dsl::email.eq(email))),
    ))
    .get_result(conn)
}
