use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{Inquiry, NewInquiry};
use crate::schema::inquiries;

pub fn create(conn: &mut PgConnection, new_inquiry: &NewInquiry<'_>) -> QueryResult<Inquiry> {
    diesel::insert_into(inquiries::table)
        .values(new_inquiry)
        .returning(Inquiry::as_returning())
        .get_result(conn)
}
