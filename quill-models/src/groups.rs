use crate::{schema::groups, Connection, Error, Result};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

/// A topic used to categorize posts.
///
/// Groups are created out of band (seed data or `psql`), there is no
/// user-facing route for it.
#[derive(Queryable, Identifiable, Clone, Debug, PartialEq)]
pub struct Group {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
}

#[derive(Insertable)]
#[table_name = "groups"]
pub struct NewGroup {
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl Group {
    get!(groups);
    insert!(groups, NewGroup);
    find_by!(groups, find_by_slug, slug as &str);

    pub fn list(conn: &Connection) -> Result<Vec<Group>> {
        groups::table
            .order(groups::title.asc())
            .load(conn)
            .map_err(Error::from)
    }
}
