use crate::{
    posts::Post, safe_string::SafeString, schema::comments, users::User, Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Comment {
    pub id: i32,
    pub content: SafeString,
    pub post_id: i32,
    pub author_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub content: SafeString,
    pub post_id: i32,
    pub author_id: i32,
}

impl Comment {
    get!(comments);
    insert!(comments, NewComment);

    /// All the comments of a post, oldest first.
    pub fn list_by_post(conn: &Connection, post_id: i32) -> Result<Vec<Comment>> {
        comments::table
            .filter(comments::post_id.eq(post_id))
            .order((comments::creation_date.asc(), comments::id.asc()))
            .load(conn)
            .map_err(Error::from)
    }

    pub fn count_for_post(conn: &Connection, post_id: i32) -> Result<i64> {
        comments::table
            .filter(comments::post_id.eq(post_id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn get_author(&self, conn: &Connection) -> Result<User> {
        User::get(conn, self.author_id)
    }

    pub fn get_post(&self, conn: &Connection) -> Result<Post> {
        Post::get(conn, self.post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{posts::tests as post_tests, tests::db};
    use diesel::Connection as _;

    #[test]
    fn insert_and_list() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let (users, _, posts) = post_tests::fill_database(&conn);
            let post = &posts[0];

            assert_eq!(Comment::count_for_post(&conn, post.id)?, 0);

            let first = Comment::insert(
                &conn,
                NewComment {
                    content: SafeString::new("Nice post!"),
                    post_id: post.id,
                    author_id: users[1].id,
                },
            )?;
            let second = Comment::insert(
                &conn,
                NewComment {
                    content: SafeString::new("Thanks!"),
                    post_id: post.id,
                    author_id: users[0].id,
                },
            )?;

            assert_eq!(first.author_id, users[1].id);
            assert_eq!(first.get_post(&conn)?.id, post.id);
            assert_eq!(Comment::count_for_post(&conn, post.id)?, 2);

            // oldest first
            let all = Comment::list_by_post(&conn, post.id)?;
            assert_eq!(
                all.iter().map(|c| c.id).collect::<Vec<_>>(),
                vec![first.id, second.id]
            );

            // other posts are untouched
            assert_eq!(Comment::count_for_post(&conn, posts[1].id)?, 0);

            Ok(())
        });
    }
}
