use crate::{schema::follows, Connection, Error, Result};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

/// A directed subscription edge: `follower` gets `following`'s posts in
/// their feed.
#[derive(Queryable, Identifiable, Clone, Debug, PartialEq)]
pub struct Follow {
    pub id: i32,
    pub follower_id: i32,
    pub following_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "follows"]
pub struct NewFollow {
    pub follower_id: i32,
    pub following_id: i32,
}

impl Follow {
    get!(follows);

    pub fn find(conn: &Connection, from: i32, to: i32) -> Result<Follow> {
        follows::table
            .filter(follows::follower_id.eq(from))
            .filter(follows::following_id.eq(to))
            .get_result(conn)
            .map_err(Error::from)
    }

    /// Subscribes `new.follower_id` to `new.following_id`.
    ///
    /// Self-follows are refused, and following the same author twice is a
    /// no-op that returns the existing edge (the table also carries a
    /// UNIQUE constraint on the pair).
    pub fn insert(conn: &Connection, new: NewFollow) -> Result<Follow> {
        if new.follower_id == new.following_id {
            return Err(Error::InvalidValue);
        }
        if let Ok(existing) = Follow::find(conn, new.follower_id, new.following_id) {
            return Ok(existing);
        }
        diesel::insert_into(follows::table)
            .values(new)
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::db, users::tests as user_tests};
    use diesel::Connection as _;

    #[test]
    fn subscribe_and_unsubscribe() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let users = user_tests::fill_database(&conn);

            let follow = Follow::insert(
                &conn,
                NewFollow {
                    follower_id: users[1].id,
                    following_id: users[0].id,
                },
            )?;
            assert_eq!(
                Follow::find(&conn, users[1].id, users[0].id)?.id,
                follow.id
            );
            assert!(users[1].is_following(&conn, users[0].id)?);
            assert_eq!(users[0].count_followers(&conn)?, 1);
            assert_eq!(users[1].count_followed(&conn)?, 1);

            follow.delete(&conn)?;
            assert!(matches!(
                Follow::find(&conn, users[1].id, users[0].id),
                Err(Error::NotFound)
            ));
            assert!(!users[1].is_following(&conn, users[0].id)?);

            Ok(())
        });
    }

    #[test]
    fn self_follow_is_refused() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let users = user_tests::fill_database(&conn);
            assert!(matches!(
                Follow::insert(
                    &conn,
                    NewFollow {
                        follower_id: users[0].id,
                        following_id: users[0].id,
                    },
                ),
                Err(Error::InvalidValue)
            ));
            assert_eq!(users[0].count_followers(&conn)?, 0);
            Ok(())
        });
    }

    #[test]
    fn double_follow_keeps_a_single_edge() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let users = user_tests::fill_database(&conn);

            let first = Follow::insert(
                &conn,
                NewFollow {
                    follower_id: users[1].id,
                    following_id: users[0].id,
                },
            )?;
            let second = Follow::insert(
                &conn,
                NewFollow {
                    follower_id: users[1].id,
                    following_id: users[0].id,
                },
            )?;

            assert_eq!(first.id, second.id);
            assert_eq!(users[0].count_followers(&conn)?, 1);

            Ok(())
        });
    }

    #[test]
    fn unfollow_without_edge_is_not_found() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let users = user_tests::fill_database(&conn);
            assert!(matches!(
                Follow::find(&conn, users[1].id, users[0].id),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }
}
