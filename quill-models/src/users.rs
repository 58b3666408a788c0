use crate::{
    db_conn::DbConn,
    schema::{follows, users},
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, dsl, ExpressionMethods, QueryDsl, RunQueryDsl};
use rocket::{
    outcome::IntoOutcome,
    request::{self, FromRequest, Request},
};

pub const AUTH_COOKIE: &str = "user_id";

const BCRYPT_COST: u32 = 10;

#[derive(Queryable, Identifiable, Clone, Debug, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub hashed_password: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "users"]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub hashed_password: String,
}

impl User {
    get!(users);
    insert!(users, NewUser);
    find_by!(users, find_by_name, username as &str);
    find_by!(users, find_by_email, email as &str);

    pub fn name(&self) -> String {
        if !self.display_name.is_empty() {
            self.display_name.clone()
        } else {
            self.username.clone()
        }
    }

    pub fn hash_pass(pass: &str) -> Result<String> {
        bcrypt::hash(pass, BCRYPT_COST).map_err(Error::from)
    }

    pub fn auth(&self, pass: &str) -> bool {
        bcrypt::verify(pass, &self.hashed_password).unwrap_or(false)
    }

    pub fn login(conn: &Connection, ident: &str, password: &str) -> Result<User> {
        let user = User::find_by_email(conn, ident).or_else(|_| User::find_by_name(conn, ident));

        match user {
            Ok(user) => {
                if user.auth(password) {
                    Ok(user)
                } else {
                    Err(Error::NotFound)
                }
            }
            Err(e) => {
                // if no user was found, fake-verify a password anyway,
                // so that an attacker can't tell the difference from timing
                if let Ok(u) = User::get(conn, 1) {
                    let _ = bcrypt::verify(password, &u.hashed_password);
                }
                Err(e)
            }
        }
    }

    /// How many authors this user is subscribed to.
    pub fn count_followed(&self, conn: &Connection) -> Result<i64> {
        follows::table
            .filter(follows::follower_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// How many users are subscribed to this author.
    pub fn count_followers(&self, conn: &Connection) -> Result<i64> {
        follows::table
            .filter(follows::following_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn is_following(&self, conn: &Connection, other_id: i32) -> Result<bool> {
        dsl::select(dsl::exists(
            follows::table
                .filter(follows::follower_id.eq(self.id))
                .filter(follows::following_id.eq(other_id)),
        ))
        .get_result(conn)
        .map_err(Error::from)
    }
}

impl<'a, 'r> FromRequest<'a, 'r> for User {
    type Error = ();

    fn from_request(request: &'a Request<'r>) -> request::Outcome<User, ()> {
        let conn = request.guard::<DbConn>()?;
        request
            .cookies()
            .get_private(AUTH_COOKIE)
            .and_then(|cookie| cookie.value().parse().ok())
            .and_then(|id| User::get(&conn, id).ok())
            .or_forward(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tests::db;
    use diesel::Connection as _;

    pub(crate) fn fill_database(conn: &Connection) -> Vec<User> {
        ["admin", "user", "other"]
            .iter()
            .map(|username| {
                User::insert(
                    conn,
                    NewUser {
                        username: (*username).to_owned(),
                        display_name: format!("{} example", username),
                        email: format!("{}@example.com", username),
                        hashed_password: User::hash_pass("testpassword")
                            .expect("Couldn't hash the password"),
                    },
                )
                .expect("Couldn't insert a new user")
            })
            .collect()
    }

    #[test]
    fn find_by() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let inserted = fill_database(&conn);

            let by_name = User::find_by_name(&conn, "admin")?;
            assert_eq!(inserted[0].id, by_name.id);

            let by_email = User::find_by_email(&conn, "other@example.com")?;
            assert_eq!(inserted[2].id, by_email.id);

            assert!(matches!(
                User::find_by_name(&conn, "nobody"),
                Err(Error::NotFound)
            ));

            Ok(())
        });
    }

    #[test]
    fn login() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            fill_database(&conn);

            assert_eq!(
                User::login(&conn, "user", "testpassword")?.username,
                "user"
            );
            assert_eq!(
                User::login(&conn, "user@example.com", "testpassword")?.username,
                "user"
            );
            assert!(matches!(
                User::login(&conn, "user", "wrongpassword"),
                Err(Error::NotFound)
            ));
            assert!(matches!(
                User::login(&conn, "nobody", "testpassword"),
                Err(Error::NotFound)
            ));

            Ok(())
        });
    }

    #[test]
    fn passwords_are_hashed() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let users = fill_database(&conn);
            assert_ne!(users[0].hashed_password, "testpassword");
            assert!(users[0].auth("testpassword"));
            assert!(!users[0].auth("testpassword2"));
            Ok(())
        });
    }
}
