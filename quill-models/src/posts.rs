use crate::{
    groups::Group,
    medias::Media,
    safe_string::SafeString,
    schema::{comments, follows, posts},
    users::User,
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub content: SafeString,
    pub media_id: Option<i32>,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub content: SafeString,
    pub media_id: Option<i32>,
}

impl Post {
    get!(posts);
    insert!(posts, NewPost);

    /// A post is adressed as (author, id); an id that exists but belongs
    /// to someone else is treated as absent.
    pub fn find_for_author(conn: &Connection, author_id: i32, id: i32) -> Result<Post> {
        posts::table
            .filter(posts::id.eq(id))
            .filter(posts::author_id.eq(author_id))
            .first(conn)
            .map_err(Error::from)
    }

    /// Saves the mutable fields of this post. The author never changes.
    pub fn update(&self, conn: &Connection) -> Result<Post> {
        diesel::update(self)
            .set((
                posts::content.eq(&self.content),
                posts::group_id.eq(self.group_id),
                posts::media_id.eq(self.media_id),
            ))
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        posts::table.count().get_result(conn).map_err(Error::from)
    }

    pub fn list_page(conn: &Connection, (min, max): (i32, i32)) -> Result<Vec<Post>> {
        posts::table
            .order((posts::creation_date.desc(), posts::id.desc()))
            .offset(min.into())
            .limit((max - min).into())
            .load(conn)
            .map_err(Error::from)
    }

    pub fn count_for_group(conn: &Connection, group: &Group) -> Result<i64> {
        posts::table
            .filter(posts::group_id.eq(group.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn list_page_for_group(
        conn: &Connection,
        group: &Group,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::group_id.eq(group.id))
            .order((posts::creation_date.desc(), posts::id.desc()))
            .offset(min.into())
            .limit((max - min).into())
            .load(conn)
            .map_err(Error::from)
    }

    pub fn count_for_author(conn: &Connection, author: &User) -> Result<i64> {
        posts::table
            .filter(posts::author_id.eq(author.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn list_page_for_author(
        conn: &Connection,
        author: &User,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::author_id.eq(author.id))
            .order((posts::creation_date.desc(), posts::id.desc()))
            .offset(min.into())
            .limit((max - min).into())
            .load(conn)
            .map_err(Error::from)
    }

    pub fn count_for_followed(conn: &Connection, user: &User) -> Result<i64> {
        let followed = follows::table
            .filter(follows::follower_id.eq(user.id))
            .select(follows::following_id);
        posts::table
            .filter(posts::author_id.eq_any(followed))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// The posts written by the authors `user` is subscribed to.
    pub fn list_page_for_followed(
        conn: &Connection,
        user: &User,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        let followed = follows::table
            .filter(follows::follower_id.eq(user.id))
            .select(follows::following_id);
        posts::table
            .filter(posts::author_id.eq_any(followed))
            .order((posts::creation_date.desc(), posts::id.desc()))
            .offset(min.into())
            .limit((max - min).into())
            .load(conn)
            .map_err(Error::from)
    }

    pub fn get_author(&self, conn: &Connection) -> Result<User> {
        User::get(conn, self.author_id)
    }

    pub fn get_group(&self, conn: &Connection) -> Result<Option<Group>> {
        self.group_id.map(|id| Group::get(conn, id)).transpose()
    }

    pub fn get_media(&self, conn: &Connection) -> Result<Option<Media>> {
        self.media_id.map(|id| Media::get(conn, id)).transpose()
    }

    pub fn count_comments(&self, conn: &Connection) -> Result<i64> {
        comments::table
            .filter(comments::post_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }
}
