use crate::cache::Cache;
use crate::routes::{errors::ErrorPage, requires_login};
use crate::template_utils::{CommentCard, PostCard, RespondOrRedirect};
use quill_models::{
    comments::{Comment, NewComment},
    db_conn::DbConn,
    posts::Post,
    safe_string::SafeString,
    users::User,
    Connection, Result,
};
use rocket::{
    request::LenientForm,
    response::{Flash, Redirect},
    State,
};
use std::sync::Arc;
use validator::Validate;

#[derive(Default, FromForm, Validate)]
pub struct NewCommentForm {
    #[validate(length(min = 1, message = "Your comment can't be empty"))]
    pub content: String,
}

pub fn comment_cards(conn: &Connection, post: &Post) -> Result<Vec<CommentCard>> {
    CommentCard::from_comments(conn, Comment::list_by_post(conn, post.id)?)
}

#[post("/<name>/<id>/comment", data = "<form>", rank = 3)]
pub fn create(
    name: String,
    id: i32,
    form: LenientForm<NewCommentForm>,
    user: User,
    conn: DbConn,
    cache: State<'_, Arc<Cache>>,
) -> Result<RespondOrRedirect, ErrorPage> {
    let author = User::find_by_name(&conn, &name)?;
    let post = Post::find_for_author(&conn, author.id, id)?;
    let form = form.into_inner();

    if let Err(errors) = form.validate() {
        let comments = comment_cards(&conn, &post)?;
        let card = PostCard::new(&conn, post)?;
        return Ok(render!(posts::details(
            &(Some(user), None),
            card,
            comments,
            &form,
            errors
        ))
        .into());
    }

    Comment::insert(
        &conn,
        NewComment {
            content: SafeString::new(&form.content),
            post_id: post.id,
            author_id: user.id,
        },
    )?;
    // comment counts show up on the cached index
    cache.invalidate();

    Ok(Flash::success(
        Redirect::to(format!("/{}/{}", name, id)),
        "Your comment has been posted",
    )
    .into())
}

#[post("/<name>/<id>/comment", rank = 4)]
pub fn create_auth(name: String, id: i32) -> Flash<Redirect> {
    requires_login(
        "You need to be logged in order to post a comment",
        format!("/{}/{}", name, id),
    )
}

#[cfg(test)]
mod tests {
    use crate::cache::Cache;
    use crate::routes::test_harness::{db_pool, unique_tag};
    use quill_models::{
        comments::Comment,
        posts::{NewPost, Post},
        safe_string::SafeString,
        users::{NewUser, User, AUTH_COOKIE},
    };
    use rocket::http::{ContentType, Cookie, Status};
    use rocket::local::Client;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn commenting_needs_a_session() {
        let pool = db_pool();
        let tag = unique_tag();
        let (author, reader, post) = {
            let conn = pool.get().expect("Couldn't get a connection");
            let author = User::insert(
                &conn,
                NewUser {
                    username: format!("writer{}", tag),
                    display_name: String::new(),
                    email: format!("writer{}@example.com", tag),
                    hashed_password: User::hash_pass("testpassword")
                        .expect("Couldn't hash the password"),
                },
            )
            .expect("Couldn't insert the author");
            let reader = User::insert(
                &conn,
                NewUser {
                    username: format!("reader{}", tag),
                    display_name: String::new(),
                    email: format!("reader{}@example.com", tag),
                    hashed_password: User::hash_pass("testpassword")
                        .expect("Couldn't hash the password"),
                },
            )
            .expect("Couldn't insert the reader");
            let post = Post::insert(
                &conn,
                NewPost {
                    author_id: author.id,
                    group_id: None,
                    content: SafeString::new("A gated post"),
                    media_id: None,
                },
            )
            .expect("Couldn't insert the post");
            (author, reader, post)
        };

        let rocket = rocket::ignite()
            .mount("/", routes![super::create, super::create_auth])
            .manage(pool.clone())
            .manage(Arc::new(Cache::new(Duration::from_secs(20))));
        let client = Client::new(rocket).expect("Couldn't build the client");
        let url = format!("/{}/{}/comment", author.username, post.id);

        let conn = pool.get().expect("Couldn't get a connection");
        let before = Comment::count_for_post(&conn, post.id).expect("Couldn't count comments");

        // without a session, the request bounces to the login page and
        // nothing is written
        let anonymous = client
            .post(&url)
            .header(ContentType::Form)
            .body("content=First!")
            .dispatch();
        assert_eq!(anonymous.status(), Status::SeeOther);
        assert!(anonymous
            .headers()
            .get_one("Location")
            .map_or(false, |l| l.starts_with("/login")));
        assert_eq!(
            Comment::count_for_post(&conn, post.id).expect("Couldn't count comments"),
            before
        );

        // the same request with a session cookie goes through
        let logged_in = client
            .post(&url)
            .header(ContentType::Form)
            .private_cookie(Cookie::new(AUTH_COOKIE, reader.id.to_string()))
            .body("content=First!")
            .dispatch();
        assert_eq!(logged_in.status(), Status::SeeOther);
        assert_eq!(
            logged_in.headers().get_one("Location"),
            Some(format!("/{}/{}", author.username, post.id).as_str())
        );
        assert_eq!(
            Comment::count_for_post(&conn, post.id).expect("Couldn't count comments"),
            before + 1
        );
    }
}
