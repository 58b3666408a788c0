use crate::routes::{errors::ErrorPage, requires_login, Page};
use crate::template_utils::{flash_msg, PostCard, Ructe};
use quill_models::{
    db_conn::DbConn,
    follows::{Follow, NewFollow},
    posts::Post,
    users::User,
    Error,
};
use rocket::{
    request::FlashMessage,
    response::{Flash, Redirect},
};

#[post("/<name>/follow", rank = 2)]
pub fn create(name: String, user: User, conn: DbConn) -> Result<Flash<Redirect>, ErrorPage> {
    let target = User::find_by_name(&conn, &name)?;
    match Follow::insert(
        &conn,
        NewFollow {
            follower_id: user.id,
            following_id: target.id,
        },
    ) {
        Ok(_) => Ok(Flash::success(
            Redirect::to(format!("/{}", name)),
            format!("You are now following {}", target.name()),
        )),
        Err(Error::InvalidValue) => Ok(Flash::error(
            Redirect::to(format!("/{}", name)),
            "You can't follow yourself",
        )),
        Err(err) => Err(err.into()),
    }
}

#[post("/<name>/follow", rank = 3)]
pub fn create_auth(name: String) -> Flash<Redirect> {
    requires_login(
        "You need to be logged in order to follow someone",
        format!("/{}", name),
    )
}

#[post("/<name>/unfollow", rank = 2)]
pub fn delete(name: String, user: User, conn: DbConn) -> Result<Flash<Redirect>, ErrorPage> {
    let target = User::find_by_name(&conn, &name)?;
    let follow = Follow::find(&conn, user.id, target.id)?;
    follow.delete(&conn)?;
    Ok(Flash::success(
        Redirect::to(format!("/{}", name)),
        format!("You are no longer following {}", target.name()),
    ))
}

#[post("/<name>/unfollow", rank = 3)]
pub fn delete_auth(name: String) -> Flash<Redirect> {
    requires_login(
        "You need to be logged in order to unfollow someone",
        format!("/{}", name),
    )
}

/// The feed of the authors the requesting user is subscribed to.
#[get("/follow?<page>")]
pub fn feed(
    page: Option<Page>,
    user: User,
    conn: DbConn,
    flash: Option<FlashMessage<'_, '_>>,
) -> Result<Ructe, ErrorPage> {
    let n_pages = Page::total(Post::count_for_followed(&conn, &user)? as i32);
    let page = page.unwrap_or_default().clamp(n_pages);
    let posts = PostCard::from_posts(
        &conn,
        Post::list_page_for_followed(&conn, &user, page.limits())?,
    )?;
    Ok(render!(posts::index(
        &(Some(user), flash_msg(flash)),
        "Your feed".to_owned(),
        posts,
        page.0,
        n_pages
    )))
}

#[get("/follow", rank = 2)]
pub fn feed_auth() -> Flash<Redirect> {
    requires_login(
        "You need to be logged in order to see your feed",
        "/follow",
    )
}

#[cfg(test)]
mod tests {
    use crate::routes::test_harness::db_pool;
    use rocket::http::Status;
    use rocket::local::Client;

    #[test]
    fn feed_needs_a_session() {
        let rocket = rocket::ignite()
            .mount("/", routes![super::feed, super::feed_auth])
            .manage(db_pool());
        let client = Client::new(rocket).expect("Couldn't build the client");

        // the query string must not keep the fallback route from matching
        let res = client.get("/follow?page=2").dispatch();
        assert_eq!(res.status(), Status::SeeOther);
        assert!(res
            .headers()
            .get_one("Location")
            .map_or(false, |l| l.starts_with("/login")));
    }
}
