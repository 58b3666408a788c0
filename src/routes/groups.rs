use crate::routes::{errors::ErrorPage, Page};
use crate::template_utils::{flash_msg, PostCard, Ructe};
use quill_models::{db_conn::DbConn, groups::Group, posts::Post, users::User};
use rocket::request::FlashMessage;

#[get("/group/<slug>?<page>")]
pub fn details(
    slug: String,
    page: Option<Page>,
    conn: DbConn,
    user: Option<User>,
    flash: Option<FlashMessage<'_, '_>>,
) -> Result<Ructe, ErrorPage> {
    let group = Group::find_by_slug(&conn, &slug)?;
    let n_pages = Page::total(Post::count_for_group(&conn, &group)? as i32);
    let page = page.unwrap_or_default().clamp(n_pages);
    let posts = PostCard::from_posts(&conn, Post::list_page_for_group(&conn, &group, page.limits())?)?;
    Ok(render!(groups::details(
        &(user, flash_msg(flash)),
        group,
        posts,
        page.0,
        n_pages
    )))
}
