use crate::cache::Cache;
use crate::routes::{errors::ErrorPage, requires_login, Page};
use crate::template_utils::{flash_msg, PostCard, RespondOrRedirect, Ructe};
use quill_models::{
    db_conn::DbConn,
    groups::Group,
    medias::Media,
    posts::{NewPost, Post},
    safe_string::SafeString,
    users::User,
    Error,
};
use rocket::{
    request::{FlashMessage, LenientForm},
    response::{Flash, Redirect},
    State,
};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

#[get("/?<page>")]
pub fn index(
    page: Option<Page>,
    conn: DbConn,
    user: Option<User>,
    flash: Option<FlashMessage<'_, '_>>,
    cache: State<'_, Arc<Cache>>,
) -> Result<Ructe, ErrorPage> {
    let n_pages = Page::total(Post::count(&conn)? as i32);
    let page = page.unwrap_or_default().clamp(n_pages);
    let cacheable = user.is_none() && flash.is_none();

    if cacheable {
        if let Some(body) = cache.get(page.0) {
            return Ok(Ructe(body));
        }
    }

    let posts = PostCard::from_posts(&conn, Post::list_page(&conn, page.limits())?)?;
    let res = render!(posts::index(
        &(user, flash_msg(flash)),
        "Latest posts".to_owned(),
        posts,
        page.0,
        n_pages
    ));

    if cacheable {
        cache.insert(page.0, res.0.clone());
    }
    Ok(res)
}

#[derive(Default, FromForm, Validate)]
pub struct NewPostForm {
    #[validate(length(min = 1, message = "Your post can't be empty"))]
    pub content: String,
    pub group: Option<i32>,
    pub media: Option<i32>,
}

#[get("/new")]
pub fn new(user: User, conn: DbConn, flash: Option<FlashMessage<'_, '_>>) -> Result<Ructe, ErrorPage> {
    let groups = Group::list(&conn)?;
    let medias = Media::for_user(&conn, user.id)?;
    Ok(render!(posts::new(
        &(Some(user), flash_msg(flash)),
        "/new".to_owned(),
        false,
        &NewPostForm::default(),
        ValidationErrors::default(),
        groups,
        medias
    )))
}

#[get("/new", rank = 2)]
pub fn new_auth() -> Flash<Redirect> {
    requires_login("You need to be logged in order to write a post", "/new")
}

#[post("/new", data = "<form>")]
pub fn create(
    form: LenientForm<NewPostForm>,
    user: User,
    conn: DbConn,
    cache: State<'_, Arc<Cache>>,
) -> Result<RespondOrRedirect, ErrorPage> {
    let form = form.into_inner();

    if let Err(errors) = form.validate() {
        let groups = Group::list(&conn)?;
        let medias = Media::for_user(&conn, user.id)?;
        return Ok(render!(posts::new(
            &(Some(user), None),
            "/new".to_owned(),
            false,
            &form,
            errors,
            groups,
            medias
        ))
        .into());
    }

    let group_id = match form.group {
        Some(id) => Some(Group::get(&conn, id)?.id),
        None => None,
    };
    let media_id = match form.media {
        Some(id) => {
            let media = Media::get(&conn, id)?;
            if media.owner_id != user.id {
                return Err(Error::Unauthorized.into());
            }
            Some(media.id)
        }
        None => None,
    };

    Post::insert(
        &conn,
        NewPost {
            author_id: user.id,
            group_id,
            content: SafeString::new(&form.content),
            media_id,
        },
    )?;
    cache.invalidate();

    Ok(Flash::success(Redirect::to("/"), "Your post has been published").into())
}

#[post("/new", rank = 2)]
pub fn create_auth() -> Flash<Redirect> {
    requires_login("You need to be logged in order to write a post", "/new")
}

#[get("/<name>/<id>", rank = 3)]
pub fn details(
    name: String,
    id: i32,
    user: User,
    conn: DbConn,
    flash: Option<FlashMessage<'_, '_>>,
) -> Result<Ructe, ErrorPage> {
    let author = User::find_by_name(&conn, &name)?;
    let post = Post::find_for_author(&conn, author.id, id)?;
    let comments = crate::routes::comments::comment_cards(&conn, &post)?;
    let card = PostCard::new(&conn, post)?;
    Ok(render!(posts::details(
        &(Some(user), flash_msg(flash)),
        card,
        comments,
        &crate::routes::comments::NewCommentForm::default(),
        ValidationErrors::default()
    )))
}

#[get("/<name>/<id>", rank = 4)]
pub fn details_auth(name: String, id: i32) -> Flash<Redirect> {
    requires_login(
        "You need to be logged in order to read a post",
        format!("/{}/{}", name, id),
    )
}

#[get("/<name>/<id>/edit", rank = 3)]
pub fn edit(
    name: String,
    id: i32,
    user: User,
    conn: DbConn,
    flash: Option<FlashMessage<'_, '_>>,
) -> Result<RespondOrRedirect, ErrorPage> {
    let author = User::find_by_name(&conn, &name)?;
    let post = Post::find_for_author(&conn, author.id, id)?;

    // only the author may edit; everyone else is sent back to the post
    if post.author_id != user.id {
        return Ok(Redirect::to(format!("/{}/{}", name, id)).into());
    }

    let form = NewPostForm {
        content: post.content.get().to_owned(),
        group: post.group_id,
        media: post.media_id,
    };
    let groups = Group::list(&conn)?;
    let medias = Media::for_user(&conn, user.id)?;
    Ok(render!(posts::new(
        &(Some(user), flash_msg(flash)),
        format!("/{}/{}/edit", name, id),
        true,
        &form,
        ValidationErrors::default(),
        groups,
        medias
    ))
    .into())
}

#[get("/<name>/<id>/edit", rank = 4)]
pub fn edit_auth(name: String, id: i32) -> Flash<Redirect> {
    requires_login(
        "You need to be logged in order to edit a post",
        format!("/{}/{}/edit", name, id),
    )
}

#[post("/<name>/<id>/edit", data = "<form>", rank = 3)]
pub fn update(
    name: String,
    id: i32,
    form: LenientForm<NewPostForm>,
    user: User,
    conn: DbConn,
    cache: State<'_, Arc<Cache>>,
) -> Result<RespondOrRedirect, ErrorPage> {
    let author = User::find_by_name(&conn, &name)?;
    let mut post = Post::find_for_author(&conn, author.id, id)?;

    if post.author_id != user.id {
        return Ok(Redirect::to(format!("/{}/{}", name, id)).into());
    }

    let form = form.into_inner();
    if let Err(errors) = form.validate() {
        let groups = Group::list(&conn)?;
        let medias = Media::for_user(&conn, user.id)?;
        return Ok(render!(posts::new(
            &(Some(user), None),
            format!("/{}/{}/edit", name, id),
            true,
            &form,
            errors,
            groups,
            medias
        ))
        .into());
    }

    post.content = SafeString::new(&form.content);
    post.group_id = match form.group {
        Some(gid) => Some(Group::get(&conn, gid)?.id),
        None => None,
    };
    post.media_id = match form.media {
        Some(mid) => {
            let media = Media::get(&conn, mid)?;
            if media.owner_id != user.id {
                return Err(Error::Unauthorized.into());
            }
            Some(media.id)
        }
        None => None,
    };
    post.update(&conn)?;
    cache.invalidate();

    Ok(Flash::success(
        Redirect::to(format!("/{}/{}", name, id)),
        "Your post has been updated",
    )
    .into())
}

#[post("/<name>/<id>/edit", rank = 4)]
pub fn update_auth(name: String, id: i32) -> Flash<Redirect> {
    requires_login(
        "You need to be logged in order to edit a post",
        format!("/{}/{}/edit", name, id),
    )
}
