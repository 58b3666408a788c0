use crate::routes::{errors::ErrorPage, Page};
use crate::template_utils::{flash_msg, PostCard, RespondOrRedirect, Ructe};
use quill_models::{
    db_conn::DbConn,
    posts::Post,
    users::{NewUser, User, AUTH_COOKIE},
};
use rocket::{
    http::{Cookie, Cookies},
    request::{FlashMessage, LenientForm},
    response::{Flash, Redirect},
};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

#[get("/<name>?<page>", rank = 5)]
pub fn details(
    name: String,
    page: Option<Page>,
    conn: DbConn,
    requester: Option<User>,
    flash: Option<FlashMessage<'_, '_>>,
) -> Result<Ructe, ErrorPage> {
    let user = User::find_by_name(&conn, &name)?;
    let n_pages = Page::total(Post::count_for_author(&conn, &user)? as i32);
    let page = page.unwrap_or_default().clamp(n_pages);
    let posts = PostCard::from_posts(
        &conn,
        Post::list_page_for_author(&conn, &user, page.limits())?,
    )?;
    let n_followers = user.count_followers(&conn)?;
    let n_followed = user.count_followed(&conn)?;
    let is_followed = match requester {
        Some(ref req) => req.is_following(&conn, user.id)?,
        None => false,
    };

    Ok(render!(users::details(
        &(requester, flash_msg(flash)),
        user,
        posts,
        n_followers,
        n_followed,
        is_followed,
        page.0,
        n_pages
    )))
}

#[derive(Default, FromForm, Validate)]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub struct NewUserForm {
    #[validate(
        length(min = 1, message = "Username can't be empty"),
        custom(
            function = "validate_username",
            message = "Username is not allowed to contain any of < > & @ ' or \""
        )
    )]
    pub username: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password should be at least 8 characters long"))]
    pub password: String,
    #[validate(length(min = 8, message = "Password should be at least 8 characters long"))]
    pub password_confirmation: String,
}

pub fn passwords_match(form: &NewUserForm) -> Result<(), ValidationError> {
    if form.password != form.password_confirmation {
        let mut err = ValidationError::new("password_match");
        err.message = Some(Cow::from("Passwords are not matching"));
        Err(err)
    } else {
        Ok(())
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.contains(&['<', '>', '&', '@', '\'', '"', '/', ' ', '\n', '\t'][..]) {
        Err(ValidationError::new("username_illegal_char"))
    } else {
        Ok(())
    }
}

#[get("/users/new")]
pub fn new(user: Option<User>, flash: Option<FlashMessage<'_, '_>>) -> Ructe {
    render!(users::new(
        &(user, flash_msg(flash)),
        &NewUserForm::default(),
        ValidationErrors::default()
    ))
}

#[post("/users/new", data = "<form>")]
pub fn create(
    form: LenientForm<NewUserForm>,
    conn: DbConn,
    mut cookies: Cookies<'_>,
) -> Result<RespondOrRedirect, ErrorPage> {
    let form = form.into_inner();

    let mut errors = match form.validate() {
        Ok(_) => ValidationErrors::new(),
        Err(e) => e,
    };
    if User::find_by_name(&conn, &form.username).is_ok() {
        let mut err = ValidationError::new("username_taken");
        err.message = Some(Cow::from("This username is already taken"));
        errors.add("username", err);
    }
    if User::find_by_email(&conn, &form.email).is_ok() {
        let mut err = ValidationError::new("email_taken");
        err.message = Some(Cow::from("This email is already used"));
        errors.add("email", err);
    }
    if !errors.errors().is_empty() {
        return Ok(render!(users::new(&(None, None), &form, errors)).into());
    }

    let user = User::insert(
        &conn,
        NewUser {
            username: form.username.clone(),
            display_name: form.username.clone(),
            email: form.email.clone(),
            hashed_password: User::hash_pass(&form.password)?,
        },
    )?;
    cookies.add_private(Cookie::new(AUTH_COOKIE, user.id.to_string()));

    Ok(Flash::success(Redirect::to("/"), "Welcome on Quill!").into())
}
