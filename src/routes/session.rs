use crate::routes::errors::ErrorPage;
use crate::template_utils::{RespondOrRedirect, Ructe};
use quill_models::{
    db_conn::DbConn,
    users::{User, AUTH_COOKIE},
};
use rocket::{
    http::{Cookie, Cookies},
    request::{FlashMessage, LenientForm},
    response::{Flash, Redirect},
};
use validator::{Validate, ValidationErrors};

#[get("/login?<m>")]
pub fn new(
    user: Option<User>,
    m: Option<String>,
    flash: Option<FlashMessage<'_, '_>>,
) -> Ructe {
    // a "callback" flash carries the URL to go back to once logged in
    let back = flash
        .and_then(|f| {
            if f.name() == "callback" {
                Some(f.msg().to_owned())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "/".to_owned());
    render!(session::login(
        &(user, None),
        m,
        back,
        &LoginForm::default(),
        ValidationErrors::default()
    ))
}

#[derive(Default, FromForm, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "We need an email, or a username, to identify you"))]
    pub email_or_name: String,
    #[validate(length(min = 1, message = "Your password can't be empty"))]
    pub password: String,
    pub back: Option<String>,
}

#[post("/login", data = "<form>")]
pub fn create(
    form: LenientForm<LoginForm>,
    conn: DbConn,
    mut cookies: Cookies<'_>,
) -> Result<RespondOrRedirect, ErrorPage> {
    let form = form.into_inner();
    let back = form
        .back
        .clone()
        .filter(|b| b.starts_with('/'))
        .unwrap_or_else(|| "/".to_owned());

    if let Err(errors) = form.validate() {
        return Ok(render!(session::login(&(None, None), None, back, &form, errors)).into());
    }

    match User::login(&conn, &form.email_or_name, &form.password) {
        Ok(user) => {
            cookies.add_private(Cookie::new(AUTH_COOKIE, user.id.to_string()));
            Ok(Flash::success(Redirect::to(back), "You are now connected").into())
        }
        Err(_) => {
            let mut errors = ValidationErrors::new();
            errors.add(
                "email_or_name",
                validator::ValidationError {
                    code: std::borrow::Cow::from("invalid_login"),
                    message: Some(std::borrow::Cow::from(
                        "Invalid username, or wrong password",
                    )),
                    params: std::collections::HashMap::new(),
                },
            );
            Ok(render!(session::login(&(None, None), None, back, &form, errors)).into())
        }
    }
}

#[get("/logout")]
pub fn delete(mut cookies: Cookies<'_>) -> Flash<Redirect> {
    if let Some(cookie) = cookies.get_private(AUTH_COOKIE) {
        cookies.remove_private(cookie);
    }
    Flash::success(Redirect::to("/"), "You are now logged out")
}
