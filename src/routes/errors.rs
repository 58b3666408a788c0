use crate::template_utils::Ructe;
use quill_models::{users::User, Error};
use rocket::{
    http::Status,
    response::{self, status::Custom, Responder, Response},
    Request,
};
use tracing::warn;

#[derive(Shrinkwrap)]
pub struct ErrorPage(Error);

impl From<Error> for ErrorPage {
    fn from(err: Error) -> ErrorPage {
        ErrorPage(err)
    }
}

impl<'r> Responder<'r> for ErrorPage {
    fn respond_to(self, req: &Request<'_>) -> response::Result<'r> {
        let user = req.guard::<User>().succeeded();
        let ctx = (user, None);
        match self.0 {
            Error::NotFound => Response::build_from(
                render!(errors::not_found(&ctx, req.uri().path().to_owned())).respond_to(req)?,
            )
            .status(Status::NotFound)
            .ok(),
            Error::Unauthorized => Response::build_from(
                render!(errors::not_found(&ctx, req.uri().path().to_owned())).respond_to(req)?,
            )
            .status(Status::NotFound)
            .ok(),
            other => {
                warn!("server error: {:?}", other);
                Response::build_from(render!(errors::server_error(&ctx)).respond_to(req)?)
                    .status(Status::InternalServerError)
                    .ok()
            }
        }
    }
}

#[catch(404)]
pub fn not_found(req: &Request<'_>) -> Ructe {
    let user = req.guard::<User>().succeeded();
    render!(errors::not_found(
        &(user, None),
        req.uri().path().to_owned()
    ))
}

#[catch(500)]
pub fn server_error(req: &Request<'_>) -> Ructe {
    let user = req.guard::<User>().succeeded();
    render!(errors::server_error(&(user, None)))
}

/// Kept around to check what the error page looks like without having to
/// break something first.
#[get("/500")]
pub fn forced_error(user: Option<User>) -> Custom<Ructe> {
    Custom(
        Status::InternalServerError,
        render!(errors::server_error(&(user, None))),
    )
}
