use crate::routes::{errors::ErrorPage, requires_login};
use crate::template_utils::{flash_msg, Ructe};
use multipart::server::{
    save::{SaveResult, SavedData},
    Multipart,
};
use quill_models::{db_conn::DbConn, medias::Media, users::User};
use rocket::{
    http::ContentType,
    request::FlashMessage,
    response::{status, Flash, Redirect},
    Data,
};
use std::fs;

#[get("/medias")]
pub fn list(
    user: User,
    conn: DbConn,
    flash: Option<FlashMessage<'_, '_>>,
) -> Result<Ructe, ErrorPage> {
    let medias = Media::for_user(&conn, user.id)?;
    Ok(render!(medias::index(
        &(Some(user), flash_msg(flash)),
        medias
    )))
}

#[get("/medias", rank = 2)]
pub fn list_auth() -> Flash<Redirect> {
    requires_login("You need to be logged in order to see your media", "/medias")
}

#[get("/medias/new")]
pub fn new(user: User, flash: Option<FlashMessage<'_, '_>>) -> Ructe {
    render!(medias::new(&(Some(user), flash_msg(flash))))
}

#[get("/medias/new", rank = 2)]
pub fn new_auth() -> Flash<Redirect> {
    requires_login(
        "You need to be logged in order to upload an image",
        "/medias/new",
    )
}

#[post("/medias/new", data = "<data>")]
pub fn upload(
    user: User,
    data: Data,
    ct: &ContentType,
    conn: DbConn,
) -> Result<Flash<Redirect>, status::BadRequest<&'static str>> {
    if !ct.is_form_data() {
        return Err(status::BadRequest(Some("Expected multipart/form-data")));
    }
    let (_, boundary) = ct
        .params()
        .find(|&(k, _)| k == "boundary")
        .ok_or(status::BadRequest(Some("No boundary")))?;

    let entries = match Multipart::with_body(data.open(), boundary).save().temp() {
        SaveResult::Full(entries) => entries,
        SaveResult::Partial(_, _) | SaveResult::Error(_) => {
            return Err(status::BadRequest(Some("Couldn't read the upload")));
        }
    };
    let fields = entries.fields;

    let file = fields
        .get("file")
        .and_then(|v| v.iter().next())
        .ok_or(status::BadRequest(Some("No file uploaded")))?;
    let filename = file
        .headers
        .filename
        .clone()
        .ok_or(status::BadRequest(Some("The upload has no file name")))?;
    let bytes = match file.data {
        SavedData::Bytes(ref bytes) => bytes.clone(),
        SavedData::File(ref path, _) => fs::read(path)
            .map_err(|_| status::BadRequest(Some("Couldn't read the uploaded file")))?,
        SavedData::Text(_) => {
            return Err(status::BadRequest(Some("Expected a file, got text")));
        }
    };
    let alt_text = fields
        .get("alt")
        .and_then(|v| v.iter().next())
        .and_then(|f| match f.data {
            SavedData::Text(ref s) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default();

    Media::save_file(&conn, &user, &filename, &bytes, &alt_text)
        .map_err(|_| status::BadRequest(Some("This file type is not supported")))?;
    Ok(Flash::success(
        Redirect::to("/medias"),
        "Your image has been uploaded",
    ))
}

#[post("/medias/new", rank = 2)]
pub fn upload_auth() -> Flash<Redirect> {
    requires_login(
        "You need to be logged in order to upload an image",
        "/medias/new",
    )
}
