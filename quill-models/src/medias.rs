use crate::{schema::medias, users::User, Connection, Error, Result, CONFIG};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use guid_create::GUID;
use std::{ffi::OsStr, fs, path::Path};
use tracing::info;

const ALLOWED_IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "svg"];

/// An image uploaded by a user, to illustrate their posts.
#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Media {
    pub id: i32,
    pub file_path: String,
    pub alt_text: String,
    pub owner_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "medias"]
pub struct NewMedia {
    pub file_path: String,
    pub alt_text: String,
    pub owner_id: i32,
}

impl Media {
    get!(medias);
    insert!(medias, NewMedia);
    list_by!(medias, for_user, owner_id as i32);

    pub fn is_valid_image(filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(OsStr::to_str)
            .map(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Writes the uploaded bytes under the media directory, with a random
    /// name, and records the new media.
    pub fn save_file(
        conn: &Connection,
        owner: &User,
        filename: &str,
        bytes: &[u8],
        alt_text: &str,
    ) -> Result<Media> {
        if !Media::is_valid_image(filename) {
            return Err(Error::InvalidValue);
        }
        let ext = Path::new(filename)
            .extension()
            .and_then(OsStr::to_str)
            .unwrap_or("png")
            .to_lowercase();

        fs::create_dir_all(&CONFIG.media_directory)?;
        let dest = format!("{}/{}.{}", CONFIG.media_directory, GUID::rand(), ext);
        fs::write(&dest, bytes)?;
        info!("saved upload from {} as {}", owner.username, dest);

        Media::insert(
            conn,
            NewMedia {
                file_path: dest,
                alt_text: alt_text.to_owned(),
                owner_id: owner.id,
            },
        )
    }

    pub fn url(&self) -> String {
        format!("/{}", self.file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extension_allow_list() {
        assert!(Media::is_valid_image("cat.png"));
        assert!(Media::is_valid_image("cat.JPG"));
        assert!(Media::is_valid_image("archive.tar.webp"));
        assert!(!Media::is_valid_image("cat.pdf"));
        assert!(!Media::is_valid_image("script.svg.exe"));
        assert!(!Media::is_valid_image("noextension"));
    }
}
