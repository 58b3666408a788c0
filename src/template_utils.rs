use quill_models::{
    comments::Comment, groups::Group, medias::Media, posts::Post, users::User, Connection, Result,
};
use rocket::http::{Method, Status};
use rocket::request::{FlashMessage, Request};
use rocket::response::{self, content::Html as HtmlCt, Flash, Redirect, Responder, Response};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

/// What every template gets: the current user (if any), and a one-shot
/// flash message as a (kind, text) pair.
pub type BaseContext<'a> = &'a (Option<User>, Option<(String, String)>);

pub fn flash_msg(flash: Option<FlashMessage<'_, '_>>) -> Option<(String, String)> {
    flash.map(|f| (f.name().to_owned(), f.msg().to_owned()))
}

/// Everything a feed template needs to render one post.
pub struct PostCard {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
    pub media: Option<Media>,
    pub n_comments: i64,
}

impl PostCard {
    pub fn new(conn: &Connection, post: Post) -> Result<PostCard> {
        Ok(PostCard {
            author: post.get_author(conn)?,
            group: post.get_group(conn)?,
            media: post.get_media(conn)?,
            n_comments: post.count_comments(conn)?,
            post,
        })
    }

    pub fn from_posts(conn: &Connection, posts: Vec<Post>) -> Result<Vec<PostCard>> {
        posts.into_iter().map(|p| PostCard::new(conn, p)).collect()
    }
}

pub struct CommentCard {
    pub comment: Comment,
    pub author: User,
}

impl CommentCard {
    pub fn from_comments(conn: &Connection, comments: Vec<Comment>) -> Result<Vec<CommentCard>> {
        comments
            .into_iter()
            .map(|comment| {
                Ok(CommentCard {
                    author: comment.get_author(conn)?,
                    comment,
                })
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct Ructe(pub Vec<u8>);

impl<'r> Responder<'r> for Ructe {
    fn respond_to(self, r: &Request<'_>) -> response::Result<'r> {
        //if method is not Get or page contain a form, no caching
        if r.method() != Method::Get || self.0.windows(6).any(|w| w == b"<form ") {
            return HtmlCt(self.0).respond_to(r);
        }
        let mut hasher = DefaultHasher::new();
        hasher.write(&self.0);
        let etag = format!("{:x}", hasher.finish());
        if r.headers()
            .get("If-None-Match")
            .any(|s| etag_matches(s, &etag))
        {
            Response::build()
                .status(Status::NotModified)
                .header("ETag", etag)
                .ok()
        } else {
            Response::build()
                .merge(HtmlCt(self.0).respond_to(r)?)
                .header("ETag", etag)
                .ok()
        }
    }
}

/// Compares an `If-None-Match` value against our ETag, dropping the
/// surrounding quotes. Headers too short to be quoted never match.
fn etag_matches(header: &str, etag: &str) -> bool {
    header.get(1..header.len().wrapping_sub(1)) == Some(etag)
}

#[macro_export]
macro_rules! render {
    ($group:tt :: $page:tt ( $( $param:expr ),* ) ) => {
        {
            use crate::templates;

            let mut res = vec![];
            templates::$group::$page(
                &mut res,
                $(
                    $param
                ),*
            ).unwrap();
            $crate::template_utils::Ructe(res)
        }
    }
}

/// For routes that can either render a page or redirect somewhere else,
/// depending on what happened.
pub enum RespondOrRedirect {
    Response(Ructe),
    Redirect(Redirect),
    FlashRedirect(Flash<Redirect>),
}

impl<'r> Responder<'r> for RespondOrRedirect {
    fn respond_to(self, req: &Request<'_>) -> response::Result<'r> {
        match self {
            RespondOrRedirect::Response(page) => page.respond_to(req),
            RespondOrRedirect::Redirect(redirect) => redirect.respond_to(req),
            RespondOrRedirect::FlashRedirect(redirect) => redirect.respond_to(req),
        }
    }
}

impl From<Ructe> for RespondOrRedirect {
    fn from(page: Ructe) -> Self {
        RespondOrRedirect::Response(page)
    }
}

impl From<Redirect> for RespondOrRedirect {
    fn from(redirect: Redirect) -> Self {
        RespondOrRedirect::Redirect(redirect)
    }
}

impl From<Flash<Redirect>> for RespondOrRedirect {
    fn from(redirect: Flash<Redirect>) -> Self {
        RespondOrRedirect::FlashRedirect(redirect)
    }
}

#[cfg(test)]
mod tests {
    use super::etag_matches;

    #[test]
    fn etag_comparison_strips_quotes() {
        assert!(etag_matches("\"abc123\"", "abc123"));
        assert!(!etag_matches("\"abc123\"", "abc124"));
    }

    #[test]
    fn malformed_etag_headers_never_match() {
        assert!(!etag_matches("", "abc123"));
        assert!(!etag_matches("\"", "abc123"));
        assert!(!etag_matches("x", "abc123"));
        assert!(!etag_matches("x", ""));
    }
}
