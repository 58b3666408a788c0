#![feature(proc_macro_hygiene, decl_macro)]

#[macro_use]
extern crate rocket;
#[macro_use]
extern crate shrinkwraprs;
#[cfg(test)]
#[macro_use]
extern crate diesel_migrations;

#[macro_use]
mod template_utils;
mod cache;
mod routes;

include!(concat!(env!("OUT_DIR"), "/templates.rs"));

use cache::Cache;
use dotenv::dotenv;
use quill_models::{db_conn::init_pool, CONFIG};
use std::{sync::Arc, time::Duration};
use tracing::info;

fn main() {
    dotenv().ok();
    tracing_subscriber::fmt().init();

    let pool = init_pool();
    info!("connected to {}", CONFIG.db_name);

    rocket::ignite()
        .mount(
            "/",
            routes![
                routes::posts::index,
                routes::posts::new,
                routes::posts::new_auth,
                routes::posts::create,
                routes::posts::create_auth,
                routes::posts::details,
                routes::posts::details_auth,
                routes::posts::edit,
                routes::posts::edit_auth,
                routes::posts::update,
                routes::posts::update_auth,
                routes::comments::create,
                routes::comments::create_auth,
                routes::groups::details,
                routes::follows::create,
                routes::follows::create_auth,
                routes::follows::delete,
                routes::follows::delete_auth,
                routes::follows::feed,
                routes::follows::feed_auth,
                routes::user::details,
                routes::user::new,
                routes::user::create,
                routes::session::new,
                routes::session::create,
                routes::session::delete,
                routes::medias::list,
                routes::medias::list_auth,
                routes::medias::new,
                routes::medias::new_auth,
                routes::medias::upload,
                routes::medias::upload_auth,
                routes::errors::forced_error,
                routes::static_files,
            ],
        )
        .register(catchers![
            routes::errors::not_found,
            routes::errors::server_error
        ])
        .manage(pool)
        .manage(Arc::new(Cache::new(Duration::from_secs(CONFIG.cache_ttl))))
        .launch();
}
