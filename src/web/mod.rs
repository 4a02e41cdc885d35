mod about;
mod admin;
mod auth;
pub mod error;
mod follow;
mod group;
mod index;
mod post;
mod profile;

use crate::Settings;
use actix_web::{http::header, HttpRequest, HttpResponse};
use serde::Deserialize;

pub const LOGIN_URL: &str = "/auth/login/";

/// Configures the web app
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Services are matched top->down, higher traffic routes go first.
    index::configure(conf);
    post::configure(conf);
    group::configure(conf);
    profile::configure(conf);
    follow::configure(conf);
    auth::configure(conf);
    about::configure(conf);
    admin::configure(conf);
}

/// Serves uploaded files from the media root.
pub fn media_files(settings: &Settings) -> actix_files::Files {
    actix_files::Files::new(
        crate::media::MEDIA_URL.trim_end_matches('/'),
        settings.media_root.clone(),
    )
    .use_last_modified(true)
}

/// `?page=` on paginated listings. Kept as text so that garbage falls back to page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}

/// Sends a guest to the login form, coming back to this URL afterwards.
pub fn redirect_to_login(req: &HttpRequest) -> HttpResponse {
    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    redirect(&format!("{}?next={}", LOGIN_URL, encode_next(next)))
}

/// Query-encodes a path for `next=`, leaving slashes readable.
pub fn encode_next(path: &str) -> String {
    url::form_urlencoded::byte_serialize(path.as_bytes())
        .collect::<String>()
        .replace("%2F", "/")
}

/// Only local absolute paths may be followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if is_local_path(next) => next,
        _ => "/",
    }
}

/// Browsers drop tabs and newlines and read a backslash as `/`, so none of those pass.
fn is_local_path(next: &str) -> bool {
    if !next.starts_with('/')
        || next.starts_with("//")
        || next.contains('\\')
        || next.chars().any(|c| c.is_control() || c.is_whitespace())
    {
        return false;
    }

    let base = match url::Url::parse("http://localhost/") {
        Ok(base) => base,
        Err(_) => return false,
    };
    match base.join(next) {
        Ok(joined) => joined.origin() == base.origin(),
        Err(_) => false,
    }
}

pub fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}
