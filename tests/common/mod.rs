#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{body::MessageBody, test};
use blogroll::cache::PageCache;
use blogroll::orm::{groups, posts, users};
use blogroll::user::{insert_new_user, NewUser};
use blogroll::{db, post, Settings};
use sea_orm::{entity::*, DatabaseConnection};
use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse battery";

/// A 2x1 transparent GIF.
pub const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xff\xff\xff\x21\xf9\x04\x00\x00\x00\x00\x00\x2c\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0c\x0a\x00\x3b";

const BOUNDARY: &str = "blogroll-test-boundary";

/// Everything a test app instance shares: an in-memory database and a throwaway media root.
pub struct TestEnv {
    pub db: Data<DatabaseConnection>,
    pub settings: Data<Settings>,
    pub cache: Data<PageCache>,
    pub media: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().expect("media root");
        let conn = db::connect("sqlite::memory:").await.expect("sqlite connection");
        db::create_tables(&conn).await.expect("tables");

        let settings = Settings::for_database("sqlite::memory:", media.path().to_path_buf());
        let cache = PageCache::new(settings.index_cache_ttl);

        Self {
            db: Data::new(conn),
            settings: Data::new(settings),
            cache: Data::new(cache),
            media,
        }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        self.db.get_ref()
    }

    pub async fn create_user(&self, username: &str) -> users::Model {
        insert_new_user(
            self.conn(),
            NewUser {
                username: username.to_owned(),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{}@example.com", username),
                password: PASSWORD.to_owned(),
            },
        )
        .await
        .expect("insert user")
        .expect("username is free")
    }

    pub async fn create_staff(&self, username: &str) -> users::Model {
        let user = self.create_user(username).await;
        let mut active: users::ActiveModel = user.into();
        active.is_staff = Set(true);
        active.update(self.conn()).await.expect("staff flag")
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> groups::Model {
        groups::ActiveModel {
            title: Set(title.to_owned()),
            slug: Set(slug.to_owned()),
            description: Set(format!("All about {}", title)),
            ..Default::default()
        }
        .insert(self.conn())
        .await
        .expect("insert group")
    }

    pub async fn create_post(
        &self,
        author: &users::Model,
        text: &str,
        group: Option<&groups::Model>,
    ) -> posts::Model {
        post::insert_post(
            self.conn(),
            author.id,
            text.to_owned(),
            group.map(|g| g.id),
            None,
        )
        .await
        .expect("insert post")
    }
}

/// Builds the full application around a `TestEnv`, with the same middleware as the server.
#[macro_export]
macro_rules! init_app {
    ($env:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($env.db.clone())
                .app_data($env.settings.clone())
                .app_data($env.cache.clone())
                .wrap(blogroll::web::error::error_handlers())
                .wrap(blogroll::middleware::ClientCtx::default())
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        $env.settings.secret_key.clone(),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .service(blogroll::web::media_files(&$env.settings))
                .configure(blogroll::web::configure),
        )
        .await
    };
}

/// Logs a user in through the login form and returns the session cookie.
#[macro_export]
macro_rules! login {
    ($app:expr, $username:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(&[
                ("username", $username),
                ("password", $crate::common::PASSWORD),
            ])
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        $crate::common::session_cookie(&resp).expect("session cookie")
    }};
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

pub async fn body_string<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Number of post cards on a rendered listing.
pub fn count_posts(html: &str) -> usize {
    html.matches("<article class=\"post\"").count()
}

/// A multipart/form-data body. Returns the content type and the bytes.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((name, filename, data)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}
