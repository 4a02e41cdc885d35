use super::{html, PageQuery};
use crate::cache::PageCache;
use crate::middleware::ClientCtx;
use crate::pagination::{fetch_page, Page};
use crate::post::{select_posts_for_template, PostForTemplate};
use crate::Settings;
use actix_web::{error, get, web, Error, HttpResponse};
use askama_actix::Template;
use sea_orm::{DatabaseConnection, PaginatorTrait};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub page: Page<PostForTemplate>,
}

/// Only the client and the requested page select a cached index; other query text is ignored.
/// Any garbage page value renders the first page, and anything below 1 the last one.
fn cache_key(client_id: Option<i32>, page: Option<&str>) -> String {
    let client = client_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "guest".to_owned());
    let page = match page.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(n)) if n < 1 => "last".to_owned(),
        Some(Ok(n)) => n.to_string(),
        _ => "1".to_owned(),
    };
    format!("index:{}:{}", client, page)
}

/// Latest posts from everyone. Rendered pages are cached per client and page.
#[get("/")]
async fn view_index(
    client: ClientCtx,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    settings: web::Data<Settings>,
    cache: web::Data<PageCache>,
) -> Result<HttpResponse, Error> {
    let key = cache_key(client.get_id(), query.page.as_deref());
    if let Some(body) = cache.get(&key) {
        return Ok(html(body));
    }

    let page = fetch_page(
        select_posts_for_template()
            .into_model::<PostForTemplate>()
            .paginate(db.get_ref(), settings.posts_per_page as usize),
        query.page.as_deref(),
        "/".to_owned(),
    )
    .await
    .map_err(error::ErrorInternalServerError)?;

    let body = IndexTemplate { client, page }
        .render()
        .map_err(error::ErrorInternalServerError)?;
    cache.insert(key, body.clone());

    Ok(html(body))
}
