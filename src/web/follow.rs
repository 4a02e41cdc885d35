use super::{redirect_to_login, PageQuery};
use crate::follow::get_followed_author_ids;
use crate::middleware::ClientCtx;
use crate::orm::posts;
use crate::pagination::{fetch_page, Page};
use crate::post::{select_posts_for_template, PostForTemplate};
use crate::Settings;
use actix_web::{error, get, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{ColumnTrait, DatabaseConnection, PaginatorTrait, QueryFilter};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_follow_index);
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowTemplate {
    pub client: ClientCtx,
    pub page: Page<PostForTemplate>,
}

/// Posts by the authors the client follows.
#[get("/follow/")]
async fn view_follow_index(
    client: ClientCtx,
    req: HttpRequest,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(redirect_to_login(&req)),
    };

    let authors = get_followed_author_ids(db.get_ref(), user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let page = fetch_page(
        select_posts_for_template()
            .filter(posts::Column::AuthorId.is_in(authors))
            .into_model::<PostForTemplate>()
            .paginate(db.get_ref(), settings.posts_per_page as usize),
        query.page.as_deref(),
        "/follow/".to_owned(),
    )
    .await
    .map_err(error::ErrorInternalServerError)?;

    Ok(FollowTemplate { client, page }.to_response())
}
