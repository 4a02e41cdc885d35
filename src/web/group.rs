use super::PageQuery;
use crate::group::get_group_by_slug;
use crate::middleware::ClientCtx;
use crate::orm::{groups, posts};
use crate::pagination::{fetch_page, Page};
use crate::post::{select_posts_for_template, PostForTemplate};
use crate::Settings;
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{ColumnTrait, DatabaseConnection, PaginatorTrait, QueryFilter};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_group);
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupTemplate {
    pub client: ClientCtx,
    pub group: groups::Model,
    pub page: Page<PostForTemplate>,
}

#[get("/group/{slug}/")]
async fn view_group(
    client: ClientCtx,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    settings: web::Data<Settings>,
) -> Result<impl Responder, Error> {
    let group = get_group_by_slug(db.get_ref(), &path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Group not found."))?;

    let page = fetch_page(
        select_posts_for_template()
            .filter(posts::Column::GroupId.eq(group.id))
            .into_model::<PostForTemplate>()
            .paginate(db.get_ref(), settings.posts_per_page as usize),
        query.page.as_deref(),
        format!("/group/{}/", group.slug),
    )
    .await
    .map_err(error::ErrorInternalServerError)?;

    Ok(GroupTemplate {
        client,
        group,
        page,
    }
    .to_response())
}
