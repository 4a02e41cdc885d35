use super::{redirect, redirect_to_login, PageQuery};
use crate::follow::{follow, is_following, unfollow, FollowOutcome};
use crate::middleware::ClientCtx;
use crate::orm::posts;
use crate::pagination::{fetch_page, Page};
use crate::post::{select_posts_for_template, PostForTemplate};
use crate::user::{get_profile_by_username, UserProfile};
use crate::Settings;
use actix_web::{error, get, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{ColumnTrait, DatabaseConnection, PaginatorTrait, QueryFilter};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_profile)
        .service(profile_follow)
        .service(profile_unfollow);
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub client: ClientCtx,
    pub author: UserProfile,
    pub page: Page<PostForTemplate>,
    pub following: bool,
}

async fn get_author(db: &DatabaseConnection, username: &str) -> Result<UserProfile, Error> {
    get_profile_by_username(db, username)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))
}

#[get("/profile/{username}/")]
async fn view_profile(
    client: ClientCtx,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, Error> {
    let author = get_author(db.get_ref(), &path.into_inner()).await?;

    let page = fetch_page(
        select_posts_for_template()
            .filter(posts::Column::AuthorId.eq(author.id))
            .into_model::<PostForTemplate>()
            .paginate(db.get_ref(), settings.posts_per_page as usize),
        query.page.as_deref(),
        format!("/profile/{}/", author.username),
    )
    .await
    .map_err(error::ErrorInternalServerError)?;

    let following = match client.get_id() {
        Some(user_id) if user_id != author.id => is_following(db.get_ref(), user_id, author.id)
            .await
            .map_err(error::ErrorInternalServerError)?,
        _ => false,
    };

    Ok(ProfileTemplate {
        client,
        author,
        page,
        following,
    }
    .to_response())
}

#[get("/profile/{username}/follow/")]
async fn profile_follow(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(redirect_to_login(&req)),
    };
    let author = get_author(db.get_ref(), &path.into_inner()).await?;

    match follow(db.get_ref(), user_id, author.id)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        FollowOutcome::Followed => {
            log::info!("user {} follows {}", user_id, author.username)
        }
        outcome => log::debug!("profile_follow: {:?} for user {}", outcome, user_id),
    }

    Ok(redirect(&format!("/profile/{}/", author.username)))
}

#[get("/profile/{username}/unfollow/")]
async fn profile_unfollow(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(redirect_to_login(&req)),
    };
    let author = get_author(db.get_ref(), &path.into_inner()).await?;

    if unfollow(db.get_ref(), user_id, author.id)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        log::info!("user {} unfollowed {}", user_id, author.username);
    }

    Ok(redirect(&format!("/profile/{}/", author.username)))
}
