use crate::middleware::ClientCtx;
use actix_web::{get, HttpResponse};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_author).service(view_tech);
}

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AuthorTemplate {
    pub client: ClientCtx,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct TechTemplate {
    pub client: ClientCtx,
}

#[get("/about/author/")]
async fn view_author(client: ClientCtx) -> HttpResponse {
    AuthorTemplate { client }.to_response()
}

#[get("/about/tech/")]
async fn view_tech(client: ClientCtx) -> HttpResponse {
    TechTemplate { client }.to_response()
}
