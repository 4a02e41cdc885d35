use super::{redirect, redirect_to_login, safe_next};
use crate::form::FormErrors;
use crate::middleware::ClientCtx;
use crate::session;
use crate::user::{
    authenticate, change_password, insert_new_user, login_failed, validate_signup_form,
    PasswordChangeFormData, SignupFormData,
};
use actix_session::Session;
use actix_web::{error, get, post, route, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_signup)
        .service(post_signup)
        .service(view_login)
        .service(post_login)
        .service(view_logout)
        .service(view_password_change)
        .service(post_password_change)
        .service(view_password_change_done);
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub client: ClientCtx,
    pub form: SignupFormData,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub client: ClientCtx,
    pub username: String,
    pub next: Option<String>,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub client: ClientCtx,
}

#[derive(Template)]
#[template(path = "users/password_change_form.html")]
pub struct PasswordChangeTemplate {
    pub client: ClientCtx,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/password_change_done.html")]
pub struct PasswordChangeDoneTemplate {
    pub client: ClientCtx,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginFormData {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

#[get("/auth/signup/")]
async fn view_signup(client: ClientCtx) -> HttpResponse {
    SignupTemplate {
        client,
        form: SignupFormData::default(),
        errors: FormErrors::default(),
    }
    .to_response()
}

#[post("/auth/signup/")]
async fn post_signup(
    client: ClientCtx,
    cookies: Session,
    form: web::Form<SignupFormData>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let form = form.into_inner();

    let new_user = match validate_signup_form(&form) {
        Ok(new_user) => new_user,
        Err(errors) => return Ok(SignupTemplate { client, form, errors }.to_response()),
    };

    let user = match insert_new_user(db.get_ref(), new_user)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        Ok(user) => user,
        Err(errors) => return Ok(SignupTemplate { client, form, errors }.to_response()),
    };

    log::info!("new user {} ({})", user.username, user.id);
    session::login(&cookies, user.id)?;

    Ok(redirect("/"))
}

#[get("/auth/login/")]
async fn view_login(client: ClientCtx, query: web::Query<NextQuery>) -> HttpResponse {
    LoginTemplate {
        client,
        username: String::new(),
        next: query.into_inner().next,
        errors: FormErrors::default(),
    }
    .to_response()
}

#[post("/auth/login/")]
async fn post_login(
    client: ClientCtx,
    cookies: Session,
    query: web::Query<NextQuery>,
    form: web::Form<LoginFormData>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let form = form.into_inner();
    let next = form.next.or_else(|| query.into_inner().next);

    let user = authenticate(db.get_ref(), &form.username, &form.password)
        .await
        .map_err(error::ErrorInternalServerError)?;

    match user {
        Some(user) => {
            log::info!("user {} logged in", user.username);
            session::login(&cookies, user.id)?;
            Ok(redirect(safe_next(next.as_deref())))
        }
        None => {
            log::info!("failed login for {:?}", form.username);
            Ok(LoginTemplate {
                client,
                username: form.username,
                next,
                errors: login_failed(),
            }
            .to_response())
        }
    }
}

#[route("/auth/logout/", method = "GET", method = "POST")]
async fn view_logout(cookies: Session) -> HttpResponse {
    session::logout(&cookies);

    // The context for this request was built before the session was cleared.
    LoggedOutTemplate {
        client: ClientCtx::default(),
    }
    .to_response()
}

#[get("/auth/password_change/")]
async fn view_password_change(client: ClientCtx, req: HttpRequest) -> HttpResponse {
    if !client.is_user() {
        return redirect_to_login(&req);
    }

    PasswordChangeTemplate {
        client,
        errors: FormErrors::default(),
    }
    .to_response()
}

#[post("/auth/password_change/")]
async fn post_password_change(
    client: ClientCtx,
    req: HttpRequest,
    form: web::Form<PasswordChangeFormData>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(redirect_to_login(&req)),
    };

    match change_password(db.get_ref(), user_id, &form)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        Ok(()) => {
            log::info!("user {} changed their password", user_id);
            Ok(redirect("/auth/password_change/done/"))
        }
        Err(errors) => Ok(PasswordChangeTemplate { client, errors }.to_response()),
    }
}

#[get("/auth/password_change/done/")]
async fn view_password_change_done(client: ClientCtx, req: HttpRequest) -> HttpResponse {
    if !client.is_user() {
        return redirect_to_login(&req);
    }

    PasswordChangeDoneTemplate { client }.to_response()
}
