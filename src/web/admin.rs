use super::{redirect, redirect_to_login};
use crate::form::FormErrors;
use crate::group::{
    get_groups_with_counts, insert_group, validate_group_form, GroupFormData, GroupWithCount,
};
use crate::middleware::ClientCtx;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_admin).service(create_group);
}

#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct AdminTemplate {
    pub client: ClientCtx,
    pub groups: Vec<GroupWithCount>,
    pub form: GroupFormData,
    pub errors: FormErrors,
}

/// Guests are sent to login; signed-in users without staff rights get a 403.
fn check_staff(client: &ClientCtx, req: &HttpRequest) -> Result<Option<HttpResponse>, Error> {
    if !client.is_user() {
        return Ok(Some(redirect_to_login(req)));
    }
    if !client.is_staff() {
        return Err(error::ErrorForbidden(
            "You do not have permission to view the admin site.",
        ));
    }
    Ok(None)
}

#[get("/admin/")]
async fn view_admin(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    if let Some(res) = check_staff(&client, &req)? {
        return Ok(res);
    }

    let groups = get_groups_with_counts(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(AdminTemplate {
        client,
        groups,
        form: GroupFormData::default(),
        errors: FormErrors::default(),
    }
    .to_response())
}

#[post("/admin/groups/")]
async fn create_group(
    client: ClientCtx,
    req: HttpRequest,
    form: web::Form<GroupFormData>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    if let Some(res) = check_staff(&client, &req)? {
        return Ok(res);
    }
    let db = db.get_ref();
    let form = form.into_inner();

    let result = match validate_group_form(&form) {
        Ok(group) => insert_group(db, group)
            .await
            .map_err(error::ErrorInternalServerError)?,
        Err(errors) => Err(errors),
    };

    match result {
        Ok(group) => {
            log::info!("user {:?} created group {}", client.get_id(), group.slug);
            Ok(redirect("/admin/"))
        }
        Err(errors) => {
            let groups = get_groups_with_counts(db)
                .await
                .map_err(error::ErrorInternalServerError)?;
            Ok(AdminTemplate {
                client,
                groups,
                form,
                errors,
            }
            .to_response())
        }
    }
}
