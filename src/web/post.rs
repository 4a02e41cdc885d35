use super::{redirect, redirect_to_login};
use crate::cache::PageCache;
use crate::comment::{
    get_comments_for_post, insert_comment, validate_comment_form, CommentForTemplate,
    CommentFormData,
};
use crate::group::get_groups;
use crate::media::{read_field_bytes, read_field_string, save_post_image, UploadedFile};
use crate::middleware::ClientCtx;
use crate::orm::{groups, posts};
use crate::post::{
    count_posts_by_author, get_post_for_template, insert_post, update_post, validate_post_form,
    PostForTemplate, PostForm, PostFormData, PostSubmission,
};
use crate::Settings;
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{error, get, post, web, Error, FromRequest, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use futures::TryStreamExt;
use sea_orm::{DatabaseConnection, EntityTrait};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_post)
        .service(create_post_form)
        .service(create_post)
        .service(edit_post)
        .service(update_post_form)
        .service(add_comment);
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub client: ClientCtx,
    pub post: PostForTemplate,
    pub author_posts_count: usize,
    pub comments: Vec<CommentForTemplate>,
}

impl PostDetailTemplate {
    pub fn can_edit(&self) -> bool {
        self.client.can_update_post(&self.post)
    }
}

#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub client: ClientCtx,
    pub form: PostForm,
    pub groups: Vec<groups::Model>,
    /// Set when editing an existing post.
    pub post_id: Option<i32>,
}

impl PostFormTemplate {
    pub fn is_edit(&self) -> bool {
        self.post_id.is_some()
    }

    pub fn action(&self) -> String {
        match self.post_id {
            Some(id) => format!("/posts/{}/edit/", id),
            None => "/create/".to_owned(),
        }
    }
}

#[get("/posts/{post_id}/")]
async fn view_post(
    client: ClientCtx,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let db = db.get_ref();
    let post = get_post_for_template(db, path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))?;

    let author_posts_count = count_posts_by_author(db, post.author_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let comments = get_comments_for_post(db, post.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(PostDetailTemplate {
        client,
        post,
        author_posts_count,
        comments,
    }
    .to_response())
}

#[get("/create/")]
async fn create_post_form(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login(&req));
    }

    let groups = get_groups(db.get_ref())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(PostFormTemplate {
        client,
        form: PostForm::default(),
        groups,
        post_id: None,
    }
    .to_response())
}

#[post("/create/")]
async fn create_post(
    client: ClientCtx,
    req: HttpRequest,
    payload: web::Payload,
    db: web::Data<DatabaseConnection>,
    settings: web::Data<Settings>,
    cache: web::Data<PageCache>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(redirect_to_login(&req)),
    };
    let db = db.get_ref();

    let submission = read_post_submission(&req, payload).await?;
    let groups = get_groups(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let clean = match validate_post_form(submission, &groups) {
        Ok(clean) => clean,
        Err(form) => {
            return Ok(PostFormTemplate {
                client,
                form,
                groups,
                post_id: None,
            }
            .to_response())
        }
    };

    let image = store_image(&settings, clean.image).await?;
    let post = insert_post(db, user_id, clean.text, clean.group_id, image)
        .await
        .map_err(error::ErrorInternalServerError)?;
    log::info!("user {} created post {}", user_id, post.id);
    cache.clear();

    Ok(redirect(&format!("/profile/{}/", client.get_name())))
}

#[get("/posts/{post_id}/edit/")]
async fn edit_post(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(redirect_to_login(&req)),
    };
    let db = db.get_ref();
    let post = get_post_model(db, path.into_inner()).await?;

    if post.author_id != user_id {
        return Ok(redirect(&format!("/posts/{}/", post.id)));
    }

    let groups = get_groups(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(PostFormTemplate {
        client,
        form: PostForm::for_post(&post),
        groups,
        post_id: Some(post.id),
    }
    .to_response())
}

#[post("/posts/{post_id}/edit/")]
async fn update_post_form(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    payload: web::Payload,
    db: web::Data<DatabaseConnection>,
    settings: web::Data<Settings>,
    cache: web::Data<PageCache>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(redirect_to_login(&req)),
    };
    let db = db.get_ref();
    let post = get_post_model(db, path.into_inner()).await?;
    let post_id = post.id;

    if post.author_id != user_id {
        return Ok(redirect(&format!("/posts/{}/", post_id)));
    }

    let submission = read_post_submission(&req, payload).await?;
    let groups = get_groups(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let clean = match validate_post_form(submission, &groups) {
        Ok(clean) => clean,
        Err(mut form) => {
            form.image = post.image;
            return Ok(PostFormTemplate {
                client,
                form,
                groups,
                post_id: Some(post_id),
            }
            .to_response());
        }
    };

    let image = store_image(&settings, clean.image).await?;
    update_post(db, post, clean.text, clean.group_id, image)
        .await
        .map_err(error::ErrorInternalServerError)?;
    log::info!("user {} edited post {}", user_id, post_id);
    cache.clear();

    Ok(redirect(&format!("/posts/{}/", post_id)))
}

#[post("/posts/{post_id}/comment/")]
async fn add_comment(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Form<CommentFormData>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(redirect_to_login(&req)),
    };
    let db = db.get_ref();
    let post = get_post_model(db, path.into_inner()).await?;

    match validate_comment_form(&form) {
        Ok(text) => {
            let comment = insert_comment(db, post.id, user_id, text)
                .await
                .map_err(error::ErrorInternalServerError)?;
            log::info!("user {} commented {} on post {}", user_id, comment.id, post.id);
        }
        Err(_) => log::debug!("add_comment: empty comment on post {}", post.id),
    }

    Ok(redirect(&format!("/posts/{}/", post.id)))
}

async fn get_post_model(db: &DatabaseConnection, id: i32) -> Result<posts::Model, Error> {
    posts::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))
}

/// Writes the image, if any, off the async workers.
async fn store_image(
    settings: &Settings,
    image: Option<UploadedFile>,
) -> Result<Option<String>, Error> {
    let upload = match image {
        Some(upload) => upload,
        None => return Ok(None),
    };
    let media_root = settings.media_root.clone();
    let path = web::block(move || save_post_image(&media_root, &upload))
        .await
        .map_err(error::ErrorInternalServerError)?
        .map_err(|e| {
            log::error!("store_image: {}", e);
            error::ErrorInternalServerError("Could not store the uploaded image.")
        })?;
    Ok(Some(path))
}

/// Reads a post form from either a multipart or a urlencoded body.
async fn read_post_submission(
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<PostSubmission, Error> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        return read_multipart(Multipart::new(req.headers(), payload)).await;
    }

    let mut payload = payload.into_inner();
    let form = web::Form::<PostFormData>::from_request(req, &mut payload).await?;
    Ok(form.into_inner().into())
}

async fn read_multipart(mut multipart: Multipart) -> Result<PostSubmission, Error> {
    let mut submission = PostSubmission::default();

    while let Some(mut field) = multipart.try_next().await.map_err(|e| {
        log::error!("read_multipart: {}", e);
        error::ErrorBadRequest("Malformed multipart body.")
    })? {
        let disposition = field.content_disposition().clone();
        match disposition.get_name().unwrap_or_default() {
            "text" => submission.text = read_field_string(&mut field).await?,
            "group" => submission.group = Some(read_field_string(&mut field).await?),
            "image" => {
                let data = read_field_bytes(&mut field).await?;
                // An empty file input is sent without a filename.
                if let Some(filename) = disposition.get_filename().filter(|f| !f.is_empty()) {
                    submission.image = Some(UploadedFile {
                        filename: filename.to_owned(),
                        data,
                    });
                }
            }
            _ => {
                read_field_bytes(&mut field).await?;
            }
        }
    }

    Ok(submission)
}
