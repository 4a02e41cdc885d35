use crate::form::{required_text, FormErrors};
use crate::orm::{comments, users};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult};
use serde::Deserialize;

/// A comment joined with its author.
#[derive(Clone, Debug, FromQueryResult)]
pub struct CommentForTemplate {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
    pub created_at: chrono::NaiveDateTime,
    // join users
    pub author_username: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentFormData {
    pub text: String,
}

/// Returns the trimmed comment text or the form errors.
pub fn validate_comment_form(form: &CommentFormData) -> Result<String, FormErrors> {
    let mut errors = FormErrors::default();
    let text = required_text(&mut errors, "text", &form.text, None);
    if errors.is_empty() {
        Ok(text)
    } else {
        Err(errors)
    }
}

/// Comments on a post, oldest first.
pub async fn get_comments_for_post(
    db: &DatabaseConnection,
    post_id: i32,
) -> Result<Vec<CommentForTemplate>, DbErr> {
    comments::Entity::find()
        .inner_join(users::Entity)
        .column_as(users::Column::Username, "author_username")
        .filter(comments::Column::PostId.eq(post_id))
        .order_by_asc(comments::Column::CreatedAt)
        .order_by_asc(comments::Column::Id)
        .into_model::<CommentForTemplate>()
        .all(db)
        .await
}

pub async fn insert_comment(
    db: &DatabaseConnection,
    post_id: i32,
    author_id: i32,
    text: String,
) -> Result<comments::Model, DbErr> {
    comments::ActiveModel {
        post_id: Set(post_id),
        author_id: Set(author_id),
        text: Set(text),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}
