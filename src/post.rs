use crate::form::{required_text, FormErrors};
use crate::media::{validate_image, UploadedFile};
use crate::orm::{groups, posts, users};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult, PaginatorTrait};
use serde::Deserialize;

/// A fully joined struct representing the post model and its relational data.
#[derive(Clone, Debug, PartialEq, FromQueryResult)]
pub struct PostForTemplate {
    pub id: i32,
    pub text: String,
    pub created_at: chrono::NaiveDateTime,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub image: Option<String>,
    // join users
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    // join groups
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

/// Title and slug of the group a post belongs to.
pub struct GroupLink<'a> {
    pub title: &'a str,
    pub slug: &'a str,
}

impl PostForTemplate {
    pub fn group(&self) -> Option<GroupLink<'_>> {
        match (&self.group_title, &self.group_slug) {
            (Some(title), Some(slug)) => Some(GroupLink { title, slug }),
            _ => None,
        }
    }

    pub fn author_name(&self) -> String {
        let full = format!("{} {}", self.author_first_name, self.author_last_name);
        let full = full.trim();
        if full.is_empty() {
            self.author_username.to_owned()
        } else {
            full.to_owned()
        }
    }

    pub fn image_url(&self) -> Option<String> {
        self.image.as_deref().map(crate::media::get_media_url)
    }

    /// First characters of the text, for titles.
    pub fn excerpt(&self) -> String {
        const EXCERPT_LEN: usize = 30;
        let mut excerpt: String = self.text.chars().take(EXCERPT_LEN).collect();
        if self.text.chars().count() > EXCERPT_LEN {
            excerpt.push('…');
        }
        excerpt
    }
}

/// Select for posts with their author and group, newest first.
pub fn select_posts_for_template() -> Select<posts::Entity> {
    posts::Entity::find()
        .inner_join(users::Entity)
        .column_as(users::Column::Username, "author_username")
        .column_as(users::Column::FirstName, "author_first_name")
        .column_as(users::Column::LastName, "author_last_name")
        .left_join(groups::Entity)
        .column_as(groups::Column::Title, "group_title")
        .column_as(groups::Column::Slug, "group_slug")
        .order_by_desc(posts::Column::CreatedAt)
        .order_by_desc(posts::Column::Id)
}

pub async fn get_post_for_template(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<PostForTemplate>, DbErr> {
    select_posts_for_template()
        .filter(posts::Column::Id.eq(id))
        .into_model::<PostForTemplate>()
        .one(db)
        .await
}

pub async fn count_posts_by_author(db: &DatabaseConnection, author_id: i32) -> Result<usize, DbErr> {
    posts::Entity::find()
        .filter(posts::Column::AuthorId.eq(author_id))
        .count(db)
        .await
}

/// Raw post form, as posted by a urlencoded form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostFormData {
    pub text: String,
    pub group: Option<String>,
}

/// Everything a post form can carry, including an uploaded image.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<UploadedFile>,
}

impl From<PostFormData> for PostSubmission {
    fn from(form: PostFormData) -> Self {
        Self {
            text: form.text,
            group: form.group,
            image: None,
        }
    }
}

/// Values a post form is rendered with.
#[derive(Clone, Debug, Default)]
pub struct PostForm {
    pub text: String,
    pub group: Option<i32>,
    pub image: Option<String>,
    pub errors: FormErrors,
}

impl PostForm {
    pub fn for_post(post: &posts::Model) -> Self {
        Self {
            text: post.text.to_owned(),
            group: post.group_id,
            image: post.image.to_owned(),
            errors: FormErrors::default(),
        }
    }

    pub fn is_group_selected(&self, id: &i32) -> bool {
        self.group == Some(*id)
    }
}

/// A post submission which passed validation.
#[derive(Debug)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<UploadedFile>,
}

/// Validates a submission against the known groups.
/// On failure, returns the form to render again with its errors.
pub fn validate_post_form(
    submission: PostSubmission,
    groups: &[groups::Model],
) -> Result<CleanPost, PostForm> {
    let mut errors = FormErrors::default();

    let text = required_text(&mut errors, "text", &submission.text, None);

    let raw_group = submission.group.as_deref().map(str::trim).unwrap_or_default();
    let group_id = if raw_group.is_empty() {
        None
    } else {
        match raw_group.parse::<i32>() {
            Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
            _ => {
                errors.add(
                    "group",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
                None
            }
        }
    };

    if let Some(upload) = &submission.image {
        if let Err(message) = validate_image(upload) {
            errors.add("image", message);
        }
    }

    if !errors.is_empty() {
        return Err(PostForm {
            text,
            group: group_id,
            image: None,
            errors,
        });
    }

    Ok(CleanPost {
        text,
        group_id,
        image: submission.image,
    })
}

pub async fn insert_post(
    db: &DatabaseConnection,
    author_id: i32,
    text: String,
    group_id: Option<i32>,
    image: Option<String>,
) -> Result<posts::Model, DbErr> {
    posts::ActiveModel {
        text: Set(text),
        created_at: Set(Utc::now().naive_utc()),
        author_id: Set(author_id),
        group_id: Set(group_id),
        image: Set(image),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Applies an edit. The author never changes. A missing group clears the group;
/// a missing image keeps the current one.
pub async fn update_post(
    db: &DatabaseConnection,
    post: posts::Model,
    text: String,
    group_id: Option<i32>,
    image: Option<String>,
) -> Result<posts::Model, DbErr> {
    let mut active: posts::ActiveModel = post.into();
    active.text = Set(text);
    active.group_id = Set(group_id);
    if image.is_some() {
        active.image = Set(image);
    }
    active.update(db).await
}
