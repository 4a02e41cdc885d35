use crate::form::{required_text, FormErrors};
use crate::orm::{groups, posts};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, PaginatorTrait};
use serde::Deserialize;

pub const TITLE_MAX_LEN: usize = 200;

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern"));

/// All groups, ordered by title for select boxes.
pub async fn get_groups(db: &DatabaseConnection) -> Result<Vec<groups::Model>, DbErr> {
    groups::Entity::find()
        .order_by_asc(groups::Column::Title)
        .all(db)
        .await
}

pub async fn get_group_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<groups::Model>, DbErr> {
    groups::Entity::find()
        .filter(groups::Column::Slug.eq(slug))
        .one(db)
        .await
}

/// A group and the number of posts in it, for the admin listing.
pub struct GroupWithCount {
    pub group: groups::Model,
    pub post_count: usize,
}

pub async fn get_groups_with_counts(
    db: &DatabaseConnection,
) -> Result<Vec<GroupWithCount>, DbErr> {
    let mut result = Vec::new();
    for group in get_groups(db).await? {
        let post_count = posts::Entity::find()
            .filter(posts::Column::GroupId.eq(group.id))
            .count(db)
            .await?;
        result.push(GroupWithCount { group, post_count });
    }
    Ok(result)
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GroupFormData {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Validates a new group form. Slug uniqueness is checked on insert.
pub fn validate_group_form(form: &GroupFormData) -> Result<groups::ActiveModel, FormErrors> {
    let mut errors = FormErrors::default();

    let title = required_text(&mut errors, "title", &form.title, Some(TITLE_MAX_LEN));
    let slug = required_text(&mut errors, "slug", &form.slug, None);
    if !slug.is_empty() && !SLUG_PATTERN.is_match(&slug) {
        errors.add(
            "slug",
            "Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens.",
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(groups::ActiveModel {
        title: Set(title),
        slug: Set(slug),
        description: Set(form.description.trim().to_owned()),
        ..Default::default()
    })
}

pub async fn insert_group(
    db: &DatabaseConnection,
    group: groups::ActiveModel,
) -> Result<Result<groups::Model, FormErrors>, DbErr> {
    if let ActiveValue::Set(slug) = &group.slug {
        if get_group_by_slug(db, slug).await?.is_some() {
            let mut errors = FormErrors::default();
            errors.add("slug", "Group with this Slug already exists.");
            return Ok(Err(errors));
        }
    }
    Ok(Ok(group.insert(db).await?))
}
