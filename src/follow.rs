use crate::orm::follows;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult};

/// What happened when a user asked to follow an author.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    SelfFollow,
}

pub async fn is_following(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    Ok(follows::Entity::find()
        .filter(follows::Column::UserId.eq(user_id))
        .filter(follows::Column::AuthorId.eq(author_id))
        .one(db)
        .await?
        .is_some())
}

/// Records a follow. A pair is stored once and nobody follows themselves.
pub async fn follow(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<FollowOutcome, DbErr> {
    if user_id == author_id {
        return Ok(FollowOutcome::SelfFollow);
    }
    if is_following(db, user_id, author_id).await? {
        return Ok(FollowOutcome::AlreadyFollowing);
    }

    let inserted = follows::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(_) => Ok(FollowOutcome::Followed),
        // Another request stored the pair first; the unique index refused this one.
        Err(e) => match is_following(db, user_id, author_id).await? {
            true => Ok(FollowOutcome::AlreadyFollowing),
            false => Err(e),
        },
    }
}

/// Removes a follow. Returns whether one existed.
pub async fn unfollow(db: &DatabaseConnection, user_id: i32, author_id: i32) -> Result<bool, DbErr> {
    let res = follows::Entity::delete_many()
        .filter(follows::Column::UserId.eq(user_id))
        .filter(follows::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Ids of every author the user follows.
pub async fn get_followed_author_ids(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<i32>, DbErr> {
    #[derive(FromQueryResult)]
    struct AuthorId {
        author_id: i32,
    }

    Ok(follows::Entity::find()
        .select_only()
        .column(follows::Column::AuthorId)
        .filter(follows::Column::UserId.eq(user_id))
        .into_model::<AuthorId>()
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.author_id)
        .collect())
}
