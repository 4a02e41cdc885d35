use crate::orm::{comments, follows, groups, posts, users};
use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use std::time::Duration;

/// Opens the database URL and returns a connection pool.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .sqlx_logging(true);

    // Every connection to an in-memory SQLite database is a new, empty database.
    if database_url.starts_with("sqlite::memory:") {
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(24 * 60 * 60));
    }

    Database::connect(opt).await
}

/// Creates any missing table from the entity definitions.
/// Tables are created in foreign key order.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, groups::Entity).await?;
    create_table(db, posts::Entity).await?;
    create_table(db, comments::Entity).await?;
    create_table(db, follows::Entity).await?;

    // A follower stores each author once.
    let backend = db.get_database_backend();
    let stmt = Index::create()
        .name("idx_follows_user_author")
        .table(follows::Entity)
        .col(follows::Column::UserId)
        .col(follows::Column::AuthorId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&stmt)).await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
