use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context as _;
use blogroll::cache::PageCache;
use blogroll::middleware::ClientCtx;
use blogroll::{db, media, Settings};
use env_logger::Env;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let settings = Settings::from_env()?;
    media::init(&settings.media_root).with_context(|| {
        format!(
            "media root {} could not be created",
            settings.media_root.display()
        )
    })?;

    let db = db::connect(&settings.database_url)
        .await
        .context("database connection failed")?;
    db::create_tables(&db)
        .await
        .context("database tables could not be created")?;

    let bind_address = settings.bind_address.clone();
    let db = Data::new(db);
    let cache = Data::new(PageCache::new(settings.index_cache_ttl));
    let settings = Data::new(settings);

    log::info!("listening on {}", bind_address);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        // However, services are read top->down, higher traffic routes should be
        // placed higher
        App::new()
            .app_data(db.clone())
            .app_data(settings.clone())
            .app_data(cache.clone())
            .wrap(blogroll::web::error::error_handlers())
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(
                    CookieSessionStore::default(),
                    settings.secret_key.clone(),
                )
                .cookie_secure(settings.cookie_secure)
                .build(),
            )
            .wrap(Logger::new("%a %{User-Agent}i"))
            .service(blogroll::web::media_files(&settings))
            .configure(blogroll::web::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env file is fine; the environment may already be set.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("no .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
