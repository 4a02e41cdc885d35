use actix_web::cookie::Key;
use anyhow::{anyhow, bail, Context as _};
use std::path::PathBuf;
use std::time::Duration;

/// Number of posts rendered on one page of any listing.
pub const DEFAULT_POSTS_PER_PAGE: u64 = 10;
/// How long a rendered index page is served from the page cache.
pub const DEFAULT_INDEX_CACHE_SECONDS: u64 = 20;

/// Runtime settings, read once from the environment at startup.
#[derive(Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub media_root: PathBuf,
    pub secret_key: Key,
    pub cookie_secure: bool,
    pub posts_per_page: u64,
    pub index_cache_ttl: Duration,
}

impl Settings {
    /// Reads settings from environment variables. Call `dotenv` first if a `.env` file is used.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(key) => parse_secret_key(&key)?,
            Err(_) => {
                log::warn!("SECRET_KEY is not set; sessions will not survive a restart.");
                Key::generate()
            }
        };

        Ok(Self {
            database_url,
            bind_address: var_or("BIND_ADDRESS", "127.0.0.1:8080"),
            media_root: PathBuf::from(var_or("MEDIA_ROOT", "./media")),
            secret_key,
            cookie_secure: parse_var("COOKIE_SECURE", false)?,
            posts_per_page: parse_posts_per_page(parse_var(
                "POSTS_PER_PAGE",
                DEFAULT_POSTS_PER_PAGE,
            )?)?,
            index_cache_ttl: Duration::from_secs(parse_var(
                "INDEX_CACHE_SECONDS",
                DEFAULT_INDEX_CACHE_SECONDS,
            )?),
        })
    }

    /// Settings for a throwaway instance, used by tests.
    pub fn for_database(database_url: &str, media_root: PathBuf) -> Self {
        Self {
            database_url: database_url.to_owned(),
            bind_address: "127.0.0.1:0".to_owned(),
            media_root,
            secret_key: Key::generate(),
            cookie_secure: false,
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
            index_cache_ttl: Duration::from_secs(DEFAULT_INDEX_CACHE_SECONDS),
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{} cannot be parsed: {}", name, e)),
        Err(_) => Ok(default),
    }
}

fn parse_posts_per_page(value: u64) -> anyhow::Result<u64> {
    if value == 0 {
        bail!("POSTS_PER_PAGE must be a positive number");
    }
    Ok(value)
}

/// The cookie key needs at least 64 bytes of material.
fn parse_secret_key(value: &str) -> anyhow::Result<Key> {
    let bytes = value.as_bytes();
    if bytes.len() < 64 {
        bail!("SECRET_KEY must be at least 64 bytes long");
    }
    Ok(Key::from(bytes))
}
