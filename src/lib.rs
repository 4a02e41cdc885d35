pub mod cache;
pub mod comment;
pub mod config;
pub mod db;
pub mod follow;
pub mod form;
pub mod group;
pub mod media;
pub mod middleware;
pub mod orm;
pub mod pagination;
pub mod post;
pub mod session;
pub mod user;
pub mod web;

pub use config::Settings;
