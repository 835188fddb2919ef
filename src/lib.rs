pub mod app_state;
pub mod cache;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod health;
pub mod logging;
pub mod mirror;
pub mod render;
pub mod rewrite;
