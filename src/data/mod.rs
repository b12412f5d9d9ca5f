//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Hashtag extraction on write

mod database;
mod hashtags;
mod models;

pub use database::Database;
pub use hashtags::{extract_hashtags, normalize_tag};
pub use models::*;
