pub mod appresult;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod history;

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use appresult::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub chat: Arc<chat::ChatState>,
}
