use std::sync::Arc;

use axum::Router;
use parlour::{AppState, auth, chat, config::RoomConfig, db, history};
use parlour::chat::{ChatState, store::HistoryStore};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "parlour=debug,info".into()),
        )
        .init();

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(dotenv::var("DATABASE_URL").unwrap().as_str())
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();

    let rooms = RoomConfig::from_env();
    tracing::info!(rooms = ?rooms.names(), "room list loaded");
    let chat = Arc::new(ChatState::new(rooms, HistoryStore::new(db_pool.clone())));
    let app_state = AppState { db_pool, chat };

    let app = Router::new()
        .nest("/api", auth::router().merge(history::router()))
        .merge(chat::router())
        .with_state(app_state)
        .layer(CorsLayer::permissive());

    let addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await.unwrap();
}
