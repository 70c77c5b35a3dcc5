use std::sync::Arc;

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::{AppResult, AppState, chat::ChatState};

const PAGE_SIZE: i64 = 200;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms/{room}/messages", get(room_messages))
        .route("/private/{a}/{b}/messages", get(private_messages))
}

/// Most recent page of a room's history, oldest first. An unconfigured
/// room name simply has no rows.
#[debug_handler(state = crate::AppState)]
async fn room_messages(
    State(chat): State<Arc<ChatState>>,
    Path(room): Path<String>,
) -> AppResult<Response> {
    let messages = chat.history().recent_room_messages(&room, PAGE_SIZE).await?;
    Ok(Json(json!({ "ok": true, "messages": messages })).into_response())
}

#[debug_handler(state = crate::AppState)]
async fn private_messages(
    State(chat): State<Arc<ChatState>>,
    Path((a, b)): Path<(String, String)>,
) -> AppResult<Response> {
    let messages = chat
        .history()
        .recent_private_messages(&a, &b, PAGE_SIZE)
        .await?;
    Ok(Json(json!({ "ok": true, "messages": messages })).into_response())
}
