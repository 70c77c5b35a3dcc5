use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Query, State, WebSocketUpgrade, ws::WebSocket},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::{AppResult, db};

use super::ChatState;
use super::event::{ClientEvent, ServerEvent};
use super::registry::ConnId;
use super::session::RoomSession;

#[derive(Deserialize)]
pub(crate) struct IdentityClaim {
    username: Option<String>,
}

/// Admission happens before the upgrade: no claim or an unknown username
/// refuses the socket with no registry or presence state ever created.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    State(db_pool): State<SqlitePool>,
    State(chat): State<Arc<ChatState>>,
    Query(IdentityClaim { username }): Query<IdentityClaim>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let Some(username) = username.filter(|name| !name.is_empty()) else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };
    if !db::user_exists(&db_pool, &username).await? {
        return Ok(StatusCode::FORBIDDEN.into_response());
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, chat, username)))
}

async fn handle_socket(socket: WebSocket, chat: Arc<ChatState>, username: String) {
    let conn = ConnId::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    chat.register(&username, conn, tx.clone());
    let _ = tx.send(ServerEvent::RoomList {
        rooms: chat.rooms().names().to_vec(),
    });

    let (mut sink, mut stream) = socket.split();
    let forward = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(frame) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(frame.into()).await.is_err() {
                break;
            }
        }
    });

    let mut session = RoomSession::new(conn, username.clone());
    while let Some(Ok(frame)) = stream.next().await {
        let Ok(event) = serde_json::from_slice::<ClientEvent>(&frame.into_data()) else {
            continue;
        };
        match event {
            ClientEvent::JoinRoom { room } => session.join(&chat, &room),
            ClientEvent::LeaveRoom { room } => session.leave(&chat, &room),
            ClientEvent::RoomMessage { room, text } => {
                // A failed write aborts this one send; the connection stays up.
                if let Err(err) = chat.send_room_message(&username, &room, &text).await {
                    tracing::error!(%err, %room, sender = %username, "room message not persisted");
                }
            }
            ClientEvent::RoomTyping { room, is_typing } => {
                chat.room_typing(&username, &room, is_typing);
            }
            ClientEvent::PrivateMessage { target, text } => {
                if let Err(err) = chat.send_private_message(&username, &target, &text).await {
                    tracing::error!(%err, %target, sender = %username, "private message not persisted");
                }
            }
            ClientEvent::PrivateTyping { target, is_typing } => {
                chat.private_typing(&username, &target, is_typing);
            }
        }
    }

    session.disconnect(&chat);
    forward.abort();
}
