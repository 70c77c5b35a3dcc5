use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RoomMessage {
    pub id: String,
    pub room: String,
    pub sender: String,
    pub text: String,
    /// Server-assigned, unix milliseconds.
    pub sent_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PrivateMessage {
    pub id: String,
    pub sender: String,
    pub target: String,
    pub text: String,
    pub sent_at: i64,
}

/// Append-only message log over SQLite. Ids (uuid v7) and timestamps are
/// assigned here; nothing in the crate ever updates or deletes a row.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append_room_message(
        &self,
        room: &str,
        sender: &str,
        text: &str,
    ) -> sqlx::Result<RoomMessage> {
        let message = RoomMessage {
            id: Uuid::now_v7().to_string(),
            room: room.to_owned(),
            sender: sender.to_owned(),
            text: text.trim().to_owned(),
            sent_at: now_ms(),
        };
        sqlx::query("INSERT INTO room_messages (id,room,sender,text,sent_at) VALUES (?,?,?,?,?)")
            .bind(&message.id)
            .bind(&message.room)
            .bind(&message.sender)
            .bind(&message.text)
            .bind(message.sent_at)
            .execute(&self.pool)
            .await?;
        Ok(message)
    }

    pub async fn append_private_message(
        &self,
        sender: &str,
        target: &str,
        text: &str,
    ) -> sqlx::Result<PrivateMessage> {
        let message = PrivateMessage {
            id: Uuid::now_v7().to_string(),
            sender: sender.to_owned(),
            target: target.to_owned(),
            text: text.trim().to_owned(),
            sent_at: now_ms(),
        };
        sqlx::query("INSERT INTO private_messages (id,sender,target,text,sent_at) VALUES (?,?,?,?,?)")
            .bind(&message.id)
            .bind(&message.sender)
            .bind(&message.target)
            .bind(&message.text)
            .bind(message.sent_at)
            .execute(&self.pool)
            .await?;
        Ok(message)
    }

    /// Most recent `limit` messages of `room`, oldest first.
    pub async fn recent_room_messages(
        &self,
        room: &str,
        limit: i64,
    ) -> sqlx::Result<Vec<RoomMessage>> {
        sqlx::query_as(
            "SELECT id,room,sender,text,sent_at FROM (
                SELECT * FROM room_messages WHERE room=?
                ORDER BY sent_at DESC, id DESC LIMIT ?
            ) ORDER BY sent_at ASC, id ASC",
        )
        .bind(room)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Most recent `limit` messages between `a` and `b`, both directions,
    /// oldest first.
    pub async fn recent_private_messages(
        &self,
        a: &str,
        b: &str,
        limit: i64,
    ) -> sqlx::Result<Vec<PrivateMessage>> {
        sqlx::query_as(
            "SELECT id,sender,target,text,sent_at FROM (
                SELECT * FROM private_messages
                WHERE (sender=? AND target=?) OR (sender=? AND target=?)
                ORDER BY sent_at DESC, id DESC LIMIT ?
            ) ORDER BY sent_at ASC, id ASC",
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
