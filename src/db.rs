use sqlx::SqlitePool;

/// Bootstraps the SQLite schema. Safe to run on every start.
pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            username   TEXT PRIMARY KEY,
            firstname  TEXT NOT NULL,
            lastname   TEXT NOT NULL,
            password   TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS room_messages (
            id      TEXT PRIMARY KEY,
            room    TEXT NOT NULL,
            sender  TEXT NOT NULL,
            text    TEXT NOT NULL,
            sent_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_room_messages_room_sent
            ON room_messages (room, sent_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS private_messages (
            id      TEXT PRIMARY KEY,
            sender  TEXT NOT NULL,
            target  TEXT NOT NULL,
            text    TEXT NOT NULL,
            sent_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_private_messages_pair_sent
            ON private_messages (sender, target, sent_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn user_exists(pool: &SqlitePool, username: &str) -> sqlx::Result<bool> {
    Ok(sqlx::query_as::<_, (i64,)>("SELECT 1 FROM users WHERE username=?")
        .bind(username)
        .fetch_optional(pool)
        .await?
        .is_some())
}
