use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{Json, debug_handler, extract::State, http::StatusCode, response::{IntoResponse, Response}};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::AppResult;

use super::reject;

#[derive(Deserialize)]
pub(crate) struct LoginBody {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// No token on success; the client keeps the username and presents it as
/// its identity claim when opening the socket.
#[debug_handler]
pub async fn login(
    State(db_pool): State<SqlitePool>,
    Json(body): Json<LoginBody>,
) -> AppResult<Response> {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Ok(reject(StatusCode::BAD_REQUEST, "Missing credentials"));
    };
    if username.is_empty() || password.is_empty() {
        return Ok(reject(StatusCode::BAD_REQUEST, "Missing credentials"));
    }

    let row: Option<(String, String, String, String)> = sqlx::query_as(
        "SELECT username,firstname,lastname,password FROM users WHERE username=?",
    )
    .bind(&username)
    .fetch_optional(&db_pool)
    .await?;

    let Some((username, firstname, lastname, hashed)) = row else {
        return Ok(reject(StatusCode::UNAUTHORIZED, "Invalid username/password"));
    };

    let parsed = PasswordHash::new(&hashed).map_err(|err| anyhow::anyhow!("stored hash: {err}"))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Ok(reject(StatusCode::UNAUTHORIZED, "Invalid username/password"));
    }

    Ok(Json(json!({
        "ok": true,
        "user": { "username": username, "firstname": firstname, "lastname": lastname },
    }))
    .into_response())
}
