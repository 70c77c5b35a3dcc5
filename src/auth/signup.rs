use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use axum::{Json, debug_handler, extract::State, http::StatusCode, response::{IntoResponse, Response}};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::AppResult;

use super::{reject, valid_username};

#[derive(Deserialize)]
pub(crate) struct SignupBody {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    firstname: Option<String>,
    #[serde(default)]
    lastname: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[debug_handler]
pub async fn signup(
    State(db_pool): State<SqlitePool>,
    Json(body): Json<SignupBody>,
) -> AppResult<Response> {
    let (Some(username), Some(firstname), Some(lastname), Some(password)) =
        (body.username, body.firstname, body.lastname, body.password)
    else {
        return Ok(reject(StatusCode::BAD_REQUEST, "All fields are required"));
    };
    if username.is_empty() || firstname.is_empty() || lastname.is_empty() || password.is_empty() {
        return Ok(reject(StatusCode::BAD_REQUEST, "All fields are required"));
    }
    if !valid_username(&username) {
        return Ok(reject(
            StatusCode::BAD_REQUEST,
            "Username can contain letters, numbers, underscore only",
        ));
    }
    if password.len() < 6 {
        return Ok(reject(StatusCode::BAD_REQUEST, "Password too short"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("password hash: {err}"))?
        .to_string();

    let inserted = sqlx::query(
        "INSERT INTO users (username,firstname,lastname,password) VALUES (?,?,?,?)",
    )
    .bind(username.trim())
    .bind(firstname.trim())
    .bind(lastname.trim())
    .bind(&hashed)
    .execute(&db_pool)
    .await;

    match inserted {
        Ok(_) => Ok(Json(json!({ "ok": true })).into_response()),
        Err(err) if is_unique_violation(&err) => {
            Ok(reject(StatusCode::BAD_REQUEST, "Username already exists"))
        }
        Err(err) => Err(err.into()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
