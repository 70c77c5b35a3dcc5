mod login;
mod signup;

use axum::{Json, Router, http::StatusCode, response::{IntoResponse, Response}, routing::post};
use serde_json::json;

use crate::AppState;

pub use login::login;
pub use signup::signup;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub(crate) fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": error }))).into_response()
}

pub(crate) fn valid_username(username: &str) -> bool {
    (3..=30).contains(&username.len())
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
