use axum::http::StatusCode;
use axum::response::Response;

use super::error_responses::error_response;

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

pub async fn health_check() -> &'static str {
    "OK"
}
