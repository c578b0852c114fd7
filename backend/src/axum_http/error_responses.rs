use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Maps a use-case failure to its response. Server errors never echo their detail.
pub fn usecase_error(status: StatusCode, err: &impl std::fmt::Display) -> Response {
    if status.is_server_error() {
        return error_response(status, "Internal server error");
    }
    error_response(status, err.to_string())
}
