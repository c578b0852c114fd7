use crate::{
    auth::AuthUser,
    axum_http::error_responses::{error_response, usecase_error},
    usecases::media::MediaUseCase,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::post,
};
use std::sync::Arc;
use textcast::domain::repositories::storage::MediaStorageClient;
use tracing::error;

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT/api/v1/media" \
//     -H "Authorization: Bearer $JWT" -H "Content-Type: image/png" --data-binary @promo.png

pub fn routes<S>(storage: Arc<S>) -> Router
where
    S: MediaStorageClient + Send + Sync + 'static,
{
    Router::new()
        .route("/", post(upload_media))
        .with_state(Arc::new(MediaUseCase::new(storage)))
}

pub async fn upload_media<S>(
    State(usecase): State<Arc<MediaUseCase<S>>>,
    AuthUser { user_id, .. }: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: MediaStorageClient + Send + Sync + 'static,
{
    let Some(content_type) = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return error_response(StatusCode::BAD_REQUEST, "Content-Type header is required");
    };

    match usecase
        .upload_image(user_id, content_type, body.to_vec())
        .await
    {
        Ok(uploaded) => (StatusCode::CREATED, Json(uploaded)).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(%user_id, error = ?err, "media: upload failed");
            }
            usecase_error(status, &err)
        }
    }
}
