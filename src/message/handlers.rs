use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Json,
};
use tracing::{info, instrument, warn};

use super::{
    models::{FileMeta, MessageKind, MessageModel},
    types::UploadQuery,
};
use crate::shared::{AppError, AppState};
use crate::websockets::ServerEvent;

const DEFAULT_MIME: &str = "application/octet-stream";

/// HTTP handler for sharing a file into a room
///
/// POST /rooms/{room}/upload?author=X&file_name=Y
/// Body is the raw file, Content-Type is its mime type. The stored message is
/// broadcast to the room as a `chat message` and returned.
#[instrument(name = "upload_file", skip(state, headers, body), fields(size = body.len()))]
pub async fn upload_file(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageModel>), AppError> {
    let room_id = room_id.trim();
    if room_id.is_empty() {
        return Err(AppError::Validation("room is required".to_string()));
    }

    let author = query.author.trim();
    if author.is_empty() {
        return Err(AppError::Validation("author is required".to_string()));
    }

    if body.is_empty() {
        return Err(AppError::MissingPayload("No file uploaded".to_string()));
    }

    let limit = state.config.max_upload_bytes;
    if body.len() > limit {
        warn!(room_id = %room_id, size = body.len(), limit, "Upload over size limit");
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} byte limit",
            limit
        )));
    }

    let mime_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_MIME)
        .to_string();
    let size_bytes = body.len() as u64;

    let url = state.blob_store.put(body, &mime_type).await?;

    let text = query.file_name().to_string();
    let file = FileMeta {
        url,
        name: text.clone(),
        size_bytes,
    };

    let message = {
        let _room_guard = state.message_service.lock_room(room_id).await;

        let message = state
            .message_service
            .create_message(
                room_id,
                author,
                &text,
                MessageKind::from_mime(&mime_type),
                Some(file),
            )
            .await?;

        state
            .broadcaster
            .broadcast_to_room(room_id, &ServerEvent::stored(message.clone()))
            .await;

        message
    };

    info!(
        room_id = %room_id,
        message_id = %message.id,
        kind = %message.kind,
        mime_type = %mime_type,
        "File shared"
    );

    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::InMemoryBlobStore;
    use crate::config::AppConfig;
    use crate::message::repository::InMemoryMessageRepository;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{body::Body, extract::DefaultBodyLimit, http::Request, Router};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    struct Fixture {
        app: Router,
        blobs: Arc<InMemoryBlobStore>,
        messages: Arc<InMemoryMessageRepository>,
    }

    fn fixture() -> Fixture {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let config = AppConfig::default();
        let limit = config.max_upload_bytes * 2;
        let state = AppStateBuilder::new()
            .with_config(config)
            .with_blob_store(blobs.clone())
            .with_message_repository(messages.clone())
            .build();

        let app = Router::new()
            .route("/rooms/:room/upload", axum::routing::post(upload_file))
            .layer(DefaultBodyLimit::max(limit))
            .with_state(state);

        Fixture {
            app,
            blobs,
            messages,
        }
    }

    fn upload(uri: &str, mime: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", mime)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_image_creates_message() {
        let f = fixture();

        let response = f
            .app
            .oneshot(upload(
                "/rooms/r1/upload?author=alice&file_name=cat.png",
                "image/png",
                vec![1, 2, 3, 4],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let message: MessageModel = serde_json::from_slice(&body).unwrap();
        assert_eq!(message.kind, MessageKind::Image);
        assert_eq!(message.author, "alice");
        assert_eq!(message.text, "cat.png");
        assert_eq!(message.file_name.as_deref(), Some("cat.png"));
        assert_eq!(message.file_size_bytes, Some(4));

        let url = message.file_url.unwrap();
        assert_eq!(f.blobs.get(&url).await.map(|(mime, _)| mime), Some("image/png".to_string()));
        assert_eq!(f.messages.message_count().await, 1);
    }

    #[tokio::test]
    async fn test_non_image_upload_is_file_kind() {
        let f = fixture();

        let response = f
            .app
            .oneshot(upload(
                "/rooms/r1/upload?author=alice&file_name=notes.pdf",
                "application/pdf",
                b"%PDF".to_vec(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let message: MessageModel = serde_json::from_slice(&body).unwrap();
        assert_eq!(message.kind, MessageKind::File);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected_before_storage() {
        let f = fixture();
        let fifteen_mib = vec![0u8; 15 * 1024 * 1024];

        let response = f
            .app
            .oneshot(upload(
                "/rooms/r1/upload?author=alice&file_name=big.bin",
                "application/octet-stream",
                fifteen_mib,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(f.blobs.blob_count().await, 0);
        assert_eq!(f.messages.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let f = fixture();

        let response = f
            .app
            .oneshot(upload(
                "/rooms/r1/upload?author=alice",
                "image/png",
                Vec::new(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(f.blobs.blob_count().await, 0);
        assert_eq!(f.messages.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_upload_requires_author() {
        let f = fixture();

        let response = f
            .app
            .oneshot(upload("/rooms/r1/upload", "image/png", vec![1]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(f.blobs.blob_count().await, 0);
    }
}
