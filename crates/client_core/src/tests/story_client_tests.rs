use super::*;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use shared::domain::{CapturedImage, Mood, MoodScores};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct ServerState {
    tx: Arc<Mutex<Option<oneshot::Sender<serde_json::Value>>>>,
}

async fn handle_generate(
    State(state): State<ServerState>,
    Json(payload): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(payload);
    }
    Json(serde_json::json!({
        "mood": "happy",
        "story": "The sun rose.\n\nAnd you smiled.",
    }))
}

async fn spawn(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn request() -> GenerateStoryRequest {
    let image = CapturedImage::jpeg(1, 1, vec![0xff, 0xd8]);
    let scores: MoodScores = [(Mood::Happy, 0.97), (Mood::Neutral, 0.03)]
        .into_iter()
        .collect();
    GenerateStoryRequest::new(&image, Mood::Happy, scores)
}

#[tokio::test]
async fn posts_image_mood_and_expressions() {
    let (tx, rx) = oneshot::channel();
    let app = Router::new()
        .route(GENERATE_STORY_PATH, post(handle_generate))
        .with_state(ServerState {
            tx: Arc::new(Mutex::new(Some(tx))),
        });
    let client = HttpStoryClient::new(spawn(app).await);

    let result = client.generate_story(&request()).await.expect("story");
    assert_eq!(result.mood, "happy");
    assert_eq!(result.story, "The sun rose.\n\nAnd you smiled.");

    let payload = rx.await.expect("payload");
    assert_eq!(payload["image_data"], "data:image/jpeg;base64,/9g=");
    assert_eq!(payload["mood"], "happy");
    assert_eq!(payload["expressions"]["happy"], 0.97);
}

#[tokio::test]
async fn surfaces_server_detail() {
    let app = Router::new().route(
        GENERATE_STORY_PATH,
        post(|| async {
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "detail": "Story model is warming up" })),
            )
        }),
    );
    let client = HttpStoryClient::new(spawn(app).await);

    let err = client.generate_story(&request()).await.unwrap_err();
    assert!(matches!(err, StoryRequestError::Server { status: 502, .. }));
    assert_eq!(err.user_message(), "Story model is warming up");
}

#[tokio::test]
async fn falls_back_to_status_message_without_detail() {
    let app = Router::new().route(
        GENERATE_STORY_PATH,
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let client = HttpStoryClient::new(spawn(app).await);

    let err = client.generate_story(&request()).await.unwrap_err();
    assert_eq!(err.user_message(), "Request failed with status code 500");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = HttpStoryClient::new(format!("http://{addr}"));
    let err = client.generate_story(&request()).await.unwrap_err();
    assert!(matches!(err, StoryRequestError::Transport(_)));
    assert!(!err.user_message().is_empty());
}

#[tokio::test]
async fn malformed_success_body_uses_generic_message() {
    let app = Router::new().route(
        GENERATE_STORY_PATH,
        post(|| async { Json(serde_json::json!({ "text": "no story field" })) }),
    );
    let client = HttpStoryClient::new(spawn(app).await);

    let err = client.generate_story(&request()).await.unwrap_err();
    assert!(matches!(err, StoryRequestError::Decode(_)));
    assert_eq!(err.user_message(), "Failed to generate story");
}

#[test]
fn endpoint_joins_base_and_path() {
    let client = HttpStoryClient::new("http://localhost:8000");
    assert_eq!(client.endpoint(), "http://localhost:8000/api/generate-story");
}
