//! End-to-end tests of the HTTP API, driving the router in-process with an
//! in-memory vector store and scripted model backends.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use docchat_chat::{BoxedStream, Generator, StreamChunk};
use docchat_core::{ChatMessage, DocChatConfig, Result, VectorBackend};
use docchat_infer::EmbedderBackend;
use docchat_server::{build_router, AppState};
use docchat_store::MemoryStore;

const BOUNDARY: &str = "docchat-test-boundary";

/// Every text embeds to the same unit vector, so stored chunks score 1.0.
struct UnitEmbedder;

#[async_trait]
impl EmbedderBackend for UnitEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0])
    }
    fn dimension(&self) -> Option<usize> {
        Some(3)
    }
    fn name(&self) -> &str {
        "unit"
    }
}

#[derive(Default)]
struct ScriptedGenerator {
    chunks: Vec<StreamChunk>,
    calls: Mutex<usize>,
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn stream(&self, _history: &[ChatMessage], _prompt: String) -> Result<BoxedStream> {
        *self.calls.lock() += 1;
        Ok(Box::pin(futures::stream::iter(self.chunks.clone())))
    }
    fn name(&self) -> &str {
        "scripted"
    }
}

fn answer_chunks() -> Vec<StreamChunk> {
    vec![
        StreamChunk::Token("The report ".into()),
        StreamChunk::Token("covers Q3 ".into()),
        StreamChunk::Token("revenue.".into()),
        StreamChunk::Done { fragments: 3 },
    ]
}

fn test_app(generator: Arc<ScriptedGenerator>) -> Router {
    let config = DocChatConfig {
        vector_backend: VectorBackend::Memory,
        ..DocChatConfig::default()
    };
    let state = AppState::new(
        config,
        Arc::new(UnitEmbedder),
        Arc::new(MemoryStore::new()),
        generator,
    );
    build_router(Arc::new(state))
}

fn words(n: usize) -> String {
    (0..n).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ")
}

fn multipart_request(file_name: &str, content_type: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

async fn upload_words(app: &Router, n: usize) -> String {
    let (status, body) =
        send_json(app, multipart_request("report.txt", "text/plain", words(n).as_bytes())).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["data"]["documentId"].as_str().unwrap().to_string()
}

/// `data:` payloads of an SSE body, in order.
fn sse_payloads(body: &str) -> Vec<String> {
    body.split("\n\n")
        .filter_map(|event| event.strip_prefix("data: "))
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn upload_text_reports_chunk_count() {
    let app = test_app(Arc::new(ScriptedGenerator::default()));

    let (status, body) =
        send_json(&app, multipart_request("report.txt", "text/plain", words(1200).as_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["data"]["chunkCount"], 3);
    assert_eq!(body["data"]["name"], "report.txt");
    assert!(body["data"]["documentId"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn upload_rejects_unsupported_type() {
    let app = test_app(Arc::new(ScriptedGenerator::default()));

    let (status, body) = send_json(&app, multipart_request("photo.png", "image/png", b"\x89PNG")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], Value::Null);
    assert!(body["error"].as_str().unwrap().contains("unsupported type"));
}

#[tokio::test]
async fn upload_rejects_blank_document() {
    let app = test_app(Arc::new(ScriptedGenerator::default()));

    let (status, body) = send_json(&app, multipart_request("blank.txt", "text/plain", b"  \n ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn chat_on_empty_index_is_not_found() {
    let generator = Arc::new(ScriptedGenerator {
        chunks: answer_chunks(),
        ..Default::default()
    });
    let app = test_app(generator.clone());

    let (status, body) = send_json(
        &app,
        json_request(Method::POST, "/chat", json!({ "question": "What is in the report?" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Not enough relevant information"));
    assert_eq!(*generator.calls.lock(), 0);
}

#[tokio::test]
async fn chat_rejects_empty_question() {
    let app = test_app(Arc::new(ScriptedGenerator::default()));

    let (status, body) = send_json(&app, json_request(Method::POST, "/chat", json!({ "question": "   " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn chat_streams_answer_and_done_marker() {
    let app = test_app(Arc::new(ScriptedGenerator {
        chunks: answer_chunks(),
        ..Default::default()
    }));
    let document_id = upload_words(&app, 800).await;

    let request = json_request(
        Method::POST,
        "/chat",
        json!({ "question": "What does the report cover?", "documentId": document_id }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.ends_with("data: [DONE]\n\n"), "{:?}", body);

    let payloads = sse_payloads(&body);
    let answer: String = payloads[..payloads.len() - 1]
        .iter()
        .map(|p| serde_json::from_str::<Value>(p).unwrap()["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(answer, "The report covers Q3 revenue.");
}

#[tokio::test]
async fn chat_mid_stream_failure_sends_error_event() {
    let app = test_app(Arc::new(ScriptedGenerator {
        chunks: vec![
            StreamChunk::Token("Partial ".into()),
            StreamChunk::Error("connection reset".into()),
        ],
        ..Default::default()
    }));
    upload_words(&app, 100).await;

    let (status, body) = send(&app, json_request(Method::POST, "/chat", json!({ "question": "Anything?" }))).await;

    assert_eq!(status, StatusCode::OK);
    let payloads = sse_payloads(&body);
    assert_eq!(payloads.len(), 2);
    let last: Value = serde_json::from_str(&payloads[1]).unwrap();
    assert!(last["error"].is_string());
    assert!(!body.contains("[DONE]"));
    assert!(!body.contains("connection reset"));
}

#[tokio::test]
async fn delete_removes_chunks_and_is_idempotent() {
    let app = test_app(Arc::new(ScriptedGenerator::default()));
    let document_id = upload_words(&app, 1200).await;

    let (_, stats) = send_json(&app, Request::get("/check-data").body(Body::empty()).unwrap()).await;
    assert_eq!(stats["hasData"], true);
    assert_eq!(stats["totalChunks"], 3);

    for _ in 0..2 {
        let (status, body) = send_json(
            &app,
            json_request(Method::DELETE, "/delete", json!({ "documentId": document_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["message"].is_string());
    }

    let (status, stats) = send_json(&app, Request::get("/check-data").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["hasData"], false);
    assert_eq!(stats["totalChunks"], 0);
    assert_eq!(stats["error"], Value::Null);
}

#[tokio::test]
async fn delete_requires_document_id() {
    let app = test_app(Arc::new(ScriptedGenerator::default()));

    let (status, body) = send_json(&app, json_request(Method::DELETE, "/delete", json!({ "documentId": " " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn routes_are_also_served_under_api_prefix() {
    let app = test_app(Arc::new(ScriptedGenerator::default()));

    let (status, body) = send_json(&app, Request::get("/api/check-data").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn cors_preflight_is_permissive() {
    let app = test_app(Arc::new(ScriptedGenerator::default()));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/chat")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
